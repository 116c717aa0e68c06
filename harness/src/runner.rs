//! Ordered execution of checks between fixture setup and cleanup.

use crate::checks::{CheckContext, CheckRegistry, Expectations};
use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::report::{RunSummary, TestRecord};
use fixtures::FixtureSet;
use probe::{HttpClient, Transport};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{error, info};

pub struct Runner<'a> {
    transport: &'a dyn Transport,
    registry: CheckRegistry,
    expectations: Expectations,
    /// Print section headers and pass/fail lines to stdout as checks run
    echo: bool,
}

impl<'a> Runner<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        registry: CheckRegistry,
        expectations: Expectations,
    ) -> Self {
        Self {
            transport,
            registry,
            expectations,
            echo: false,
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Prepares `fixtures`, runs every check, then cleans up.
    ///
    /// Cleanup runs whether or not preparation succeeded. A preparation error
    /// is returned after cleanup; check failures never are, they end up in the
    /// summary.
    pub fn run(&self, fixtures: &mut FixtureSet) -> HarnessResult<RunSummary> {
        self.banner("Setting up test environment");
        let outcome = match fixtures.prepare() {
            Ok(()) => Ok(self.run_checks(fixtures)),
            Err(e) => {
                error!("Fixture setup failed: {}", e);
                Err(e.into())
            }
        };

        self.banner("Cleaning up test environment");
        fixtures.cleanup();
        outcome
    }

    /// Runs every registered check in order against already prepared fixtures.
    pub fn run_checks(&self, fixtures: &FixtureSet) -> RunSummary {
        let ctx = CheckContext::new(self.transport, fixtures, &self.expectations);
        let mut summary = RunSummary::new(self.transport.base_url());

        for check in self.registry.iter() {
            self.banner(&format!("Testing {}", check.title()));
            let start = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(|| check.run(&ctx)));
            let elapsed_ms = start.elapsed().as_millis() as u64;

            let record = match result {
                Ok(Ok(())) => {
                    info!("{} passed", check.name());
                    TestRecord::pass(check.name(), elapsed_ms)
                }
                Ok(Err(e)) => {
                    error!("{} failed: {}", check.name(), e);
                    TestRecord::fail(check.name(), e.to_string(), elapsed_ms)
                }
                Err(payload) => {
                    let message = format!("panicked: {}", panic_message(payload.as_ref()));
                    error!("{} {}", check.name(), message);
                    TestRecord::fail(check.name(), message, elapsed_ms)
                }
            };

            if self.echo {
                println!("{}", record.status_line());
            }
            summary.push(record);
        }

        summary
    }

    fn banner(&self, title: &str) {
        if self.echo {
            println!("\n=== {} ===", title);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Builds the HTTP client and fixtures described by `config` and runs its checks.
pub fn run_with_config(config: &HarnessConfig, echo: bool) -> HarnessResult<RunSummary> {
    config.validate()?;
    let client = HttpClient::new(config.probe_config())?;
    info!(
        "Running {} checks against {}",
        config.registry().len(),
        client.base_url()
    );

    let mut fixtures = FixtureSet::new(config.fixture_config());
    let runner =
        Runner::new(&client, config.registry(), config.expectations()).with_echo(echo);
    runner.run(&mut fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::FnTransport;
    use crate::checks::{Check, CheckResult};
    use crate::error::HarnessError;
    use fixtures::FixtureConfig;
    use probe::ProbeResponse;
    use tempfile::TempDir;

    struct AlwaysPasses;

    impl Check for AlwaysPasses {
        fn name(&self) -> &str {
            "test_passes"
        }

        fn title(&self) -> &str {
            "PASS"
        }

        fn run(&self, _ctx: &CheckContext<'_>) -> CheckResult<()> {
            Ok(())
        }
    }

    struct ChecksFixtureDir;

    impl Check for ChecksFixtureDir {
        fn name(&self) -> &str {
            "test_fixture_visible"
        }

        fn title(&self) -> &str {
            "FIXTURES"
        }

        fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()> {
            ctx.fixtures().read("test.txt")?;
            Ok(())
        }
    }

    struct Panics;

    impl Check for Panics {
        fn name(&self) -> &str {
            "test_panics"
        }

        fn title(&self) -> &str {
            "PANIC"
        }

        fn run(&self, _ctx: &CheckContext<'_>) -> CheckResult<()> {
            panic!("server sent garbage");
        }
    }

    fn fixtures_in(root: &TempDir) -> FixtureSet {
        FixtureSet::new(FixtureConfig::with_dirs(
            root.path().join("test_files"),
            root.path().join("static"),
        ))
    }

    fn expectations() -> Expectations {
        Expectations {
            test_body: "Hello, World!".to_string(),
        }
    }

    #[test]
    fn test_failures_do_not_stop_later_checks() {
        let root = TempDir::new().unwrap();
        let mut fixtures = fixtures_in(&root);
        let transport = FnTransport::new(|_| ProbeResponse::new(500));

        let mut registry = CheckRegistry::standard();
        registry.register(Box::new(AlwaysPasses));
        let runner = Runner::new(&transport, registry, expectations());

        let summary = runner.run(&mut fixtures).unwrap();
        assert_eq!(summary.total(), 6);
        assert_eq!(summary.failed(), 5);
        assert_eq!(summary.success(), 1);
        assert_eq!(summary.total(), summary.success() + summary.failed());
        assert!(summary.records[5].passed);
        assert_eq!(
            summary.records[0].message.as_deref(),
            Some("GET /test.txt: expected status 200, got 500")
        );
    }

    #[test]
    fn test_panicking_check_is_recorded_and_run_continues() {
        let root = TempDir::new().unwrap();
        let mut fixtures = fixtures_in(&root);
        let transport = FnTransport::new(|_| ProbeResponse::new(200));

        let mut registry = CheckRegistry::new();
        registry.register(Box::new(Panics));
        registry.register(Box::new(AlwaysPasses));
        let runner = Runner::new(&transport, registry, expectations());

        let summary = runner.run(&mut fixtures).unwrap();
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.records[0].name, "test_panics");
        assert_eq!(
            summary.records[0].message.as_deref(),
            Some("panicked: server sent garbage")
        );
        assert!(summary.records[1].passed);
        assert!(!root.path().join("test_files").exists());
    }

    #[test]
    fn test_panic_message_formats() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_run_on_already_prepared_fixtures() {
        let root = TempDir::new().unwrap();
        let served = root.path().join("static");
        std::fs::create_dir_all(&served).unwrap();
        std::fs::write(served.join("test.txt"), "server copy").unwrap();

        let mut fixtures = FixtureSet::setup(FixtureConfig::with_dirs(
            root.path().join("test_files"),
            &served,
        ))
        .unwrap();
        let transport = FnTransport::new(|_| ProbeResponse::new(200));
        let runner = Runner::new(&transport, CheckRegistry::new(), expectations());

        runner.run(&mut fixtures).unwrap();
        assert_eq!(
            std::fs::read_to_string(served.join("test.txt")).unwrap(),
            "server copy"
        );
        assert!(!root.path().join("test_files").exists());
    }

    #[test]
    fn test_fixtures_exist_during_checks_and_not_after() {
        let root = TempDir::new().unwrap();
        let mut fixtures = fixtures_in(&root);
        let transport = FnTransport::new(|_| ProbeResponse::new(200));

        let mut registry = CheckRegistry::new();
        registry.register(Box::new(ChecksFixtureDir));
        let runner = Runner::new(&transport, registry, expectations());

        let summary = runner.run(&mut fixtures).unwrap();
        assert!(summary.all_passed());
        assert!(fixtures.is_cleaned_up());
        assert!(!root.path().join("test_files").exists());
        assert!(!root.path().join("static").exists());
    }

    #[test]
    fn test_setup_failure_aborts_after_cleanup() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("static"), "in the way").unwrap();
        let mut fixtures = fixtures_in(&root);
        let transport = FnTransport::new(|_| ProbeResponse::new(200));
        let runner = Runner::new(&transport, CheckRegistry::standard(), expectations());

        let result = runner.run(&mut fixtures);
        assert!(matches!(result, Err(HarnessError::Fixture(_))));
        assert!(transport.sent.borrow().is_empty());
        assert!(!root.path().join("test_files").exists());
    }

    #[test]
    fn test_run_with_config_rejects_invalid_config() {
        let config = HarnessConfig {
            base_url: "not a url".to_string(),
            ..HarnessConfig::default()
        };
        let result = run_with_config(&config, false);
        assert!(matches!(result, Err(HarnessError::Config(_))));
    }
}
