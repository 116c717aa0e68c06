use crate::checks::{CheckRegistry, Expectations};
use crate::error::{HarnessError, HarnessResult};
use crate::report::ReportFormat;
use fixtures::{FixtureConfig, TEXT_FIXTURE, TEXT_FIXTURE_CONTENTS};
use probe::{ProbeConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one harness run, loadable from TOML; every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub base_url: String,
    /// Per-request timeout; unset means requests may block indefinitely
    pub timeout_secs: Option<u64>,
    pub fixture_dir: PathBuf,
    pub served_dir: PathBuf,
    /// Body expected from `GET /test.txt`; defaults to the mirrored fixture
    pub expect_test_body: Option<String>,
    pub extended: bool,
    pub strict: bool,
    pub format: ReportFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let fixtures = FixtureConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            fixture_dir: fixtures.fixture_dir,
            served_dir: fixtures.served_dir,
            expect_test_body: None,
            extended: false,
            strict: false,
            format: ReportFormat::Text,
        }
    }
}

impl HarnessConfig {
    pub fn from_toml_str(source: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| HarnessError::ConfigFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        self.probe_config()
            .validate()
            .map_err(HarnessError::Config)?;
        self.fixture_config().validate()?;
        Ok(())
    }

    pub fn probe_config(&self) -> ProbeConfig {
        let config = ProbeConfig::default().with_base_url(self.base_url.clone());
        match self.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    pub fn fixture_config(&self) -> FixtureConfig {
        FixtureConfig::with_dirs(self.fixture_dir.clone(), self.served_dir.clone())
    }

    pub fn expectations(&self) -> Expectations {
        let test_body = match &self.expect_test_body {
            Some(body) => body.clone(),
            None => self
                .fixture_config()
                .file(TEXT_FIXTURE)
                .map(|f| String::from_utf8_lossy(&f.contents).into_owned())
                .unwrap_or_else(|| TEXT_FIXTURE_CONTENTS.to_string()),
        };
        Expectations { test_body }
    }

    pub fn registry(&self) -> CheckRegistry {
        if self.extended {
            CheckRegistry::extended()
        } else {
            CheckRegistry::standard()
        }
    }
}
