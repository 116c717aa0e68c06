//! Checks executed by the harness
//!
//! A check is one named test case (`test_get`, `test_put`, ...). Checks send
//! requests through a [`Transport`] and compare the responses against fixed
//! expectations. The first unmet expectation ends the check with a
//! [`CheckError`]; the runner records it and moves on to the next check.

pub mod extended;
pub mod methods;

use fixtures::{FixtureError, FixtureSet};
use probe::{ProbeError, ProbeRequest, ProbeResponse, Transport};
use thiserror::Error;
use tracing::info;

pub use extended::{
    HeadLengthCheck, HeadMissingCheck, MethodNotAllowedCheck, PostErrorsCheck, PutEnvelopeCheck,
};
pub use methods::{DeleteCheck, GetCheck, HeadCheck, PostCheck, PutCheck};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("{request}: expected status {expected}, got {actual}")]
    UnexpectedStatus {
        request: String,
        expected: u16,
        actual: u16,
    },

    #[error("{request}: expected body {expected:?}, got {actual:?}")]
    BodyMismatch {
        request: String,
        expected: String,
        actual: String,
    },

    #[error("{request}: missing header '{header}'")]
    MissingHeader { request: String, header: String },

    #[error("{request}: header '{header}' {message}")]
    HeaderMismatch {
        request: String,
        header: String,
        message: String,
    },

    #[error("{request}: {message}")]
    UnexpectedBody { request: String, message: String },

    #[error("{0}")]
    Probe(#[from] ProbeError),

    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),
}

pub type CheckResult<T> = Result<T, CheckError>;

/// Values checks compare responses against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectations {
    /// Body served for `GET /test.txt`, compared after trimming whitespace
    pub test_body: String,
}

/// One request/response pair, with assertion helpers that name the request on failure.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub label: String,
    pub response: ProbeResponse,
}

impl Exchange {
    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn expect_status(&self, expected: u16) -> CheckResult<&Self> {
        if self.response.status != expected {
            return Err(CheckError::UnexpectedStatus {
                request: self.label.clone(),
                expected,
                actual: self.response.status,
            });
        }
        Ok(self)
    }

    pub fn expect_header(&self, header: &str) -> CheckResult<&str> {
        self.response
            .header(header)
            .ok_or_else(|| CheckError::MissingHeader {
                request: self.label.clone(),
                header: header.to_string(),
            })
    }

    pub fn expect_body(&self, expected: &[u8]) -> CheckResult<&Self> {
        if self.response.body != expected {
            return Err(self.body_mismatch(String::from_utf8_lossy(expected).into_owned()));
        }
        Ok(self)
    }

    /// Compares the body as text with surrounding whitespace removed.
    pub fn expect_trimmed_text(&self, expected: &str) -> CheckResult<&Self> {
        if self.response.text().trim() != expected.trim() {
            return Err(self.body_mismatch(expected.to_string()));
        }
        Ok(self)
    }

    pub fn expect_empty_body(&self) -> CheckResult<&Self> {
        if !self.response.body.is_empty() {
            return Err(CheckError::UnexpectedBody {
                request: self.label.clone(),
                message: format!(
                    "expected an empty body, got {} bytes",
                    self.response.body.len()
                ),
            });
        }
        Ok(self)
    }

    fn body_mismatch(&self, expected: String) -> CheckError {
        CheckError::BodyMismatch {
            request: self.label.clone(),
            expected,
            actual: self.response.text(),
        }
    }
}

/// Everything a check may use while it runs.
pub struct CheckContext<'a> {
    transport: &'a dyn Transport,
    fixtures: &'a FixtureSet,
    expectations: &'a Expectations,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        fixtures: &'a FixtureSet,
        expectations: &'a Expectations,
    ) -> Self {
        Self {
            transport,
            fixtures,
            expectations,
        }
    }

    pub fn fixtures(&self) -> &FixtureSet {
        self.fixtures
    }

    pub fn expectations(&self) -> &Expectations {
        self.expectations
    }

    /// Sends one request; network failures surface as [`CheckError::Probe`].
    pub fn send(&self, request: ProbeRequest) -> CheckResult<Exchange> {
        let label = request.label();
        let response = self.transport.send(&request)?;
        info!("{}: {}", label, response.status);
        Ok(Exchange { label, response })
    }
}

pub trait Check {
    /// Stable identifier used in reports, e.g. `test_get`
    fn name(&self) -> &str;

    /// Section heading printed before the check runs, e.g. `GET`
    fn title(&self) -> &str;

    fn run(&self, ctx: &CheckContext<'_>) -> CheckResult<()>;
}

/// Checks in execution order.
pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// GET, HEAD, POST, PUT, DELETE, in that order. DELETE relies on the
    /// resource PUT created.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GetCheck::new()));
        registry.register(Box::new(HeadCheck::new()));
        registry.register(Box::new(PostCheck::new()));
        registry.register(Box::new(PutCheck::new()));
        registry.register(Box::new(DeleteCheck::new()));
        registry
    }

    /// The standard checks followed by the error-path checks.
    pub fn extended() -> Self {
        let mut registry = Self::standard();
        registry.register(Box::new(HeadMissingCheck::new()));
        registry.register(Box::new(HeadLengthCheck::new()));
        registry.register(Box::new(PostErrorsCheck::new()));
        registry.register(Box::new(MethodNotAllowedCheck::new()));
        registry.register(Box::new(PutEnvelopeCheck::new()));
        registry
    }

    pub fn register(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn get_check(&self, name: &str) -> Option<&dyn Check> {
        self.checks
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn list_checks(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
