pub mod checks;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;

pub use checks::{
    Check, CheckContext, CheckError, CheckRegistry, CheckResult, DeleteCheck, Exchange,
    Expectations, GetCheck, HeadCheck, HeadLengthCheck, HeadMissingCheck, MethodNotAllowedCheck,
    PostCheck, PostErrorsCheck, PutCheck, PutEnvelopeCheck,
};
pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use report::{ReportFormat, RunSummary, TestRecord};
pub use runner::{run_with_config, Runner};
