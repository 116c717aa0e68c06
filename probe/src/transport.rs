use crate::types::{ProbeRequest, ProbeResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Connection failed: {message}")]
    Unreachable { message: String },
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Sends one request and waits for the complete response.
///
/// Implementations must not retry: every call maps to exactly one exchange.
pub trait Transport {
    fn send(&self, request: &ProbeRequest) -> ProbeResult<ProbeResponse>;

    fn base_url(&self) -> &str;

    fn transport_name(&self) -> &'static str;
}
