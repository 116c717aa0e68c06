pub mod client;
pub mod config;
pub mod transport;
pub mod types;

pub use client::HttpClient;
pub use config::{ProbeConfig, DEFAULT_BASE_URL};
pub use transport::{ProbeError, ProbeResult, Transport};
pub use types::{Method, MultipartPart, Payload, ProbeRequest, ProbeResponse};

pub mod prelude {
    pub use crate::client::*;
    pub use crate::config::*;
    pub use crate::transport::*;
    pub use crate::types::*;
}
