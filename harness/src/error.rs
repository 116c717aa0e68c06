use fixtures::FixtureError;
use probe::ProbeError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before or outside the checks themselves
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Client error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Fixture setup failed: {0}")]
    Fixture(#[from] FixtureError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_pick_the_right_variant() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: HarnessError = json_err.into();
        assert!(matches!(err, HarnessError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));

        let err: HarnessError = FixtureError::UnknownFixture("nope.txt".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Fixture setup failed: Unknown fixture: nope.txt"
        );
    }
}
