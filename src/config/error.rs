//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value:?} ({reason})")]
    InvalidValue {
        /// Dotted field path, e.g. `log.log_level`.
        field: String,
        value: String,
        reason: String,
    },
    #[error("unknown setting override: {0}")]
    UnknownOverride(String),
    #[error("failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: String, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
