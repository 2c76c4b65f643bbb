//! Logging setup error types.

use std::path::PathBuf;

/// Failure while building or installing the logging pipeline.
#[derive(Debug, thiserror::Error)]
pub enum LoggingSetupError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a global tracing subscriber is already installed: {0}")]
    SubscriberInstalled(String),
}
