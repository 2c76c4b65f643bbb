//! Logging settings and the log level enum.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

pub(crate) const DEFAULT_LOG_DIR: &str = "logs";
pub(crate) const DEFAULT_LOG_FILE: &str = "app.log";
pub(crate) const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub(crate) const DEFAULT_LOG_BACKUP_COUNT: u32 = 5;

/// Severity threshold accepted in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Severity of a `tracing` event. `tracing` stops at ERROR, so an ERROR
    /// event flagged `critical = true` ranks as CRITICAL. TRACE has no
    /// counterpart and is never emitted.
    pub fn from_tracing(level: &Level, critical: bool) -> Option<Self> {
        match level.as_str() {
            "ERROR" if critical => Some(LogLevel::Critical),
            "ERROR" => Some(LogLevel::Error),
            "WARN" => Some(LogLevel::Warning),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(format!(
                "unknown log level {:?}, expected one of DEBUG, INFO, WARNING, ERROR, CRITICAL",
                s
            )),
        }
    }
}

/// Logging settings (`LOG__*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSettings {
    /// Threshold for the root logger and every sink.
    pub log_level: LogLevel,
    /// Directory holding the JSON log file. Created on demand.
    pub log_dir: PathBuf,
    /// Active log file name inside `log_dir`.
    pub log_file: String,
    /// Size in bytes after which the log file is rotated. Always positive.
    pub log_max_bytes: u64,
    /// Number of rotated files kept next to the active one.
    pub log_backup_count: u32,
    /// Per-logger thresholds, keyed by logger name (event target).
    ///
    /// Values stay raw strings: unrecognized levels are skipped when the
    /// logging pipeline is built, not rejected here.
    pub logger_level_overrides: BTreeMap<String, String>,
}

impl LogSettings {
    /// Full path of the active log file.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_file: DEFAULT_LOG_FILE.to_string(),
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            log_backup_count: DEFAULT_LOG_BACKUP_COUNT,
            logger_level_overrides: BTreeMap::new(),
        }
    }
}
