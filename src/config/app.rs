//! Application-level settings.

use serde::Serialize;

pub(crate) const DEFAULT_APP_NAME: &str = "App Bootstrap";
pub(crate) const DEFAULT_ENVIRONMENT: &str = "development";

/// Application-level settings (`APP__*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSettings {
    /// Application name used in logs.
    pub app_name: String,
    /// Human-readable console logging and no log file. Also read from `DEBUG`.
    pub dev_mode: bool,
    /// Environment: "development", "staging", or "production".
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            dev_mode: false,
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}
