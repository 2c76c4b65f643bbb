//! Layered, typed application settings.
//!
//! Values resolve per field in this order, highest precedence first:
//! explicit overrides, process environment, the `.env` file, field defaults.
//! Keys match case-insensitively. Grouped fields are addressed as
//! `GROUP__FIELD` (`LOG__LOG_LEVEL`); the flat field name (`LOG_LEVEL`) is
//! accepted as a fallback within the same source.

mod app;
mod error;
mod field;
mod log;
mod source;

pub use app::AppSettings;
pub use error::ConfigError;
pub use field::{Field, NESTED_DELIMITER};
pub use log::{LogLevel, LogSettings};
pub use source::SourceKind;

use serde::Serialize;
use source::{Source, Sources};
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Default `.env` location, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Process-wide settings. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub app: AppSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Resolve from the process environment and `./.env`.
    pub fn load() -> Result<Self, ConfigError> {
        SettingsLoader::new().load()
    }
}

/// Builder for resolving [`Settings`] from explicit sources.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    env_file: Option<PathBuf>,
    env_vars: Option<Vec<(String, String)>>,
    overrides: Vec<(String, String)>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            env_file: Some(PathBuf::from(DEFAULT_ENV_FILE)),
            env_vars: None,
            overrides: Vec::new(),
        }
    }

    /// Read the `.env` file from `path` instead of `./.env`.
    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Skip the `.env` file entirely.
    pub fn no_env_file(mut self) -> Self {
        self.env_file = None;
        self
    }

    /// Use these variables instead of the process environment.
    pub fn env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Explicit override. `key` is any form accepted for the field:
    /// `log.log_level`, `LOG__LOG_LEVEL` or `log_level`.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn load(&self) -> Result<Settings, ConfigError> {
        if let Some((key, _)) = self
            .overrides
            .iter()
            .find(|(key, _)| Field::for_key(key).is_none())
        {
            return Err(ConfigError::UnknownOverride(key.clone()));
        }

        let mut sources = Sources::default();
        sources.push(Source::new(SourceKind::Override, self.overrides.iter().cloned()));
        match &self.env_vars {
            Some(vars) => sources.push(Source::new(SourceKind::Environment, vars.iter().cloned())),
            None => sources.push(Source::new(
                SourceKind::Environment,
                source::unicode_pairs(env::vars_os()),
            )),
        }
        if let Some(path) = &self.env_file {
            match Source::from_env_file(path)? {
                Some(source) => sources.push(source),
                None => debug!(path = %path.display(), "env file not found, skipping"),
            }
        }

        resolve(&sources)
    }
}

fn resolve(sources: &Sources) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();
    for field in Field::ALL {
        let Some((raw, kind)) = sources.lookup(field) else {
            continue;
        };
        field.apply(raw, &mut settings.app, &mut settings.log)?;
        debug!(field = %field.path(), source = %kind, "setting resolved");
    }
    Ok(settings)
}

static CURRENT: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

/// Load settings once and install them process-wide. Later calls return
/// the installed instance without reloading.
pub fn init() -> Result<Arc<Settings>, ConfigError> {
    let mut current = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(settings) = current.as_ref() {
        return Ok(Arc::clone(settings));
    }
    let settings = Arc::new(Settings::load()?);
    *current = Some(Arc::clone(&settings));
    Ok(settings)
}

/// Install `settings` as the process-wide instance, replacing any previous one.
pub fn install(settings: Settings) -> Arc<Settings> {
    let settings = Arc::new(settings);
    *CURRENT.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&settings));
    settings
}

/// The installed process-wide settings, if any.
pub fn current() -> Option<Arc<Settings>> {
    CURRENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(Arc::clone)
}

/// Drop the process-wide settings. Intended for tests.
pub fn reset() {
    *CURRENT.write().unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(test)]
mod tests;
