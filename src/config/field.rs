//! Table of every settings field, the keys it is read from and how its raw
//! value is coerced.

use super::{AppSettings, ConfigError, LogLevel, LogSettings};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Delimiter between group and field name in nested keys (`LOG__LOG_LEVEL`).
pub const NESTED_DELIMITER: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AppName,
    DevMode,
    Environment,
    LogLevel,
    LogDir,
    LogFile,
    LogMaxBytes,
    LogBackupCount,
    LoggerLevelOverrides,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::AppName,
        Field::DevMode,
        Field::Environment,
        Field::LogLevel,
        Field::LogDir,
        Field::LogFile,
        Field::LogMaxBytes,
        Field::LogBackupCount,
        Field::LoggerLevelOverrides,
    ];

    pub fn group(self) -> &'static str {
        match self {
            Field::AppName | Field::DevMode | Field::Environment => "app",
            _ => "log",
        }
    }

    /// Field names, canonical first, then aliases.
    fn names(self) -> &'static [&'static str] {
        match self {
            Field::AppName => &["app_name"],
            Field::DevMode => &["dev_mode", "debug"],
            Field::Environment => &["environment"],
            Field::LogLevel => &["log_level"],
            Field::LogDir => &["log_dir"],
            Field::LogFile => &["log_file"],
            Field::LogMaxBytes => &["log_max_bytes"],
            Field::LogBackupCount => &["log_backup_count"],
            Field::LoggerLevelOverrides => &["logger_level_overrides"],
        }
    }

    pub fn name(self) -> &'static str {
        self.names()[0]
    }

    /// Dotted path used in error messages, e.g. `log.log_level`.
    pub fn path(self) -> String {
        format!("{}.{}", self.group(), self.name())
    }

    /// Upper-cased keys looked up within a single source: nested keys first,
    /// then the flat ones.
    pub fn keys(self) -> Vec<String> {
        let group = self.group().to_ascii_uppercase();
        let nested = self
            .names()
            .iter()
            .map(|name| format!("{}{}{}", group, NESTED_DELIMITER, name.to_ascii_uppercase()));
        let flat = self.names().iter().map(|name| name.to_ascii_uppercase());
        nested.chain(flat).collect()
    }

    /// Field addressed by `key`, if any. `key` may be nested, flat or dotted,
    /// in any case.
    pub fn for_key(key: &str) -> Option<Field> {
        let key = normalize_key(key);
        Field::ALL
            .into_iter()
            .find(|field| field.keys().iter().any(|k| *k == key))
    }

    /// Coerce `raw` and store it in the matching group.
    pub fn apply(
        self,
        raw: &str,
        app: &mut AppSettings,
        log: &mut LogSettings,
    ) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::invalid(self.path(), raw, reason);

        match self {
            Field::AppName => app.app_name = raw.to_string(),
            Field::DevMode => app.dev_mode = parse_bool(raw).map_err(invalid)?,
            Field::Environment => app.environment = raw.to_string(),
            Field::LogLevel => log.log_level = raw.parse::<LogLevel>().map_err(invalid)?,
            Field::LogDir => {
                if raw.trim().is_empty() {
                    return Err(invalid("must not be empty".into()));
                }
                log.log_dir = PathBuf::from(raw);
            }
            Field::LogFile => log.log_file = parse_file_name(raw).map_err(invalid)?,
            Field::LogMaxBytes => {
                let value = parse_integer::<u64>(raw).map_err(invalid)?;
                if value == 0 {
                    return Err(invalid("must be greater than zero".into()));
                }
                log.log_max_bytes = value;
            }
            Field::LogBackupCount => log.log_backup_count = parse_integer(raw).map_err(invalid)?,
            Field::LoggerLevelOverrides => {
                log.logger_level_overrides = parse_mapping(raw).map_err(invalid)?
            }
        }
        Ok(())
    }
}

/// Upper-case and turn dotted paths into nested keys.
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim().replace('.', NESTED_DELIMITER).to_ascii_uppercase()
}

pub(crate) fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err("expected a boolean".to_string()),
    }
}

fn parse_integer<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    s: &str,
) -> Result<T, String> {
    s.trim()
        .parse::<T>()
        .map_err(|e| format!("expected a non-negative integer: {}", e))
}

fn parse_file_name(s: &str) -> Result<String, String> {
    let name = s.trim();
    if name.is_empty() {
        return Err("must not be empty".to_string());
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err("must be a file name, not a path".to_string());
    }
    Ok(name.to_string())
}

/// Mappings are JSON objects of string to string, e.g.
/// `{"noisy.module": "ERROR"}`. An empty value means an empty mapping.
pub(crate) fn parse_mapping(s: &str) -> Result<BTreeMap<String, String>, String> {
    if s.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(s).map_err(|e| format!("expected a JSON object of strings: {}", e))
}
