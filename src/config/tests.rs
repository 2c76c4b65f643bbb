//! Tests for config module.

use super::*;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn env_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Loader isolated from the process environment.
fn loader(env_path: &Path) -> SettingsLoader {
    SettingsLoader::new()
        .env_file(env_path)
        .env_vars(Vec::<(String, String)>::new())
}

fn no_vars() -> Vec<(&'static str, &'static str)> {
    Vec::new()
}

// ==================== Defaults ====================

#[test]
fn test_defaults_without_sources() {
    let settings = SettingsLoader::new()
        .no_env_file()
        .env_vars(no_vars())
        .load()
        .unwrap();

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.app.app_name, "App Bootstrap");
    assert!(!settings.app.dev_mode);
    assert_eq!(settings.app.environment, "development");
    assert_eq!(settings.log.log_level, LogLevel::Info);
    assert_eq!(settings.log.log_dir, PathBuf::from("logs"));
    assert_eq!(settings.log.log_file, "app.log");
    assert_eq!(settings.log.log_max_bytes, 10_485_760);
    assert_eq!(settings.log.log_backup_count, 5);
    assert!(settings.log.logger_level_overrides.is_empty());
}

#[test]
fn test_missing_env_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = loader(&dir.path().join(".env")).load().unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_log_path_joins_dir_and_file() {
    let settings = Settings::default();
    assert_eq!(settings.log.log_path(), PathBuf::from("logs").join("app.log"));
}

// ==================== Precedence ====================

#[test]
fn test_env_file_beats_default() {
    let file = env_file("APP__APP_NAME=from-file\nLOG__LOG_BACKUP_COUNT=2\n");
    let settings = loader(file.path()).load().unwrap();

    assert_eq!(settings.app.app_name, "from-file");
    assert_eq!(settings.log.log_backup_count, 2);
}

#[test]
fn test_env_beats_env_file() {
    let file = env_file("LOG__LOG_LEVEL=ERROR\n");
    let settings = SettingsLoader::new()
        .env_file(file.path())
        .env_vars([("LOG__LOG_LEVEL", "DEBUG")])
        .load()
        .unwrap();

    assert_eq!(settings.log.log_level, LogLevel::Debug);
    assert_eq!(settings.log.log_level.as_str(), "DEBUG");
}

#[test]
fn test_override_beats_env_and_env_file() {
    let file = env_file("APP__APP_NAME=from-file\n");
    let settings = SettingsLoader::new()
        .env_file(file.path())
        .env_vars([("APP__APP_NAME", "from-env")])
        .set("app.app_name", "from-override")
        .load()
        .unwrap();

    assert_eq!(settings.app.app_name, "from-override");
}

#[test]
fn test_precedence_holds_for_every_field() {
    let file = env_file(
        "APP__APP_NAME=file\n\
         APP__DEV_MODE=false\n\
         APP__ENVIRONMENT=file\n\
         LOG__LOG_LEVEL=ERROR\n\
         LOG__LOG_DIR=file-dir\n\
         LOG__LOG_FILE=file.log\n\
         LOG__LOG_MAX_BYTES=100\n\
         LOG__LOG_BACKUP_COUNT=1\n\
         LOG__LOGGER_LEVEL_OVERRIDES='{\"a\":\"ERROR\"}'\n",
    );
    let env = [
        ("APP__APP_NAME", "env"),
        ("APP__DEV_MODE", "true"),
        ("APP__ENVIRONMENT", "env"),
        ("LOG__LOG_LEVEL", "WARNING"),
        ("LOG__LOG_DIR", "env-dir"),
        ("LOG__LOG_FILE", "env.log"),
        ("LOG__LOG_MAX_BYTES", "200"),
        ("LOG__LOG_BACKUP_COUNT", "2"),
        ("LOG__LOGGER_LEVEL_OVERRIDES", "{\"b\":\"WARNING\"}"),
    ];

    let from_env = SettingsLoader::new()
        .env_file(file.path())
        .env_vars(env)
        .load()
        .unwrap();
    assert_eq!(from_env.app.app_name, "env");
    assert!(from_env.app.dev_mode);
    assert_eq!(from_env.app.environment, "env");
    assert_eq!(from_env.log.log_level, LogLevel::Warning);
    assert_eq!(from_env.log.log_dir, PathBuf::from("env-dir"));
    assert_eq!(from_env.log.log_file, "env.log");
    assert_eq!(from_env.log.log_max_bytes, 200);
    assert_eq!(from_env.log.log_backup_count, 2);
    assert_eq!(
        from_env.log.logger_level_overrides,
        BTreeMap::from([("b".to_string(), "WARNING".to_string())])
    );

    let overridden = SettingsLoader::new()
        .env_file(file.path())
        .env_vars(env)
        .set("app.app_name", "override")
        .set("app.dev_mode", "false")
        .set("app.environment", "override")
        .set("log.log_level", "DEBUG")
        .set("log.log_dir", "override-dir")
        .set("log.log_file", "override.log")
        .set("log.log_max_bytes", "300")
        .set("log.log_backup_count", "3")
        .set("log.logger_level_overrides", "{}")
        .load()
        .unwrap();
    assert_eq!(overridden.app.app_name, "override");
    assert!(!overridden.app.dev_mode);
    assert_eq!(overridden.app.environment, "override");
    assert_eq!(overridden.log.log_level, LogLevel::Debug);
    assert_eq!(overridden.log.log_dir, PathBuf::from("override-dir"));
    assert_eq!(overridden.log.log_file, "override.log");
    assert_eq!(overridden.log.log_max_bytes, 300);
    assert_eq!(overridden.log.log_backup_count, 3);
    assert!(overridden.log.logger_level_overrides.is_empty());
}

// ==================== Key matching ====================

#[test]
fn test_keys_are_case_insensitive() {
    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars([("log__log_level", "error"), ("App__App_Name", "mixed")])
        .load()
        .unwrap();

    assert_eq!(settings.log.log_level, LogLevel::Error);
    assert_eq!(settings.app.app_name, "mixed");
}

#[test]
fn test_flat_keys_are_accepted() {
    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG_LEVEL", "WARNING"), ("APP_NAME", "flat")])
        .load()
        .unwrap();

    assert_eq!(settings.log.log_level, LogLevel::Warning);
    assert_eq!(settings.app.app_name, "flat");
}

#[test]
fn test_nested_key_wins_over_flat_in_same_source() {
    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG_LEVEL", "ERROR"), ("LOG__LOG_LEVEL", "DEBUG")])
        .load()
        .unwrap();

    assert_eq!(settings.log.log_level, LogLevel::Debug);
}

#[test]
fn test_flat_env_beats_nested_env_file() {
    let file = env_file("LOG__LOG_LEVEL=ERROR\n");
    let settings = loader(file.path())
        .env_vars([("LOG_LEVEL", "DEBUG")])
        .load()
        .unwrap();

    assert_eq!(settings.log.log_level, LogLevel::Debug);
}

#[test]
fn test_debug_is_alias_for_dev_mode() {
    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars([("DEBUG", "true")])
        .load()
        .unwrap();
    assert!(settings.app.dev_mode);
}

#[test]
fn test_unknown_variables_are_ignored() {
    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars([("PATH", "/usr/bin"), ("LOG__NOPE", "x"), ("SOMETHING_ELSE", "y")])
        .load()
        .unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_override_key_forms() {
    for key in ["log.log_level", "LOG__LOG_LEVEL", "log_level", "Log.Log_Level"] {
        let settings = loader(Path::new("/nonexistent/.env"))
            .set(key, "ERROR")
            .load()
            .unwrap();
        assert_eq!(settings.log.log_level, LogLevel::Error, "key {}", key);
    }
}

#[test]
fn test_unknown_override_is_rejected() {
    let err = loader(Path::new("/nonexistent/.env"))
        .set("log.nope", "1")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownOverride(ref key) if key == "log.nope"));
}

// ==================== Coercion ====================

#[test]
fn test_bool_coercion() {
    for (raw, expected) in [
        ("1", true),
        ("TRUE", true),
        ("yes", true),
        ("on", true),
        ("0", false),
        ("False", false),
        ("no", false),
        ("off", false),
    ] {
        let settings = loader(Path::new("/nonexistent/.env"))
            .env_vars([("APP__DEV_MODE", raw)])
            .load()
            .unwrap();
        assert_eq!(settings.app.dev_mode, expected, "raw {:?}", raw);
    }
}

#[test]
fn test_invalid_bool_names_field_and_value() {
    let err = loader(Path::new("/nonexistent/.env"))
        .env_vars([("APP__DEV_MODE", "maybe")])
        .load()
        .unwrap_err();

    match err {
        ConfigError::InvalidValue { field, value, .. } => {
            assert_eq!(field, "app.dev_mode");
            assert_eq!(value, "maybe");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_invalid_log_level() {
    let err = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG__LOG_LEVEL", "LOUD")])
        .load()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("log.log_level"));
    assert!(message.contains("LOUD"));
}

#[test]
fn test_log_level_parse() {
    assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
    assert_eq!("Info".parse::<LogLevel>().unwrap(), LogLevel::Info);
    assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
    assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
    assert_eq!("CRITICAL".parse::<LogLevel>().unwrap(), LogLevel::Critical);
    assert!("verbose".parse::<LogLevel>().is_err());
}

#[test]
fn test_log_level_from_tracing() {
    use tracing::Level;

    assert_eq!(LogLevel::from_tracing(&Level::DEBUG, false), Some(LogLevel::Debug));
    assert_eq!(LogLevel::from_tracing(&Level::WARN, true), Some(LogLevel::Warning));
    assert_eq!(LogLevel::from_tracing(&Level::ERROR, false), Some(LogLevel::Error));
    assert_eq!(LogLevel::from_tracing(&Level::ERROR, true), Some(LogLevel::Critical));
    assert_eq!(LogLevel::from_tracing(&Level::TRACE, false), None);
    assert!(LogLevel::Critical > LogLevel::Error);
}

#[test]
fn test_zero_max_bytes_rejected() {
    let err = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG__LOG_MAX_BYTES", "0")])
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "log.log_max_bytes"));
}

#[test]
fn test_negative_backup_count_rejected() {
    let err = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG__LOG_BACKUP_COUNT", "-1")])
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "log.log_backup_count"));
}

#[test]
fn test_zero_backup_count_accepted() {
    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG__LOG_BACKUP_COUNT", "0")])
        .load()
        .unwrap();
    assert_eq!(settings.log.log_backup_count, 0);
}

#[test]
fn test_log_file_must_be_a_file_name() {
    let err = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG__LOG_FILE", "nested/app.log")])
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "log.log_file"));
}

#[test]
fn test_logger_level_overrides_from_json() {
    let file = env_file("LOG__LOGGER_LEVEL_OVERRIDES='{\"noisy.module\": \"ERROR\", \"chatty\": \"debug\"}'\n");
    let settings = loader(file.path()).load().unwrap();

    let overrides = &settings.log.logger_level_overrides;
    assert_eq!(overrides.len(), 2);
    assert_eq!(overrides["noisy.module"], "ERROR");
    assert_eq!(overrides["chatty"], "debug");
}

#[test]
fn test_logger_level_overrides_keep_unknown_levels() {
    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG__LOGGER_LEVEL_OVERRIDES", "{\"x\": \"LOUD\"}")])
        .load()
        .unwrap();
    assert_eq!(settings.log.logger_level_overrides["x"], "LOUD");
}

#[test]
fn test_logger_level_overrides_invalid_json() {
    let err = loader(Path::new("/nonexistent/.env"))
        .env_vars([("LOG__LOGGER_LEVEL_OVERRIDES", "noisy=ERROR")])
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "log.logger_level_overrides"));
}

#[test]
fn test_malformed_env_file_is_an_error() {
    let file = env_file("THIS IS NOT VALID\n");
    let err = loader(file.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::EnvFile { .. }));
}

#[cfg(unix)]
#[test]
fn test_non_unicode_env_vars_are_skipped() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let vars = vec![
        (OsString::from("JUNK"), OsString::from_vec(vec![0xff, 0xfe])),
        (OsString::from_vec(vec![b'K', 0xff]), OsString::from("x")),
        (OsString::from("LOG__LOG_LEVEL"), OsString::from("ERROR")),
    ];
    let pairs: Vec<_> = source::unicode_pairs(vars).collect();
    assert_eq!(pairs, vec![("LOG__LOG_LEVEL".to_string(), "ERROR".to_string())]);

    let settings = loader(Path::new("/nonexistent/.env"))
        .env_vars(pairs)
        .load()
        .unwrap();
    assert_eq!(settings.log.log_level, LogLevel::Error);
}

// ==================== Field table ====================

#[test]
fn test_field_keys_nested_first() {
    assert_eq!(
        Field::DevMode.keys(),
        vec!["APP__DEV_MODE", "APP__DEBUG", "DEV_MODE", "DEBUG"]
    );
    assert_eq!(Field::LogLevel.path(), "log.log_level");
    assert_eq!(Field::for_key("log_backup_count"), Some(Field::LogBackupCount));
    assert_eq!(Field::for_key("app.debug"), Some(Field::DevMode));
    assert_eq!(Field::for_key("unknown"), None);
}

// ==================== Process-wide instance ====================

#[test]
fn test_install_current_reset() {
    reset();
    assert!(current().is_none());

    let mut settings = Settings::default();
    settings.app.app_name = "installed".to_string();
    let installed = install(settings);

    let seen = current().unwrap();
    assert!(Arc::ptr_eq(&installed, &seen));
    assert_eq!(seen.app.app_name, "installed");

    // init returns the installed instance instead of reloading
    let initialized = init().unwrap();
    assert!(Arc::ptr_eq(&installed, &initialized));

    reset();
    assert!(current().is_none());
}
