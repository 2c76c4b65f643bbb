//! Layered key/value sources consulted during resolution.

use super::ConfigError;
use super::field::{Field, normalize_key};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;

/// Where a resolved value came from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceKind {
    Override,
    Environment,
    EnvFile,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Override => write!(f, "override"),
            SourceKind::Environment => write!(f, "environment"),
            SourceKind::EnvFile => write!(f, "env file"),
        }
    }
}

/// One source: upper-cased keys to raw values.
#[derive(Debug, Clone)]
pub(crate) struct Source {
    kind: SourceKind,
    values: HashMap<String, String>,
}

impl Source {
    pub fn new<K, V>(kind: SourceKind, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        Self { kind, values }
    }

    /// Read a `.env` file without touching the process environment.
    /// A missing file yields `None`.
    pub fn from_env_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(None),
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let pairs = iter
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Some(Self::new(SourceKind::EnvFile, pairs)))
    }

    fn get(&self, field: Field) -> Option<&str> {
        field
            .keys()
            .iter()
            .find_map(|key| self.values.get(key).map(String::as_str))
    }
}

/// Sources ordered by precedence.
#[derive(Debug, Default)]
pub(crate) struct Sources {
    layers: Vec<Source>,
}

impl Sources {
    pub fn push(&mut self, source: Source) {
        self.layers.push(source);
        self.layers.sort_by_key(|layer| layer.kind);
    }

    /// First value for `field` in precedence order.
    pub fn lookup(&self, field: Field) -> Option<(&str, SourceKind)> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(field).map(|value| (value, layer.kind)))
    }
}

/// Skip variables whose name or value is not valid Unicode instead of
/// failing on them.
pub(crate) fn unicode_pairs(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}
