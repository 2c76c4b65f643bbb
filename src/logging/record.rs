//! Structured records collected from `tracing` events and spans.

use crate::config::LogLevel;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::fmt;
use tracing::Level;
use tracing::field::{Field, Visit};

/// Enriched, ready-to-render log record.
pub type Record = Map<String, Value>;

/// Key holding the event message.
pub const EVENT_KEY: &str = "event";

/// Boolean field raising an ERROR event to CRITICAL.
pub const CRITICAL_KEY: &str = "critical";

/// Event data as captured, before any enrichment stage runs.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub logger_name: String,
    pub level: Level,
    /// Caller-supplied fields, the message stored under [`EVENT_KEY`].
    pub fields: Record,
    /// Fields of the enclosing spans, outermost first.
    pub context: Record,
    /// Messages of an attached error and its sources, outermost first.
    pub error_chain: Vec<String>,
}

impl RawEvent {
    pub fn new(logger_name: impl Into<String>, level: Level) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            fields: Record::new(),
            context: Record::new(),
            error_chain: Vec::new(),
        }
    }

    /// Builder used by tests and by callers feeding records directly.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Severity used for thresholds and the `level` field.
    pub fn severity(&self) -> Option<LogLevel> {
        let critical = self.fields.get(CRITICAL_KEY) == Some(&Value::Bool(true));
        LogLevel::from_tracing(&self.level, critical)
    }

    /// Events bridged from the `log` crate carry their real target in a
    /// `log.target` field; adopt it and drop the bridge metadata.
    pub(crate) fn normalize_log_bridge(&mut self) {
        if let Some(Value::String(target)) = self.fields.remove("log.target") {
            self.logger_name = target;
        }
        self.fields.retain(|key, _| !key.starts_with("log."));
    }
}

/// Records `tracing` field values as JSON values.
pub(crate) struct FieldVisitor<'a> {
    fields: &'a mut Record,
    error_chain: Option<&'a mut Vec<String>>,
}

impl<'a> FieldVisitor<'a> {
    pub fn new(fields: &'a mut Record) -> Self {
        Self {
            fields,
            error_chain: None,
        }
    }

    /// Also capture the source chain of the first error field.
    pub fn with_errors(fields: &'a mut Record, error_chain: &'a mut Vec<String>) -> Self {
        Self {
            fields,
            error_chain: Some(error_chain),
        }
    }

    fn insert(&mut self, field: &Field, value: Value) {
        let key = match field.name() {
            "message" => EVENT_KEY,
            name => name,
        };
        self.fields.insert(key.to_string(), value);
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));

        if let Some(chain) = self.error_chain.as_deref_mut() {
            if chain.is_empty() {
                let mut current: Option<&(dyn Error + 'static)> = Some(value);
                while let Some(err) = current {
                    chain.push(err.to_string());
                    current = err.source();
                }
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}

/// Span fields kept in the span's extensions.
#[derive(Debug, Default)]
pub(crate) struct SpanFields(pub Record);
