//! Enrichment stages applied to every record before it reaches a renderer.

use super::record::{CRITICAL_KEY, RawEvent, Record};
use crate::config::LogLevel;
use chrono::{Local, Utc};
use serde_json::Value;

/// Timestamp layout added by [`Processor::TimeStamper`] in the shared chain.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// One enrichment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processor {
    /// Span fields first, event fields win on conflict.
    MergeContext,
    /// `logger_name`: the event target.
    AddLoggerName,
    /// `level`: lower-case severity name. A `critical` flag is folded into it.
    AddLogLevel,
    /// `exception`: attached error and its causes, one per line.
    FormatExcInfo,
    /// `timestamp`: UTC, or local time when `utc` is false, in the given
    /// `strftime` format.
    TimeStamper { format: String, utc: bool },
}

impl Processor {
    pub fn process(&self, event: &RawEvent, record: &mut Record) {
        match self {
            Processor::MergeContext => {
                if event.context.is_empty() {
                    return;
                }
                let mut merged = event.context.clone();
                merged.extend(std::mem::take(record));
                *record = merged;
            }
            Processor::AddLoggerName => {
                record.insert("logger_name".into(), Value::String(event.logger_name.clone()));
            }
            Processor::AddLogLevel => {
                let name = event.severity().map(level_name).unwrap_or("trace");
                if event.severity() == Some(LogLevel::Critical) {
                    record.shift_remove(CRITICAL_KEY);
                }
                record.insert("level".into(), Value::String(name.into()));
            }
            Processor::FormatExcInfo => {
                if let Some(text) = format_error_chain(&event.error_chain) {
                    record.entry("exception").or_insert(Value::String(text));
                }
            }
            Processor::TimeStamper { format, utc } => {
                let now = if *utc {
                    Utc::now().format(format).to_string()
                } else {
                    Local::now().format(format).to_string()
                };
                record.insert("timestamp".into(), Value::String(now));
            }
        }
    }
}

/// The ordered stages shared by every sink.
pub fn shared_processors() -> Vec<Processor> {
    vec![
        Processor::MergeContext,
        Processor::AddLoggerName,
        Processor::AddLogLevel,
        Processor::FormatExcInfo,
        Processor::TimeStamper {
            format: TIMESTAMP_FORMAT.to_string(),
            utc: true,
        },
    ]
}

/// Run `processors` in order over a copy of the event fields.
pub fn enrich(processors: &[Processor], event: &RawEvent) -> Record {
    let mut record = event.fields.clone();
    for processor in processors {
        processor.process(event, &mut record);
    }
    record
}

pub fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warning => "warning",
        LogLevel::Error => "error",
        LogLevel::Critical => "critical",
    }
}

fn format_error_chain(chain: &[String]) -> Option<String> {
    let (first, causes) = chain.split_first()?;
    let mut text = first.clone();
    for cause in causes {
        text.push_str("\nCaused by: ");
        text.push_str(cause);
    }
    Some(text)
}
