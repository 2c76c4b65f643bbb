//! Renderers turn an enriched record into one output line.

use super::record::{EVENT_KEY, Record};
use owo_colors::OwoColorize as _;
use serde_json::Value;
use std::fmt::Write as _;

const LEVEL_WIDTH: usize = 8;
const EVENT_WIDTH: usize = 30;

/// Keys the console renderer places itself instead of printing as `key=value`.
const CONSOLE_RESERVED: [&str; 5] = ["timestamp", "level", EVENT_KEY, "logger_name", "exception"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// Human-readable `key=value` line, exceptions printed below it.
    Console { colors: bool },
    /// One JSON object per line.
    Json,
}

impl Renderer {
    pub fn render(&self, record: &Record) -> Result<String, serde_json::Error> {
        match self {
            Renderer::Console { colors } => Ok(render_console(record, *colors)),
            Renderer::Json => serde_json::to_string(record),
        }
    }

    pub fn is_human_readable(&self) -> bool {
        matches!(self, Renderer::Console { .. })
    }
}

fn render_console(record: &Record, colors: bool) -> String {
    let text = |key: &str| record.get(key).map(value_text).unwrap_or_default();

    let timestamp = text("timestamp");
    let level = text("level");
    let event = text(EVENT_KEY);
    let logger_name = text("logger_name");

    let padded_level = format!("{:<width$}", level, width = LEVEL_WIDTH);
    let padded_event = format!("{:<width$}", event, width = EVENT_WIDTH);

    let mut line = String::new();
    if colors {
        let _ = write!(
            line,
            "{} [{}] {}",
            timestamp.dimmed(),
            paint_level(&level, &padded_level),
            padded_event.bold()
        );
        if !logger_name.is_empty() {
            let _ = write!(line, " [{}]", logger_name.blue().bold());
        }
    } else {
        let _ = write!(line, "{} [{}] {}", timestamp, padded_level, padded_event);
        if !logger_name.is_empty() {
            let _ = write!(line, " [{}]", logger_name);
        }
    }

    for (key, value) in record
        .iter()
        .filter(|(key, _)| !CONSOLE_RESERVED.contains(&key.as_str()))
    {
        let value = value_text(value);
        if colors {
            let _ = write!(line, " {}={}", key.cyan(), value.magenta());
        } else {
            let _ = write!(line, " {}={}", key, value);
        }
    }

    if let Some(exception) = record.get("exception").map(value_text) {
        line.push('\n');
        if colors {
            let _ = write!(line, "{}", exception.red());
        } else {
            line.push_str(&exception);
        }
    }

    line
}

fn paint_level(level: &str, padded: &str) -> String {
    match level {
        "error" | "critical" => padded.red().bold().to_string(),
        "warning" => padded.yellow().bold().to_string(),
        "info" | "debug" => padded.green().bold().to_string(),
        _ => padded.to_string(),
    }
}

/// Strings verbatim, everything else as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
