//! The assembled pipeline: thresholds, enrichment stages and sinks.

use super::LoggingSetupError;
use super::processor::{Processor, enrich, shared_processors};
use super::record::RawEvent;
use super::render::Renderer;
use super::sink::{Sink, SinkKind};
use crate::config::{LogLevel, LogSettings, Settings};
use tracing::Level;

/// Logger override whose level could not be parsed. Skipped, not fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    pub logger: String,
    pub level: String,
}

/// Per-logger thresholds. Logger names form a hierarchy split on `.` or
/// `::`; the most specific configured ancestor (or the logger itself)
/// decides, the root level otherwise.
#[derive(Debug, Clone)]
struct Thresholds {
    root: LogLevel,
    loggers: Vec<(String, LogLevel)>,
}

impl Thresholds {
    fn level_for(&self, logger_name: &str) -> LogLevel {
        self.loggers
            .iter()
            .filter(|(name, _)| covers(name, logger_name))
            .max_by_key(|(name, _)| name.len())
            .map_or(self.root, |(_, level)| *level)
    }
}

/// `name` is `logger` itself or one of its ancestors.
fn covers(name: &str, logger: &str) -> bool {
    match logger.strip_prefix(name) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with("::"),
        None => false,
    }
}

#[derive(Debug)]
pub struct Pipeline {
    processors: Vec<Processor>,
    sinks: Vec<Sink>,
    thresholds: Thresholds,
    rejected: Vec<RejectedOverride>,
}

impl Pipeline {
    /// Dev mode: colored console only. Otherwise JSON to the console and to
    /// the rotating file. The file and its directory are created here, so a
    /// failure leaves any previously installed pipeline untouched.
    pub fn build(settings: &Settings) -> Result<Self, LoggingSetupError> {
        let log = &settings.log;

        let console_renderer = if settings.app.dev_mode {
            Renderer::Console { colors: true }
        } else {
            Renderer::Json
        };

        let mut sinks = vec![Sink::console(console_renderer, log.log_level)];
        if !settings.app.dev_mode {
            sinks.push(Sink::file(log)?);
        }

        Ok(Self::with_sinks(log, sinks))
    }

    /// Pipeline over caller-provided sinks, thresholds taken from `log`.
    pub fn with_sinks(log: &LogSettings, sinks: Vec<Sink>) -> Self {
        let mut loggers = Vec::new();
        let mut rejected = Vec::new();

        for (logger, raw_level) in &log.logger_level_overrides {
            match raw_level.parse::<LogLevel>() {
                Ok(level) => loggers.push((logger.clone(), level)),
                Err(_) => rejected.push(RejectedOverride {
                    logger: logger.clone(),
                    level: raw_level.clone(),
                }),
            }
        }

        Self {
            processors: shared_processors(),
            sinks,
            thresholds: Thresholds {
                root: log.log_level,
                loggers,
            },
            rejected,
        }
    }

    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    pub fn rejected_overrides(&self) -> &[RejectedOverride] {
        &self.rejected
    }

    pub fn has_sink(&self, kind: SinkKind) -> bool {
        self.sinks.iter().any(|sink| sink.kind() == kind)
    }

    /// Passes the logger threshold and at least one sink threshold.
    pub fn would_enable(&self, logger_name: &str, severity: LogLevel) -> bool {
        severity >= self.thresholds.level_for(logger_name)
            && self.sinks.iter().any(|sink| sink.enabled(severity))
    }

    /// Callsite check before any field is known. An ERROR callsite may still
    /// carry the critical flag, so it is judged as CRITICAL here.
    pub(crate) fn might_enable(&self, logger_name: &str, level: &Level) -> bool {
        LogLevel::from_tracing(level, true)
            .is_some_and(|severity| self.would_enable(logger_name, severity))
    }

    /// Enrich once, then hand the record to every sink accepting its level.
    pub fn dispatch(&self, event: &RawEvent) {
        let Some(severity) = event.severity() else {
            return;
        };
        if !self.would_enable(&event.logger_name, severity) {
            return;
        }

        let record = enrich(&self.processors, event);
        for sink in self.sinks.iter().filter(|sink| sink.enabled(severity)) {
            sink.emit(&record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::covers;

    #[test]
    fn test_covers_hierarchy() {
        assert!(covers("app", "app"));
        assert!(covers("app", "app.db"));
        assert!(covers("app", "app::db"));
        assert!(!covers("app", "application"));
        assert!(!covers("app", "apple::db"));
        assert!(!covers("app.db", "app"));
    }
}
