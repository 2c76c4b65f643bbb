//! Sinks: a writer paired with a renderer and a severity threshold.

use super::LoggingSetupError;
use super::record::Record;
use super::render::Renderer;
use super::rotate::RotatingFile;
use crate::config::{LogLevel, LogSettings};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    File,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Console => write!(f, "console"),
            SinkKind::File => write!(f, "file"),
        }
    }
}

pub struct Sink {
    kind: SinkKind,
    renderer: Renderer,
    level: LogLevel,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("kind", &self.kind)
            .field("renderer", &self.renderer)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl Sink {
    pub fn new(
        kind: SinkKind,
        renderer: Renderer,
        level: LogLevel,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self {
            kind,
            renderer,
            level,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Standard output.
    pub fn console(renderer: Renderer, level: LogLevel) -> Self {
        Self::new(SinkKind::Console, renderer, level, io::stdout())
    }

    /// JSON lines appended to `log_dir/log_file`, rotated by size.
    /// Creates `log_dir` when missing.
    pub fn file(settings: &LogSettings) -> Result<Self, LoggingSetupError> {
        fs::create_dir_all(&settings.log_dir).map_err(|source| LoggingSetupError::CreateDir {
            path: settings.log_dir.clone(),
            source,
        })?;

        let path = settings.log_path();
        let file = RotatingFile::open(&path, settings.log_max_bytes, settings.log_backup_count)
            .map_err(|source| LoggingSetupError::OpenFile { path, source })?;

        Ok(Self::new(
            SinkKind::File,
            Renderer::Json,
            settings.log_level,
            file,
        ))
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn renderer(&self) -> Renderer {
        self.renderer
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn enabled(&self, severity: LogLevel) -> bool {
        severity >= self.level
    }

    /// Render and write one record. Failures never reach the caller; they
    /// are reported as a single line on stderr.
    pub fn emit(&self, record: &Record) {
        let mut line = match self.renderer.render(record) {
            Ok(line) => line,
            Err(e) => {
                self.report_failure("render", &e);
                return;
            }
        };
        line.push('\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let result = match writer.write_all(line.as_bytes()) {
            Ok(()) => writer.flush(),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.report_failure("write", &e);
        }
    }

    fn report_failure(&self, stage: &str, err: &dyn fmt::Display) {
        eprintln!("logging error: {} sink failed to {} record: {}", self.kind, stage, err);
    }
}
