//! Structured logging pipeline.
//!
//! Every event passes the same enrichment stages (span context, logger name,
//! level, exception text, `HH:MM:SS` timestamp) and is then rendered per sink:
//!
//! - dev mode: colored human-readable lines on stdout, no file;
//! - otherwise: JSON lines on stdout and in a size-rotated file under
//!   `log_dir`.
//!
//! The logger name of an event is its `tracing` target, so per-logger
//! thresholds apply to targets (`info!(target: "env_check", ...)`) and to
//! module paths by prefix.

mod error;
mod layer;
mod pipeline;
mod processor;
mod record;
mod render;
mod rotate;
mod sink;

pub use error::LoggingSetupError;
pub use layer::{PipelineHandle, PipelineLayer, SinkInfo};
pub use pipeline::{Pipeline, RejectedOverride};
pub use processor::{Processor, TIMESTAMP_FORMAT, enrich, level_name, shared_processors};
pub use record::{EVENT_KEY, RawEvent, Record};
pub use render::Renderer;
pub use rotate::RotatingFile;
pub use sink::{Sink, SinkKind};

use crate::config::Settings;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static GLOBAL: OnceLock<PipelineHandle> = OnceLock::new();
static INSTALL: Mutex<()> = Mutex::new(());

/// Build the pipeline for `settings` and make it the process-wide one.
///
/// The first call installs the global subscriber; later calls replace the
/// whole pipeline, so sinks never accumulate. Nothing is replaced when the
/// new pipeline cannot be built.
pub fn configure(settings: &Settings) -> Result<(), LoggingSetupError> {
    let pipeline = Pipeline::build(settings)?;
    let rejected = pipeline.rejected_overrides().to_vec();

    global_handle()?.replace(Some(pipeline));

    for RejectedOverride { logger, level } in rejected {
        warn!(logger = %logger, level = %level, "ignoring logger level override with unknown level");
    }
    debug!(
        dev_mode = settings.app.dev_mode,
        log_level = %settings.log.log_level,
        "logging configured"
    );
    Ok(())
}

/// Drop the installed pipeline, closing its file. Events are discarded until
/// the next [`configure`].
pub fn reset() {
    if let Some(handle) = GLOBAL.get() {
        handle.replace(None);
    }
}

/// Sinks of the installed pipeline, empty when unconfigured.
pub fn active_sinks() -> Vec<SinkInfo> {
    GLOBAL.get().map(PipelineHandle::sinks).unwrap_or_default()
}

pub fn is_configured() -> bool {
    GLOBAL.get().is_some_and(PipelineHandle::is_configured)
}

fn global_handle() -> Result<&'static PipelineHandle, LoggingSetupError> {
    if let Some(handle) = GLOBAL.get() {
        return Ok(handle);
    }

    let _guard = INSTALL.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = GLOBAL.get() {
        return Ok(handle);
    }

    let layer = PipelineLayer::new(None);
    let handle = layer.handle();
    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| LoggingSetupError::SubscriberInstalled(e.to_string()))?;

    Ok(GLOBAL.get_or_init(|| handle))
}
