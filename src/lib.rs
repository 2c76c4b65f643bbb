//! Application bootstrap: layered typed settings and a structured,
//! dual-sink logging pipeline.
//!
//! ```no_run
//! use app_bootstrap::{config, logging};
//!
//! let settings = config::init()?;
//! logging::configure(&settings)?;
//! tracing::info!(target: "app", app_name = %settings.app.app_name, "started");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod logging;
