//! Logging setup for applications embedding the pipeline.
//!
//! The library itself only emits through the `log` facade: stage transitions
//! at `debug`, run summaries at `info`, skipped stages at `warn` and aborted
//! runs at `error`. Call [`init`] once at startup to see them on stderr.
//!
//! ```no_run
//! tabwash::logging::init();
//! log::info!("Cleaning started");
//! ```
//!
//! The filter defaults to `info` and can be overridden with `RUST_LOG`, for
//! example `RUST_LOG=tabwash=debug`.

use anyhow::{Context as _, Result};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

fn builder() -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER));
    builder.format_timestamp_millis();
    builder
}

/// Install the global logger.
///
/// # Panics
///
/// If a global logger has already been installed.
pub fn init() {
    builder().init();
}

/// Install the global logger unless one is already set.
///
/// # Errors
///
/// Returns an error if another logger was installed first.
pub fn try_init() -> Result<()> {
    builder()
        .try_init()
        .context("Failed to initialize logging")
}

