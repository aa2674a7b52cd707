//! Logging infrastructure for Short Maker.
//!
//! This module provides:
//! - Per-run loggers with file + callback dual output
//! - Compact mode with progress filtering
//! - Tail buffer of ffmpeg/TTS output for failure diagnosis
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use sm_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("my_short", "/path/to/logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("Reconcile");
//! logger.timing("Narration", 12.4);
//! logger.command("ffmpeg -i top.mp4 ...");
//! logger.success("Rendered");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// Respects `RUST_LOG`, falling back to `default_level`. Output goes to
/// stderr. Should be called once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter()));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
