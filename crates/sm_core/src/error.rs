//! Error taxonomy for composition runs.
//!
//! Errors fall into four families:
//! - configuration problems, rejected before any engine is invoked
//! - synthesis failures (per-phrase ones are recovered by the estimator)
//! - render failures, fatal to the run
//! - transition render failures, recovered by a fade fallback

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the composition engine.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Invalid user configuration (resolution, speed, volumes, durations).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A TTS engine call failed.
    #[error("Synthesis failed for '{text}': {message}")]
    Synthesis { text: String, message: String },

    /// No phrase produced a usable duration, or total narration failed.
    #[error("No usable narration timing: {0}")]
    NoNarrationTiming(String),

    /// A media item list was empty.
    #[error("Track '{0}' has no media items")]
    EmptyTrack(String),

    /// A media item resolved to a zero or negative duration.
    #[error("Media item '{path}' has invalid duration {duration:.3}s")]
    InvalidItemDuration { path: PathBuf, duration: f64 },

    /// Probing a media file failed.
    #[error("Failed to probe '{path}': {message}")]
    Probe { path: PathBuf, message: String },

    /// Visual composition or final encode failed.
    #[error("Render failed: {0}")]
    Render(String),

    /// A start/end transition could not be rendered.
    #[error("Transition '{kind}' failed to render: {message}")]
    TransitionRender { kind: String, message: String },

    /// File I/O error.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl ComposeError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a synthesis error.
    pub fn synthesis(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Synthesis {
            text: text.into(),
            message: message.into(),
        }
    }

    /// Create a "no usable narration timing" error.
    pub fn no_narration_timing(message: impl Into<String>) -> Self {
        Self::NoNarrationTiming(message.into())
    }

    /// Create a render error.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Whether this error must abort the run.
    ///
    /// Per-phrase synthesis and transition failures are recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ComposeError::Synthesis { .. } | ComposeError::TransitionRender { .. }
        )
    }
}

/// Result type for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;
