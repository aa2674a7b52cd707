//! Media-related data structures (items, output resolution, transitions).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::enums::{MediaKind, TransitionKind};
use crate::error::ComposeError;

/// A single loaded media file.
///
/// Immutable once loaded; re-timing an item produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Path to the media file.
    pub path: PathBuf,
    /// Video or still image.
    pub kind: MediaKind,
    /// Intrinsic duration in seconds.
    pub duration: f64,
    /// Duration is a configured default, not a property of the file.
    #[serde(default)]
    pub provisional: bool,
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Whether the file carries an audio stream.
    #[serde(default)]
    pub has_audio: bool,
}

impl MediaItem {
    /// Create a video item.
    pub fn video(
        path: impl Into<PathBuf>,
        duration: f64,
        width: u32,
        height: u32,
        has_audio: bool,
    ) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Video,
            duration,
            provisional: false,
            width,
            height,
            has_audio,
        }
    }

    /// Create a still-image item with a provisional default duration.
    pub fn image(path: impl Into<PathBuf>, default_duration: f64, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Image,
            duration: default_duration,
            provisional: true,
            width,
            height,
            has_audio: false,
        }
    }

    /// Return a copy of this item with an authoritative duration.
    pub fn with_duration(&self, duration: f64) -> Self {
        Self {
            duration,
            provisional: false,
            ..self.clone()
        }
    }

    /// Whether this item is a still image.
    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    /// File name for display.
    pub fn display_name(&self) -> String {
        file_label(&self.path)
    }
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Output frame size, parsed from `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height of one slot when two tracks are stacked vertically.
    pub fn half_height(&self) -> u32 {
        self.height / 2
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1080, 1920)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ComposeError::configuration(format!(
                "Invalid resolution '{}'. Use WIDTHxHEIGHT (e.g., 1080x1920)",
                s
            ))
        };

        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.parse().map_err(|_| invalid())?;
        let height: u32 = h.parse().map_err(|_| invalid())?;
        if width == 0 || height < 2 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// A requested transition effect and its duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    pub duration: f64,
}

impl TransitionSpec {
    /// Create a transition spec.
    pub fn new(kind: TransitionKind, duration: f64) -> Self {
        Self { kind, duration }
    }

    /// No transition.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether this spec produces any effect.
    pub fn is_active(&self) -> bool {
        !self.kind.is_none() && self.duration > 0.0
    }

    /// Reject negative or non-finite durations.
    pub fn validate(&self) -> Result<(), ComposeError> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ComposeError::configuration(format!(
                "Transition '{}' has invalid duration {}",
                self.kind, self.duration
            )));
        }
        Ok(())
    }
}

/// A transition after clamping, placed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampedTransition {
    pub kind: TransitionKind,
    /// Start offset in seconds.
    pub start: f64,
    /// Effective duration in seconds.
    pub duration: f64,
}

impl ClampedTransition {
    /// End offset in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}
