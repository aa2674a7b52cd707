//! Core enums used throughout the composition engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of media item in a visual track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Classify a file by extension. Returns None for unsupported files.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "mov" | "mkv" | "webm" | "avi" | "m4v" => Some(MediaKind::Video),
            "jpg" | "jpeg" | "png" | "bmp" | "webp" | "gif" => Some(MediaKind::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Image => write!(f, "image"),
        }
    }
}

/// Visual transition effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    #[default]
    None,
    Fade,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    ZoomIn,
    ZoomOut,
}

impl TransitionKind {
    /// All kinds, in display order.
    pub const ALL: [TransitionKind; 8] = [
        TransitionKind::None,
        TransitionKind::Fade,
        TransitionKind::SlideLeft,
        TransitionKind::SlideRight,
        TransitionKind::SlideUp,
        TransitionKind::SlideDown,
        TransitionKind::ZoomIn,
        TransitionKind::ZoomOut,
    ];

    /// Get the canonical name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            TransitionKind::None => "none",
            TransitionKind::Fade => "fade",
            TransitionKind::SlideLeft => "slide-left",
            TransitionKind::SlideRight => "slide-right",
            TransitionKind::SlideUp => "slide-up",
            TransitionKind::SlideDown => "slide-down",
            TransitionKind::ZoomIn => "zoom-in",
            TransitionKind::ZoomOut => "zoom-out",
        }
    }

    /// Whether this kind produces any effect.
    pub fn is_none(&self) -> bool {
        matches!(self, TransitionKind::None)
    }

    /// Whether this kind is a motion effect (slide or zoom).
    pub fn is_motion(&self) -> bool {
        !matches!(self, TransitionKind::None | TransitionKind::Fade)
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        TransitionKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| format!("Unknown transition '{}'", s))
    }
}

/// Kind of audio source in the composite mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioKind {
    /// Sound carried by the primary visual track.
    Original,
    /// Synthesized narration.
    Narration,
    /// Background music.
    Music,
}

impl std::fmt::Display for AudioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioKind::Original => write!(f, "original"),
            AudioKind::Narration => write!(f, "narration"),
            AudioKind::Music => write!(f, "music"),
        }
    }
}

/// Which time source governs the final timeline length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoverningMode {
    /// Timeline lasts as long as the narration.
    #[default]
    UseNarrationLength,
    /// Timeline lasts as long as the primary media track.
    UseMediaLength,
}

impl GoverningMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UseNarrationLength => "narration length",
            Self::UseMediaLength => "media length",
        }
    }
}

/// Visual slot a track occupies in the vertical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSlot {
    /// Top half (or full frame when alone).
    Primary,
    /// Bottom half.
    Secondary,
}

impl std::fmt::Display for TrackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackSlot::Primary => write!(f, "primary"),
            TrackSlot::Secondary => write!(f, "secondary"),
        }
    }
}

/// Final status of a composition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Output file written.
    Rendered,
    /// Run failed with error.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_kind_parses_names() {
        assert_eq!("fade".parse::<TransitionKind>(), Ok(TransitionKind::Fade));
        assert_eq!(
            "Slide_Left".parse::<TransitionKind>(),
            Ok(TransitionKind::SlideLeft)
        );
        assert_eq!("zoom-out".parse::<TransitionKind>(), Ok(TransitionKind::ZoomOut));
        assert!("wipe".parse::<TransitionKind>().is_err());
    }

    #[test]
    fn transition_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&TransitionKind::SlideUp).unwrap();
        assert_eq!(json, "\"slide-up\"");
    }

    #[test]
    fn media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("txt"), None);
    }

    #[test]
    fn motion_kinds() {
        assert!(!TransitionKind::Fade.is_motion());
        assert!(!TransitionKind::None.is_motion());
        assert!(TransitionKind::ZoomIn.is_motion());
    }
}
