//! Phrases, narration fitting and the final reconciled timeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio::CompositeAudio;
use super::enums::GoverningMode;
use super::media::{ClampedTransition, Resolution};
use super::track::FittedTrack;

/// One subtitle-sized chunk of narration with its timing span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub index: usize,
    pub text: String,
    /// Duration measured from per-phrase synthesis (0 if synthesis failed).
    pub estimated: f64,
    /// Duration after speed scaling and normalization.
    pub duration: f64,
    /// Offset of the phrase on the timeline.
    pub start: f64,
}

impl Phrase {
    /// Create an unplaced phrase.
    pub fn new(index: usize, text: impl Into<String>, estimated: f64) -> Self {
        Self {
            index,
            text: text.into(),
            estimated,
            duration: estimated,
            start: 0.0,
        }
    }

    /// End of the phrase span.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// What happens to the narration audio to match the governing duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "seconds")]
pub enum NarrationFit {
    /// Narration already matches.
    Exact,
    /// Trailing silence of the given length is appended.
    PadSilence(f64),
    /// Narration is cut at the given time.
    TruncateAt(f64),
}

/// Narration audio placed at t=0 on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationTrack {
    /// Tempo-adjusted narration audio file.
    pub path: PathBuf,
    /// Authoritative narration length after speed scaling, before padding.
    pub duration: f64,
    pub fit: NarrationFit,
}

/// Entrance and exit effects on the composed clip.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AppliedTransitions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrance: Option<ClampedTransition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ClampedTransition>,
}

impl AppliedTransitions {
    /// Whether neither effect is present.
    pub fn is_empty(&self) -> bool {
        self.entrance.is_none() && self.exit.is_none()
    }

    /// Whether any effect is a slide or zoom.
    pub fn has_motion(&self) -> bool {
        self.entrance
            .iter()
            .chain(self.exit.iter())
            .any(|t| t.kind.is_motion())
    }
}

/// The reconciled composition handed to the render engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Governing duration; every element matches it exactly.
    pub duration: f64,
    pub mode: GoverningMode,
    pub resolution: Resolution,
    pub primary: FittedTrack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<FittedTrack>,
    /// Subtitle spans (empty when subtitles are disabled).
    pub phrases: Vec<Phrase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<NarrationTrack>,
    pub audio: CompositeAudio,
    pub transitions: AppliedTransitions,
}

impl Timeline {
    /// Whether two tracks are stacked vertically.
    pub fn is_stacked(&self) -> bool {
        self.secondary.is_some()
    }
}
