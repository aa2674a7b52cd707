//! Visual tracks built from ordered media items.

use serde::{Deserialize, Serialize};

use super::enums::{MediaKind, TrackSlot};
use super::media::{ClampedTransition, MediaItem, TransitionSpec};

/// One media item placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub item: MediaItem,
    /// Offset of the item's first frame within the track.
    pub start: f64,
    /// Transition blending this item in over the previous one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_in: Option<ClampedTransition>,
}

impl TrackEntry {
    /// Offset of the item's last frame within the track.
    pub fn end(&self) -> f64 {
        self.start + self.item.duration
    }
}

/// Ordered sequence of media items with a known total duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub slot: TrackSlot,
    pub entries: Vec<TrackEntry>,
    /// Requested inter-item transition (before clamping).
    pub transition: TransitionSpec,
    /// Σ item durations − Σ transition overlaps.
    pub duration: f64,
}

impl Track {
    /// Number of items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the track has no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the items in order.
    pub fn items(&self) -> impl Iterator<Item = &MediaItem> {
        self.entries.iter().map(|e| &e.item)
    }

    /// Whether any true video item carries sound.
    pub fn has_audio(&self) -> bool {
        self.items()
            .any(|i| i.kind == MediaKind::Video && i.has_audio)
    }

    /// Whether every item is a still image with a default duration.
    pub fn is_provisional(&self) -> bool {
        !self.is_empty() && self.items().all(|i| i.is_image() && i.provisional)
    }

    /// Total seconds lost to overlapping transitions.
    pub fn overlap_total(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|e| e.transition_in.map(|t| t.duration))
            .sum()
    }
}

/// A track bound to the governing duration.
///
/// The track is repeated whole `loops` times and the result truncated to
/// `duration`. `loops * track.duration >= duration` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTrack {
    pub track: Track,
    /// Number of whole repetitions of the track (at least 1).
    pub loops: u32,
    /// Final duration after truncation.
    pub duration: f64,
    /// Provisional images were re-timed instead of looping.
    #[serde(default)]
    pub respread: bool,
}

impl FittedTrack {
    /// Length of the looped content before truncation.
    pub fn content_duration(&self) -> f64 {
        self.track.duration * self.loops as f64
    }

    /// Seconds cut from the end of the looped content.
    pub fn trimmed(&self) -> f64 {
        (self.content_duration() - self.duration).max(0.0)
    }
}
