//! Data models for the composition engine.
//!
//! This module contains the value types that flow between pipeline stages:
//! - Enums for media kinds, transitions, audio kinds, governing mode
//! - Media items, resolution and transition specs
//! - Tracks and fitted tracks
//! - Audio sources, gain envelopes and the composite mix
//! - Phrases and the final Timeline

mod audio;
mod enums;
mod jobs;
mod media;
mod timeline;
mod track;

// Re-export all public types
pub use audio::{
    AudioSource, CompositeAudio, DuckWindow, GainEnvelope, GainSegment, LayerFit, MixLayer,
};
pub use enums::{AudioKind, GoverningMode, JobStatus, MediaKind, TrackSlot, TransitionKind};
pub use jobs::{CompositionSpec, JobResult, MusicInput};
pub(crate) use media::file_label;
pub use media::{ClampedTransition, MediaItem, Resolution, TransitionSpec};
pub use timeline::{AppliedTransitions, NarrationFit, NarrationTrack, Phrase, Timeline};
pub use track::{FittedTrack, Track, TrackEntry};
