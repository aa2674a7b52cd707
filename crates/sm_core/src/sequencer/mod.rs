//! Media sequencing: ordered media items into one visual track.
//!
//! Tracks are built in two phases. `Sequencer::build` lays items end to end
//! using whatever durations are known at load time (still images carry a
//! provisional default). Once the governing duration is known,
//! `Sequencer::fit` binds the track to it: provisional image tracks are
//! re-timed to spread evenly over the governing duration, everything else is
//! looped whole and truncated.

use crate::error::{ComposeError, ComposeResult};
use crate::models::{
    ClampedTransition, FittedTrack, MediaItem, Track, TrackEntry, TrackSlot, TransitionSpec,
};

/// Small slack so float error never forces an extra loop.
const LOOP_EPSILON: f64 = 1e-9;

/// Builds and fits visual tracks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequencer {
    /// Requested transition between consecutive items.
    transition: TransitionSpec,
}

impl Sequencer {
    /// Create a sequencer with the given inter-item transition.
    pub fn new(transition: TransitionSpec) -> Self {
        Self { transition }
    }

    /// Lay items out into a provisional track.
    ///
    /// Adjacent items overlap by the transition duration, clamped to a third
    /// of the shorter neighbor.
    pub fn build(&self, slot: TrackSlot, items: Vec<MediaItem>) -> ComposeResult<Track> {
        self.transition.validate()?;

        if items.is_empty() {
            return Err(ComposeError::EmptyTrack(slot.to_string()));
        }

        let mut entries: Vec<TrackEntry> = Vec::with_capacity(items.len());
        for item in items {
            if !item.duration.is_finite() || item.duration <= 0.0 {
                return Err(ComposeError::InvalidItemDuration {
                    path: item.path.clone(),
                    duration: item.duration,
                });
            }

            let entry = match entries.last() {
                None => TrackEntry {
                    item,
                    start: 0.0,
                    transition_in: None,
                },
                Some(prev) => {
                    let transition_in = self.clamp_between(&prev.item, &item).map(|duration| {
                        ClampedTransition {
                            kind: self.transition.kind,
                            start: prev.end() - duration,
                            duration,
                        }
                    });
                    let start = transition_in.map(|t| t.start).unwrap_or_else(|| prev.end());
                    TrackEntry {
                        item,
                        start,
                        transition_in,
                    }
                }
            };
            entries.push(entry);
        }

        let duration = entries.last().map(TrackEntry::end).unwrap_or(0.0);

        Ok(Track {
            slot,
            entries,
            transition: self.transition,
            duration,
        })
    }

    /// Bind a track to the governing duration.
    ///
    /// The result always covers at least `governing` seconds before
    /// truncation and reports exactly `governing` after it.
    pub fn fit(&self, track: Track, governing: f64) -> ComposeResult<FittedTrack> {
        if !governing.is_finite() || governing <= 0.0 {
            return Err(ComposeError::configuration(format!(
                "Governing duration must be positive (got {:.3}s)",
                governing
            )));
        }

        if track.is_provisional() {
            let respread = self.respread(&track, governing)?;
            tracing::debug!(
                "Re-timed {} {} images to {:.3}s each",
                respread.len(),
                track.slot,
                respread.entries[0].item.duration
            );
            return Ok(FittedTrack {
                track: respread,
                loops: 1,
                duration: governing,
                respread: true,
            });
        }

        let loops = loops_needed(track.duration, governing);
        tracing::debug!(
            "Fitting {} track {:.3}s to {:.3}s: {} loop(s)",
            track.slot,
            track.duration,
            governing,
            loops
        );

        Ok(FittedTrack {
            track,
            loops,
            duration: governing,
            respread: false,
        })
    }

    /// Rebuild a provisional image track so it lasts exactly `target`.
    ///
    /// Every image gets the same duration `x`, chosen so that
    /// `n*x - (n-1)*overlap(x) == target`.
    fn respread(&self, track: &Track, target: f64) -> ComposeResult<Track> {
        let n = track.len() as f64;
        let x = if n <= 1.0 || !self.transition.is_active() {
            target / n
        } else {
            let overlap = self.transition.duration;
            let unclamped = (target + (n - 1.0) * overlap) / n;
            if overlap <= unclamped / 3.0 {
                unclamped
            } else {
                // Overlap is clamped to x/3 for every junction
                target / (n - (n - 1.0) / 3.0)
            }
        };

        let items = track.items().map(|i| i.with_duration(x)).collect();
        self.build(track.slot, items)
    }

    /// Clamped overlap between two neighbors, or None for a hard cut.
    fn clamp_between(&self, prev: &MediaItem, next: &MediaItem) -> Option<f64> {
        if !self.transition.is_active() {
            return None;
        }
        let limit = prev.duration.min(next.duration) / 3.0;
        Some(self.transition.duration.min(limit))
    }
}

/// Number of whole repetitions of `track_duration` needed to reach `target`.
pub fn loops_needed(track_duration: f64, target: f64) -> u32 {
    if track_duration <= 0.0 {
        return 1;
    }
    ((target / track_duration) - LOOP_EPSILON).ceil().max(1.0) as u32
}
