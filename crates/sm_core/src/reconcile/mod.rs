//! Duration reconciliation.
//!
//! Turns per-phrase estimates, the authoritative narration length, the
//! playback speed and the primary track length into:
//! - phrase spans covering the subtitle timeline with no gaps
//! - the governing duration for the whole composition
//! - what happens to the narration audio (pad, truncate or nothing)
//!
//! Visual fitting to the governing duration is done by
//! `Sequencer::fit` once this has run.

use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, ComposeResult};
use crate::models::{GoverningMode, NarrationFit, Phrase};

/// Durations closer than this are treated as equal.
const DURATION_EPSILON: f64 = 1e-6;

/// Outcome of reconciling narration against media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Authoritative total length.
    pub governing: f64,
    pub mode: GoverningMode,
    /// Narration length after speed scaling.
    pub narration_duration: f64,
    /// Normalized phrases with contiguous starts.
    pub phrases: Vec<Phrase>,
    pub narration_fit: NarrationFit,
    /// Σ estimates − narration length, after speed scaling.
    pub drift: f64,
    /// Whether |drift| exceeded the tolerance.
    pub drift_exceeded: bool,
}

impl Reconciliation {
    /// End of the last subtitle span.
    pub fn subtitle_end(&self) -> f64 {
        self.phrases.last().map(|p| p.end()).unwrap_or(0.0)
    }
}

/// Scale phrase estimates and narration length for a playback speed.
///
/// Speed must be positive; durations are divided by it.
pub fn scale_for_speed(
    phrases: &[Phrase],
    narration: f64,
    speed: f64,
) -> ComposeResult<(Vec<Phrase>, f64)> {
    validate_speed(speed)?;
    let scaled = phrases
        .iter()
        .map(|p| Phrase {
            estimated: p.estimated / speed,
            duration: p.duration / speed,
            ..p.clone()
        })
        .collect();
    Ok((scaled, narration / speed))
}

fn validate_speed(speed: f64) -> ComposeResult<()> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(ComposeError::configuration(format!(
            "Speed must be greater than 0, got {}",
            speed
        )));
    }
    Ok(())
}

/// Reconciles narration timing with the media timeline.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    /// Drift between Σ estimates and narration length that triggers a warning.
    tolerance: f64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Reconciler {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }

    /// Governing duration when there is no narration at all.
    pub fn governing_without_narration(&self, media: f64) -> ComposeResult<f64> {
        if !media.is_finite() || media <= 0.0 {
            return Err(ComposeError::configuration(format!(
                "Media duration must be positive, got {}",
                media
            )));
        }
        Ok(media)
    }

    /// Reconcile phrase estimates against the narration and media lengths.
    ///
    /// `narration` is the unscaled length of the full synthesis; `media` is
    /// the primary track's duration.
    pub fn reconcile(
        &self,
        phrases: &[Phrase],
        narration: f64,
        speed: f64,
        mode: GoverningMode,
        media: f64,
    ) -> ComposeResult<Reconciliation> {
        let (scaled, narration) = scale_for_speed(phrases, narration, speed)?;

        if !narration.is_finite() || narration <= 0.0 {
            return Err(ComposeError::no_narration_timing(format!(
                "narration duration is {}",
                narration
            )));
        }

        let total: f64 = scaled.iter().map(|p| p.estimated).sum();
        if total <= 0.0 {
            return Err(ComposeError::no_narration_timing(
                "every phrase failed to synthesize",
            ));
        }

        let drift = total - narration;
        let drift_exceeded = drift.abs() > self.tolerance;
        if drift_exceeded {
            tracing::warn!(
                "Phrase estimates sum to {:.3}s but narration lasts {:.3}s; rescaling",
                total,
                narration
            );
        }

        let mut normalized = normalize(scaled, total, narration);

        let (governing, narration_fit) = match mode {
            GoverningMode::UseNarrationLength => (narration, NarrationFit::Exact),
            GoverningMode::UseMediaLength => {
                if !media.is_finite() || media <= 0.0 {
                    return Err(ComposeError::configuration(format!(
                        "Media duration must be positive, got {}",
                        media
                    )));
                }
                let fit = if narration > media + DURATION_EPSILON {
                    clip_spans(&mut normalized, media);
                    NarrationFit::TruncateAt(media)
                } else if narration < media - DURATION_EPSILON {
                    NarrationFit::PadSilence(media - narration)
                } else {
                    NarrationFit::Exact
                };
                (media, fit)
            }
        };

        Ok(Reconciliation {
            governing,
            mode,
            narration_duration: narration,
            phrases: normalized,
            narration_fit,
            drift,
            drift_exceeded,
        })
    }
}

/// Rescale so durations sum to `target` and lay spans end to end.
fn normalize(mut phrases: Vec<Phrase>, total: f64, target: f64) -> Vec<Phrase> {
    let factor = target / total;
    let mut cursor = 0.0;
    for phrase in phrases.iter_mut() {
        phrase.start = cursor;
        phrase.duration = phrase.estimated * factor;
        cursor += phrase.duration;
    }

    // Absorb float error into the last span so it ends exactly at target
    if let Some(last) = phrases.last_mut() {
        last.duration = (target - last.start).max(0.0);
    }
    phrases
}

/// Drop spans starting at or after `limit` and clip the one straddling it.
fn clip_spans(phrases: &mut Vec<Phrase>, limit: f64) {
    phrases.retain(|p| p.start < limit);
    if let Some(last) = phrases.last_mut() {
        if last.end() > limit {
            last.duration = limit - last.start;
        }
    }
}
