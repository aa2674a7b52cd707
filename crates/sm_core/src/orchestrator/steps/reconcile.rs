//! Reconcile step - picks the governing duration and fits every track to it.

use crate::models::NarrationFit;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, ReconcileOutput, StepOutcome};
use crate::reconcile::Reconciler;
use crate::sequencer::Sequencer;

/// Durations within this are treated as equal by the output check.
const FIT_EPSILON: f64 = 1e-6;

/// Reconciles narration timing with the visual tracks.
pub struct ReconcileStep;

impl ReconcileStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReconcileStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ReconcileStep {
    fn name(&self) -> &str {
        "Reconcile"
    }

    fn description(&self) -> &str {
        "Choose the governing duration and fit tracks to it"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let sequence = state
            .sequence
            .clone()
            .ok_or_else(|| StepError::precondition_failed("Sequence step has not run"))?;

        let n = &ctx.settings.narration;
        let reconciler = Reconciler::new(n.normalization_tolerance);
        let media = sequence.primary.duration;

        let reconciliation = match state.narration.as_ref() {
            Some(narration) => {
                let r = reconciler.reconcile(
                    &narration.phrases,
                    narration.raw_duration,
                    n.speed,
                    n.mode,
                    media,
                )?;
                if r.drift_exceeded {
                    ctx.logger.warn(&format!(
                        "Phrase estimates drift {:+.3}s from narration (tolerance {:.3}s); spans rescaled",
                        r.drift, n.normalization_tolerance
                    ));
                } else {
                    ctx.logger
                        .debug(&format!("Phrase estimate drift {:+.3}s", r.drift));
                }
                match r.narration_fit {
                    NarrationFit::PadSilence(secs) => ctx
                        .logger
                        .info(&format!("Narration padded with {:.3}s of silence", secs)),
                    NarrationFit::TruncateAt(at) => ctx
                        .logger
                        .warn(&format!("Narration truncated at {:.3}s", at)),
                    NarrationFit::Exact => {}
                }
                Some(r)
            }
            None => None,
        };

        let governing = match reconciliation.as_ref() {
            Some(r) => r.governing,
            None => reconciler.governing_without_narration(media)?,
        };
        ctx.logger.timing(
            &format!(
                "Governing duration ({})",
                reconciliation
                    .as_ref()
                    .map(|r| r.mode.name())
                    .unwrap_or("media length")
            ),
            governing,
        );

        let sequencer = Sequencer::new(ctx.settings.media.item_transition_spec());
        let primary = sequencer.fit(sequence.primary, governing)?;
        let secondary = sequence
            .secondary
            .map(|track| sequencer.fit(track, governing))
            .transpose()?;

        for fitted in std::iter::once(&primary).chain(secondary.iter()) {
            if fitted.respread {
                ctx.logger.info(&format!(
                    "{} images re-timed to fill {:.3}s",
                    fitted.track.slot, governing
                ));
            } else if fitted.loops > 1 || fitted.trimmed() > 0.0 {
                ctx.logger.info(&format!(
                    "{} track looped {}x, trimmed {:.3}s",
                    fitted.track.slot,
                    fitted.loops,
                    fitted.trimmed()
                ));
            }
        }

        state.reconcile = Some(ReconcileOutput {
            governing,
            reconciliation,
            primary,
            secondary,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let output = state
            .reconcile
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Reconciliation not recorded"))?;

        let g = output.governing;
        let tracks = std::iter::once(&output.primary).chain(output.secondary.iter());
        for fitted in tracks {
            if (fitted.duration - g).abs() > FIT_EPSILON
                || fitted.content_duration() + FIT_EPSILON < g
            {
                return Err(StepError::invalid_output(format!(
                    "{} track does not cover {:.3}s",
                    fitted.track.slot, g
                )));
            }
        }
        if let Some(r) = &output.reconciliation {
            if r.subtitle_end() > g + FIT_EPSILON {
                return Err(StepError::invalid_output(
                    "Subtitle spans run past the governing duration",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SynthesizedAudio;
    use crate::models::{CompositionSpec, GoverningMode, MediaItem, Phrase};
    use crate::orchestrator::steps::SequenceStep;
    use crate::orchestrator::test_support::TestRun;
    use crate::orchestrator::types::NarrationOutput;
    use std::path::PathBuf;

    fn narration(durations: &[f64], raw: f64) -> NarrationOutput {
        NarrationOutput {
            phrases: durations
                .iter()
                .enumerate()
                .map(|(i, d)| Phrase::new(i, format!("phrase {}", i), *d))
                .collect(),
            raw_duration: raw,
            audio: SynthesizedAudio {
                path: PathBuf::from("/tmp/narration.mp3"),
                duration: raw,
            },
            failed: Vec::new(),
        }
    }

    fn sequenced(run: &TestRun, spec: CompositionSpec) -> (Context, JobState) {
        let ctx = run.context(spec);
        let mut state = JobState::new("r");
        SequenceStep::new().execute(&ctx, &mut state).unwrap();
        (ctx, state)
    }

    #[test]
    fn narration_governs_and_video_loops() {
        let run = TestRun::new();
        let (ctx, mut state) = sequenced(&run, run.spec());
        state.narration = Some(narration(&[10.0, 10.0, 5.0], 25.0));

        ReconcileStep::new().execute(&ctx, &mut state).unwrap();
        ReconcileStep::new().validate_output(&ctx, &state).unwrap();

        let out = state.reconcile.unwrap();
        assert_eq!(out.governing, 25.0);
        assert_eq!(out.primary.loops, 3);
        assert!((out.primary.trimmed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn media_governs_without_narration() {
        let run = TestRun::new();
        let (ctx, mut state) = sequenced(&run, run.spec());

        ReconcileStep::new().execute(&ctx, &mut state).unwrap();
        let out = state.reconcile.unwrap();
        assert_eq!(out.governing, 10.0);
        assert!(out.reconciliation.is_none());
        assert_eq!(out.primary.loops, 1);
    }

    #[test]
    fn media_mode_truncates_long_narration() {
        let mut run = TestRun::new();
        run.settings.narration.mode = GoverningMode::UseMediaLength;
        let (ctx, mut state) = sequenced(&run, run.spec());
        state.narration = Some(narration(&[6.0, 6.0], 12.0));

        ReconcileStep::new().execute(&ctx, &mut state).unwrap();
        ReconcileStep::new().validate_output(&ctx, &state).unwrap();

        let out = state.reconcile.unwrap();
        assert_eq!(out.governing, 10.0);
        let r = out.reconciliation.unwrap();
        assert_eq!(r.narration_fit, NarrationFit::TruncateAt(10.0));
        assert!(r.subtitle_end() <= 10.0 + 1e-9);
    }

    #[test]
    fn image_secondary_is_respread() {
        let run = TestRun::new();
        let spec = run.spec().with_secondary(vec![
            MediaItem::image("/media/a.png", 5.0, 800, 600),
            MediaItem::image("/media/b.png", 5.0, 800, 600),
            MediaItem::image("/media/c.png", 5.0, 800, 600),
        ]);
        let (ctx, mut state) = sequenced(&run, spec);
        state.narration = Some(narration(&[12.0], 12.0));

        ReconcileStep::new().execute(&ctx, &mut state).unwrap();
        let secondary = state.reconcile.unwrap().secondary.unwrap();
        assert!(secondary.respread);
        assert_eq!(secondary.loops, 1);
        assert!((secondary.track.entries[0].item.duration - 4.0).abs() < 1e-9);
    }

    #[test]
    fn requires_sequence() {
        let run = TestRun::new();
        let ctx = run.context(run.spec());
        let mut state = JobState::new("r");
        let err = ReconcileStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::PreconditionFailed(_)));
    }
}
