//! Transitions step - places entrance/exit effects and assembles the timeline.

use crate::models::{GoverningMode, Timeline};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::transitions::TransitionApplicator;

/// Clamps edge effects and hands back the final timeline.
pub struct TransitionsStep;

impl TransitionsStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TransitionsStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for TransitionsStep {
    fn name(&self) -> &str {
        "Transitions"
    }

    fn description(&self) -> &str {
        "Place entrance and exit effects"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        ctx.settings.resolution()?;
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let reconcile = state
            .reconcile
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Reconcile step has not run"))?;
        let mix = state
            .mix
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Mix step has not run"))?;

        let t = &ctx.settings.transitions;
        let applicator = TransitionApplicator::new(t.start_spec(), t.end_spec())?;
        let governing = reconcile.governing;
        let applied = applicator.apply(governing);

        for (label, effect) in [("Entrance", applied.entrance), ("Exit", applied.exit)] {
            if let Some(e) = effect {
                ctx.logger.info(&format!(
                    "{} {} at {:.3}s for {:.3}s",
                    label, e.kind, e.start, e.duration
                ));
                if e.duration + 1e-9 < t.duration {
                    ctx.logger.debug(&format!(
                        "{} clamped from {:.3}s",
                        label, t.duration
                    ));
                }
            }
        }

        let phrases = match (&reconcile.reconciliation, ctx.subtitles_enabled()) {
            (Some(r), true) => r.phrases.clone(),
            _ => Vec::new(),
        };
        let mode = reconcile
            .reconciliation
            .as_ref()
            .map(|r| r.mode)
            .unwrap_or(GoverningMode::UseMediaLength);

        state.timeline = Some(Timeline {
            duration: governing,
            mode,
            resolution: ctx.settings.resolution()?,
            primary: reconcile.primary.clone(),
            secondary: reconcile.secondary.clone(),
            phrases,
            narration: mix.narration.clone(),
            audio: mix.audio.clone(),
            transitions: applied,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let timeline = state
            .timeline
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Timeline not assembled"))?;

        let g = timeline.duration;
        if let Some(exit) = timeline.transitions.exit {
            if (exit.end() - g).abs() > 1e-6 {
                return Err(StepError::invalid_output("Exit effect does not end the clip"));
            }
        }
        if (timeline.audio.duration - g).abs() > 1e-6 {
            return Err(StepError::invalid_output(
                "Audio and video durations disagree",
            ));
        }
        Ok(())
    }
}
