//! Sequence step - lays loaded media items out into visual tracks.
//!
//! Builds the primary track and, when secondary items are present, the
//! bottom track of the stacked layout. Tracks are provisional here; they are
//! bound to the governing duration by the Reconcile step.

use crate::models::TrackSlot;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, SequenceOutput, StepOutcome};
use crate::sequencer::Sequencer;

/// Builds visual tracks from the composition's media items.
pub struct SequenceStep;

impl SequenceStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequenceStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SequenceStep {
    fn name(&self) -> &str {
        "Sequence"
    }

    fn description(&self) -> &str {
        "Lay media items out into visual tracks"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let items = ctx.spec.primary.iter().chain(ctx.spec.secondary.iter());
        for item in items {
            if item.path.as_os_str().is_empty() {
                return Err(StepError::invalid_input("Media item has an empty path"));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let sequencer = Sequencer::new(ctx.settings.media.item_transition_spec());

        let primary = sequencer.build(TrackSlot::Primary, ctx.spec.primary.clone())?;
        ctx.logger.info(&format!(
            "Primary track: {} item(s), {:.3}s{}",
            primary.len(),
            primary.duration,
            if primary.is_provisional() {
                " (provisional)"
            } else {
                ""
            }
        ));

        let secondary = if ctx.spec.secondary.is_empty() {
            None
        } else {
            let track = sequencer.build(TrackSlot::Secondary, ctx.spec.secondary.clone())?;
            ctx.logger.info(&format!(
                "Secondary track: {} item(s), {:.3}s",
                track.len(),
                track.duration
            ));
            Some(track)
        };

        state.sequence = Some(SequenceOutput { primary, secondary });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let sequence = state
            .sequence
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Tracks not recorded"))?;

        if sequence.primary.duration <= 0.0 {
            return Err(StepError::invalid_output("Primary track has no duration"));
        }
        Ok(())
    }
}
