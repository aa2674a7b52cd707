//! Mix step - describes the composite audio over the governing duration.

use crate::mixer::AudioMixer;
use crate::models::NarrationTrack;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, MixOutput, StepOutcome};

/// Layers original sound, narration and music.
pub struct MixStep;

impl MixStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MixStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MixStep {
    fn name(&self) -> &str {
        "Mix"
    }

    fn description(&self) -> &str {
        "Layer narration, music and original audio"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if let Some(music) = &ctx.spec.music {
            if !music.path.exists() {
                return Err(StepError::invalid_input(format!(
                    "Music file not found: {}",
                    music.path.display()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let reconcile = state
            .reconcile
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Reconcile step has not run"))?;

        let narration = match (state.narration.as_ref(), reconcile.reconciliation.as_ref()) {
            (Some(n), Some(r)) => Some(NarrationTrack {
                path: n.audio.path.clone(),
                duration: r.narration_duration,
                fit: r.narration_fit,
            }),
            _ => None,
        };

        let mixer = AudioMixer::new(&ctx.settings.audio)?;
        let audio = mixer.mix(
            reconcile.governing,
            &reconcile.primary,
            narration.as_ref(),
            ctx.spec.music.as_ref(),
        )?;

        if audio.is_silent() {
            ctx.logger.info("No audio sources; output will be silent");
        }
        for layer in &audio.layers {
            let ducked = layer
                .duck
                .map(|d| format!(", ducked to {:.0}% for {:.3}s", d.factor * 100.0, d.len()))
                .unwrap_or_default();
            ctx.logger.info(&format!(
                "Audio layer {}: volume {:.2}, {:?}{}",
                layer.source.kind, layer.source.volume, layer.fit, ducked
            ));
        }

        state.mix = Some(MixOutput { audio, narration });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let mix = state
            .mix
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Mix not recorded"))?;
        let governing = state.governing().unwrap_or(mix.audio.duration);

        if (mix.audio.duration - governing).abs() > 1e-6 {
            return Err(StepError::invalid_output(format!(
                "Composite audio lasts {:.3}s, timeline lasts {:.3}s",
                mix.audio.duration, governing
            )));
        }
        Ok(())
    }
}
