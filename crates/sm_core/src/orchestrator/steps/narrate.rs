//! Narrate step - splits the script into phrases and measures speech.
//!
//! Each phrase is synthesized on its own for a duration estimate, then the
//! whole script is synthesized once as the narration that actually plays.
//! A speed other than 1 tempo-shifts that narration.

use crate::error::ComposeError;
use crate::narration::{clean_script, split_phrases, SpeechEstimator};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, NarrationOutput, StepOutcome};

/// Synthesizes narration and per-phrase estimates.
pub struct NarrateStep;

impl NarrateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NarrateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for NarrateStep {
    fn name(&self) -> &str {
        "Narrate"
    }

    fn description(&self) -> &str {
        "Synthesize narration and estimate phrase durations"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.artifacts.is_released() {
            return Err(StepError::precondition_failed(
                "Artifact directory already released",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let script = match ctx.spec.script.as_deref() {
            Some(s) if ctx.spec.has_narration() => s,
            _ => return Ok(StepOutcome::Skipped("No narration script".to_string())),
        };

        let n = &ctx.settings.narration;
        let cleaned = clean_script(script);
        let texts = split_phrases(&cleaned, n.max_phrase_chars);

        if texts.is_empty() {
            if ctx.subtitles_enabled() {
                return Err(ComposeError::configuration("No text available for subtitles").into());
            }
            return Ok(StepOutcome::Skipped(
                "Script has no speakable text".to_string(),
            ));
        }

        ctx.logger.info(&format!(
            "Split script into {} phrase(s) of at most {} characters",
            texts.len(),
            n.max_phrase_chars
        ));

        let tts = ctx.engines.tts.as_ref();
        let estimator = SpeechEstimator::new(tts, &ctx.artifacts, &n.language, n.slow_voice);
        let estimate = estimator.estimate_with_progress(&texts, |done, total| {
            let percent = (done * 100 / total.max(1)) as u32;
            ctx.logger.progress(percent);
            ctx.report_progress(
                self.name(),
                percent,
                &format!("Synthesized phrase {}/{}", done, total),
            );
        })?;

        for index in &estimate.failed {
            ctx.logger
                .warn(&format!("Phrase {} could not be synthesized; timed as 0s", index + 1));
        }
        ctx.logger
            .timing("Estimated phrases", estimate.estimated_total());
        ctx.logger
            .timing("Full narration", estimate.narration.duration);

        let audio = estimator.apply_speed(&estimate.narration, n.speed)?;
        if (n.speed - 1.0).abs() > f64::EPSILON {
            ctx.logger.info(&format!(
                "Narration at {}x: {:.3}s",
                n.speed, audio.duration
            ));
        }

        state.narration = Some(NarrationOutput {
            raw_duration: estimate.narration.duration,
            phrases: estimate.phrases,
            audio,
            failed: estimate.failed,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let narration = state
            .narration
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Narration not recorded"))?;

        if !narration.audio.path.exists() {
            return Err(StepError::invalid_output(format!(
                "Narration audio missing: {}",
                narration.audio.path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FakeRenderer, FakeTts};
    use crate::orchestrator::test_support::TestRun;

    #[test]
    fn skipped_without_script() {
        let run = TestRun::new();
        let ctx = run.context(run.spec());
        let mut state = JobState::new("n");

        let outcome = NarrateStep::new().execute(&ctx, &mut state).unwrap();
        assert!(matches!(outcome, StepOutcome::Skipped(_)));
        assert!(state.narration.is_none());
    }

    #[test]
    fn records_phrases_and_speed_adjusted_audio() {
        let mut run = TestRun::new();
        run.settings.narration.speed = 2.0;
        let ctx = run.context(run.spec().with_script("Hello there. This is a test."));
        let mut state = JobState::new("n");

        NarrateStep::new().execute(&ctx, &mut state).unwrap();
        NarrateStep::new().validate_output(&ctx, &state).unwrap();

        let narration = state.narration.unwrap();
        assert!(!narration.phrases.is_empty());
        assert!(narration.failed.is_empty());
        assert!((narration.audio.duration - narration.raw_duration / 2.0).abs() < 1e-9);
    }

    #[test]
    fn symbols_only_script_with_subtitles_is_configuration_error() {
        let run = TestRun::new();
        let ctx = run.context(run.spec().with_script("$$$ {} ###"));
        let mut state = JobState::new("n");

        let err = NarrateStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::Compose(ComposeError::Configuration(_))));
    }

    #[test]
    fn failed_full_synthesis_aborts() {
        let tts = FakeTts::new(0.1).with("Short one.", None);
        let run = TestRun::with_engines(tts, FakeRenderer::default());
        let ctx = run.context(run.spec().with_script("Short one."));
        let mut state = JobState::new("n");

        let err = NarrateStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::Compose(ComposeError::NoNarrationTiming(_))));
    }
}
