//! The `PipelineStep` trait implemented by every composition phase.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// One phase of a composition run.
///
/// For each step the pipeline calls `validate_input`, then `execute`, then
/// (only when `execute` returned `Success`) `validate_output`. A step reads
/// earlier results from `JobState` and writes its own slot exactly once.
///
/// ```ignore
/// impl PipelineStep for MixStep {
///     fn name(&self) -> &str { "Mix" }
///
///     fn validate_input(&self, _ctx: &Context) -> StepResult<()> { Ok(()) }
///
///     fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
///         state.mix = Some(/* composite audio */);
///         Ok(StepOutcome::Success)
///     }
///
///     fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
///         state.mix.as_ref().map(|_| ()).ok_or_else(|| StepError::invalid_output("no mix"))
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Short name used in logs and error context.
    fn name(&self) -> &str;

    /// Check that everything this step reads is present.
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Do the work. `Skipped` means there was nothing to do.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    /// Check what `execute` recorded.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Progress message shown while the step runs.
    fn description(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::TestRun;

    /// Skips when the composition has no script.
    struct ScriptOnly;

    impl PipelineStep for ScriptOnly {
        fn name(&self) -> &str {
            "ScriptOnly"
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            if ctx.spec.has_narration() {
                Ok(StepOutcome::Success)
            } else {
                Ok(StepOutcome::Skipped("no script".to_string()))
            }
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn defaults_and_dynamic_dispatch() {
        let step: Box<dyn PipelineStep> = Box::new(ScriptOnly);
        assert_eq!(step.description(), "ScriptOnly");

        let run = TestRun::new();
        let mut state = JobState::new("step");

        let silent = run.context(run.spec());
        assert_eq!(
            step.execute(&silent, &mut state).unwrap(),
            StepOutcome::Skipped("no script".to_string())
        );

        let narrated = run.context(run.spec().with_script("Hello."));
        assert_eq!(step.execute(&narrated, &mut state).unwrap(), StepOutcome::Success);
    }
}
