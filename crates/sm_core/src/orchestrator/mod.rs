//! Pipeline orchestrator for composition runs.
//!
//! A run is a fixed sequence of steps sharing a read-only `Context` and a
//! write-once `JobState`. Each step validates its input, executes, and
//! records its output for the steps after it.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Sequence     (media items → provisional tracks)
//!     ├── Step: Narrate      (script → phrases, estimates, narration audio)
//!     ├── Step: Reconcile    (governing duration, phrase spans, fitted tracks)
//!     ├── Step: Mix          (composite audio)
//!     ├── Step: Transitions  (entrance/exit effects, final timeline)
//!     └── Step: Render       (subtitles, render, fade fallback)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sm_core::orchestrator::{create_standard_pipeline, Context, JobState};
//!
//! let pipeline = create_standard_pipeline();
//! let ctx = Context::new(spec, settings, "my_short", logger, engines, artifacts);
//! let mut state = JobState::new("my_short");
//!
//! let result = pipeline.run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod composer;
mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

#[cfg(test)]
mod test_support;

pub use composer::{ComposeOptions, Composer};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{MixStep, NarrateStep, ReconcileStep, RenderStep, SequenceStep, TransitionsStep};
pub use types::{
    Context, Engines, JobState, MixOutput, NarrationOutput, ProgressCallback, ReconcileOutput,
    RenderedOutput, SequenceOutput, StepOutcome,
};

/// Create the standard composition pipeline.
///
/// 1. Sequence - build visual tracks from media items
/// 2. Narrate - synthesize narration, estimate phrase durations
/// 3. Reconcile - choose the governing duration, fit tracks to it
/// 4. Mix - layer original audio, narration and music
/// 5. Transitions - place entrance/exit effects, assemble the timeline
/// 6. Render - burn subtitles and encode the output
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(SequenceStep::new())
        .with_step(NarrateStep::new())
        .with_step(ReconcileStep::new())
        .with_step(MixStep::new())
        .with_step(TransitionsStep::new())
        .with_step(RenderStep::new())
}
