//! Sequential step runner with a cancel flag checked between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::errors::{PipelineError, PipelineResult, StepResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Ordered list of composition steps.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Handle that stops the run before the next step starts.
    ///
    /// A step already executing (a render, a TTS call) runs to completion.
    /// A cancel stops one run: the flag clears when it takes effect and
    /// when a run finishes, so a later `run` starts fresh.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step against `ctx`, recording results into `state`.
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult::default();
        let total = self.steps.len().max(1) as f64;

        for (i, step) in self.steps.iter().enumerate() {
            let name = step.name();
            if self.cancelled.swap(false, Ordering::SeqCst) {
                ctx.logger
                    .warn(&format!("Cancelled before step '{}'", name));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            ctx.logger.phase(name);
            ctx.report_progress(name, (i as f64 / total * 100.0) as u32, step.description());

            let started = Instant::now();
            match run_step(step.as_ref(), ctx, state) {
                Ok(StepOutcome::Success) => {
                    ctx.logger.timing(name, started.elapsed().as_secs_f64());
                    ctx.logger.success(&format!("{} done", name));
                    result.steps_completed.push(name.to_string());
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    ctx.logger.info(&format!("{} skipped: {}", name, reason));
                    result.steps_skipped.push(name.to_string());
                }
                Err(e) => {
                    ctx.logger.error(&format!("{}: {}", name, e));
                    self.cancelled.store(false, Ordering::SeqCst);
                    return Err(PipelineError::step_failed(&ctx.job_name, name, e));
                }
            }
        }

        self.cancelled.store(false, Ordering::SeqCst);
        ctx.report_progress("Complete", 100, "Composition finished");
        Ok(result)
    }
}

/// Validate, execute, and validate again.
fn run_step(step: &dyn PipelineStep, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
    ctx.logger.debug(&format!("Checking inputs for {}", step.name()));
    step.validate_input(ctx)?;

    let outcome = step.execute(ctx, state)?;
    if outcome == StepOutcome::Success {
        step.validate_output(ctx, state)?;
    }
    Ok(outcome)
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared cancel flag for a `Pipeline`.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Names of the steps that ran, by outcome.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}
