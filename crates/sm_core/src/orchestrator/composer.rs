//! Composer: runs one composition request through the standard pipeline.
//!
//! Owns the per-run setup the steps rely on: settings validation, the run
//! logger, and the scoped artifact directory. Artifacts are released on
//! every exit path.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::logging::{LogCallback, LogConfig, RunLogger};
use crate::models::{CompositionSpec, JobResult};
use crate::narration::ArtifactStore;

use super::create_standard_pipeline;
use super::errors::{PipelineError, PipelineResult};
use super::pipeline::{CancelHandle, Pipeline};
use super::types::{Context, Engines, JobState, ProgressCallback};

/// Optional per-run hooks and outputs.
#[derive(Default)]
pub struct ComposeOptions {
    /// Also write phrase spans as SRT here.
    pub srt_output: Option<PathBuf>,
    pub log_callback: Option<LogCallback>,
    pub progress_callback: Option<ProgressCallback>,
    /// Use a verbose run log.
    pub verbose: bool,
}

/// Runs composition requests.
///
/// # Example
///
/// ```ignore
/// let composer = Composer::new(settings, engines);
/// let result = composer.compose(spec, ComposeOptions::default());
/// ```
pub struct Composer {
    settings: Settings,
    engines: Engines,
    log_dir: PathBuf,
    temp_root: PathBuf,
    pipeline: Pipeline,
}

impl Composer {
    /// Create a composer using the folders from `settings.paths`.
    pub fn new(settings: Settings, engines: Engines) -> Self {
        let log_dir = PathBuf::from(&settings.paths.logs_folder);
        let temp_root = PathBuf::from(&settings.paths.temp_root);
        Self {
            settings,
            engines,
            log_dir,
            temp_root,
            pipeline: create_standard_pipeline(),
        }
    }

    /// Override the log folder.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Override the artifact root.
    pub fn with_temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_root = dir.into();
        self
    }

    /// Handle that stops the current (or next) run at a step boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.pipeline.cancel_handle()
    }

    /// Compose one short and summarize the outcome.
    pub fn compose(&self, spec: CompositionSpec, options: ComposeOptions) -> JobResult {
        let job_name = spec.job_name();
        match self.run(spec, options) {
            Ok(state) => {
                let output_path = state
                    .render
                    .as_ref()
                    .map(|r| r.output_path.clone())
                    .unwrap_or_default();
                JobResult::rendered(job_name, output_path, state.governing().unwrap_or(0.0))
            }
            Err(e) => JobResult::failed(job_name, e.to_string()),
        }
    }

    /// Compose one short, returning the full job state.
    pub fn run(&self, spec: CompositionSpec, options: ComposeOptions) -> PipelineResult<JobState> {
        let job_name = spec.job_name();

        self.settings
            .validate()
            .map_err(|e| PipelineError::validation_failed(&job_name, e.to_string()))?;

        let log_config = if options.verbose {
            LogConfig::debug()
        } else {
            LogConfig::from_settings(&self.settings.logging)
        };
        let logger = RunLogger::new(&job_name, &self.log_dir, log_config, options.log_callback)
            .map(Arc::new)
            .map_err(|e| {
                PipelineError::setup_failed(&job_name, format!("Failed to create logger: {}", e))
            })?;

        let artifacts = ArtifactStore::new_in(&self.temp_root, &job_name).map_err(|e| {
            PipelineError::setup_failed(
                &job_name,
                format!("Failed to create artifact directory: {}", e),
            )
        })?;

        logger.info(&format!("Starting job: {}", job_name));
        logger.info(&format!(
            "Primary: {} item(s), secondary: {} item(s), narration: {}, music: {}",
            spec.primary.len(),
            spec.secondary.len(),
            if spec.has_narration() { "yes" } else { "no" },
            if spec.music.is_some() { "yes" } else { "no" }
        ));

        let mut ctx = Context::new(
            spec,
            self.settings.clone(),
            &job_name,
            Arc::clone(&logger),
            self.engines.clone(),
            artifacts,
        );
        if let Some(path) = options.srt_output {
            ctx = ctx.with_srt_output(path);
        }
        if let Some(callback) = options.progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = JobState::new(&job_name);
        let outcome = self.pipeline.run(&ctx, &mut state);

        if let Err(e) = ctx.artifacts.release() {
            logger.warn(&format!("Could not remove temporary files: {}", e));
        }

        let result = match outcome {
            Ok(run) => {
                if let Some(render) = &state.render {
                    logger.info(&format!(
                        "Job completed: {} ({} step(s), {} skipped)",
                        render.output_path.display(),
                        run.steps_completed.len(),
                        run.steps_skipped.len()
                    ));
                }
                Ok(state)
            }
            Err(e) => {
                match e.failed_step() {
                    Some(step) => logger.error(&format!("Step '{}' failed: {}", step, e)),
                    None => logger.error(&format!("Job stopped: {}", e)),
                }
                logger.show_tail("Recent tool output");
                Err(e)
            }
        };
        logger.close();
        result
    }
}
