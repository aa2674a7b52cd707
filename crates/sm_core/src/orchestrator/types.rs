//! Context, job state and per-step outputs shared by the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::engine::{RenderEngine, SynthesizedAudio, TtsEngine};
use crate::logging::RunLogger;
use crate::models::{
    AppliedTransitions, CompositeAudio, CompositionSpec, FittedTrack, NarrationTrack, Phrase,
    Timeline, Track,
};
use crate::narration::ArtifactStore;
use crate::reconcile::Reconciliation;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// External engines a run drives.
#[derive(Clone)]
pub struct Engines {
    pub tts: Arc<dyn TtsEngine>,
    pub renderer: Arc<dyn RenderEngine>,
}

/// Read-only context passed to pipeline steps.
///
/// Contains the composition request and shared resources that steps can
/// read but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// What to compose.
    pub spec: CompositionSpec,
    /// Application settings.
    pub settings: Settings,
    /// Job name/identifier.
    pub job_name: String,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    pub engines: Engines,
    /// Scoped temporary files of this run.
    pub artifacts: ArtifactStore,
    /// Where to export phrase spans as SRT, if requested.
    pub srt_output: Option<PathBuf>,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a run.
    pub fn new(
        spec: CompositionSpec,
        settings: Settings,
        job_name: impl Into<String>,
        logger: Arc<RunLogger>,
        engines: Engines,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            spec,
            settings,
            job_name: job_name.into(),
            logger,
            engines,
            artifacts,
            srt_output: None,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Export an SRT sidecar next to the render.
    pub fn with_srt_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.srt_output = Some(path.into());
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Whether burned-in subtitles are wanted.
    pub fn subtitles_enabled(&self) -> bool {
        self.settings.narration.subtitles
    }
}

/// Results recorded by the steps of one run.
///
/// Each step fills its own slot once; later steps only read earlier slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<SequenceOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<NarrationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconcile: Option<ReconcileOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix: Option<MixOutput>,
    /// Assembled timeline (from Transitions step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderedOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Governing duration, once reconciled.
    pub fn governing(&self) -> Option<f64> {
        self.reconcile.as_ref().map(|r| r.governing)
    }
}

/// Output from the Sequence step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceOutput {
    pub primary: Track,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Track>,
}

/// Output from the Narrate step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationOutput {
    /// Phrases with per-phrase estimates (normal speed).
    pub phrases: Vec<Phrase>,
    /// Length of the full synthesis at normal speed.
    pub raw_duration: f64,
    /// Narration audio actually played (tempo-shifted when speed ≠ 1).
    pub audio: SynthesizedAudio,
    /// Indices of phrases whose synthesis failed.
    pub failed: Vec<usize>,
}

/// Output from the Reconcile step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutput {
    pub governing: f64,
    /// Present only when there is narration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<Reconciliation>,
    pub primary: FittedTrack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<FittedTrack>,
}

/// Output from the Mix step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixOutput {
    pub audio: CompositeAudio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<NarrationTrack>,
}

/// Output from the Render step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedOutput {
    pub output_path: PathBuf,
    /// Command that produced the output.
    pub command: String,
    /// Effects actually rendered.
    pub transitions: AppliedTransitions,
    /// Whether motion effects were replaced by fades.
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srt_path: Option<PathBuf>,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (nothing to do, not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_serializes() {
        let state = JobState::new("test-456");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"test-456\""));
        assert!(!json.contains("reconcile"));
        assert!(state.governing().is_none());
    }
}
