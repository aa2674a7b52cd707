//! Composition job description produced by the front end.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::JobStatus;
use super::media::MediaItem;

/// Everything a front end resolves before the core runs.
///
/// Built once by the loader; the pipeline never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionSpec {
    /// Items of the primary (top or full-frame) track, in order.
    pub primary: Vec<MediaItem>,
    /// Items of the optional secondary (bottom) track.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary: Vec<MediaItem>,
    /// Narration script text, if narration is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Background music file and its duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicInput>,
    /// Final output file.
    pub output: PathBuf,
}

impl CompositionSpec {
    /// Create a spec with a primary track and output path.
    pub fn new(primary: Vec<MediaItem>, output: impl Into<PathBuf>) -> Self {
        Self {
            primary,
            output: output.into(),
            ..Default::default()
        }
    }

    /// Add a secondary (bottom) track.
    pub fn with_secondary(mut self, items: Vec<MediaItem>) -> Self {
        self.secondary = items;
        self
    }

    /// Add a narration script.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Add background music.
    pub fn with_music(mut self, path: impl Into<PathBuf>, duration: f64) -> Self {
        self.music = Some(MusicInput {
            path: path.into(),
            duration,
        });
        self
    }

    /// Whether narration was requested.
    pub fn has_narration(&self) -> bool {
        self.script
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    /// Derive a job name from the output file stem.
    pub fn job_name(&self) -> String {
        self.output
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "short".to_string())
    }
}

/// Background music input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicInput {
    pub path: PathBuf,
    pub duration: f64,
}

/// Outcome of one composition run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_name: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Governing duration of the rendered timeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    /// A successfully rendered composition.
    pub fn rendered(job_name: impl Into<String>, output_path: PathBuf, duration: f64) -> Self {
        Self {
            job_name: job_name.into(),
            status: JobStatus::Rendered,
            output_path: Some(output_path),
            duration: Some(duration),
            error: None,
        }
    }

    /// A failed composition.
    pub fn failed(job_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            status: JobStatus::Failed,
            output_path: None,
            duration: None,
            error: Some(error.into()),
        }
    }

    /// Whether the output was rendered.
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Rendered
    }
}
