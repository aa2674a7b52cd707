//! External engines the composition core drives.
//!
//! The core never decodes or encodes media itself. It talks to three
//! collaborators through these traits:
//! - `TtsEngine`: speech synthesis and tempo change
//! - `MediaProbe`: duration, dimensions and stream discovery
//! - `RenderEngine`: the final composite render/encode
//!
//! Command-line backed implementations live in the submodules; tests swap in
//! in-process fakes.

mod ffmpeg;
mod probe;
mod process;
mod tts;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{OutputSettings, SubtitleSettings};
use crate::error::ComposeResult;
use crate::models::Timeline;

pub use ffmpeg::{FfmpegRenderer, FilterGraph};
pub use probe::{FfprobeProbe, ProbeInfo};
pub use process::{CommandOutput, ToolRunner};
pub use tts::{atempo_chain, GttsEngine};

/// Synthesized (or tempo-shifted) audio on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedAudio {
    pub path: PathBuf,
    /// Measured length in seconds.
    pub duration: f64,
}

/// Text-to-speech engine.
pub trait TtsEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Synthesize `text` into `out` and measure the result.
    fn synthesize(
        &self,
        text: &str,
        language: &str,
        slow: bool,
        out: &Path,
    ) -> ComposeResult<SynthesizedAudio>;

    /// Change tempo by `factor` without changing pitch.
    fn change_tempo(
        &self,
        audio: &SynthesizedAudio,
        factor: f64,
        out: &Path,
    ) -> ComposeResult<SynthesizedAudio>;
}

/// Media inspection.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path) -> ComposeResult<ProbeInfo>;
}

/// Everything the render engine needs for one output file.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub timeline: Timeline,
    pub output: PathBuf,
    /// Styled subtitle script to burn in, if any.
    pub subtitles: Option<PathBuf>,
    pub encode: OutputSettings,
    pub subtitle_style: SubtitleSettings,
}

/// Result of a successful render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub output_path: PathBuf,
    /// Command line that produced the file.
    pub command: String,
}

/// Render/compositing engine.
pub trait RenderEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Render the timeline to `request.output`.
    ///
    /// Returns `ComposeError::TransitionRender` when the failure is
    /// attributable to an entrance/exit effect.
    fn render(&self, request: &RenderRequest) -> ComposeResult<RenderOutput>;
}
