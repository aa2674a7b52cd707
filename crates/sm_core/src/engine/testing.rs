//! In-process engines for unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use super::{RenderEngine, RenderOutput, RenderRequest, SynthesizedAudio, TtsEngine};
use crate::error::{ComposeError, ComposeResult};

/// TTS whose durations are proportional to text length.
pub(crate) struct FakeTts {
    pub secs_per_char: f64,
    /// Exact durations for specific texts; `None` makes that text fail.
    pub overrides: HashMap<String, Option<f64>>,
    pub fail_tempo: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTts {
    pub fn new(secs_per_char: f64) -> Self {
        Self {
            secs_per_char,
            overrides: HashMap::new(),
            fail_tempo: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, text: &str, duration: Option<f64>) -> Self {
        self.overrides.insert(text.to_string(), duration);
        self
    }
}

impl TtsEngine for FakeTts {
    fn name(&self) -> &str {
        "fake-tts"
    }

    fn synthesize(
        &self,
        text: &str,
        _language: &str,
        _slow: bool,
        out: &Path,
    ) -> ComposeResult<SynthesizedAudio> {
        self.calls.lock().push(text.to_string());
        let duration = match self.overrides.get(text) {
            Some(Some(d)) => *d,
            Some(None) => return Err(ComposeError::synthesis(text, "engine unavailable")),
            None => text.chars().count() as f64 * self.secs_per_char,
        };
        fs::write(out, b"fake audio").map_err(|e| ComposeError::io("writing fake audio", e))?;
        Ok(SynthesizedAudio {
            path: out.to_path_buf(),
            duration,
        })
    }

    fn change_tempo(
        &self,
        audio: &SynthesizedAudio,
        factor: f64,
        out: &Path,
    ) -> ComposeResult<SynthesizedAudio> {
        if self.fail_tempo {
            return Err(ComposeError::render("tempo filter failed"));
        }
        fs::write(out, b"fake audio").map_err(|e| ComposeError::io("writing fake audio", e))?;
        Ok(SynthesizedAudio {
            path: out.to_path_buf(),
            duration: audio.duration / factor,
        })
    }
}

/// Renderer that records requests and writes an empty output file.
#[derive(Default)]
pub(crate) struct FakeRenderer {
    /// Fail with a transition error while motion effects are present.
    pub fail_motion: bool,
    /// Fail every render.
    pub fail_always: bool,
    pub requests: Mutex<Vec<RenderRequest>>,
}

impl RenderEngine for FakeRenderer {
    fn name(&self) -> &str {
        "fake-render"
    }

    fn render(&self, request: &RenderRequest) -> ComposeResult<RenderOutput> {
        self.requests.lock().push(request.clone());

        if self.fail_always {
            return Err(ComposeError::render("encoder crashed"));
        }
        if self.fail_motion && request.timeline.transitions.has_motion() {
            return Err(ComposeError::TransitionRender {
                kind: "motion".to_string(),
                message: "overlay failed".to_string(),
            });
        }

        if let Some(parent) = request.output.parent() {
            fs::create_dir_all(parent).map_err(|e| ComposeError::io("creating output dir", e))?;
        }
        fs::write(&request.output, b"fake video")
            .map_err(|e| ComposeError::io("writing fake output", e))?;
        Ok(RenderOutput {
            output_path: request.output.clone(),
            command: "fake-render".to_string(),
        })
    }
}
