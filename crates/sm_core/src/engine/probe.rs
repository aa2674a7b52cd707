//! Media probing using `ffprobe -print_format json`.

use std::ffi::OsStr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::process::ToolRunner;
use super::MediaProbe;
use crate::error::{ComposeError, ComposeResult};

/// What the core needs to know about a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeInfo {
    /// Container duration in seconds (None for still images).
    pub duration: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub has_video: bool,
    pub has_audio: bool,
}

/// `MediaProbe` backed by ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    runner: ToolRunner,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            runner: ToolRunner::new(ffprobe_path),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> ComposeResult<ProbeInfo> {
        if !path.exists() {
            return Err(ComposeError::Probe {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }

        tracing::debug!("Probing file: {}", path.display());

        let args: [&OsStr; 7] = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_format"),
            OsStr::new("-show_streams"),
            path.as_os_str(),
        ];
        let output = self.runner.run_checked(args, |message| ComposeError::Probe {
            path: path.to_path_buf(),
            message,
        })?;

        let json: Value = serde_json::from_str(&output.stdout).map_err(|e| ComposeError::Probe {
            path: path.to_path_buf(),
            message: format!("invalid ffprobe JSON: {}", e),
        })?;

        Ok(parse_probe_json(&json))
    }
}

/// Parse the JSON output of ffprobe.
pub(crate) fn parse_probe_json(json: &Value) -> ProbeInfo {
    let mut info = ProbeInfo::default();

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[]);

    for stream in streams {
        match stream.get("codec_type").and_then(|t| t.as_str()) {
            Some("video") if !info.has_video => {
                info.has_video = true;
                info.width = stream.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32;
                info.height = stream.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32;
            }
            Some("audio") => info.has_audio = true,
            _ => {}
        }
    }

    // ffprobe reports numbers as strings
    info.duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(number_field)
        .filter(|d| *d > 0.0);

    info
}

fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
