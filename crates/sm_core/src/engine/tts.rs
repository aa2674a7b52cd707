//! Google TTS via `gtts-cli`, with tempo changes through ffmpeg `atempo`.

use std::ffi::OsStr;
use std::path::Path;

use super::probe::FfprobeProbe;
use super::process::ToolRunner;
use super::{MediaProbe, SynthesizedAudio, TtsEngine};
use crate::error::{ComposeError, ComposeResult};

/// Range a single `atempo` filter accepts.
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Build an `atempo` filter chain for an arbitrary positive factor.
///
/// Factors outside [0.5, 2.0] are split into several stages whose product
/// equals the requested factor.
pub fn atempo_chain(factor: f64) -> ComposeResult<String> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ComposeError::configuration(format!(
            "Speed factor must be greater than 0, got {}",
            factor
        )));
    }

    let mut stages = Vec::new();
    let mut remaining = factor;
    while remaining > ATEMPO_MAX {
        stages.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        stages.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    stages.push(remaining);

    Ok(stages
        .iter()
        .map(|s| format!("atempo={}", s))
        .collect::<Vec<_>>()
        .join(","))
}

/// Arguments for one `gtts-cli` call.
///
/// The text goes last, after `--`, so phrases starting with a dash
/// ("- Hello", "-5 degrees") are not parsed as options.
fn synthesis_args<'a>(text: &'a str, language: &'a str, slow: bool, out: &'a Path) -> Vec<&'a OsStr> {
    let mut args: Vec<&OsStr> = vec![OsStr::new("--lang"), OsStr::new(language)];
    if slow {
        args.push(OsStr::new("--slow"));
    }
    args.push(OsStr::new("--output"));
    args.push(out.as_os_str());
    args.push(OsStr::new("--"));
    args.push(OsStr::new(text));
    args
}

/// `TtsEngine` backed by the gtts-cli command-line tool.
#[derive(Debug, Clone)]
pub struct GttsEngine {
    tts: ToolRunner,
    ffmpeg: ToolRunner,
    probe: FfprobeProbe,
}

impl GttsEngine {
    pub fn new(
        tts_command: impl Into<String>,
        ffmpeg_path: impl Into<String>,
        ffprobe_path: impl Into<String>,
    ) -> Self {
        Self {
            tts: ToolRunner::new(tts_command),
            ffmpeg: ToolRunner::new(ffmpeg_path),
            probe: FfprobeProbe::new(ffprobe_path),
        }
    }

    fn measure(&self, path: &Path) -> ComposeResult<f64> {
        self.probe
            .probe(path)?
            .duration
            .ok_or_else(|| ComposeError::Probe {
                path: path.to_path_buf(),
                message: "no duration reported".to_string(),
            })
    }
}

impl TtsEngine for GttsEngine {
    fn name(&self) -> &str {
        "gtts"
    }

    fn synthesize(
        &self,
        text: &str,
        language: &str,
        slow: bool,
        out: &Path,
    ) -> ComposeResult<SynthesizedAudio> {
        let args = synthesis_args(text, language, slow, out);
        self.tts
            .run_checked(&args, |message| ComposeError::synthesis(text, message))?;

        let duration = self
            .measure(out)
            .map_err(|e| ComposeError::synthesis(text, e.to_string()))?;

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
        let chain = atempo_chain(factor)?;
        let args: [&OsStr; 7] = [
            OsStr::new("-y"),
            OsStr::new("-i"),
            audio.path.as_os_str(),
            OsStr::new("-filter:a"),
            OsStr::new(&chain),
            OsStr::new("-vn"),
            out.as_os_str(),
        ];

        self.ffmpeg.run_checked(args, |message| {
            ComposeError::render(format!("speed adjustment x{} failed: {}", factor, message))
        })?;

        Ok(SynthesizedAudio {
            path: out.to_path_buf(),
            duration: self.measure(out)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_within_range_is_single_stage() {
        assert_eq!(atempo_chain(1.0).unwrap(), "atempo=1");
        assert_eq!(atempo_chain(1.25).unwrap(), "atempo=1.25");
        assert_eq!(atempo_chain(0.5).unwrap(), "atempo=0.5");
    }

    #[test]
    fn chain_splits_large_factors() {
        assert_eq!(atempo_chain(3.0).unwrap(), "atempo=2,atempo=1.5");
        assert_eq!(atempo_chain(8.0).unwrap(), "atempo=2,atempo=2,atempo=2");
    }

    #[test]
    fn chain_splits_small_factors() {
        assert_eq!(atempo_chain(0.25).unwrap(), "atempo=0.5,atempo=0.5");
    }

    #[test]
    fn dash_leading_text_follows_option_terminator() {
        let out = Path::new("/tmp/phrase_0.mp3");
        let args = synthesis_args("-5 degrees today.", "en", true, out);
        assert_eq!(
            args,
            vec![
                OsStr::new("--lang"),
                OsStr::new("en"),
                OsStr::new("--slow"),
                OsStr::new("--output"),
                out.as_os_str(),
                OsStr::new("--"),
                OsStr::new("-5 degrees today."),
            ]
        );

        let plain = synthesis_args("- Hello there.", "pl", false, out);
        assert_eq!(plain[plain.len() - 2..], [OsStr::new("--"), OsStr::new("- Hello there.")]);
        assert!(!plain.contains(&OsStr::new("--slow")));
    }

    #[cfg(unix)]
    #[test]
    fn dash_leading_text_reaches_the_tool_as_text() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-gtts");
        let seen = dir.path().join("seen.txt");
        // Rejects option-looking positionals the way a click CLI does.
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nwhile [ \"$1\" != \"--\" ]; do\n  case \"$1\" in --lang|--output) shift 2 ;; --slow) shift ;; *) exit 2 ;; esac\ndone\nshift\nprintf '%s' \"$1\" > '{}'\n",
                seen.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tts = ToolRunner::new(script.display().to_string());
        let out = dir.path().join("phrase.mp3");
        let output = tts
            .run(synthesis_args("- Hello there.", "en", false, &out))
            .unwrap();
        assert!(output.success(), "stderr: {}", output.stderr);
        assert_eq!(std::fs::read_to_string(&seen).unwrap(), "- Hello there.");
    }

    #[test]
    fn chain_rejects_non_positive() {
        assert!(matches!(
            atempo_chain(0.0),
            Err(ComposeError::Configuration(_))
        ));
        assert!(atempo_chain(-1.0).is_err());
        assert!(atempo_chain(f64::NAN).is_err());
    }
}
