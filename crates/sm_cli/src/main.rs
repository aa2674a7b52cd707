//! Short Maker CLI - vertical shorts from media, narration and music.

mod loader;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::Parser;

use sm_core::config::{ConfigManager, Settings};
use sm_core::engine::{FfmpegRenderer, FfprobeProbe, GttsEngine};
use sm_core::logging::{init_tracing, LogLevel};
use sm_core::models::{CompositionSpec, GoverningMode, TransitionKind};
use sm_core::orchestrator::{ComposeOptions, Composer, Engines};

use loader::{read_script, MediaLoader};

/// Command-line arguments for short-maker.
#[derive(Parser, Debug)]
#[command(name = "short-maker")]
#[command(version)]
#[command(about = "Create vertical short videos with narration, subtitles and audio mixing")]
#[command(long_about = "Create vertical short videos with narration, subtitles and audio mixing.\n\n\
    Media arguments accept a file, a directory, or a semicolon-separated list.\n\n\
    EXAMPLES:\n    \
    short-maker top.mp4 bottom.mp4 -m music.mp3 -o output.mp4\n    \
    short-maker input.mp4 -t script.txt -l en -o narrated.mp4\n    \
    short-maker top.mp4 photos/ -t script.txt --duck-volume 40 --end-transition fade")]
struct Args {
    /// Top media (file, directory, or semicolon-separated list)
    top: String,

    /// Bottom media (optional)
    bottom: Option<String>,

    /// Background music file
    #[arg(short, long)]
    music: Option<PathBuf>,

    /// Output filename
    #[arg(short, long, default_value = "output.mp4")]
    output: PathBuf,

    /// Target resolution WIDTHxHEIGHT
    #[arg(short, long)]
    resolution: Option<String>,

    /// Music volume (0-100%)
    #[arg(long, visible_alias = "mv")]
    music_volume: Option<f64>,

    /// Include audio from the top media
    #[arg(short, long)]
    audio: bool,

    /// Original audio volume (0-100%)
    #[arg(long, visible_alias = "vv")]
    video_volume: Option<f64>,

    /// Text file for narration
    #[arg(short, long)]
    text: Option<PathBuf>,

    /// Narration language code
    #[arg(short, long)]
    lang: Option<String>,

    /// Disable subtitles
    #[arg(long, visible_alias = "ns")]
    no_subtitles: bool,

    /// Lower background audio during narration (0-100% volume)
    #[arg(long, num_args = 0..=1, default_missing_value = "50")]
    duck_volume: Option<f64>,

    /// Use the top media length instead of the narration length
    #[arg(long)]
    use_video_length: bool,

    /// Narration speed multiplier (0.5 = slower, 2.0 = faster)
    #[arg(short, long)]
    speed: Option<f64>,

    /// Entrance effect (fade, slide-left, slide-right, slide-up, slide-down, zoom-in, zoom-out)
    #[arg(long)]
    start_transition: Option<TransitionKind>,

    /// Exit effect
    #[arg(long)]
    end_transition: Option<TransitionKind>,

    /// Entrance/exit effect length in seconds (capped at 2s)
    #[arg(long)]
    transition_duration: Option<f64>,

    /// Transition between consecutive media items
    #[arg(long)]
    item_transition: Option<TransitionKind>,

    /// Inter-item transition length in seconds
    #[arg(long)]
    item_transition_duration: Option<f64>,

    /// Duration of each still image in seconds
    #[arg(long)]
    image_duration: Option<f64>,

    /// Also write subtitles to this SRT file
    #[arg(long)]
    srt: Option<PathBuf>,

    /// Config file (default: user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(r) = &self.resolution {
            settings.output.resolution = r.clone();
        }
        if let Some(v) = self.music_volume {
            settings.audio.music_volume = v;
        }
        if self.audio {
            settings.audio.include_original = true;
        }
        if let Some(v) = self.video_volume {
            settings.audio.original_volume = v;
        }
        if let Some(lang) = &self.lang {
            settings.narration.language = lang.clone();
        }
        if self.no_subtitles {
            settings.narration.subtitles = false;
        }
        if self.duck_volume.is_some() {
            settings.audio.duck_volume = self.duck_volume;
        }
        if self.use_video_length {
            settings.narration.mode = GoverningMode::UseMediaLength;
        }
        if let Some(s) = self.speed {
            settings.narration.speed = s;
        }
        if let Some(kind) = self.start_transition {
            settings.transitions.start = kind;
        }
        if let Some(kind) = self.end_transition {
            settings.transitions.end = kind;
        }
        if let Some(d) = self.transition_duration {
            settings.transitions.duration = d;
        }
        if let Some(kind) = self.item_transition {
            settings.media.item_transition = kind;
        }
        if let Some(d) = self.item_transition_duration {
            settings.media.item_transition_duration = d;
        }
        if let Some(d) = self.image_duration {
            settings.media.image_duration = d;
        }
    }

    /// Output path, relative names resolved against the output folder.
    fn output_path(&self, settings: &Settings) -> PathBuf {
        if self.output.is_absolute() {
            self.output.clone()
        } else {
            PathBuf::from(&settings.paths.output_folder).join(&self.output)
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("short-maker")
        .join("config.toml")
}

fn load_settings(args: &Args) -> Result<Settings> {
    let path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = ConfigManager::new(&path);
    config
        .load_or_create()
        .with_context(|| format!("loading config {}", path.display()))?;
    config
        .ensure_dirs_exist()
        .context("creating temp and log folders")?;

    let mut settings = config.into_settings();
    args.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn build_spec(args: &Args, settings: &Settings, probe: &FfprobeProbe) -> Result<CompositionSpec> {
    let loader = MediaLoader::new(probe, settings.media.image_duration);

    let primary = loader
        .load_track(&args.top)
        .with_context(|| format!("loading top media '{}'", args.top))?;
    let mut spec = CompositionSpec::new(primary, args.output_path(settings));

    if let Some(bottom) = &args.bottom {
        let secondary = loader
            .load_track(bottom)
            .with_context(|| format!("loading bottom media '{}'", bottom))?;
        spec = spec.with_secondary(secondary);
    }
    if let Some(text) = &args.text {
        spec = spec.with_script(read_script(text)?);
    }
    if let Some(music) = &args.music {
        spec.music = Some(loader.load_music(music)?);
    }
    Ok(spec)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    });

    let settings = load_settings(&args)?;
    let out = &settings.output;
    let probe = FfprobeProbe::new(&out.ffprobe_path);
    let spec = build_spec(&args, &settings, &probe)?;

    let engines = Engines {
        tts: Arc::new(GttsEngine::new(
            &settings.narration.tts_command,
            &out.ffmpeg_path,
            &out.ffprobe_path,
        )),
        renderer: Arc::new(FfmpegRenderer::new(&out.ffmpeg_path)),
    };

    let options = ComposeOptions {
        srt_output: args.srt.clone(),
        log_callback: Some(Box::new(|line: &str| println!("{}", line))),
        progress_callback: None,
        verbose: args.verbose,
    };

    let result = Composer::new(settings, engines).compose(spec, options);
    if !result.is_success() {
        bail!(result.error.unwrap_or_else(|| "composition failed".to_string()));
    }

    if let (Some(path), Some(duration)) = (&result.output_path, result.duration) {
        println!("Rendered {} ({:.2}s)", path.display(), duration);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_settings() {
        let args = Args::parse_from([
            "short-maker",
            "top.mp4",
            "-s",
            "1.5",
            "--duck-volume",
            "--use-video-length",
            "--end-transition",
            "slide-up",
            "--no-subtitles",
        ]);
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.narration.speed, 1.5);
        assert_eq!(settings.audio.duck_volume, Some(50.0));
        assert_eq!(settings.narration.mode, GoverningMode::UseMediaLength);
        assert_eq!(settings.transitions.end, TransitionKind::SlideUp);
        assert!(!settings.narration.subtitles);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn explicit_duck_volume_and_bottom_media() {
        let args = Args::parse_from([
            "short-maker",
            "top.mp4",
            "photos",
            "--duck-volume",
            "30",
            "-m",
            "music.mp3",
        ]);
        assert_eq!(args.bottom.as_deref(), Some("photos"));
        assert_eq!(args.duck_volume, Some(30.0));
        assert_eq!(args.music, Some(PathBuf::from("music.mp3")));
    }

    #[test]
    fn relative_output_uses_output_folder() {
        let args = Args::parse_from(["short-maker", "top.mp4", "-o", "clip.mp4"]);
        let mut settings = Settings::default();
        settings.paths.output_folder = "renders".to_string();
        assert_eq!(args.output_path(&settings), PathBuf::from("renders/clip.mp4"));
    }
}
