//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.
//! A front end assembles one `Settings` value before a run; the pipeline only
//! ever reads it.

use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, ComposeResult};
use crate::models::{GoverningMode, Resolution, TransitionKind, TransitionSpec};

/// Hard cap on start/end transition length in seconds.
pub const MAX_EDGE_TRANSITION_SECS: f64 = 2.0;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Output encode settings.
    #[serde(default)]
    pub output: OutputSettings,

    /// Narration and timing settings.
    #[serde(default)]
    pub narration: NarrationSettings,

    /// Mixing settings.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Media loading and sequencing.
    #[serde(default)]
    pub media: MediaSettings,

    /// Entrance/exit effects.
    #[serde(default)]
    pub transitions: TransitionSettings,

    /// Burned-in subtitle style.
    #[serde(default)]
    pub subtitles: SubtitleSettings,
}

/// Logical sections of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Output,
    Narration,
    Audio,
    Media,
    Transitions,
    Subtitles,
}

impl ConfigSection {
    /// Every section, in file order.
    pub const ALL: [ConfigSection; 8] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Output,
        ConfigSection::Narration,
        ConfigSection::Audio,
        ConfigSection::Media,
        ConfigSection::Transitions,
        ConfigSection::Subtitles,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Output => "output",
            ConfigSection::Narration => "narration",
            ConfigSection::Audio => "audio",
            ConfigSection::Media => "media",
            ConfigSection::Transitions => "transitions",
            ConfigSection::Subtitles => "subtitles",
        }
    }

    /// Comment line written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "# Output and working directories",
            ConfigSection::Logging => "# Logging configuration",
            ConfigSection::Output => "# Encoder settings for the final render",
            ConfigSection::Narration => "# Narration, phrase splitting and timing",
            ConfigSection::Audio => "# Volumes (percent) and ducking",
            ConfigSection::Media => "# Media loading and inter-item transitions",
            ConfigSection::Transitions => "# Entrance/exit effects on the whole clip",
            ConfigSection::Subtitles => "# Burned-in subtitle style",
        }
    }
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for relative output names.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for synthesis artifacts.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    ".".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log the full ffmpeg filter graph before rendering.
    #[serde(default)]
    pub show_filter_graph: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_filter_graph: false,
        }
    }
}

/// Encoder settings for the final render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Target frame size as WIDTHxHEIGHT.
    #[serde(default = "default_resolution")]
    pub resolution: String,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_crf")]
    pub crf: u32,

    #[serde(default = "default_threads")]
    pub threads: u32,

    /// ffmpeg executable.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    /// ffprobe executable.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
}

fn default_resolution() -> String {
    "1080x1920".to_string()
}

fn default_fps() -> u32 {
    30
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_crf() -> u32 {
    23
}

fn default_threads() -> u32 {
    4
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            fps: default_fps(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            preset: default_preset(),
            crf: default_crf(),
            threads: default_threads(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
        }
    }
}

/// Narration, phrase splitting and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationSettings {
    /// TTS language code.
    #[serde(default = "default_language")]
    pub language: String,

    /// Narration speed multiplier (0.5 = slower, 2.0 = faster).
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Ask the TTS engine for its slow voice.
    #[serde(default)]
    pub slow_voice: bool,

    /// Maximum characters per subtitle phrase.
    #[serde(default = "default_max_phrase_chars")]
    pub max_phrase_chars: usize,

    /// Drift between summed phrase durations and narration that is
    /// reported as a warning, in seconds.
    #[serde(default = "default_tolerance")]
    pub normalization_tolerance: f64,

    /// Burn phrase subtitles into the video.
    #[serde(default = "default_true")]
    pub subtitles: bool,

    /// Which duration governs the timeline.
    #[serde(default)]
    pub mode: GoverningMode,

    /// TTS command line tool.
    #[serde(default = "default_tts_command")]
    pub tts_command: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_speed() -> f64 {
    1.0
}

fn default_max_phrase_chars() -> usize {
    50
}

fn default_tolerance() -> f64 {
    1.0
}

fn default_tts_command() -> String {
    "gtts-cli".to_string()
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            speed: default_speed(),
            slow_voice: false,
            max_phrase_chars: default_max_phrase_chars(),
            normalization_tolerance: default_tolerance(),
            subtitles: true,
            mode: GoverningMode::default(),
            tts_command: default_tts_command(),
        }
    }
}

/// Mixing settings. Volumes are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Keep the primary track's own sound.
    #[serde(default)]
    pub include_original: bool,

    /// Original sound volume (0-100+ %).
    #[serde(default = "default_volume")]
    pub original_volume: f64,

    /// Music volume (0-100+ %).
    #[serde(default = "default_volume")]
    pub music_volume: f64,

    /// Volume of other sources while narration plays (0-100 %).
    /// None disables ducking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duck_volume: Option<f64>,
}

fn default_volume() -> f64 {
    100.0
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            include_original: false,
            original_volume: default_volume(),
            music_volume: default_volume(),
            duck_volume: None,
        }
    }
}

impl AudioSettings {
    /// Original volume as a linear multiplier.
    pub fn original_gain(&self) -> f64 {
        self.original_volume / 100.0
    }

    /// Music volume as a linear multiplier.
    pub fn music_gain(&self) -> f64 {
        self.music_volume / 100.0
    }

    /// Duck factor in [0, 1], if ducking is enabled.
    pub fn duck_factor(&self) -> Option<f64> {
        self.duck_volume.map(|v| v / 100.0)
    }
}

/// Media loading and inter-item transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSettings {
    /// Provisional duration for still images, in seconds.
    #[serde(default = "default_image_duration")]
    pub image_duration: f64,

    /// Transition between consecutive items of a track.
    #[serde(default)]
    pub item_transition: TransitionKind,

    /// Requested inter-item transition length in seconds.
    #[serde(default = "default_item_transition_duration")]
    pub item_transition_duration: f64,
}

fn default_image_duration() -> f64 {
    5.0
}

fn default_item_transition_duration() -> f64 {
    0.5
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            image_duration: default_image_duration(),
            item_transition: TransitionKind::None,
            item_transition_duration: default_item_transition_duration(),
        }
    }
}

impl MediaSettings {
    /// Requested inter-item transition.
    pub fn item_transition_spec(&self) -> TransitionSpec {
        TransitionSpec::new(self.item_transition, self.item_transition_duration)
    }
}

/// Entrance/exit effects on the whole clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionSettings {
    #[serde(default)]
    pub start: TransitionKind,

    #[serde(default)]
    pub end: TransitionKind,

    /// Requested effect length in seconds (clamped at render).
    #[serde(default = "default_edge_duration")]
    pub duration: f64,
}

fn default_edge_duration() -> f64 {
    1.0
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            start: TransitionKind::None,
            end: TransitionKind::None,
            duration: default_edge_duration(),
        }
    }
}

impl TransitionSettings {
    pub fn start_spec(&self) -> TransitionSpec {
        TransitionSpec::new(self.start, self.duration)
    }

    pub fn end_spec(&self) -> TransitionSpec {
        TransitionSpec::new(self.end, self.duration)
    }
}

/// Burned-in subtitle style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleSettings {
    #[serde(default = "default_font")]
    pub font: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default = "default_true")]
    pub bold: bool,

    /// Text color as RRGGBB.
    #[serde(default = "default_text_color")]
    pub text_color: String,

    /// Outline color as RRGGBB.
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,

    /// Opacity of the black box behind the text (0-1).
    #[serde(default = "default_box_opacity")]
    pub box_opacity: f64,

    /// Padding around the text inside the box, in pixels.
    #[serde(default = "default_box_padding")]
    pub box_padding: u32,

    /// Maximum caption width in pixels.
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Fade in/out of each phrase, in seconds.
    #[serde(default)]
    pub fade: f64,
}

fn default_font() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    60
}

fn default_text_color() -> String {
    "FFFFFF".to_string()
}

fn default_stroke_color() -> String {
    "000000".to_string()
}

fn default_stroke_width() -> u32 {
    2
}

fn default_box_opacity() -> f64 {
    0.6
}

fn default_box_padding() -> u32 {
    20
}

fn default_max_width() -> u32 {
    1000
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            font: default_font(),
            font_size: default_font_size(),
            bold: true,
            text_color: default_text_color(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            box_opacity: default_box_opacity(),
            box_padding: default_box_padding(),
            max_width: default_max_width(),
            fade: 0.0,
        }
    }
}

impl Settings {
    /// Parsed output resolution.
    pub fn resolution(&self) -> ComposeResult<Resolution> {
        self.output.resolution.parse()
    }

    /// Reject invalid values before any engine is invoked.
    pub fn validate(&self) -> ComposeResult<()> {
        self.resolution()?;

        let n = &self.narration;
        if !n.speed.is_finite() || n.speed <= 0.0 {
            return Err(ComposeError::configuration(format!(
                "Speed factor must be greater than 0 (got {})",
                n.speed
            )));
        }
        if n.max_phrase_chars == 0 {
            return Err(ComposeError::configuration(
                "Maximum phrase length must be at least 1 character",
            ));
        }
        if !n.normalization_tolerance.is_finite() || n.normalization_tolerance < 0.0 {
            return Err(ComposeError::configuration(format!(
                "Normalization tolerance cannot be negative (got {})",
                n.normalization_tolerance
            )));
        }

        let a = &self.audio;
        for (name, value) in [
            ("Original volume", a.original_volume),
            ("Music volume", a.music_volume),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ComposeError::configuration(format!(
                    "{} cannot be negative (got {})",
                    name, value
                )));
            }
        }
        if let Some(duck) = a.duck_volume {
            if !(0.0..=100.0).contains(&duck) {
                return Err(ComposeError::configuration(format!(
                    "Duck volume must be between 0 and 100 (got {})",
                    duck
                )));
            }
        }

        if !self.media.image_duration.is_finite() || self.media.image_duration <= 0.0 {
            return Err(ComposeError::configuration(format!(
                "Image duration must be positive (got {})",
                self.media.image_duration
            )));
        }
        self.media.item_transition_spec().validate()?;
        self.transitions.start_spec().validate()?;
        self.transitions.end_spec().validate()?;

        if !self.subtitles.fade.is_finite() || self.subtitles.fade < 0.0 {
            return Err(ComposeError::configuration(format!(
                "Subtitle fade duration cannot be negative (got {})",
                self.subtitles.fade
            )));
        }
        if !(0.0..=1.0).contains(&self.subtitles.box_opacity) {
            return Err(ComposeError::configuration(
                "Subtitle box opacity must be between 0 and 1",
            ));
        }

        Ok(())
    }
}
