//! Settings for a composition run and the TOML file they live in.
//!
//! Every section has defaults, so a missing or partial file is fine.
//! `Settings::validate` rejects bad values before any engine runs.
//!
//! # Example
//!
//! ```no_run
//! use sm_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/short-maker.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Narration language: {}", config.settings().narration.language);
//!
//! config.settings_mut().audio.duck_volume = Some(40.0);
//! config.update_section(ConfigSection::Audio).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, ConfigSection, LoggingSettings, MediaSettings, NarrationSettings,
    OutputSettings, PathSettings, Settings, SubtitleSettings, TransitionSettings,
    MAX_EDGE_TRANSITION_SECS,
};
