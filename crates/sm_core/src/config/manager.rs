//! Reading and writing the TOML config file.
//!
//! The file is written atomically (temp file in the same directory, then
//! rename). `update_section` edits one table through `toml_edit`, so user
//! comments elsewhere in the file survive. On load, a file whose tables do
//! not match the known sections is rewritten in full.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot edit config: {0}")]
    Edit(#[from] toml_edit::TomlError),

    #[error("No config file at {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the config path and the settings loaded from it.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Starts with defaults; nothing is read until `load` or `load_or_create`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory edits; persist with `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Read an existing file.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }
        self.settings = toml::from_str(&fs::read_to_string(&self.config_path)?)?;
        Ok(())
    }

    /// Read the file, or write one full of defaults when there is none.
    ///
    /// Missing fields take their defaults. When whole tables are missing, or
    /// tables this version does not know are present, the file is rewritten.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            self.settings = Settings::default();
            tracing::info!("Creating config at {}", self.config_path.display());
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        if tables_drifted(&content)? {
            tracing::info!("Rewriting {} with current sections", self.config_path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Create the output, temp and log folders.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        let p = &self.settings.paths;
        for dir in [&p.output_folder, &p.temp_root, &p.logs_folder] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Write the whole file, with a comment above each table.
    pub fn save(&self) -> ConfigResult<()> {
        let mut out = String::from("# Short Maker configuration\n");
        out.push_str("# Sections are rewritten individually when settings change.\n");

        for section in ConfigSection::ALL {
            out.push('\n');
            out.push_str(section.comment());
            out.push_str(&format!("\n[{}]\n", section.table_name()));
            out.push_str(&self.section_body(section)?);
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        self.write_atomically(&out)?;
        Ok(())
    }

    /// Replace one table in the file on disk, leaving the rest untouched.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match fs::read_to_string(&self.config_path) {
            Ok(content) if !content.trim().is_empty() => content.parse::<DocumentMut>()?,
            Ok(_) => DocumentMut::new(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentMut::new(),
            Err(e) => return Err(e.into()),
        };

        let table: DocumentMut = self.section_body(section)?.parse()?;
        doc[section.table_name()] = Item::Table(table.as_table().clone());

        self.write_atomically(&doc.to_string())?;
        Ok(())
    }

    fn section_body(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        Ok(match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
            ConfigSection::Output => toml::to_string_pretty(&s.output)?,
            ConfigSection::Narration => toml::to_string_pretty(&s.narration)?,
            ConfigSection::Audio => toml::to_string_pretty(&s.audio)?,
            ConfigSection::Media => toml::to_string_pretty(&s.media)?,
            ConfigSection::Transitions => toml::to_string_pretty(&s.transitions)?,
            ConfigSection::Subtitles => toml::to_string_pretty(&s.subtitles)?,
        })
    }

    fn write_atomically(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Same directory as the target so rename never crosses filesystems.
        let staging = self.config_path.with_extension("toml.tmp");
        let mut file = fs::File::create(&staging)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&staging, &self.config_path)
    }
}

/// Whether the file's top-level tables differ from the known sections.
fn tables_drifted(content: &str) -> ConfigResult<bool> {
    let doc: DocumentMut = content.parse()?;
    let present: Vec<&str> = doc.iter().map(|(key, _)| key).collect();

    let missing = ConfigSection::ALL
        .iter()
        .any(|s| !present.contains(&s.table_name()));
    let unknown = present
        .iter()
        .any(|key| ConfigSection::ALL.iter().all(|s| s.table_name() != *key));
    Ok(missing || unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_commented_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short-maker").join("config.toml");

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        for table in ["[paths]", "[narration]", "[audio]", "[subtitles]"] {
            assert!(content.contains(table), "missing {}", table);
        }
        assert!(content.contains("# Volumes (percent) and ducking"));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn saved_values_load_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut manager = ConfigManager::new(&path);
        manager.settings_mut().narration.speed = 1.5;
        manager.settings_mut().audio.duck_volume = Some(30.0);
        manager.save().unwrap();

        let mut reloaded = ConfigManager::new(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().narration.speed, 1.5);
        assert_eq!(reloaded.settings().audio.duck_volume, Some(30.0));
    }

    #[test]
    fn partial_file_is_completed_without_losing_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[narration]\nlanguage = \"pl\"\n").unwrap();

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().narration.language, "pl");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[output]"));
        assert!(content.contains("language = \"pl\""));
    }

    #[test]
    fn unknown_tables_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut manager = ConfigManager::new(&path);
        manager.save().unwrap();

        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("\n[legacy]\nflag = true\n");
        fs::write(&path, content).unwrap();

        manager.load_or_create().unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("[legacy]"));
    }

    #[test]
    fn update_section_keeps_user_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();
        let mut content = fs::read_to_string(&path).unwrap();
        content.insert_str(0, "# my notes\n");
        fs::write(&path, content).unwrap();

        manager.settings_mut().logging.compact = false;
        manager.update_section(ConfigSection::Logging).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# my notes"));
        assert!(content.contains("compact = false"));
        assert!(content.contains("[paths]"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("nope.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn creates_configured_folders() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("config.toml"));
        let paths = &mut manager.settings_mut().paths;
        paths.output_folder = dir.path().join("out").display().to_string();
        paths.temp_root = dir.path().join("tmp").display().to_string();
        paths.logs_folder = dir.path().join("logs").display().to_string();

        manager.ensure_dirs_exist().unwrap();
        for name in ["out", "tmp", "logs"] {
            assert!(dir.path().join(name).is_dir());
        }
    }
}
