//! Turns command-line media arguments into loaded media items.
//!
//! A media argument is a single file, a directory (its supported files in
//! name order), or a semicolon-separated list of files.

use std::fs;
use std::path::{Path, PathBuf};

use sm_core::engine::MediaProbe;
use sm_core::models::{MediaItem, MediaKind, MusicInput};
use sm_core::{ComposeError, ComposeResult};

/// Resolves and probes media for one run.
pub struct MediaLoader<'a> {
    probe: &'a dyn MediaProbe,
    image_duration: f64,
}

impl<'a> MediaLoader<'a> {
    pub fn new(probe: &'a dyn MediaProbe, image_duration: f64) -> Self {
        Self {
            probe,
            image_duration,
        }
    }

    /// Load every item named by a media argument, in order.
    pub fn load_track(&self, arg: &str) -> ComposeResult<Vec<MediaItem>> {
        expand_media_arg(arg)?
            .iter()
            .map(|path| self.load_item(path))
            .collect()
    }

    /// Probe one file into a media item.
    pub fn load_item(&self, path: &Path) -> ComposeResult<MediaItem> {
        let kind = media_kind(path).ok_or_else(|| {
            ComposeError::configuration(format!(
                "Unsupported media file: {}",
                path.display()
            ))
        })?;
        let info = self.probe.probe(path)?;

        match kind {
            MediaKind::Image => Ok(MediaItem::image(
                path,
                self.image_duration,
                info.width,
                info.height,
            )),
            MediaKind::Video => {
                let duration = info.duration.unwrap_or(0.0);
                if !duration.is_finite() || duration <= 0.0 {
                    return Err(ComposeError::InvalidItemDuration {
                        path: path.to_path_buf(),
                        duration,
                    });
                }
                Ok(MediaItem::video(
                    path,
                    duration,
                    info.width,
                    info.height,
                    info.has_audio,
                ))
            }
        }
    }

    /// Probe the background music file.
    pub fn load_music(&self, path: &Path) -> ComposeResult<MusicInput> {
        let info = self.probe.probe(path)?;
        let duration = info.duration.ok_or_else(|| ComposeError::Probe {
            path: path.to_path_buf(),
            message: "no duration reported".to_string(),
        })?;
        Ok(MusicInput {
            path: path.to_path_buf(),
            duration,
        })
    }
}

/// Read the narration script.
pub fn read_script(path: &Path) -> ComposeResult<String> {
    fs::read_to_string(path)
        .map_err(|e| ComposeError::io(format!("reading script {}", path.display()), e))
}

/// Expand a media argument into an ordered list of files.
pub fn expand_media_arg(arg: &str) -> ComposeResult<Vec<PathBuf>> {
    let arg = arg.trim();
    if arg.contains(';') {
        let paths: Vec<PathBuf> = arg
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
        for path in &paths {
            ensure_exists(path)?;
        }
        return Ok(paths);
    }

    let path = PathBuf::from(arg);
    if path.is_dir() {
        return list_media_dir(&path);
    }
    ensure_exists(&path)?;
    Ok(vec![path])
}

fn list_media_dir(dir: &Path) -> ComposeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ComposeError::io(format!("listing {}", dir.display()), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ComposeError::io(format!("listing {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_file() && media_kind(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();

    tracing::debug!("Found {} media file(s) in {}", files.len(), dir.display());
    Ok(files)
}

fn media_kind(path: &Path) -> Option<MediaKind> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(MediaKind::from_extension)
}

fn ensure_exists(path: &Path) -> ComposeResult<()> {
    if !path.exists() {
        return Err(ComposeError::configuration(format!(
            "Media file not found: {}",
            path.display()
        )));
    }
    Ok(())
}
