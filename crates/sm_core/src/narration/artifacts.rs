//! Scoped storage for synthesized audio and other per-run files.
//!
//! Everything the estimator or the render preparation writes lives in one
//! temporary directory owned by the run. The directory is removed by an
//! explicit `release()` after the final render, or by `Drop` on any error
//! path.

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::TempDir;

/// Owner of a run's temporary artifacts.
pub struct ArtifactStore {
    dir: Mutex<Option<TempDir>>,
    /// Path of the directory, kept for display after release.
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a fresh artifact directory under `parent`.
    pub fn new_in(parent: impl AsRef<Path>, prefix: &str) -> io::Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", prefix))
            .tempdir_in(parent)?;
        let root = dir.path().to_path_buf();

        tracing::debug!("Artifact directory: {}", root.display());
        Ok(Self {
            dir: Mutex::new(Some(dir)),
            root,
        })
    }

    /// Directory holding the artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a named artifact inside the store.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Whether the directory has already been removed.
    pub fn is_released(&self) -> bool {
        self.dir.lock().is_none()
    }

    /// Remove the directory and everything in it.
    ///
    /// Safe to call more than once.
    pub fn release(&self) -> io::Result<()> {
        match self.dir.lock().take() {
            Some(dir) => {
                tracing::debug!("Releasing artifacts in {}", self.root.display());
                dir.close()
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("root", &self.root)
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn release_removes_directory() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "run").unwrap();
        let file = store.path_for("narration.mp3");
        fs::write(&file, b"data").unwrap();
        assert!(file.exists());

        store.release().unwrap();
        assert!(store.is_released());
        assert!(!store.root().exists());

        // Second release is a no-op
        store.release().unwrap();
    }

    #[test]
    fn drop_removes_directory() {
        let parent = tempdir().unwrap();
        let root = {
            let store = ArtifactStore::new_in(parent.path(), "run").unwrap();
            fs::write(store.path_for("phrase_0.mp3"), b"x").unwrap();
            store.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn directory_uses_prefix() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path().join("nested"), "my_short").unwrap();
        let name = store.root().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("my_short-"));
    }
}
