//! Shared fixtures for orchestrator tests.

use std::sync::Arc;

use tempfile::TempDir;

use super::types::{Context, Engines};
use crate::config::Settings;
use crate::engine::testing::{FakeRenderer, FakeTts};
use crate::logging::{LogConfig, RunLogger};
use crate::models::{CompositionSpec, MediaItem};
use crate::narration::ArtifactStore;

pub(crate) struct TestRun {
    pub dir: TempDir,
    pub tts: Arc<FakeTts>,
    pub renderer: Arc<FakeRenderer>,
    pub settings: Settings,
}

impl TestRun {
    pub fn new() -> Self {
        Self::with_engines(FakeTts::new(0.1), FakeRenderer::default())
    }

    pub fn with_engines(tts: FakeTts, renderer: FakeRenderer) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            tts: Arc::new(tts),
            renderer: Arc::new(renderer),
            settings: Settings::default(),
        }
    }

    /// One 10 s video with sound, rendered into the temp dir.
    pub fn spec(&self) -> CompositionSpec {
        CompositionSpec::new(
            vec![MediaItem::video("/media/top.mp4", 10.0, 1920, 1080, true)],
            self.dir.path().join("out").join("short.mp4"),
        )
    }

    pub fn engines(&self) -> Engines {
        Engines {
            tts: self.tts.clone(),
            renderer: self.renderer.clone(),
        }
    }

    pub fn context(&self, spec: CompositionSpec) -> Context {
        let artifacts = ArtifactStore::new_in(self.dir.path().join("tmp"), "test").unwrap();
        Context::new(
            spec,
            self.settings.clone(),
            "test",
            Arc::new(RunLogger::in_memory("test", LogConfig::default())),
            self.engines(),
            artifacts,
        )
    }
}
