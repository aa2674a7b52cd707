//! Speech duration estimation.
//!
//! Every phrase is synthesized on its own to measure how long it takes to
//! speak. The joined phrases are then synthesized once more; that audio is
//! what actually plays, and its length is authoritative.

use crate::engine::{SynthesizedAudio, TtsEngine};
use crate::error::{ComposeError, ComposeResult};
use crate::models::Phrase;

use super::artifacts::ArtifactStore;

/// Per-phrase estimates plus the full narration audio.
#[derive(Debug, Clone)]
pub struct NarrationEstimate {
    /// Phrases with `estimated` set (0 for failed phrases).
    pub phrases: Vec<Phrase>,
    /// Full narration at normal speed.
    pub narration: SynthesizedAudio,
    /// Indices of phrases whose synthesis failed.
    pub failed: Vec<usize>,
}

impl NarrationEstimate {
    /// Σ of the per-phrase estimates.
    pub fn estimated_total(&self) -> f64 {
        self.phrases.iter().map(|p| p.estimated).sum()
    }
}

/// Drives a `TtsEngine` over the phrases of one script.
pub struct SpeechEstimator<'a> {
    tts: &'a dyn TtsEngine,
    store: &'a ArtifactStore,
    language: String,
    slow: bool,
}

impl<'a> SpeechEstimator<'a> {
    pub fn new(
        tts: &'a dyn TtsEngine,
        store: &'a ArtifactStore,
        language: impl Into<String>,
        slow: bool,
    ) -> Self {
        Self {
            tts,
            store,
            language: language.into(),
            slow,
        }
    }

    /// Estimate all phrases without progress reporting.
    pub fn estimate(&self, texts: &[String]) -> ComposeResult<NarrationEstimate> {
        self.estimate_with_progress(texts, |_, _| {})
    }

    /// Estimate all phrases, calling `on_phrase(done, total)` after each one.
    ///
    /// A failed phrase contributes 0 and is logged as a warning. A failed
    /// full synthesis is fatal.
    pub fn estimate_with_progress<F>(
        &self,
        texts: &[String],
        mut on_phrase: F,
    ) -> ComposeResult<NarrationEstimate>
    where
        F: FnMut(usize, usize),
    {
        if texts.is_empty() {
            return Err(ComposeError::no_narration_timing("no phrases to synthesize"));
        }

        let mut phrases = Vec::with_capacity(texts.len());
        let mut failed = Vec::new();

        for (index, text) in texts.iter().enumerate() {
            let out = self.store.path_for(&format!("phrase_{:03}.mp3", index));
            let estimated = match self.tts.synthesize(text, &self.language, self.slow, &out) {
                Ok(audio) if audio.duration.is_finite() && audio.duration > 0.0 => audio.duration,
                Ok(audio) => {
                    tracing::warn!(
                        "Phrase {} produced unusable duration {}; counting as 0",
                        index,
                        audio.duration
                    );
                    failed.push(index);
                    0.0
                }
                Err(e) => {
                    tracing::warn!("Phrase {} failed to synthesize: {}", index, e);
                    failed.push(index);
                    0.0
                }
            };
            phrases.push(Phrase::new(index, text.clone(), estimated));
            on_phrase(index + 1, texts.len());
        }

        let joined = texts.join(" ");
        let out = self.store.path_for("narration.mp3");
        let narration = self
            .tts
            .synthesize(&joined, &self.language, self.slow, &out)
            .map_err(|e| {
                ComposeError::no_narration_timing(format!("full narration synthesis failed: {}", e))
            })?;

        if !narration.duration.is_finite() || narration.duration <= 0.0 {
            return Err(ComposeError::no_narration_timing(format!(
                "full narration has duration {}",
                narration.duration
            )));
        }

        Ok(NarrationEstimate {
            phrases,
            narration,
            failed,
        })
    }

    /// Tempo-shift the full narration by `speed`.
    ///
    /// Speed 1 returns the audio unchanged. Failure here is fatal.
    pub fn apply_speed(
        &self,
        narration: &SynthesizedAudio,
        speed: f64,
    ) -> ComposeResult<SynthesizedAudio> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ComposeError::configuration(format!(
                "Speed must be greater than 0, got {}",
                speed
            )));
        }
        if (speed - 1.0).abs() < f64::EPSILON {
            return Ok(narration.clone());
        }

        let out = self.store.path_for("narration_speed.mp3");
        self.tts.change_tempo(narration, speed, &out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeTts;
    use tempfile::tempdir;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn measures_each_phrase_and_full_narration() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "est").unwrap();
        let tts = FakeTts::new(0.1).with("Hello there. General", Some(2.2));
        let estimator = SpeechEstimator::new(&tts, &store, "en", false);

        let estimate = estimator.estimate(&texts(&["Hello there.", "General"])).unwrap();

        assert_eq!(estimate.phrases.len(), 2);
        assert!((estimate.phrases[0].estimated - 1.2).abs() < 1e-9);
        assert!((estimate.phrases[1].estimated - 0.7).abs() < 1e-9);
        assert_eq!(estimate.narration.duration, 2.2);
        assert!(estimate.failed.is_empty());
        assert!(store.path_for("phrase_000.mp3").exists());
        assert!(store.path_for("narration.mp3").exists());
    }

    #[test]
    fn failed_phrase_counts_as_zero() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "est").unwrap();
        let tts = FakeTts::new(0.1).with("broken", None);
        let estimator = SpeechEstimator::new(&tts, &store, "en", false);

        let estimate = estimator
            .estimate(&texts(&["first one", "broken", "third"]))
            .unwrap();

        assert_eq!(estimate.failed, vec![1]);
        assert_eq!(estimate.phrases[1].estimated, 0.0);
        assert_eq!(estimate.phrases.len(), 3);
        assert!((estimate.estimated_total() - 1.4).abs() < 1e-9);
    }

    #[test]
    fn synthesizes_each_phrase_once_then_the_joined_script() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "est").unwrap();
        let tts = FakeTts::new(0.1).with("broken", None);
        let estimator = SpeechEstimator::new(&tts, &store, "en", false);

        let phrases = texts(&["One.", "broken", "Three."]);
        let estimate = estimator.estimate(&phrases).unwrap();
        assert_eq!(
            *tts.calls.lock(),
            vec!["One.", "broken", "Three.", "One. broken Three."]
        );

        estimator.apply_speed(&estimate.narration, 1.0).unwrap();
        assert_eq!(tts.calls.lock().len(), 4);
    }

    #[test]
    fn failed_full_synthesis_is_fatal() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "est").unwrap();
        let tts = FakeTts::new(0.1).with("a b", None);
        let estimator = SpeechEstimator::new(&tts, &store, "en", false);

        let err = estimator.estimate(&texts(&["a", "b"])).unwrap_err();
        assert!(matches!(err, ComposeError::NoNarrationTiming(_)));
    }

    #[test]
    fn progress_reports_every_phrase() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "est").unwrap();
        let tts = FakeTts::new(0.1);
        let estimator = SpeechEstimator::new(&tts, &store, "en", false);

        let mut seen = Vec::new();
        estimator
            .estimate_with_progress(&texts(&["one", "two", "three"]), |done, total| {
                seen.push((done, total))
            })
            .unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn speed_shortens_narration() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "est").unwrap();
        let tts = FakeTts::new(0.1);
        let estimator = SpeechEstimator::new(&tts, &store, "en", false);
        let audio = SynthesizedAudio {
            path: store.path_for("narration.mp3"),
            duration: 10.0,
        };

        let fast = estimator.apply_speed(&audio, 1.25).unwrap();
        assert!((fast.duration - 8.0).abs() < 1e-9);

        let same = estimator.apply_speed(&audio, 1.0).unwrap();
        assert_eq!(same, audio);

        assert!(matches!(
            estimator.apply_speed(&audio, 0.0),
            Err(ComposeError::Configuration(_))
        ));
    }

    #[test]
    fn tempo_failure_is_propagated() {
        let parent = tempdir().unwrap();
        let store = ArtifactStore::new_in(parent.path(), "est").unwrap();
        let mut tts = FakeTts::new(0.1);
        tts.fail_tempo = true;
        let estimator = SpeechEstimator::new(&tts, &store, "en", false);
        let audio = SynthesizedAudio {
            path: store.path_for("narration.mp3"),
            duration: 10.0,
        };
        assert!(estimator.apply_speed(&audio, 2.0).unwrap_err().is_fatal());
    }
}
