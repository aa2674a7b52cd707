//! Audio mixing policy.
//!
//! Up to three sources are layered over the governing duration:
//! - original sound of the primary track, looped with it
//! - narration at offset 0, never scaled or ducked
//! - background music, looped
//!
//! Layers are summed, not averaged. With ducking enabled every non-narration
//! layer is lowered while the narration plays.

use crate::config::AudioSettings;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{
    AudioKind, AudioSource, CompositeAudio, DuckWindow, FittedTrack, GainEnvelope, GainSegment,
    LayerFit, MixLayer, MusicInput, NarrationFit, NarrationTrack,
};

/// Durations closer than this are treated as equal.
const DURATION_EPSILON: f64 = 1e-6;

/// Gain envelope for a layer of `duration` seconds at `base` volume.
///
/// A layer longer than the duck window is scaled by the duck factor over the
/// window and kept at `base` afterwards; a layer no longer than the window is
/// scaled entirely.
pub fn duck_envelope(base: f64, duration: f64, window: Option<DuckWindow>) -> GainEnvelope {
    match window {
        None => GainEnvelope::constant(base, duration),
        Some(w) if duration > w.end + DURATION_EPSILON => GainEnvelope {
            segments: vec![
                GainSegment {
                    start: 0.0,
                    end: w.end,
                    gain: base * w.factor,
                },
                GainSegment {
                    start: w.end,
                    end: duration,
                    gain: base,
                },
            ],
        },
        Some(w) => GainEnvelope::constant(base * w.factor, duration),
    }
}

fn fit_for(source: f64, target: f64) -> LayerFit {
    if source < target - DURATION_EPSILON {
        LayerFit::Loop
    } else if source > target + DURATION_EPSILON {
        LayerFit::Truncate
    } else {
        LayerFit::Exact
    }
}

/// Builds the composite audio for a timeline.
#[derive(Debug, Clone, Copy)]
pub struct AudioMixer {
    include_original: bool,
    original_gain: f64,
    music_gain: f64,
    duck_factor: Option<f64>,
}

impl AudioMixer {
    /// Create a mixer from audio settings, rejecting invalid volumes.
    pub fn new(settings: &AudioSettings) -> ComposeResult<Self> {
        for (name, volume) in [
            ("original", settings.original_volume),
            ("music", settings.music_volume),
        ] {
            if !volume.is_finite() || volume < 0.0 {
                return Err(ComposeError::configuration(format!(
                    "{} volume must be >= 0, got {}",
                    name, volume
                )));
            }
        }

        if let Some(duck) = settings.duck_volume {
            if !(0.0..=100.0).contains(&duck) {
                return Err(ComposeError::configuration(format!(
                    "Duck volume must be between 0 and 100, got {}",
                    duck
                )));
            }
        }

        Ok(Self {
            include_original: settings.include_original,
            original_gain: settings.original_gain(),
            music_gain: settings.music_gain(),
            duck_factor: settings.duck_factor(),
        })
    }

    /// Layer every active source over `governing` seconds.
    pub fn mix(
        &self,
        governing: f64,
        primary: &FittedTrack,
        narration: Option<&NarrationTrack>,
        music: Option<&MusicInput>,
    ) -> ComposeResult<CompositeAudio> {
        if !governing.is_finite() || governing <= 0.0 {
            return Err(ComposeError::configuration(format!(
                "Governing duration must be positive, got {}",
                governing
            )));
        }

        let window = match (narration, self.duck_factor) {
            (Some(n), Some(factor)) => {
                let end = n.duration.min(governing);
                (end > 0.0).then_some(DuckWindow {
                    start: 0.0,
                    end,
                    factor,
                })
            }
            _ => None,
        };

        let mut layers = Vec::new();

        if self.include_original && self.original_gain > 0.0 && primary.track.has_audio() {
            let fit = if primary.loops > 1 {
                LayerFit::Loop
            } else {
                fit_for(primary.track.duration, governing)
            };
            layers.push(MixLayer {
                source: AudioSource::new(
                    AudioKind::Original,
                    None,
                    primary.track.duration,
                    self.original_gain,
                ),
                offset: 0.0,
                fit,
                duck: window,
                envelope: duck_envelope(self.original_gain, governing, window),
                duration: governing,
            });
        } else if self.include_original {
            tracing::debug!("Original audio requested but muted or absent; skipping");
        }

        if let Some(n) = narration {
            let fit = match n.fit {
                NarrationFit::Exact => LayerFit::Exact,
                NarrationFit::PadSilence(_) => LayerFit::Pad,
                NarrationFit::TruncateAt(_) => LayerFit::Truncate,
            };
            layers.push(MixLayer {
                source: AudioSource::new(
                    AudioKind::Narration,
                    Some(n.path.clone()),
                    n.duration,
                    1.0,
                ),
                offset: 0.0,
                fit,
                duck: None,
                envelope: GainEnvelope::constant(1.0, governing),
                duration: governing,
            });
        }

        if let Some(m) = music {
            if !m.duration.is_finite() || m.duration <= 0.0 {
                return Err(ComposeError::configuration(format!(
                    "Music '{}' has no usable duration",
                    m.path.display()
                )));
            }
            layers.push(MixLayer {
                source: AudioSource::new(
                    AudioKind::Music,
                    Some(m.path.clone()),
                    m.duration,
                    self.music_gain,
                ),
                offset: 0.0,
                fit: fit_for(m.duration, governing),
                duck: window,
                envelope: duck_envelope(self.music_gain, governing, window),
                duration: governing,
            });
        }

        if layers.is_empty() {
            return Ok(CompositeAudio::silent(governing));
        }

        Ok(CompositeAudio {
            duration: governing,
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, TrackSlot, TransitionSpec};
    use crate::sequencer::Sequencer;
    use std::path::PathBuf;

    fn track(duration: f64, has_audio: bool, governing: f64) -> FittedTrack {
        let sequencer = Sequencer::new(TransitionSpec::none());
        let track = sequencer
            .build(
                TrackSlot::Primary,
                vec![MediaItem::video("/m/a.mp4", duration, 1920, 1080, has_audio)],
            )
            .unwrap();
        sequencer.fit(track, governing).unwrap()
    }

    fn narration(duration: f64, fit: NarrationFit) -> NarrationTrack {
        NarrationTrack {
            path: PathBuf::from("/tmp/narration.mp3"),
            duration,
            fit,
        }
    }

    fn music(duration: f64) -> MusicInput {
        MusicInput {
            path: PathBuf::from("/m/song.mp3"),
            duration,
        }
    }

    fn settings(include_original: bool, duck: Option<f64>) -> AudioSettings {
        AudioSettings {
            include_original,
            duck_volume: duck,
            ..AudioSettings::default()
        }
    }

    #[test]
    fn music_is_ducked_under_narration() {
        let mixer = AudioMixer::new(&settings(false, Some(50.0))).unwrap();
        let audio = mixer
            .mix(
                30.0,
                &track(30.0, false, 30.0),
                Some(&narration(6.0, NarrationFit::PadSilence(24.0))),
                Some(&music(30.0)),
            )
            .unwrap();

        let music = audio.layer(AudioKind::Music).unwrap();
        assert!((music.integrated_gain(0.0, 6.0) - 3.0).abs() < 1e-9);
        assert!((music.integrated_gain(6.0, 30.0) - 24.0).abs() < 1e-9);
        assert_eq!(music.fit, LayerFit::Exact);

        let voice = audio.layer(AudioKind::Narration).unwrap();
        assert!(voice.duck.is_none());
        assert!((voice.integrated_gain(0.0, 30.0) - 30.0).abs() < 1e-9);
        assert_eq!(voice.fit, LayerFit::Pad);
    }

    #[test]
    fn layer_no_longer_than_window_is_scaled_entirely() {
        let env = duck_envelope(
            0.8,
            10.0,
            Some(DuckWindow {
                start: 0.0,
                end: 10.0,
                factor: 0.25,
            }),
        );
        assert!(env.is_constant());
        assert!((env.integrate(0.0, 10.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn original_requires_request_volume_and_audio() {
        let primary = track(10.0, true, 10.0);
        let with = AudioMixer::new(&settings(true, None)).unwrap();
        assert!(with
            .mix(10.0, &primary, None, None)
            .unwrap()
            .layer(AudioKind::Original)
            .is_some());

        let not_requested = AudioMixer::new(&settings(false, None)).unwrap();
        assert!(not_requested.mix(10.0, &primary, None, None).unwrap().is_silent());

        let muted = AudioMixer::new(&AudioSettings {
            include_original: true,
            original_volume: 0.0,
            ..AudioSettings::default()
        })
        .unwrap();
        assert!(muted.mix(10.0, &primary, None, None).unwrap().is_silent());

        let no_sound = track(10.0, false, 10.0);
        assert!(with.mix(10.0, &no_sound, None, None).unwrap().is_silent());
    }

    #[test]
    fn original_loops_with_track() {
        let mixer = AudioMixer::new(&settings(true, None)).unwrap();
        let audio = mixer.mix(20.0, &track(8.0, true, 20.0), None, None).unwrap();
        let original = audio.layer(AudioKind::Original).unwrap();
        assert_eq!(original.fit, LayerFit::Loop);
        assert_eq!(original.duration, 20.0);
    }

    #[test]
    fn short_music_loops_long_music_truncates() {
        let mixer = AudioMixer::new(&settings(false, None)).unwrap();
        let primary = track(20.0, false, 20.0);

        let short = mixer.mix(20.0, &primary, None, Some(&music(7.0))).unwrap();
        assert_eq!(short.layer(AudioKind::Music).unwrap().fit, LayerFit::Loop);

        let long = mixer.mix(20.0, &primary, None, Some(&music(200.0))).unwrap();
        assert_eq!(long.layer(AudioKind::Music).unwrap().fit, LayerFit::Truncate);
        assert_eq!(long.duration, 20.0);
    }

    #[test]
    fn duck_window_clipped_to_governing() {
        let mixer = AudioMixer::new(&settings(false, Some(20.0))).unwrap();
        let audio = mixer
            .mix(
                5.0,
                &track(5.0, false, 5.0),
                Some(&narration(8.0, NarrationFit::TruncateAt(5.0))),
                Some(&music(60.0)),
            )
            .unwrap();
        let music = audio.layer(AudioKind::Music).unwrap();
        assert_eq!(music.duck.unwrap().end, 5.0);
        assert!((music.integrated_gain(0.0, 5.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn no_ducking_without_narration() {
        let mixer = AudioMixer::new(&settings(false, Some(50.0))).unwrap();
        let audio = mixer
            .mix(10.0, &track(10.0, false, 10.0), None, Some(&music(10.0)))
            .unwrap();
        let music = audio.layer(AudioKind::Music).unwrap();
        assert!(music.duck.is_none());
        assert!((music.integrated_gain(0.0, 10.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sources_is_explicit_silence() {
        let mixer = AudioMixer::new(&settings(false, None)).unwrap();
        let audio = mixer.mix(12.0, &track(12.0, true, 12.0), None, None).unwrap();
        assert!(audio.is_silent());
        assert_eq!(audio.duration, 12.0);
    }

    #[test]
    fn invalid_volumes_rejected() {
        assert!(AudioMixer::new(&AudioSettings {
            music_volume: -5.0,
            ..AudioSettings::default()
        })
        .is_err());
        assert!(AudioMixer::new(&settings(false, Some(150.0))).is_err());
    }
}
