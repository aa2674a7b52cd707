//! Audio sources and the composite mix description.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::AudioKind;

/// Window during which a source is ducked under narration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuckWindow {
    pub start: f64,
    pub end: f64,
    /// Gain multiplier inside the window, in [0, 1].
    pub factor: f64,
}

impl DuckWindow {
    /// Window length in seconds.
    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Whether the window covers no time.
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}

/// One audio input to the mixer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSource {
    pub kind: AudioKind,
    /// File providing the samples. Original audio uses the primary track's media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Natural length of the source in seconds.
    pub duration: f64,
    /// Linear volume multiplier (1.0 = unchanged).
    pub volume: f64,
}

impl AudioSource {
    /// Create a source.
    pub fn new(kind: AudioKind, path: Option<PathBuf>, duration: f64, volume: f64) -> Self {
        Self {
            kind,
            path,
            duration,
            volume,
        }
    }
}

/// Constant gain over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainSegment {
    pub start: f64,
    pub end: f64,
    pub gain: f64,
}

/// Piecewise-constant gain curve over a layer's timeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GainEnvelope {
    pub segments: Vec<GainSegment>,
}

impl GainEnvelope {
    /// Single constant gain over `[0, duration)`.
    pub fn constant(gain: f64, duration: f64) -> Self {
        Self {
            segments: vec![GainSegment {
                start: 0.0,
                end: duration,
                gain,
            }],
        }
    }

    /// Gain at time `t` (0 outside every segment).
    pub fn gain_at(&self, t: f64) -> f64 {
        self.segments
            .iter()
            .find(|s| t >= s.start && t < s.end)
            .map(|s| s.gain)
            .unwrap_or(0.0)
    }

    /// ∫ gain dt over `[start, end)`.
    pub fn integrate(&self, start: f64, end: f64) -> f64 {
        self.segments
            .iter()
            .map(|s| {
                let lo = s.start.max(start);
                let hi = s.end.min(end);
                if hi > lo {
                    (hi - lo) * s.gain
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// End of the last segment.
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }

    /// Whether the gain never changes.
    pub fn is_constant(&self) -> bool {
        self.segments
            .windows(2)
            .all(|w| (w[0].gain - w[1].gain).abs() < f64::EPSILON)
    }
}

/// How a layer's source is stretched to the composite duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerFit {
    /// Source repeated whole then truncated.
    Loop,
    /// Silence appended after the source ends.
    Pad,
    /// Source cut at the composite duration.
    Truncate,
    /// Source already matches.
    Exact,
}

/// One source placed in the composite mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixLayer {
    pub source: AudioSource,
    /// Offset of the layer's first sample (always 0 in this engine).
    pub offset: f64,
    pub fit: LayerFit,
    /// Ducking applied to this layer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duck: Option<DuckWindow>,
    /// Gain applied to the fitted layer over the composite timeline.
    pub envelope: GainEnvelope,
    /// Duration after fitting (== composite duration).
    pub duration: f64,
}

impl MixLayer {
    /// Gain relative to the source's own level over `[start, end)`.
    pub fn integrated_gain(&self, start: f64, end: f64) -> f64 {
        self.envelope.integrate(start, end)
    }
}

/// Summed result of every mix layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositeAudio {
    /// Always equals the timeline's governing duration.
    pub duration: f64,
    pub layers: Vec<MixLayer>,
}

impl CompositeAudio {
    /// An explicit silent track.
    pub fn silent(duration: f64) -> Self {
        Self {
            duration,
            layers: Vec::new(),
        }
    }

    /// Whether no source contributes.
    pub fn is_silent(&self) -> bool {
        self.layers.is_empty()
    }

    /// Find a layer by kind.
    pub fn layer(&self, kind: AudioKind) -> Option<&MixLayer> {
        self.layers.iter().find(|l| l.source.kind == kind)
    }
}
