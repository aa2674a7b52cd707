//! Entrance and exit effects on the composed clip.
//!
//! Effects are purely visual: the entrance starts at 0, the exit ends at the
//! governing duration, and neither changes the total length. Each effect is
//! clamped to a third of the composition and to a hard cap.

use crate::config::MAX_EDGE_TRANSITION_SECS;
use crate::error::ComposeResult;
use crate::models::{AppliedTransitions, ClampedTransition, TransitionKind, TransitionSpec};

/// Places start/end effects on a composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionApplicator {
    start: TransitionSpec,
    end: TransitionSpec,
}

impl TransitionApplicator {
    /// Create an applicator, rejecting negative durations.
    pub fn new(start: TransitionSpec, end: TransitionSpec) -> ComposeResult<Self> {
        start.validate()?;
        end.validate()?;
        Ok(Self { start, end })
    }

    /// Effective length of an effect over a clip of `governing` seconds.
    pub fn clamp(requested: f64, governing: f64) -> f64 {
        requested
            .min(governing / 3.0)
            .min(MAX_EDGE_TRANSITION_SECS)
            .max(0.0)
    }

    /// Place the configured effects on a clip of `governing` seconds.
    pub fn apply(&self, governing: f64) -> AppliedTransitions {
        let entrance = self.placed(self.start, governing).map(|duration| ClampedTransition {
            kind: self.start.kind,
            start: 0.0,
            duration,
        });
        let exit = self.placed(self.end, governing).map(|duration| ClampedTransition {
            kind: self.end.kind,
            start: governing - duration,
            duration,
        });

        for t in entrance.iter().chain(exit.iter()) {
            tracing::debug!(
                "Transition {} at {:.3}s for {:.3}s",
                t.kind,
                t.start,
                t.duration
            );
        }

        AppliedTransitions { entrance, exit }
    }

    fn placed(&self, spec: TransitionSpec, governing: f64) -> Option<f64> {
        if !spec.is_active() {
            return None;
        }
        let duration = Self::clamp(spec.duration, governing);
        (duration > 0.0).then_some(duration)
    }
}

/// Replace every motion effect with a fade of the same timing.
pub fn fade_fallback(applied: &AppliedTransitions) -> AppliedTransitions {
    let to_fade = |t: ClampedTransition| {
        if t.kind.is_motion() {
            ClampedTransition {
                kind: TransitionKind::Fade,
                ..t
            }
        } else {
            t
        }
    };
    AppliedTransitions {
        entrance: applied.entrance.map(to_fade),
        exit: applied.exit.map(to_fade),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposeError;

    fn applicator(start: TransitionKind, end: TransitionKind, duration: f64) -> TransitionApplicator {
        TransitionApplicator::new(
            TransitionSpec::new(start, duration),
            TransitionSpec::new(end, duration),
        )
        .unwrap()
    }

    #[test]
    fn entrance_at_zero_exit_at_end() {
        let applied = applicator(TransitionKind::Fade, TransitionKind::SlideLeft, 1.0).apply(20.0);
        let entrance = applied.entrance.unwrap();
        let exit = applied.exit.unwrap();
        assert_eq!(entrance.start, 0.0);
        assert_eq!(entrance.duration, 1.0);
        assert_eq!(exit.start, 19.0);
        assert_eq!(exit.end(), 20.0);
    }

    #[test]
    fn clamped_to_third_and_cap() {
        assert_eq!(TransitionApplicator::clamp(1.0, 1.5), 0.5);
        assert_eq!(TransitionApplicator::clamp(5.0, 60.0), MAX_EDGE_TRANSITION_SECS);
        assert_eq!(TransitionApplicator::clamp(0.75, 60.0), 0.75);

        let applied = applicator(TransitionKind::ZoomIn, TransitionKind::None, 3.0).apply(3.0);
        assert_eq!(applied.entrance.unwrap().duration, 1.0);
        assert!(applied.exit.is_none());
    }

    #[test]
    fn none_or_zero_duration_places_nothing() {
        assert!(applicator(TransitionKind::None, TransitionKind::None, 1.0)
            .apply(10.0)
            .is_empty());
        assert!(applicator(TransitionKind::Fade, TransitionKind::Fade, 0.0)
            .apply(10.0)
            .is_empty());
    }

    #[test]
    fn negative_duration_is_configuration_error() {
        let err = TransitionApplicator::new(
            TransitionSpec::new(TransitionKind::Fade, -1.0),
            TransitionSpec::none(),
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::Configuration(_)));
    }

    #[test]
    fn fallback_turns_motion_into_fade() {
        let applied = applicator(TransitionKind::SlideUp, TransitionKind::ZoomOut, 1.0).apply(12.0);
        assert!(applied.has_motion());

        let fallback = fade_fallback(&applied);
        assert!(!fallback.has_motion());
        assert_eq!(fallback.entrance.unwrap().kind, TransitionKind::Fade);
        assert_eq!(fallback.exit.unwrap().start, applied.exit.unwrap().start);
    }
}
