//! Time-based animation state
//!
//! Fades, shrink-outs and beam travel are plain values evaluated inside the
//! frame tick against chapter time. Nothing runs after its owner is gone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    EaseOutQuad,
    EaseOutCubic,
    EaseInCubic,
    EaseInOutSine,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInCubic => t * t * t,
            Easing::EaseInOutSine => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }
}

/// A running animation: started at `start`, lasting `duration` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub start: f32,
    pub duration: f32,
    pub easing: Easing,
}

impl Tween {
    pub fn new(start: f32, duration: f32, easing: Easing) -> Self {
        Self {
            start,
            duration,
            easing,
        }
    }

    /// Linear progress in [0, 1]
    pub fn raw(&self, now: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    /// Eased progress in [0, 1]
    pub fn progress(&self, now: f32) -> f32 {
        self.easing.apply(self.raw(now))
    }

    pub fn is_finished(&self, now: f32) -> bool {
        now - self.start >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseOutQuad,
            Easing::EaseOutCubic,
            Easing::EaseInCubic,
            Easing::EaseInOutSine,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-5, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{:?}", easing);
        }
    }

    #[test]
    fn test_tween_tolerates_irregular_sampling() {
        let tween = Tween::new(2.0, 1.0, Easing::EaseOutCubic);
        assert_eq!(tween.raw(1.0), 0.0);
        assert!(!tween.is_finished(2.5));
        // A big jump past the end clamps rather than overshooting
        assert_eq!(tween.progress(10.0), 1.0);
        assert!(tween.is_finished(10.0));
    }

    #[test]
    fn test_zero_duration_is_immediately_done() {
        let tween = Tween::new(0.0, 0.0, Easing::Linear);
        assert_eq!(tween.progress(0.0), 1.0);
        assert!(tween.is_finished(0.0));
    }
}
