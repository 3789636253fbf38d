//! Portal, the beams that summon it, and the visible pulse ring

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::entity::Animated;
use super::scene::Appearance;
use super::tween::{Easing, Tween};

const PORTAL_COLOR: Vec3 = Vec3::new(0.6, 0.9, 1.0);
const BEAM_COLOR: Vec3 = Vec3::new(1.0, 0.9, 0.6);
const PULSE_COLOR: Vec3 = Vec3::new(0.8, 0.95, 1.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    opening: Tween,
    spin: f32,
}

impl Portal {
    pub fn new(now: f32) -> Self {
        Self {
            opening: Tween::new(now, 1.2, Easing::EaseOutCubic),
            spin: 0.0,
        }
    }

    pub(crate) fn animate(&mut self, now: f32, dt: f32) -> Animated {
        self.spin += dt * 0.8;
        let open = self.opening.progress(now);
        Animated {
            appearance: Appearance::new(PORTAL_COLOR, 1.0 + 2.0 * open, open),
            scale: open.max(0.01),
            rotation: Quat::from_rotation_z(self.spin),
            finished: false,
        }
    }
}

/// Streak of light travelling from the player to the portal site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalBeam {
    pub from: Vec3,
    pub to: Vec3,
    travel: Tween,
    /// Angle of the spiral this beam follows around its straight path
    swirl: f32,
    pub arrived: bool,
}

impl PortalBeam {
    pub fn new(from: Vec3, to: Vec3, now: f32, duration: f32, swirl: f32) -> Self {
        Self {
            from,
            to,
            travel: Tween::new(now, duration, Easing::EaseInOutSine),
            swirl,
            arrived: false,
        }
    }

    /// Position along the spiral path at `now`
    pub fn position_at(&self, now: f32) -> Vec3 {
        let t = self.travel.progress(now);
        let straight = self.from.lerp(self.to, t);
        // Radius shrinks to zero at both ends
        let radius = 3.0 * (std::f32::consts::PI * t).sin();
        let angle = self.swirl + t * std::f32::consts::TAU;
        straight + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
    }

    pub(crate) fn animate(&mut self, position: &mut Vec3, now: f32) -> Animated {
        *position = self.position_at(now);
        let done = self.travel.is_finished(now);
        Animated {
            appearance: Appearance::new(BEAM_COLOR, 3.0, 1.0),
            scale: 1.0,
            rotation: Quat::IDENTITY,
            finished: done,
        }
    }
}

/// The visible ring of a pulse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseWave {
    expansion: Tween,
    max_radius: f32,
}

impl PulseWave {
    pub fn new(now: f32, duration: f32, max_radius: f32) -> Self {
        Self {
            expansion: Tween::new(now, duration, Easing::Linear),
            max_radius,
        }
    }

    pub(crate) fn animate(&self, now: f32) -> Animated {
        let t = self.expansion.progress(now);
        Animated {
            appearance: Appearance::new(PULSE_COLOR, 2.0, 1.0 - t),
            scale: (t * self.max_radius).max(0.01),
            rotation: Quat::IDENTITY,
            finished: self.expansion.is_finished(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beam_starts_and_ends_on_path() {
        let beam = PortalBeam::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -40.0), 0.0, 2.0, 1.0);
        assert!(beam.position_at(0.0).distance(Vec3::ZERO) < 1e-4);
        assert!(beam.position_at(2.0).distance(Vec3::new(0.0, 0.0, -40.0)) < 1e-3);
    }

    #[test]
    fn test_pulse_wave_fades_while_growing() {
        let wave = PulseWave::new(0.0, 1.0, 30.0);
        let early = wave.animate(0.25);
        let late = wave.animate(0.75);
        assert!(late.scale > early.scale);
        assert!(late.appearance.opacity < early.appearance.opacity);
        assert!(wave.animate(1.0).finished);
    }
}
