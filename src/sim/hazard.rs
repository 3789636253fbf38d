//! Hazards of the lane chapter

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::entity::Animated;
use super::gravity::BlackHoleZones;
use super::scene::Appearance;

const METEOR_COLOR: Vec3 = Vec3::new(0.55, 0.35, 0.25);
const COMET_COLOR: Vec3 = Vec3::new(0.35, 0.1, 0.5);
const DISK_COLOR: Vec3 = Vec3::new(0.7, 0.3, 1.0);

/// Tumbling rock; shatters on contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meteor {
    spin_axis: Vec3,
    spin_speed: f32,
    angle: f32,
}

impl Meteor {
    pub fn new(spin_axis: Vec3, spin_speed: f32) -> Self {
        Self {
            spin_axis: spin_axis.try_normalize().unwrap_or(Vec3::Y),
            spin_speed,
            angle: 0.0,
        }
    }

    pub(crate) fn animate(&mut self, dt: f32) -> Animated {
        self.angle += self.spin_speed * dt;
        Animated {
            appearance: Appearance::new(METEOR_COLOR, 0.3, 1.0),
            scale: 1.0,
            rotation: Quat::from_axis_angle(self.spin_axis, self.angle),
            finished: false,
        }
    }
}

/// Dark comet flying toward the player on a weaving path; passes through on hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowComet {
    pub speed: f32,
    /// Set once it has struck the player; a comet hits at most once
    pub spent: bool,
    base_x: f32,
    weave_amplitude: f32,
    weave_phase: f32,
}

impl ShadowComet {
    pub fn new(base_x: f32, speed: f32, weave_amplitude: f32, weave_phase: f32) -> Self {
        Self {
            speed,
            spent: false,
            base_x,
            weave_amplitude,
            weave_phase,
        }
    }

    pub(crate) fn animate(&mut self, position: &mut Vec3, dt: f32) -> Animated {
        // Travels along +Z, back toward the player
        position.z += self.speed * dt;
        self.weave_phase += dt * 2.0;
        position.x = self.base_x + self.weave_phase.sin() * self.weave_amplitude;

        let intensity = if self.spent { 0.2 } else { 0.8 };
        Animated {
            appearance: Appearance::new(COMET_COLOR, intensity, 0.9),
            scale: 1.0,
            rotation: Quat::from_rotation_z(self.weave_phase),
            finished: false,
        }
    }
}

/// Gravity well with nested influence zones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackHole {
    pub zones: BlackHoleZones,
    spin: f32,
}

impl BlackHole {
    pub fn new(zones: BlackHoleZones) -> Self {
        Self { zones, spin: 0.0 }
    }

    pub(crate) fn animate(&mut self, now: f32, dt: f32) -> Animated {
        self.spin += dt * 1.2;
        let shimmer = 1.5 + 0.3 * (now * 3.0).sin();
        Animated {
            appearance: Appearance::new(DISK_COLOR, shimmer, 0.85),
            scale: 1.0,
            rotation: Quat::from_rotation_z(self.spin),
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comet_moves_toward_player() {
        let mut comet = ShadowComet::new(2.0, 15.0, 0.0, 0.0);
        let mut pos = Vec3::new(2.0, 0.0, -100.0);
        comet.animate(&mut pos, 0.1);
        assert!((pos.z - -98.5).abs() < 1e-4);
        assert_eq!(pos.x, 2.0);
    }

    #[test]
    fn test_meteor_spin_axis_is_normalized() {
        let mut meteor = Meteor::new(Vec3::ZERO, 1.0);
        let out = meteor.animate(0.5);
        assert!(out.rotation.is_normalized());
    }
}
