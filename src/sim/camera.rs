//! Follow camera with decaying shake

use glam::{Vec2, Vec3};

use crate::smoothing;

const SHAKE_DECAY: f32 = 0.9;
const SHAKE_CUTOFF: f32 = 0.01;
/// World units of look sway per pixel of mouse velocity
const LOOK_SCALE: f32 = 0.01;
const MAX_LOOK: f32 = 1.5;

#[derive(Debug, Clone)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub follow_rate: f32,
    shake: f32,
    shake_phase: f32,
    look: Vec3,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 10.0),
            target: Vec3::ZERO,
            follow_rate: 5.0,
            shake: 0.0,
            shake_phase: 0.0,
            look: Vec3::ZERO,
        }
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shake(&self) -> f32 {
        self.shake
    }

    /// Add shake; stronger requests win
    pub fn add_shake(&mut self, amount: f32) {
        self.shake = self.shake.max(amount);
    }

    /// Sway the look target with mouse motion (screen y is down)
    pub fn look(&mut self, mouse_velocity: Vec2) {
        self.look = (Vec3::new(mouse_velocity.x, -mouse_velocity.y, 0.0) * LOOK_SCALE)
            .clamp_length_max(MAX_LOOK);
    }

    /// Jump straight to the follow position (chapter load)
    pub fn snap(&mut self, subject: Vec3, offset: Vec3) {
        self.position = subject + offset;
        self.target = subject;
        self.shake = 0.0;
    }

    /// Move toward `subject + offset`; returns (position, look target)
    pub fn update(&mut self, subject: Vec3, offset: Vec3, dt: f32) -> (Vec3, Vec3) {
        let k = smoothing(self.follow_rate, dt);
        self.position = self.position.lerp(subject + offset, k);
        self.target = self.target.lerp(subject, k);

        let mut jitter = Vec3::ZERO;
        if self.shake > 0.0 {
            self.shake_phase += dt * 60.0;
            jitter = Vec3::new(
                (self.shake_phase * 1.3).sin(),
                (self.shake_phase * 1.7).cos(),
                0.0,
            ) * self.shake;
            self.shake *= SHAKE_DECAY;
            if self.shake < SHAKE_CUTOFF {
                self.shake = 0.0;
            }
        }
        (self.position + jitter, self.target + self.look)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shake_decays_to_zero() {
        let mut cam = CameraRig::new();
        cam.add_shake(0.5);
        let mut frames = 0;
        while cam.shake() > 0.0 {
            cam.update(Vec3::ZERO, Vec3::Z, 1.0 / 60.0);
            frames += 1;
            assert!(frames < 100);
        }
        // 0.5 * 0.9^n < 0.01 first at n = 38
        assert_eq!(frames, 38);
    }

    #[test]
    fn test_follows_subject() {
        let mut cam = CameraRig::new();
        for _ in 0..300 {
            cam.update(Vec3::new(0.0, 0.0, -50.0), Vec3::new(0.0, 2.0, 8.0), 1.0 / 60.0);
        }
        assert!(cam.position.distance(Vec3::new(0.0, 2.0, -42.0)) < 0.01);
        assert!(cam.target.distance(Vec3::new(0.0, 0.0, -50.0)) < 0.01);
    }

    #[test]
    fn test_mouse_sways_look_target() {
        let mut cam = CameraRig::new();
        cam.snap(Vec3::ZERO, Vec3::Z);
        cam.look(Vec2::new(50.0, 0.0));
        let (_, target) = cam.update(Vec3::ZERO, Vec3::Z, 1.0 / 60.0);
        assert!((target.x - 0.5).abs() < 1e-5);

        cam.look(Vec2::new(0.0, 10_000.0));
        let (_, target) = cam.update(Vec3::ZERO, Vec3::Z, 1.0 / 60.0);
        assert!((target.y + MAX_LOOK).abs() < 1e-4);

        cam.look(Vec2::ZERO);
        let (_, target) = cam.update(Vec3::ZERO, Vec3::Z, 1.0 / 60.0);
        assert_eq!(target, Vec3::ZERO);
    }
}
