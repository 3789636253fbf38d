//! The player's light: energy, pulse, timers and glow

use glam::{Quat, Vec3};
use serde::Serialize;

use super::physics::{BodyDesc, BodyHandle, PhysicsWorld};
use super::scene::{Appearance, NodeId, SceneGraph, Shape, Visual};
use crate::{lerp, smoothing};
use crate::tuning::PlayerTuning;

/// Target look of the player's glow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum VisualState {
    #[default]
    Normal,
    Boost,
    Danger,
    /// Skimming a slingshot ring
    Slingshot,
    /// Caught in a black hole's outer or far pull
    Pull,
    Climax,
}

impl VisualState {
    fn target(self) -> (Vec3, f32) {
        match self {
            VisualState::Normal => (Vec3::new(1.0, 0.95, 0.8), 1.5),
            VisualState::Boost => (Vec3::new(0.5, 0.9, 1.0), 3.0),
            VisualState::Danger => (Vec3::new(1.0, 0.3, 0.25), 2.0),
            VisualState::Slingshot => (Vec3::new(0.35, 1.0, 0.45), 2.5),
            VisualState::Pull => (Vec3::new(0.75, 0.55, 1.0), 1.2),
            VisualState::Climax => (Vec3::new(1.0, 1.0, 1.0), 4.0),
        }
    }
}

#[derive(Debug)]
pub struct Player {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    lumen: f32,
    max_lumen: f32,
    lumen_decay: f32,
    pulse_cooldown: f32,
    pulse_cooldown_remaining: f32,
    pub visual_state: VisualState,
    color: Vec3,
    intensity: f32,
    visual_rate: f32,
    pub orbs_collected: u32,
    /// Slingshot boost remaining (gravity suppressed while positive)
    pub boost_timer: f32,
    /// Invulnerability remaining after a hazard hit
    pub hit_timer: f32,
    body: Option<BodyHandle>,
    node: Option<NodeId>,
    destroyed: bool,
}

impl Player {
    /// Create the player; `kinematic` players are positioned by the chapter
    /// rather than moved by forces
    pub fn spawn(
        tuning: &PlayerTuning,
        position: Vec3,
        kinematic: bool,
        physics: &mut dyn PhysicsWorld,
        scene: &mut dyn SceneGraph,
    ) -> Self {
        let desc = if kinematic {
            BodyDesc::kinematic(position, tuning.radius)
        } else {
            BodyDesc::dynamic(position, tuning.radius, tuning.mass).with_damping(tuning.damping)
        };
        let (color, intensity) = VisualState::Normal.target();
        let node = scene.add_node(Visual::new(
            Shape::Sphere {
                radius: tuning.radius,
            },
            position,
            color,
            intensity,
        ));

        Self {
            position,
            velocity: Vec3::ZERO,
            radius: tuning.radius,
            lumen: tuning.max_lumen,
            max_lumen: tuning.max_lumen,
            lumen_decay: tuning.lumen_decay,
            pulse_cooldown: tuning.pulse_cooldown,
            pulse_cooldown_remaining: 0.0,
            visual_state: VisualState::Normal,
            color,
            intensity,
            visual_rate: tuning.visual_rate,
            orbs_collected: 0,
            boost_timer: 0.0,
            hit_timer: 0.0,
            body: Some(physics.add_body(desc)),
            node: Some(node),
            destroyed: false,
        }
    }

    pub fn lumen(&self) -> f32 {
        self.lumen
    }

    pub fn max_lumen(&self) -> f32 {
        self.max_lumen
    }

    pub fn is_depleted(&self) -> bool {
        self.lumen <= 0.0
    }

    pub fn add_lumen(&mut self, amount: f32) {
        self.lumen = (self.lumen + amount).clamp(0.0, self.max_lumen);
    }

    pub fn drain_lumen(&mut self, amount: f32) {
        self.add_lumen(-amount);
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn pulse_ready(&self) -> bool {
        self.pulse_cooldown_remaining <= 0.0
    }

    /// Start the pulse cooldown if it has elapsed
    pub fn try_pulse(&mut self) -> bool {
        if !self.pulse_ready() {
            return false;
        }
        self.pulse_cooldown_remaining = self.pulse_cooldown;
        true
    }

    pub fn is_boosting(&self) -> bool {
        self.boost_timer > 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.boost_timer > 0.0 || self.hit_timer > 0.0
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Energy decay, timers and glow interpolation
    pub fn tick(&mut self, dt: f32, decay: bool) {
        if decay {
            self.drain_lumen(self.lumen_decay * dt);
        }
        self.pulse_cooldown_remaining = (self.pulse_cooldown_remaining - dt).max(0.0);
        self.boost_timer = (self.boost_timer - dt).max(0.0);
        self.hit_timer = (self.hit_timer - dt).max(0.0);

        let (color, intensity) = self.visual_state.target();
        let k = smoothing(self.visual_rate, dt);
        self.color = self.color.lerp(color, k);
        self.intensity = lerp(self.intensity, intensity, k);
    }

    /// Read the simulated position back from a dynamic body
    pub fn read_back(&mut self, physics: &dyn PhysicsWorld) {
        let Some(body) = self.body else { return };
        if let Some(position) = physics.position(body) {
            self.position = position;
        }
        if let Some(velocity) = physics.velocity(body) {
            self.velocity = velocity;
        }
    }

    pub fn apply_force(&self, physics: &mut dyn PhysicsWorld, force: Vec3) {
        if let Some(body) = self.body {
            physics.apply_force(body, force);
        }
    }

    /// Push position/glow to the body and visual
    pub fn sync(&self, physics: &mut dyn PhysicsWorld, scene: &mut dyn SceneGraph) {
        if let Some(body) = self.body {
            physics.set_position(body, self.position);
        }
        if let Some(node) = self.node {
            scene.set_transform(node, self.position, Quat::IDENTITY, 1.0);
            let glow = self.intensity * (0.4 + 0.6 * self.lumen / self.max_lumen);
            scene.set_appearance(node, Appearance::new(self.color, glow, 1.0));
        }
    }

    pub fn destroy(&mut self, physics: &mut dyn PhysicsWorld, scene: &mut dyn SceneGraph) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(node) = self.node.take() {
            scene.remove_node(node);
        }
        if let Some(body) = self.body.take() {
            physics.remove_body(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::PointMassWorld;
    use crate::sim::scene::RetainedScene;
    use proptest::prelude::*;

    fn player() -> (Player, PointMassWorld, RetainedScene) {
        let mut physics = PointMassWorld::new();
        let mut scene = RetainedScene::new();
        let p = Player::spawn(&PlayerTuning::default(), Vec3::ZERO, false, &mut physics, &mut scene);
        (p, physics, scene)
    }

    #[test]
    fn test_pulse_cooldown() {
        let (mut p, _, _) = player();
        assert!(p.try_pulse());
        assert!(!p.try_pulse());
        p.tick(1.0, false);
        assert!(!p.try_pulse());
        p.tick(0.6, false);
        assert!(p.try_pulse());
    }

    #[test]
    fn test_decay_only_when_enabled() {
        let (mut p, _, _) = player();
        p.tick(1.0, false);
        assert_eq!(p.lumen(), 100.0);
        p.tick(1.0, true);
        assert!((p.lumen() - 99.4).abs() < 1e-4);
    }

    #[test]
    fn test_visual_state_approaches_target() {
        let (mut p, _, _) = player();
        p.visual_state = VisualState::Danger;
        let before = p.intensity();
        for _ in 0..120 {
            p.tick(1.0 / 60.0, false);
        }
        assert!(p.intensity() > before);
        assert!((p.color() - Vec3::new(1.0, 0.3, 0.25)).length() < 0.01);
    }

    #[test]
    fn test_destroy_releases_once() {
        let (mut p, mut physics, mut scene) = player();
        p.destroy(&mut physics, &mut scene);
        p.destroy(&mut physics, &mut scene);
        assert_eq!(scene.node_count(), 0);
        assert_eq!(physics.body_count(), 0);
    }

    proptest! {
        #[test]
        fn test_lumen_stays_in_bounds(changes in prop::collection::vec(-250.0f32..250.0, 1..40)) {
            let (mut p, _, _) = player();
            for amount in changes {
                p.add_lumen(amount);
                p.tick(0.1, true);
                prop_assert!(p.lumen() >= 0.0 && p.lumen() <= p.max_lumen());
            }
        }
    }
}
