//! Physics collaborator
//!
//! The chapter core only registers bodies, pushes forces, teleports kinematic
//! bodies and reads positions back. [`PointMassWorld`] is the reference
//! implementation used natively and in tests; a host may supply its own.

use glam::Vec3;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle to a body registered with a physics world
    pub struct BodyHandle;
}

/// Description of a body to register
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub position: Vec3,
    /// Sphere shape radius
    pub radius: f32,
    pub mass: f32,
    /// Trigger bodies report overlap only and never respond to forces
    pub trigger: bool,
    /// Kinematic bodies are moved with `set_position` only
    pub kinematic: bool,
    /// Linear damping per second (0 = none)
    pub damping: f32,
}

impl BodyDesc {
    pub fn dynamic(position: Vec3, radius: f32, mass: f32) -> Self {
        Self {
            position,
            radius,
            mass,
            trigger: false,
            kinematic: false,
            damping: 0.0,
        }
    }

    pub fn trigger(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            mass: 0.0,
            trigger: true,
            kinematic: true,
            damping: 0.0,
        }
    }

    pub fn kinematic(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            mass: 1.0,
            trigger: false,
            kinematic: true,
            damping: 0.0,
        }
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }
}

/// Interface the chapter core requires from a physics engine
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;
    /// Removing an unknown handle is a no-op
    fn remove_body(&mut self, handle: BodyHandle);
    fn apply_force(&mut self, handle: BodyHandle, force: Vec3);
    fn set_position(&mut self, handle: BodyHandle, position: Vec3);
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3);
    fn position(&self, handle: BodyHandle) -> Option<Vec3>;
    fn velocity(&self, handle: BodyHandle) -> Option<Vec3>;
    fn step(&mut self, dt: f32);
    fn body_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct PointMass {
    desc: BodyDesc,
    position: Vec3,
    velocity: Vec3,
    force: Vec3,
}

/// Semi-implicit Euler point masses with linear damping, no contacts
#[derive(Debug, Default)]
pub struct PointMassWorld {
    bodies: SlotMap<BodyHandle, PointMass>,
}

impl PointMassWorld {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhysicsWorld for PointMassWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        self.bodies.insert(PointMass {
            desc,
            position: desc.position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
        })
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if self.bodies.remove(handle).is_none() {
            log::warn!("remove_body on unknown handle {:?}", handle);
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if !body.desc.kinematic {
                body.force += force;
            }
        }
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.position = position;
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.velocity = velocity;
        }
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| b.position)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| b.velocity)
    }

    fn step(&mut self, dt: f32) {
        for (_handle, body) in &mut self.bodies {
            if body.desc.kinematic {
                body.force = Vec3::ZERO;
                continue;
            }

            let inv_mass = if body.desc.mass > 0.0 {
                1.0 / body.desc.mass
            } else {
                0.0
            };
            body.velocity += body.force * inv_mass * dt;
            if body.desc.damping > 0.0 {
                body.velocity *= (1.0 - body.desc.damping * dt).max(0.0);
            }
            body.position += body.velocity * dt;
            body.force = Vec3::ZERO;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_moves_dynamic_body() {
        let mut world = PointMassWorld::new();
        let h = world.add_body(BodyDesc::dynamic(Vec3::ZERO, 1.0, 2.0));
        world.apply_force(h, Vec3::new(4.0, 0.0, 0.0));
        world.step(0.5);
        // a = 2, v = 1, x = 0.5
        assert!((world.velocity(h).unwrap().x - 1.0).abs() < 1e-5);
        assert!((world.position(h).unwrap().x - 0.5).abs() < 1e-5);

        // Forces are cleared after each step
        world.step(0.5);
        assert!((world.velocity(h).unwrap().x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_kinematic_and_trigger_ignore_forces() {
        let mut world = PointMassWorld::new();
        let k = world.add_body(BodyDesc::kinematic(Vec3::ONE, 1.0));
        let t = world.add_body(BodyDesc::trigger(Vec3::ZERO, 1.0));
        world.apply_force(k, Vec3::X * 100.0);
        world.apply_force(t, Vec3::X * 100.0);
        world.step(1.0);
        assert_eq!(world.position(k), Some(Vec3::ONE));
        assert_eq!(world.position(t), Some(Vec3::ZERO));

        world.set_position(k, Vec3::Z);
        assert_eq!(world.position(k), Some(Vec3::Z));
    }

    #[test]
    fn test_remove_is_tolerant() {
        let mut world = PointMassWorld::new();
        let h = world.add_body(BodyDesc::dynamic(Vec3::ZERO, 1.0, 1.0));
        world.remove_body(h);
        world.remove_body(h);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.position(h), None);
    }

    #[test]
    fn test_damping_slows_body() {
        let mut world = PointMassWorld::new();
        let h = world.add_body(BodyDesc::dynamic(Vec3::ZERO, 1.0, 1.0).with_damping(2.0));
        world.set_velocity(h, Vec3::X * 10.0);
        world.step(0.1);
        assert!(world.velocity(h).unwrap().x < 10.0);
    }
}
