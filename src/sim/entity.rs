//! Tagged entity record shared by every chapter
//!
//! An entity owns at most one visual node and one physics body. Destroying it
//! releases both exactly once; after that it is inert until the chapter's
//! cleanup pass drops it from the live list.

use glam::{Quat, Vec3};

use super::collectible::{Orb, Photon};
use super::hazard::{BlackHole, Meteor, ShadowComet};
use super::physics::{BodyDesc, BodyHandle, PhysicsWorld};
use super::portal::{Portal, PortalBeam, PulseWave};
use super::scene::{Appearance, NodeId, SceneGraph, Shape, Visual};

/// Chapter-local entity id
pub type EntityId = u32;

#[derive(Debug, Clone)]
pub enum EntityKind {
    Orb(Orb),
    Photon(Photon),
    Meteor(Meteor),
    ShadowComet(ShadowComet),
    BlackHole(BlackHole),
    Portal(Portal),
    PortalBeam(PortalBeam),
    PulseWave(PulseWave),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Orb(_) => "orb",
            EntityKind::Photon(_) => "photon",
            EntityKind::Meteor(_) => "meteor",
            EntityKind::ShadowComet(_) => "shadow_comet",
            EntityKind::BlackHole(_) => "black_hole",
            EntityKind::Portal(_) => "portal",
            EntityKind::PortalBeam(_) => "portal_beam",
            EntityKind::PulseWave(_) => "pulse_wave",
        }
    }

    /// Hazards the player can collide with
    pub fn is_hazard(&self) -> bool {
        matches!(self, EntityKind::Meteor(_) | EntityKind::ShadowComet(_))
    }

    fn visual(&self, position: Vec3, radius: f32) -> Visual {
        match self {
            EntityKind::Orb(orb) => {
                let intensity = if orb.hidden { 0.1 } else { 1.2 };
                Visual::new(Shape::Sphere { radius }, position, Vec3::new(1.0, 0.85, 0.45), intensity)
            }
            EntityKind::Photon(_) => {
                Visual::new(Shape::Sphere { radius }, position, Vec3::new(0.45, 0.9, 1.0), 1.4)
            }
            EntityKind::Meteor(_) => {
                Visual::new(Shape::Rock { radius }, position, Vec3::new(0.55, 0.35, 0.25), 0.3)
                    .with_model("meteor")
            }
            EntityKind::ShadowComet(_) => {
                Visual::new(Shape::Sphere { radius }, position, Vec3::new(0.35, 0.1, 0.5), 0.8)
                    .with_model("shadow_comet")
            }
            EntityKind::BlackHole(hole) => Visual::new(
                Shape::Ring {
                    radius: hole.zones.trap_radius,
                    thickness: hole.zones.event_horizon,
                },
                position,
                Vec3::new(0.7, 0.3, 1.0),
                1.5,
            ),
            EntityKind::Portal(_) => Visual::new(
                Shape::Ring {
                    radius,
                    thickness: radius * 0.15,
                },
                position,
                Vec3::new(0.6, 0.9, 1.0),
                1.0,
            ),
            EntityKind::PortalBeam(_) => {
                Visual::new(Shape::Streak { length: 2.0 }, position, Vec3::new(1.0, 0.9, 0.6), 3.0)
            }
            EntityKind::PulseWave(_) => Visual::new(
                Shape::Ring {
                    radius: 1.0,
                    thickness: 0.05,
                },
                position,
                Vec3::new(0.8, 0.95, 1.0),
                2.0,
            ),
        }
    }

    fn body(&self, position: Vec3, radius: f32) -> Option<BodyDesc> {
        match self {
            EntityKind::Orb(_) | EntityKind::Photon(_) | EntityKind::Portal(_) => {
                Some(BodyDesc::trigger(position, radius))
            }
            EntityKind::Meteor(_) | EntityKind::ShadowComet(_) | EntityKind::BlackHole(_) => {
                Some(BodyDesc::kinematic(position, radius))
            }
            EntityKind::PortalBeam(_) | EntityKind::PulseWave(_) => None,
        }
    }
}

/// Per-frame animation output of an entity kind
#[derive(Debug, Clone, Copy)]
pub(crate) struct Animated {
    pub appearance: Appearance,
    pub scale: f32,
    pub rotation: Quat,
    /// The entity has played out and should be destroyed
    pub finished: bool,
}

impl Animated {
    pub fn still(appearance: Appearance) -> Self {
        Self {
            appearance,
            scale: 1.0,
            rotation: Quat::IDENTITY,
            finished: false,
        }
    }
}

/// Something an entity update wants the chapter to react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntitySignal {
    BeamArrived { destination: Vec3 },
}

#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub radius: f32,
    rotation: Quat,
    scale: f32,
    node: Option<NodeId>,
    body: Option<BodyHandle>,
    destroyed: bool,
}

impl Entity {
    /// Create the entity and register its visual and body
    pub fn spawn(
        id: EntityId,
        kind: EntityKind,
        position: Vec3,
        radius: f32,
        physics: &mut dyn PhysicsWorld,
        scene: &mut dyn SceneGraph,
    ) -> Self {
        let node = scene.add_node(kind.visual(position, radius));
        let body = kind.body(position, radius).map(|desc| physics.add_body(desc));
        Self {
            id,
            kind,
            position,
            radius,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            node: Some(node),
            body,
            destroyed: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Release the visual and body; calling again does nothing
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

    /// Sphere overlap test against another sphere
    pub fn overlaps(&self, center: Vec3, radius: f32) -> bool {
        self.position.distance(center) < self.radius + radius
    }

    /// Advance the kind's own animation/motion for one frame
    pub fn update(
        &mut self,
        now: f32,
        dt: f32,
        physics: &mut dyn PhysicsWorld,
        scene: &mut dyn SceneGraph,
    ) -> Option<EntitySignal> {
        if self.destroyed {
            return None;
        }

        let mut signal = None;
        let animated = match &mut self.kind {
            EntityKind::Orb(orb) => orb.animate(&mut self.position, now),
            EntityKind::Photon(photon) => photon.animate(now, dt),
            EntityKind::Meteor(meteor) => meteor.animate(dt),
            EntityKind::ShadowComet(comet) => comet.animate(&mut self.position, dt),
            EntityKind::BlackHole(hole) => hole.animate(now, dt),
            EntityKind::Portal(portal) => portal.animate(now, dt),
            EntityKind::PortalBeam(beam) => {
                let out = beam.animate(&mut self.position, now);
                if out.finished && !beam.arrived {
                    beam.arrived = true;
                    signal = Some(EntitySignal::BeamArrived {
                        destination: beam.to,
                    });
                }
                out
            }
            EntityKind::PulseWave(wave) => wave.animate(now),
        };

        self.rotation = animated.rotation;
        self.scale = animated.scale;
        if let Some(node) = self.node {
            scene.set_appearance(node, animated.appearance);
        }
        if animated.finished {
            self.destroy(physics, scene);
        }
        signal
    }

    /// Push the current transform to the body and the visual
    pub fn sync(&self, physics: &mut dyn PhysicsWorld, scene: &mut dyn SceneGraph) {
        if self.destroyed {
            return;
        }
        if let Some(body) = self.body {
            physics.set_position(body, self.position);
        }
        if let Some(node) = self.node {
            scene.set_transform(node, self.position, self.rotation, self.scale);
        }
    }

    pub fn as_orb(&self) -> Option<&Orb> {
        match &self.kind {
            EntityKind::Orb(orb) => Some(orb),
            _ => None,
        }
    }

    pub fn as_black_hole(&self) -> Option<&BlackHole> {
        match &self.kind {
            EntityKind::BlackHole(hole) => Some(hole),
            _ => None,
        }
    }

    /// Reveal state for kinds a pulse can uncover
    pub fn reveal_mut(&mut self) -> Option<&mut super::collectible::Reveal> {
        match &mut self.kind {
            EntityKind::Orb(orb) => Some(&mut orb.reveal),
            EntityKind::Photon(photon) => Some(&mut photon.reveal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::PointMassWorld;
    use crate::sim::scene::RetainedScene;

    #[test]
    fn test_destroy_is_idempotent() {
        let mut physics = PointMassWorld::new();
        let mut scene = RetainedScene::new();
        let mut e = Entity::spawn(
            1,
            EntityKind::Meteor(Meteor::new(Vec3::X, 1.0)),
            Vec3::ZERO,
            1.0,
            &mut physics,
            &mut scene,
        );
        assert_eq!(scene.node_count(), 1);
        assert_eq!(physics.body_count(), 1);

        e.destroy(&mut physics, &mut scene);
        e.destroy(&mut physics, &mut scene);
        assert!(e.is_destroyed());
        assert_eq!(scene.node_count(), 0);
        assert_eq!(physics.body_count(), 0);
        assert_eq!(scene.stale_removals(), 0);
    }

    #[test]
    fn test_beam_signals_arrival_once_then_destroys() {
        let mut physics = PointMassWorld::new();
        let mut scene = RetainedScene::new();
        let to = Vec3::new(0.0, 0.0, -10.0);
        let mut e = Entity::spawn(
            2,
            EntityKind::PortalBeam(PortalBeam::new(Vec3::ZERO, to, 0.0, 1.0, 0.0)),
            Vec3::ZERO,
            0.2,
            &mut physics,
            &mut scene,
        );
        assert_eq!(e.update(0.5, 0.5, &mut physics, &mut scene), None);
        assert_eq!(
            e.update(1.0, 0.5, &mut physics, &mut scene),
            Some(EntitySignal::BeamArrived { destination: to })
        );
        assert!(e.is_destroyed());
        assert_eq!(e.update(1.5, 0.5, &mut physics, &mut scene), None);
    }

    #[test]
    fn test_sync_pushes_transform() {
        let mut physics = PointMassWorld::new();
        let mut scene = RetainedScene::new();
        let mut e = Entity::spawn(
            3,
            EntityKind::Photon(Photon::new()),
            Vec3::ZERO,
            0.5,
            &mut physics,
            &mut scene,
        );
        e.position = Vec3::new(1.0, 2.0, 3.0);
        e.sync(&mut physics, &mut scene);
        let node = e.node().unwrap();
        assert_eq!(scene.node(node).unwrap().position, e.position);
        assert_eq!(physics.position(e.body().unwrap()), Some(e.position));
    }
}
