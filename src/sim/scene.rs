//! Render collaborator
//!
//! The simulation never draws. It owns disposable visual nodes through the
//! [`SceneGraph`] trait; the host renders them. [`RetainedScene`] keeps a node
//! table that can be exported as a serializable snapshot for a JS renderer.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use serde::Serialize;
use slotmap::{Key, SlotMap, new_key_type};

new_key_type! {
    /// Handle to a visual node
    pub struct NodeId;
}

/// Procedural shapes (always available, also the fallback for models)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Sphere { radius: f32 },
    /// Irregular rock (meteor)
    Rock { radius: f32 },
    /// Flat torus (pulse wave, portal rim, accretion disk)
    Ring { radius: f32, thickness: f32 },
    /// Streak particle
    Streak { length: f32 },
}

/// Description of a node to add
#[derive(Debug, Clone)]
pub struct Visual {
    pub shape: Shape,
    /// Optional model asset; the shape is used when it cannot be loaded
    pub model: Option<&'static str>,
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Visual {
    pub fn new(shape: Shape, position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            shape,
            model: None,
            position,
            color,
            intensity,
        }
    }

    pub fn with_model(mut self, model: &'static str) -> Self {
        self.model = Some(model);
        self
    }
}

/// Colour, emissive intensity and opacity of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Appearance {
    pub color: Vec3,
    pub intensity: f32,
    pub opacity: f32,
}

impl Appearance {
    pub fn new(color: Vec3, intensity: f32, opacity: f32) -> Self {
        Self {
            color,
            intensity,
            opacity,
        }
    }
}

/// Interface the chapter core requires from a renderer
pub trait SceneGraph {
    fn add_node(&mut self, visual: Visual) -> NodeId;
    /// Removing an unknown node is a no-op
    fn remove_node(&mut self, node: NodeId);
    fn set_transform(&mut self, node: NodeId, position: Vec3, rotation: Quat, scale: f32);
    fn set_appearance(&mut self, node: NodeId, appearance: Appearance);
    /// Bloom pass strength; hosts without bloom ignore it
    fn set_bloom(&mut self, strength: f32);
    fn set_camera(&mut self, position: Vec3, target: Vec3);
    /// Full-screen fade overlay (0 = clear, 1 = black)
    fn set_overlay(&mut self, alpha: f32);
    fn clear(&mut self);
    fn node_count(&self) -> usize;
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeState {
    pub shape: Shape,
    pub model: Option<&'static str>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub appearance: Appearance,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: u64,
    #[serde(flatten)]
    pub state: NodeState,
}

/// Everything a host renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub bloom: f32,
    pub overlay: f32,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
}

/// Retained node table
#[derive(Debug, Default)]
pub struct RetainedScene {
    nodes: SlotMap<NodeId, NodeState>,
    models: HashSet<&'static str>,
    missing_models: HashSet<&'static str>,
    bloom: f32,
    overlay: f32,
    camera_position: Vec3,
    camera_target: Vec3,
    /// Removals of nodes that no longer existed
    stale_removals: u32,
}

impl RetainedScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a model the host has loaded
    pub fn register_model(&mut self, name: &'static str) {
        self.models.insert(name);
    }

    pub fn node(&self, node: NodeId) -> Option<&NodeState> {
        self.nodes.get(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn bloom(&self) -> f32 {
        self.bloom
    }

    pub fn overlay(&self) -> f32 {
        self.overlay
    }

    pub fn camera(&self) -> (Vec3, Vec3) {
        (self.camera_position, self.camera_target)
    }

    pub fn stale_removals(&self) -> u32 {
        self.stale_removals
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            nodes: self
                .nodes
                .iter()
                .map(|(id, state)| NodeSnapshot {
                    id: id.data().as_ffi(),
                    state: state.clone(),
                })
                .collect(),
            bloom: self.bloom,
            overlay: self.overlay,
            camera_position: self.camera_position,
            camera_target: self.camera_target,
        }
    }
}

impl SceneGraph for RetainedScene {
    fn add_node(&mut self, visual: Visual) -> NodeId {
        let model = match visual.model {
            Some(name) if self.models.contains(name) => Some(name),
            Some(name) => {
                if self.missing_models.insert(name) {
                    log::warn!("Model '{}' unavailable, using procedural {:?}", name, visual.shape);
                }
                None
            }
            None => None,
        };

        self.nodes.insert(NodeState {
            shape: visual.shape,
            model,
            position: visual.position,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            appearance: Appearance::new(visual.color, visual.intensity, 1.0),
        })
    }

    fn remove_node(&mut self, node: NodeId) {
        if self.nodes.remove(node).is_none() {
            self.stale_removals += 1;
            log::warn!("remove_node on unknown node {:?}", node);
        }
    }

    fn set_transform(&mut self, node: NodeId, position: Vec3, rotation: Quat, scale: f32) {
        if let Some(state) = self.nodes.get_mut(node) {
            state.position = position;
            state.rotation = rotation;
            state.scale = scale;
        }
    }

    fn set_appearance(&mut self, node: NodeId, appearance: Appearance) {
        if let Some(state) = self.nodes.get_mut(node) {
            state.appearance = appearance;
        }
    }

    fn set_bloom(&mut self, strength: f32) {
        self.bloom = strength;
    }

    fn set_camera(&mut self, position: Vec3, target: Vec3) {
        self.camera_position = position;
        self.camera_target = target;
    }

    fn set_overlay(&mut self, alpha: f32) {
        self.overlay = alpha.clamp(0.0, 1.0);
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_falls_back_to_shape() {
        let mut scene = RetainedScene::new();
        scene.register_model("meteor_a");
        let known = scene.add_node(
            Visual::new(Shape::Rock { radius: 1.0 }, Vec3::ZERO, Vec3::ONE, 1.0)
                .with_model("meteor_a"),
        );
        let missing = scene.add_node(
            Visual::new(Shape::Rock { radius: 1.0 }, Vec3::ZERO, Vec3::ONE, 1.0)
                .with_model("meteor_b"),
        );
        assert_eq!(scene.node(known).unwrap().model, Some("meteor_a"));
        assert_eq!(scene.node(missing).unwrap().model, None);
        assert_eq!(scene.node(missing).unwrap().shape, Shape::Rock { radius: 1.0 });
    }

    #[test]
    fn test_double_remove_is_counted_not_fatal() {
        let mut scene = RetainedScene::new();
        let n = scene.add_node(Visual::new(Shape::Sphere { radius: 1.0 }, Vec3::ZERO, Vec3::ONE, 1.0));
        scene.remove_node(n);
        scene.remove_node(n);
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.stale_removals(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut scene = RetainedScene::new();
        scene.add_node(Visual::new(Shape::Ring { radius: 2.0, thickness: 0.1 }, Vec3::Z, Vec3::ONE, 2.0));
        scene.set_bloom(1.5);
        let json = serde_json::to_string(&scene.snapshot()).unwrap();
        assert!(json.contains("\"ring\""));
        assert!(json.contains("\"bloom\":1.5"));
    }
}
