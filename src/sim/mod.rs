//! Chapter simulation
//!
//! All gameplay logic lives here. Rendering, physics integration and audio are
//! collaborators behind traits, so the whole loop runs headless:
//! - Clamped variable timestep (see [`consts::MAX_FRAME_DT`](crate::consts::MAX_FRAME_DT))
//! - Seeded RNG per chapter load
//! - Entities updated in spawn order
//! - No direct rendering or platform dependencies

pub mod camera;
pub mod chapter;
pub mod collectible;
pub mod director;
pub mod economy;
pub mod engine;
pub mod entity;
pub mod gravity;
pub mod hazard;
pub mod input;
pub mod music;
pub mod physics;
pub mod player;
pub mod portal;
pub mod scene;
pub mod services;
pub mod spawner;
pub mod tutorial;
pub mod tween;
pub mod velocity;

#[cfg(test)]
pub(crate) mod testing;

pub use camera::CameraRig;
pub use chapter::{Chapter, ChapterEvent, ChapterRules, ChapterState, Hud};
pub use director::{Destination, Director, Transition};
pub use economy::SpeedEconomy;
pub use engine::Engine;
pub use entity::{Entity, EntityId, EntityKind};
pub use gravity::{BlackHoleZones, GravityZone, Slingshot, apply_gravity};
pub use input::{InputManager, Key};
pub use physics::{BodyDesc, BodyHandle, PhysicsWorld, PointMassWorld};
pub use player::{Player, VisualState};
pub use scene::{RetainedScene, SceneGraph, SceneSnapshot};
pub use services::{AmbientLayer, AppCommand, AudioSink, CommandQueue, FrameContext, SoundCue};
pub use spawner::{Spawner, WavePlan};
pub use tutorial::TutorialRules;
pub use tween::{Easing, Tween};
pub use velocity::VelocityRules;
