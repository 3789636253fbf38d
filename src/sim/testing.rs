//! Collaborator fixtures for chapter tests

use super::chapter::{Chapter, ChapterRules};
use super::input::{InputManager, Key};
use super::physics::{PhysicsWorld, PointMassWorld};
use super::scene::RetainedScene;
use super::services::{CommandQueue, FrameContext, RecordingAudio};
use crate::tuning::Tuning;

pub struct Rig {
    pub physics: PointMassWorld,
    pub scene: RetainedScene,
    pub audio: RecordingAudio,
    pub input: InputManager,
    pub commands: CommandQueue,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            physics: PointMassWorld::new(),
            scene: RetainedScene::new(),
            audio: RecordingAudio::default(),
            input: InputManager::new(),
            commands: CommandQueue::new(),
        }
    }

    pub fn ctx(&mut self) -> FrameContext<'_> {
        FrameContext {
            physics: &mut self.physics,
            scene: &mut self.scene,
            audio: Some(&mut self.audio),
            input: &self.input,
            commands: &mut self.commands,
        }
    }

    pub fn load(&mut self, rules: Box<dyn ChapterRules>, tuning: Tuning) -> Chapter {
        Chapter::new(0, rules, tuning, 42, &mut self.ctx())
    }

    /// One engine-ordered frame: physics, chapter, sync, input edges
    pub fn step(&mut self, chapter: &mut Chapter, dt: f32) {
        self.physics.step(dt);
        chapter.update(&mut self.ctx(), dt);
        chapter.sync_visuals(&mut self.physics, &mut self.scene);
        self.input.end_frame();
    }

    pub fn tap(&mut self, key: Key) {
        self.input.key_down(key);
        self.input.key_up(key);
    }
}
