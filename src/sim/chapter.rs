//! Shared chapter core
//!
//! [`Chapter`] owns the player, the live entity list, the active pulse and the
//! completion latch. Chapter-specific behaviour (setup, per-frame rules, win
//! condition, completion sequence) is supplied by a [`ChapterRules`] policy.
//!
//! Per-frame order:
//! 1. read physics back into the player, emit due narration
//! 2. fire a pulse if requested
//! 3. chapter rules
//! 4. pulse propagation, entity animation
//! 5. player energy/timers, depletion check
//! 6. win check (latched), music layers, cleanup of destroyed entities

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::collectible::PulseEvent;
use super::entity::{Entity, EntityId, EntityKind, EntitySignal};
use super::music::MusicLayers;
use super::physics::PhysicsWorld;
use super::player::Player;
use super::portal::PulseWave;
use super::scene::SceneGraph;
use super::services::{AppCommand, FrameContext, SoundCue};
use crate::tuning::Tuning;

/// Notifications for the host (HUD, overlays) and the engine (persistence)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChapterEvent {
    Narration { text: String },
    PulseFired,
    OrbCollected { collected: u32, total: u32 },
    Depleted,
    LightSpeed,
    ShowCompletionOverlay,
    Completed { chapter: usize, elapsed: f32, orbs: u32 },
}

/// HUD readout, filled in by the core and the chapter rules
#[derive(Debug, Clone, Default, Serialize)]
pub struct Hud {
    pub chapter: usize,
    pub title: &'static str,
    pub elapsed: f32,
    pub lumen: f32,
    pub max_lumen: f32,
    pub pulse_ready: bool,
    pub orbs_collected: u32,
    pub orbs_total: u32,
    pub speed: Option<f32>,
    pub max_speed: Option<f32>,
    pub sustained: Option<f32>,
    pub slingshot_ready: bool,
    pub completed: bool,
}

/// State every chapter shares; handed to the rules each frame
pub struct ChapterState {
    pub id: usize,
    pub time: f32,
    pub player: Player,
    pub entities: Vec<Entity>,
    pub pulse: Option<PulseEvent>,
    pub tuning: Tuning,
    pub rng: Pcg32,
    /// Requested bloom strength
    pub bloom: f32,
    /// Camera offset from the player
    pub camera_offset: Vec3,
    /// Shake requested this frame, consumed by the engine
    pub shake: f32,
    /// Climax visuals and music
    pub climax: bool,
    next_id: EntityId,
    completed: bool,
    finished: bool,
    depleted: bool,
    events: Vec<ChapterEvent>,
    narration: Vec<(f32, String)>,
    narration_cursor: usize,
    music: MusicLayers,
}

impl ChapterState {
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn emit(&mut self, event: ChapterEvent) {
        self.events.push(event);
    }

    /// Queue timed narration lines (seconds from chapter start)
    pub fn set_narration(&mut self, mut lines: Vec<(f32, String)>) {
        lines.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.narration = lines;
        self.narration_cursor = 0;
    }

    /// Register a new entity and return its id
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        position: Vec3,
        radius: f32,
        physics: &mut dyn PhysicsWorld,
        scene: &mut dyn SceneGraph,
    ) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities
            .push(Entity::spawn(id, kind, position, radius, physics, scene));
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id && !e.is_destroyed())
    }

    /// Live (not destroyed) entities
    pub fn live(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| !e.is_destroyed())
    }

    pub fn destroy_all_entities(&mut self, physics: &mut dyn PhysicsWorld, scene: &mut dyn SceneGraph) {
        for entity in &mut self.entities {
            entity.destroy(physics, scene);
        }
    }

    /// Drop destroyed entities from the live list
    pub fn cleanup(&mut self) {
        self.entities.retain(|e| !e.is_destroyed());
    }

    /// Emit `Completed` once
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let event = ChapterEvent::Completed {
            chapter: self.id,
            elapsed: self.time,
            orbs: self.player.orbs_collected,
        };
        self.events.push(event);
        log::info!("Chapter {} finished in {:.2}s", self.id, self.time);
    }

    fn fire_pulse(&mut self, ctx: &mut FrameContext) {
        let p = &self.tuning.player;
        let pulse = PulseEvent {
            origin: self.player.position,
            started_at: self.time,
            max_radius: p.pulse_max_radius,
            duration: p.pulse_duration,
            tolerance: p.pulse_tolerance,
            reveal_duration: p.reveal_duration,
        };
        let wave = PulseWave::new(self.time, pulse.duration, pulse.max_radius);
        self.spawn(
            EntityKind::PulseWave(wave),
            pulse.origin,
            1.0,
            ctx.physics,
            ctx.scene,
        );
        self.pulse = Some(pulse);
        ctx.play(SoundCue::Pulse);
        self.emit(ChapterEvent::PulseFired);
    }

    fn propagate_pulse(&mut self) {
        let Some(pulse) = self.pulse else { return };
        if !pulse.is_active(self.time) {
            self.pulse = None;
            return;
        }
        let now = self.time;
        for entity in self.entities.iter_mut().filter(|e| !e.is_destroyed()) {
            let id = entity.id;
            let distance = entity.position.distance(pulse.origin);
            if let Some(reveal) = entity.reveal_mut() {
                if reveal.receive_pulse(distance, &pulse, now) {
                    log::debug!("Pulse revealed entity {}", id);
                }
            }
        }
    }

    fn emit_narration(&mut self) {
        while let Some((at, text)) = self.narration.get(self.narration_cursor) {
            if *at > self.time {
                break;
            }
            let text = text.clone();
            self.narration_cursor += 1;
            self.events.push(ChapterEvent::Narration { text });
        }
    }
}

/// Chapter-specific policy plugged into the shared core
pub trait ChapterRules {
    fn title(&self) -> &'static str;

    /// Lane chapters move the player directly instead of with forces
    fn kinematic_player(&self) -> bool {
        false
    }

    /// Spawn initial entities, queue narration
    fn setup(&mut self, state: &mut ChapterState, ctx: &mut FrameContext);

    /// Per-frame gameplay
    fn update(&mut self, state: &mut ChapterState, ctx: &mut FrameContext, dt: f32);

    fn check_win_condition(&self, state: &ChapterState) -> bool;

    /// Start the completion sequence; called exactly once
    fn complete(&mut self, state: &mut ChapterState, ctx: &mut FrameContext);

    /// React to an entity signal (beam arrival)
    fn on_signal(&mut self, _state: &mut ChapterState, _signal: EntitySignal, _ctx: &mut FrameContext) {}

    /// Progress in [0, 1], drives the music layers
    fn progress(&self, state: &ChapterState) -> f32;

    /// Whether the player loses lumen over time this frame
    fn lumen_decays(&self, state: &ChapterState) -> bool {
        !state.is_completed()
    }

    fn fill_hud(&self, _state: &ChapterState, _hud: &mut Hud) {}
}

pub struct Chapter {
    pub state: ChapterState,
    rules: Box<dyn ChapterRules>,
}

impl Chapter {
    /// Build the chapter and run its setup
    pub fn new(
        id: usize,
        mut rules: Box<dyn ChapterRules>,
        tuning: Tuning,
        seed: u64,
        ctx: &mut FrameContext,
    ) -> Self {
        let player = Player::spawn(
            &tuning.player,
            Vec3::ZERO,
            rules.kinematic_player(),
            ctx.physics,
            ctx.scene,
        );
        let mut state = ChapterState {
            id,
            time: 0.0,
            player,
            entities: Vec::new(),
            pulse: None,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            bloom: 1.0,
            camera_offset: Vec3::new(0.0, 3.0, 10.0),
            shake: 0.0,
            climax: false,
            next_id: 1,
            completed: false,
            finished: false,
            depleted: false,
            events: Vec::new(),
            narration: Vec::new(),
            narration_cursor: 0,
            music: MusicLayers::new(),
        };
        rules.setup(&mut state, ctx);
        log::info!("Chapter {} '{}' loaded", id, rules.title());
        Self { state, rules }
    }

    pub fn id(&self) -> usize {
        self.state.id
    }

    pub fn title(&self) -> &'static str {
        self.rules.title()
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    pub fn update(&mut self, ctx: &mut FrameContext, dt: f32) {
        let state = &mut self.state;
        state.time += dt;
        state.player.read_back(ctx.physics);
        state.emit_narration();

        if ctx.input.just_pressed(super::input::Key::Pulse) && state.player.try_pulse() {
            state.fire_pulse(ctx);
        }

        self.rules.update(&mut self.state, ctx, dt);

        let state = &mut self.state;
        state.propagate_pulse();
        let now = state.time;
        let mut signals = Vec::new();
        for entity in &mut state.entities {
            if let Some(signal) = entity.update(now, dt, ctx.physics, ctx.scene) {
                signals.push(signal);
            }
        }
        for signal in signals {
            self.rules.on_signal(&mut self.state, signal, ctx);
        }

        let decays = self.rules.lumen_decays(&self.state);
        let state = &mut self.state;
        state.player.tick(dt, decays);
        if state.player.is_depleted() && !state.depleted && !state.completed {
            state.depleted = true;
            log::info!("Lumen depleted in chapter {}", state.id);
            ctx.play(SoundCue::Depleted);
            state.emit(ChapterEvent::Depleted);
            ctx.commands.push(AppCommand::RestartChapter);
        }

        if !self.state.completed && self.rules.check_win_condition(&self.state) {
            self.complete(ctx);
        }

        let progress = self.rules.progress(&self.state);
        let state = &mut self.state;
        state.music.update(progress, state.climax, ctx);
        state.cleanup();
    }

    /// Latched: the completion sequence runs at most once
    pub fn complete(&mut self, ctx: &mut FrameContext) -> bool {
        if self.state.completed {
            return false;
        }
        self.state.completed = true;
        log::info!("Chapter {} complete at {:.2}s", self.state.id, self.state.time);
        self.rules.complete(&mut self.state, ctx);
        true
    }

    /// Push entity and player transforms to physics and the scene
    pub fn sync_visuals(&self, physics: &mut dyn PhysicsWorld, scene: &mut dyn SceneGraph) {
        self.state.player.sync(physics, scene);
        for entity in &self.state.entities {
            entity.sync(physics, scene);
        }
    }

    pub fn take_events(&mut self) -> Vec<ChapterEvent> {
        std::mem::take(&mut self.state.events)
    }

    pub fn take_shake(&mut self) -> f32 {
        std::mem::take(&mut self.state.shake)
    }

    pub fn hud(&self) -> Hud {
        let state = &self.state;
        let mut hud = Hud {
            chapter: state.id,
            title: self.rules.title(),
            elapsed: state.time,
            lumen: state.player.lumen(),
            max_lumen: state.player.max_lumen(),
            pulse_ready: state.player.pulse_ready(),
            orbs_collected: state.player.orbs_collected,
            completed: state.completed,
            ..Default::default()
        };
        self.rules.fill_hud(state, &mut hud);
        hud
    }

    /// Release everything the chapter owns
    pub fn unload(&mut self, ctx: &mut FrameContext) {
        let state = &mut self.state;
        state.destroy_all_entities(ctx.physics, ctx.scene);
        state.cleanup();
        state.player.destroy(ctx.physics, ctx.scene);
        state.music.stop_all(ctx);
        state.pulse = None;
        log::info!("Chapter {} unloaded", state.id);
    }
}
