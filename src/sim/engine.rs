//! Frame orchestration
//!
//! The engine owns the collaborators, the director and the persisted player
//! state. Hosts call [`Engine::animate`] once per display frame with a
//! millisecond timestamp; everything else happens inside.

use super::camera::CameraRig;
use super::chapter::{ChapterEvent, Hud};
use super::director::{Destination, Director};
use super::input::{InputManager, Key};
use super::physics::PhysicsWorld;
use super::scene::SceneGraph;
use super::services::{AppCommand, AudioSink, CommandQueue, FrameContext};
use crate::consts::{CHAPTER_COUNT, FIRST_FRAME_DT, MAX_FRAME_DT};
use crate::leaderboard::Leaderboard;
use crate::persistence::KeyValueStore;
use crate::progress::Progress;
use crate::settings::Settings;
use crate::tuning::Tuning;

pub struct Engine<P: PhysicsWorld, S: SceneGraph> {
    pub physics: P,
    pub scene: S,
    audio: Option<Box<dyn AudioSink>>,
    pub input: InputManager,
    pub camera: CameraRig,
    pub director: Director,
    commands: CommandQueue,
    pub tuning: Tuning,
    settings: Settings,
    progress: Progress,
    leaderboards: Vec<Leaderboard>,
    store: Box<dyn KeyValueStore>,
    seed: u64,
    last_time_ms: Option<f64>,
    /// Host clock of the latest frame, stamps leaderboard entries
    clock_ms: f64,
    paused: bool,
    events: Vec<ChapterEvent>,
}

impl<P: PhysicsWorld, S: SceneGraph> Engine<P, S> {
    pub fn new(physics: P, scene: S, store: Box<dyn KeyValueStore>, tuning: Tuning, seed: u64) -> Self {
        let settings = Settings::load(store.as_ref());
        let progress = Progress::load(store.as_ref());
        let leaderboards = (0..CHAPTER_COUNT)
            .map(|chapter| Leaderboard::load(store.as_ref(), chapter))
            .collect();
        log::info!(
            "Engine ready: {} orbs collected so far, seed {}",
            progress.total_orbs,
            seed
        );
        Self {
            physics,
            scene,
            audio: None,
            input: InputManager::new(),
            camera: CameraRig::new(),
            director: Director::new(),
            commands: CommandQueue::new(),
            tuning,
            settings,
            progress,
            leaderboards,
            store,
            seed,
            last_time_ms: None,
            clock_ms: 0.0,
            paused: false,
            events: Vec::new(),
        }
    }

    pub fn with_audio(mut self, mut audio: Box<dyn AudioSink>) -> Self {
        audio.set_volume(self.settings.music_gain(), self.settings.sfx_gain());
        self.audio = Some(audio);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn leaderboard(&self, chapter: usize) -> Option<&Leaderboard> {
        self.leaderboards.get(chapter)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Replace and persist the settings
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.settings.save(self.store.as_mut());
        if let Some(audio) = self.audio.as_mut() {
            audio.set_volume(self.settings.music_gain(), self.settings.sfx_gain());
        }
    }

    /// Silence or restore audio (focus changes)
    pub fn set_muted(&mut self, muted: bool) {
        let (music, sfx) = if muted {
            (0.0, 0.0)
        } else {
            (self.settings.music_gain(), self.settings.sfx_gain())
        };
        if let Some(audio) = self.audio.as_mut() {
            audio.set_volume(music, sfx);
        }
    }

    pub fn push_command(&mut self, command: AppCommand) {
        self.commands.push(command);
    }

    pub fn take_events(&mut self) -> Vec<ChapterEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> Option<Hud> {
        self.director.active().map(|chapter| chapter.hud())
    }

    /// Advance to the host timestamp `now_ms`
    pub fn animate(&mut self, now_ms: f64) {
        let dt = match self.last_time_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => FIRST_FRAME_DT,
        };
        self.last_time_ms = Some(now_ms);
        self.clock_ms = now_ms;
        self.frame(dt);
    }

    /// One frame with an explicit delta
    pub fn frame(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        if self.input.just_pressed(Key::Pause) {
            self.commands.push(AppCommand::TogglePause);
        }

        let running = !self.paused && !self.director.is_transitioning();
        if running && self.director.active().is_some() {
            self.physics.step(dt);
        }

        let swapped = {
            let mut ctx = FrameContext {
                physics: &mut self.physics,
                scene: &mut self.scene,
                audio: self.audio.as_deref_mut(),
                input: &self.input,
                commands: &mut self.commands,
            };
            if running {
                if let Some(chapter) = self.director.active_mut() {
                    chapter.update(&mut ctx, dt);
                }
            }
            self.director.update(dt, &mut ctx, &self.tuning, self.seed)
        };

        let events = match self.director.active_mut() {
            Some(chapter) => {
                chapter.sync_visuals(&mut self.physics, &mut self.scene);
                chapter.take_events()
            }
            None => Vec::new(),
        };
        for event in &events {
            if let ChapterEvent::Completed {
                chapter,
                elapsed,
                orbs,
            } = *event
            {
                self.record_run(chapter, elapsed, orbs);
            }
        }
        self.events.extend(events);

        if swapped {
            self.paused = false;
            self.input.reset();
            if let Some(chapter) = self.director.active() {
                self.camera
                    .snap(chapter.state.player.position, chapter.state.camera_offset);
            }
        }
        self.update_view(dt);
        self.input.end_frame();
        self.process_commands();
    }

    fn update_view(&mut self, dt: f32) {
        if let Some(chapter) = self.director.active_mut() {
            let shake = chapter.take_shake();
            if shake > 0.0 && self.settings.effective_screen_shake() {
                self.camera.add_shake(shake);
            }
            self.camera.look(self.input.mouse_velocity());
            let state = &chapter.state;
            let (position, target) =
                self.camera
                    .update(state.player.position, state.camera_offset, dt);
            self.scene.set_camera(position, target);
            self.scene.set_bloom(state.bloom * self.settings.bloom_scale());
        }
        self.scene.set_overlay(self.director.overlay_alpha());
    }

    /// Persist a finished run: leaderboard, orb total, next chapter unlock
    fn record_run(&mut self, chapter: usize, elapsed: f32, orbs: u32) {
        let elapsed_ms = (elapsed * 1000.0).round() as u64;
        if let Some(board) = self.leaderboards.get_mut(chapter) {
            if let Some(rank) = board.add_time(elapsed_ms, self.clock_ms) {
                log::info!("Chapter {} time ranked #{}", chapter, rank);
                board.save(self.store.as_mut(), chapter);
            }
        }
        self.progress.add_orbs(orbs);
        self.progress.unlock(chapter + 1);
        self.progress.save(self.store.as_mut());
    }

    fn process_commands(&mut self) {
        let mut hold_pause = false;
        for command in self.commands.drain() {
            log::debug!("Command {:?}", command);
            match command {
                AppCommand::StartChapter(id) => {
                    if self.progress.is_unlocked(id) {
                        self.director.request(Destination::Chapter(id));
                    } else {
                        log::warn!("Chapter {} is locked", id);
                    }
                }
                AppCommand::RestartChapter => {
                    if let Some(id) = self.director.active_id() {
                        self.director.request(Destination::Chapter(id));
                    }
                }
                AppCommand::NextChapter => {
                    let next = self.director.active_id().map(|id| id + 1);
                    match next {
                        Some(id) if id < CHAPTER_COUNT && self.progress.is_unlocked(id) => {
                            self.director.request(Destination::Chapter(id));
                        }
                        _ => {
                            self.director.request(Destination::Menu);
                        }
                    }
                }
                AppCommand::ReturnToMenu => {
                    self.director.request(Destination::Menu);
                }
                AppCommand::TogglePause => {
                    if self.director.active().is_some() {
                        self.paused = !self.paused;
                        log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
                    }
                }
                AppCommand::Pause => hold_pause = true,
            }
        }
        if hold_pause && !self.paused && self.director.active().is_some() {
            self.paused = true;
            log::info!("Paused");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::physics::PointMassWorld;
    use crate::sim::scene::RetainedScene;

    const DT: f32 = 1.0 / 60.0;

    type TestEngine = Engine<PointMassWorld, RetainedScene>;

    fn engine(tuning: Tuning) -> TestEngine {
        let mut engine = Engine::new(
            PointMassWorld::new(),
            RetainedScene::new(),
            Box::new(MemoryStore::new()),
            tuning,
            7,
        );
        engine.director.fade_duration = 0.0;
        engine
    }

    /// Queue a chapter and run until it is loaded
    fn start(engine: &mut TestEngine, id: usize) {
        engine.push_command(AppCommand::StartChapter(id));
        engine.frame(DT);
        engine.frame(DT);
        assert_eq!(engine.director.active_id(), Some(id));
    }

    fn chapter_time(engine: &TestEngine) -> f32 {
        engine.director.active().map(|c| c.state.time).unwrap()
    }

    #[test]
    fn test_completion_is_persisted() {
        let mut tuning = Tuning::default();
        tuning.tutorial.orb_count = 1;
        tuning.tutorial.visible_orbs = 1;
        tuning.tutorial.beam_count = 0;
        tuning.tutorial.beam_distance = 0.0;
        tuning.tutorial.portal_trigger_distance = 10.0;
        let mut engine = engine(tuning);
        start(&mut engine, 0);

        let chapter = engine.director.active().unwrap();
        let orb = chapter
            .state
            .live()
            .find(|e| e.as_orb().is_some())
            .map(|e| e.position)
            .unwrap();
        let body = chapter.state.player.body().unwrap();
        engine.physics.set_position(body, orb);

        // Collect, then enter the portal that opens above the player
        engine.frame(DT);
        engine.frame(DT);

        let events = engine.take_events();
        assert!(events.iter().any(|e| matches!(e, ChapterEvent::Completed { chapter: 0, orbs: 1, .. })));
        assert!(engine.progress().is_unlocked(1));
        assert_eq!(engine.progress().total_orbs, 1);
        assert!(engine.leaderboard(0).unwrap().best_time().is_some());

        let reloaded = Progress::load(engine.store());
        assert!(reloaded.is_unlocked(1));
        assert_eq!(Leaderboard::load(engine.store(), 0).entries.len(), 1);
    }

    #[test]
    fn test_depletion_restarts_chapter() {
        let mut engine = engine(Tuning::default());
        start(&mut engine, 0);
        engine.frame(DT);
        engine
            .director
            .active_mut()
            .unwrap()
            .state
            .player
            .drain_lumen(1000.0);

        engine.frame(DT);
        assert!(engine.take_events().contains(&ChapterEvent::Depleted));
        engine.frame(DT);

        let chapter = engine.director.active().unwrap();
        assert_eq!(chapter.id(), 0);
        assert_eq!(chapter.state.time, 0.0);
        assert_eq!(chapter.state.player.lumen(), chapter.state.player.max_lumen());
    }

    #[test]
    fn test_pause_freezes_chapter() {
        let mut engine = engine(Tuning::default());
        start(&mut engine, 0);
        engine.push_command(AppCommand::TogglePause);
        engine.frame(DT);
        assert!(engine.is_paused());

        let frozen = chapter_time(&engine);
        for _ in 0..5 {
            engine.frame(DT);
        }
        assert_eq!(chapter_time(&engine), frozen);

        // The pause key toggles back
        engine.input.key_down(Key::Pause);
        engine.frame(DT);
        assert!(!engine.is_paused());
        engine.frame(DT);
        assert!(chapter_time(&engine) > frozen);
    }

    #[test]
    fn test_pause_survives_toggle_in_same_frame() {
        let mut engine = engine(Tuning::default());
        start(&mut engine, 0);
        engine.push_command(AppCommand::Pause);
        engine.input.key_down(Key::Pause);
        engine.frame(DT);
        assert!(engine.is_paused());

        // Already paused: stays paused
        engine.input.key_up(Key::Pause);
        engine.push_command(AppCommand::Pause);
        engine.frame(DT);
        assert!(engine.is_paused());
    }

    #[test]
    fn test_pause_ignored_on_menu() {
        let mut engine = engine(Tuning::default());
        engine.push_command(AppCommand::Pause);
        engine.frame(DT);
        assert!(!engine.is_paused());
    }

    #[test]
    fn test_chapter_frozen_during_transition() {
        let mut engine = engine(Tuning::default());
        start(&mut engine, 0);
        engine.director.fade_duration = 0.5;
        engine.push_command(AppCommand::RestartChapter);
        engine.frame(0.05);
        assert!(engine.director.is_transitioning());

        let before = chapter_time(&engine);
        engine.frame(0.05);
        assert_eq!(chapter_time(&engine), before);
        assert!(engine.scene.overlay() > 0.0);

        for _ in 0..12 {
            engine.frame(0.05);
        }
        assert!(!engine.director.is_transitioning());
        assert_eq!(engine.scene.overlay(), 0.0);
    }

    #[test]
    fn test_locked_chapter_not_started() {
        let mut engine = engine(Tuning::default());
        engine.push_command(AppCommand::StartChapter(1));
        engine.frame(DT);
        engine.frame(DT);
        assert!(engine.director.active().is_none());
    }

    #[test]
    fn test_animate_clamps_long_frames() {
        let mut engine = engine(Tuning::default());
        engine.animate(0.0);
        engine.push_command(AppCommand::StartChapter(0));
        engine.animate(16.0);
        engine.animate(32.0);
        let before = chapter_time(&engine);
        // A five second stall advances at most one clamped step
        engine.animate(5032.0);
        assert!((chapter_time(&engine) - before - MAX_FRAME_DT).abs() < 1e-5);
    }

    #[test]
    fn test_bloom_follows_settings() {
        let mut engine = engine(Tuning::default());
        engine.apply_settings(Settings {
            bloom: false,
            ..Default::default()
        });
        start(&mut engine, 0);
        engine.frame(DT);
        assert_eq!(engine.scene.bloom(), 0.0);
        assert!(!Settings::load(engine.store()).bloom);
    }
}
