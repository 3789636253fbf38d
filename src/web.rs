//! Browser entry point
//!
//! The host page owns the canvas and the renderer. Each animation frame it
//! forwards input, calls [`WebGame::frame`] and draws from
//! [`WebGame::scene_snapshot`].

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::audio::WebAudio;
use crate::leaderboard::{format_age, format_time};
use crate::persistence::{KeyValueStore, LocalStore, MemoryStore};
use crate::settings::Settings;
use crate::sim::{AppCommand, Engine, Key, PointMassWorld, RetainedScene};
use crate::tuning::Tuning;

/// Models the host may have loaded
const KNOWN_MODELS: [&str; 2] = ["meteor", "shadow_comet"];

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Lumina Voyage starting...");
}

/// Leaderboard entry ready for display
#[derive(Serialize)]
struct BoardRow {
    rank: usize,
    elapsed_ms: u64,
    time: String,
    age: String,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::warn!("Serialization failed: {}", e);
        "null".to_string()
    })
}

#[wasm_bindgen]
pub struct WebGame {
    engine: Engine<PointMassWorld, RetainedScene>,
}

#[wasm_bindgen]
impl WebGame {
    /// Create the game; `tuning_json` optionally overrides balance values
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Self {
        let store: Box<dyn KeyValueStore> = match LocalStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{}, progress will not be kept", e);
                Box::new(MemoryStore::new())
            }
        };
        let tuning = Tuning::load_or_default(tuning_json.as_deref());
        let seed = js_sys::Date::now() as u64;
        let engine = Engine::new(PointMassWorld::new(), RetainedScene::new(), store, tuning, seed)
            .with_audio(Box::new(WebAudio::new()));
        Self { engine }
    }

    /// Advance one animation frame (`requestAnimationFrame` timestamp)
    pub fn frame(&mut self, time_ms: f64) {
        self.engine.animate(time_ms);
    }

    pub fn key_down(&mut self, code: &str) {
        if let Some(key) = Key::from_code(code) {
            self.engine.input.key_down(key);
        }
    }

    pub fn key_up(&mut self, code: &str) {
        if let Some(key) = Key::from_code(code) {
            self.engine.input.key_up(key);
        }
    }

    pub fn mouse_move(&mut self, dx: f32, dy: f32) {
        self.engine.input.mouse_move(dx, dy);
    }

    pub fn start_chapter(&mut self, id: usize) {
        self.engine.push_command(AppCommand::StartChapter(id));
    }

    /// Queue a named command; returns false if the name is unknown
    pub fn command(&mut self, name: &str) -> bool {
        match AppCommand::parse(name) {
            Some(command) => {
                self.engine.push_command(command);
                true
            }
            None => {
                log::warn!("Unknown command '{}'", name);
                false
            }
        }
    }

    /// Declare a loaded model so nodes use it instead of the procedural shape
    pub fn register_model(&mut self, name: &str) -> bool {
        match KNOWN_MODELS.iter().find(|m| **m == name) {
            Some(model) => {
                self.engine.scene.register_model(*model);
                true
            }
            None => false,
        }
    }

    /// Window focus changed: auto-pause and optionally mute
    pub fn set_focus(&mut self, focused: bool) {
        if self.engine.settings().mute_on_blur {
            self.engine.set_muted(!focused);
        }
        if !focused && self.engine.director.active().is_some() {
            self.engine.push_command(AppCommand::Pause);
            log::info!("Auto-paused (window blur)");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.engine.is_paused()
    }

    pub fn scene_snapshot(&self) -> String {
        to_json(&self.engine.scene.snapshot())
    }

    /// HUD readout, `null` on the menu
    pub fn hud(&self) -> String {
        to_json(&self.engine.hud())
    }

    /// Events since the last call (narration, overlays, completion)
    pub fn take_events(&mut self) -> String {
        to_json(&self.engine.take_events())
    }

    pub fn progress(&self) -> String {
        to_json(self.engine.progress())
    }

    /// Best times for a chapter with display strings, fastest first
    pub fn leaderboard(&self, chapter: usize) -> String {
        let now = js_sys::Date::now();
        let rows: Vec<BoardRow> = self
            .engine
            .leaderboard(chapter)
            .map(|board| {
                board
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(i, run)| BoardRow {
                        rank: i + 1,
                        elapsed_ms: run.elapsed_ms,
                        time: format_time(run.elapsed_ms),
                        age: format_age(run.timestamp, now),
                    })
                    .collect()
            })
            .unwrap_or_default();
        to_json(&rows)
    }

    pub fn settings(&self) -> String {
        to_json(self.engine.settings())
    }

    /// Apply and persist settings from JSON; returns false if it does not parse
    pub fn set_settings(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => {
                self.engine.apply_settings(settings);
                true
            }
            Err(e) => {
                log::warn!("Ignoring settings: {}", e);
                false
            }
        }
    }
}
