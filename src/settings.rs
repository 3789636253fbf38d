//! Player preferences
//!
//! Persisted separately from progress under `lumina_voyage_settings`.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};

const STORAGE_NAME: &str = "settings";

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume percentage (0 - 100)
    pub master_volume: u8,
    /// Music volume percentage (0 - 100)
    pub music_volume: u8,
    /// Sound effects volume percentage (0 - 100)
    pub sfx_volume: u8,
    /// Mute when the page loses focus
    pub mute_on_blur: bool,

    // === Visual Effects ===
    pub screen_shake: bool,
    pub bloom: bool,

    // === Accessibility ===
    /// Reduced motion (minimize shake and flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 80,
            music_volume: 70,
            sfx_volume: 100,
            mute_on_blur: true,

            screen_shake: true,
            bloom: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Clamp out-of-range values from older or hand-edited saves
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.min(100);
        self.music_volume = self.music_volume.min(100);
        self.sfx_volume = self.sfx_volume.min(100);
        self
    }

    /// Music gain in [0, 1]
    pub fn music_gain(&self) -> f32 {
        self.master_volume as f32 / 100.0 * self.music_volume as f32 / 100.0
    }

    /// Effect gain in [0, 1]
    pub fn sfx_gain(&self) -> f32 {
        self.master_volume as f32 / 100.0 * self.sfx_volume as f32 / 100.0
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Multiplier applied to the chapter's requested bloom
    pub fn bloom_scale(&self) -> f32 {
        match (self.bloom, self.reduced_motion) {
            (false, _) => 0.0,
            (true, true) => 0.4,
            (true, false) => 1.0,
        }
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load_json::<Settings>(store, STORAGE_NAME) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match persistence::save_json(store, STORAGE_NAME, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_roundtrip() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            music_volume: 10,
            reduced_motion: true,
            ..Default::default()
        };
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_out_of_range_volume_clamped() {
        let mut store = MemoryStore::new();
        store
            .set("lumina_voyage_settings", r#"{"master_volume": 250, "sfx_volume": 40}"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.master_volume, 100);
        assert_eq!(settings.sfx_volume, 40);
        // Missing fields keep defaults
        assert_eq!(settings.music_volume, 70);
    }

    #[test]
    fn test_gains_and_reduced_motion() {
        let settings = Settings {
            master_volume: 50,
            sfx_volume: 50,
            reduced_motion: true,
            ..Default::default()
        };
        assert!((settings.sfx_gain() - 0.25).abs() < 1e-6);
        assert!(!settings.effective_screen_shake());
        assert_eq!(settings.bloom_scale(), 0.4);
    }

    #[test]
    fn test_failed_save_is_not_fatal() {
        let mut store = MemoryStore {
            reject_writes: true,
            ..Default::default()
        };
        Settings::default().save(&mut store);
        assert_eq!(Settings::load(&store), Settings::default());
    }
}
