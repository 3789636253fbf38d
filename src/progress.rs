//! Chapter unlocks and the lifetime orb counter

use serde::{Deserialize, Serialize};

use crate::consts::{CHAPTER_COUNT, MAX_TOTAL_ORBS};
use crate::persistence::{self, KeyValueStore};

const STORAGE_NAME: &str = "progress";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// One flag per chapter, in order
    pub unlocked: Vec<bool>,
    pub total_orbs: u32,
}

impl Default for Progress {
    fn default() -> Self {
        let mut unlocked = vec![false; CHAPTER_COUNT];
        unlocked[0] = true;
        Self {
            unlocked,
            total_orbs: 0,
        }
    }
}

impl Progress {
    /// Repair a loaded document: right length, first chapter open, capped total
    fn normalized(mut self) -> Self {
        self.unlocked.resize(CHAPTER_COUNT, false);
        if let Some(first) = self.unlocked.first_mut() {
            *first = true;
        }
        self.total_orbs = self.total_orbs.min(MAX_TOTAL_ORBS);
        self
    }

    pub fn is_unlocked(&self, chapter: usize) -> bool {
        self.unlocked.get(chapter).copied().unwrap_or(false)
    }

    /// Returns true if this call unlocked it
    pub fn unlock(&mut self, chapter: usize) -> bool {
        match self.unlocked.get_mut(chapter) {
            Some(flag) if !*flag => {
                *flag = true;
                log::info!("Chapter {} unlocked", chapter);
                true
            }
            _ => false,
        }
    }

    pub fn add_orbs(&mut self, count: u32) {
        self.total_orbs = self.total_orbs.saturating_add(count).min(MAX_TOTAL_ORBS);
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        persistence::load_json::<Progress>(store, STORAGE_NAME)
            .map(Self::normalized)
            .unwrap_or_default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        if let Err(e) = persistence::save_json(store, STORAGE_NAME, self) {
            log::warn!("Progress not saved: {}", e);
        }
    }
}
