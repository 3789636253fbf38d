//! Per-chapter best times
//!
//! Persisted under `lumina_voyage_leaderboard_<chapter>`, top 10 fastest runs.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};

/// Maximum number of runs to keep per chapter
pub const MAX_ENTRIES: usize = 10;

/// A single completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTime {
    /// Chapter completion time in milliseconds
    pub elapsed_ms: u64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<RunTime>,
}

fn storage_name(chapter: usize) -> String {
    format!("leaderboard_{}", chapter)
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a time would make the board (lower is better)
    pub fn qualifies(&self, elapsed_ms: u64) -> bool {
        if elapsed_ms == 0 {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().is_none_or(|e| elapsed_ms < e.elapsed_ms)
    }

    /// Get the rank a time would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, elapsed_ms: u64) -> Option<usize> {
        if !self.qualifies(elapsed_ms) {
            return None;
        }
        let rank = self.entries.iter().position(|e| elapsed_ms < e.elapsed_ms);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Record a run; returns the rank achieved (1-indexed)
    pub fn add_time(&mut self, elapsed_ms: u64, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(elapsed_ms)?;
        self.entries.insert(
            rank - 1,
            RunTime {
                elapsed_ms,
                timestamp,
            },
        );
        self.entries.truncate(MAX_ENTRIES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best_time(&self) -> Option<u64> {
        self.entries.first().map(|e| e.elapsed_ms)
    }

    pub fn load(store: &dyn KeyValueStore, chapter: usize) -> Self {
        match persistence::load_json::<Leaderboard>(store, &storage_name(chapter)) {
            Some(mut board) => {
                // Trust nothing about order or length from storage
                board.entries.sort_by_key(|e| e.elapsed_ms);
                board.entries.truncate(MAX_ENTRIES);
                log::info!("Loaded {} times for chapter {}", board.entries.len(), chapter);
                board
            }
            None => Self::new(),
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, chapter: usize) {
        match persistence::save_json(store, &storage_name(chapter), self) {
            Ok(()) => log::info!("Leaderboard {} saved ({} entries)", chapter, self.entries.len()),
            Err(e) => log::warn!("Leaderboard {} not saved: {}", chapter, e),
        }
    }
}

/// Format milliseconds as `m:ss.mmm`
pub fn format_time(elapsed_ms: u64) -> String {
    let minutes = elapsed_ms / 60_000;
    let seconds = (elapsed_ms / 1000) % 60;
    let millis = elapsed_ms % 1000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// Format a timestamp relative to `now` (both Unix ms)
pub fn format_age(timestamp: f64, now: f64) -> String {
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_sorted_ascending_and_capped() {
        let mut board = Leaderboard::new();
        for ms in [5000u64, 3000, 9000, 1000, 7000, 2000, 8000, 4000, 6000, 10000, 11000] {
            board.add_time(ms, 0.0);
        }
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert_eq!(board.best_time(), Some(1000));
        assert!(board.entries.windows(2).all(|w| w[0].elapsed_ms <= w[1].elapsed_ms));
        // Slower than everything on a full board
        assert!(!board.qualifies(20000));
        assert_eq!(board.add_time(500, 0.0), Some(1));
        assert_eq!(board.entries.last().map(|e| e.elapsed_ms), Some(9000));
    }

    #[test]
    fn test_zero_time_rejected() {
        let mut board = Leaderboard::new();
        assert_eq!(board.add_time(0, 0.0), None);
        assert!(board.is_empty());
    }

    #[test]
    fn test_per_chapter_keys() {
        let mut store = MemoryStore::new();
        let mut board = Leaderboard::new();
        board.add_time(1234, 1.0);
        board.save(&mut store, 1);
        assert!(Leaderboard::load(&store, 0).is_empty());
        assert_eq!(Leaderboard::load(&store, 1).best_time(), Some(1234));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_time(83_045), "1:23.045");
        assert_eq!(format_age(0.0, 30_000.0), "Just now");
        assert_eq!(format_age(0.0, 2.5 * 3_600_000.0), "2 hours ago");
        assert_eq!(format_age(0.0, 86_400_000.0), "Yesterday");
    }
}
