//! Lumina Voyage - A glowing-orb arcade voyage through light and gravity
//!
//! Core modules:
//! - `sim`: Chapter simulation (entities, gravity wells, spawning, pulse reveal)
//! - `tuning`: Data-driven game balance
//! - `persistence`: Key/value storage (LocalStorage on web, memory elsewhere)
//! - `settings`, `progress`, `leaderboard`: Persisted player state
//! - `audio` / `web`: Browser-only collaborators

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod leaderboard;
pub mod persistence;
pub mod progress;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use leaderboard::Leaderboard;
pub use progress::Progress;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Upper bound on a frame's delta time (prevents spiral of death after a stall)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Delta used for the very first frame
    pub const FIRST_FRAME_DT: f32 = 1.0 / 60.0;

    /// Player energy bounds
    pub const MAX_LUMEN: f32 = 100.0;

    /// Number of chapters shipped
    pub const CHAPTER_COUNT: usize = 2;

    /// Lane grid is 3x3
    pub const LANE_ROWS: usize = 3;
    pub const LANE_COLS: usize = 3;
    /// Obstacles per wave can never fill the whole grid
    pub const MAX_OBSTACLES_PER_WAVE: usize = 7;

    /// Slingshot ring band, as fractions of the slingshot radius
    pub const SLINGSHOT_RING_INNER: f32 = 0.85;
    /// Far pull zone reaches this multiple of the slingshot radius
    pub const FAR_PULL_FACTOR: f32 = 1.3;

    /// Cumulative orb counter is capped at this value when loaded
    pub const MAX_TOTAL_ORBS: u32 = 9999;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate independent smoothing factor for exponential approach
#[inline]
pub fn smoothing(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// Distance on the XY plane only (lane space)
#[inline]
pub fn lateral_distance(a: Vec3, b: Vec3) -> f32 {
    glam::Vec2::new(a.x - b.x, a.y - b.y).length()
}
