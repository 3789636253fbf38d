//! Wave spawning ahead of the player on the 3x3 lane grid
//!
//! The player flies toward -Z. A cursor (`last_spawn_z`) trails ahead of the
//! player; every time it falls within `spawn_ahead_distance` a wave is planned
//! `spawn_interval` further on. After `advance` returns, the cursor is always
//! at least `spawn_ahead_distance` ahead.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::consts::{LANE_COLS, LANE_ROWS, MAX_OBSTACLES_PER_WAVE};
use crate::tuning::VelocityTuning;

/// Lane index in row-major order (0..9)
pub type Lane = usize;

/// Offset of a lane centre from the corridor axis
pub fn lane_offset(lane: Lane, spacing: f32) -> Vec2 {
    let row = lane / LANE_COLS;
    let col = lane % LANE_COLS;
    Vec2::new(
        (col as f32 - 1.0) * spacing,
        (row as f32 - 1.0) * spacing,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObstacleKind {
    Meteor,
    ShadowComet,
}

/// What to place for one wave
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavePlan {
    pub z: f32,
    pub obstacles: Vec<(Lane, ObstacleKind)>,
    pub photons: Vec<Lane>,
    /// Position of a black hole, if this wave carries one
    pub black_hole: Option<Vec3>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Spawner {
    last_spawn_z: f32,
    wave_index: u32,
    last_black_hole_z: Option<f32>,
}

impl Spawner {
    pub fn new(start_z: f32) -> Self {
        Self {
            last_spawn_z: start_z,
            wave_index: 0,
            last_black_hole_z: None,
        }
    }

    pub fn last_spawn_z(&self) -> f32 {
        self.last_spawn_z
    }

    pub fn wave_index(&self) -> u32 {
        self.wave_index
    }

    /// Move the cursor forward; returns the z of every wave that is due
    pub fn advance(&mut self, player_z: f32, tuning: &VelocityTuning) -> Vec<f32> {
        let mut due = Vec::new();
        while self.last_spawn_z > player_z - tuning.spawn_ahead_distance {
            self.last_spawn_z -= tuning.spawn_interval;
            due.push(self.last_spawn_z);
        }
        due
    }

    /// Decide the contents of the wave at `z`
    pub fn plan_wave<R: Rng>(
        &mut self,
        z: f32,
        difficulty: f32,
        tuning: &VelocityTuning,
        rng: &mut R,
    ) -> WavePlan {
        let count = ((tuning.base_obstacles * difficulty).round() as usize)
            .clamp(1, MAX_OBSTACLES_PER_WAVE);

        let mut lanes: Vec<Lane> = (0..LANE_ROWS * LANE_COLS).collect();
        lanes.shuffle(rng);
        let (taken, free) = lanes.split_at(count);

        let obstacles = taken
            .iter()
            .map(|&lane| {
                let comet = difficulty >= tuning.comet_min_difficulty
                    && rng.random::<f32>() < tuning.comet_chance;
                let kind = if comet {
                    ObstacleKind::ShadowComet
                } else {
                    ObstacleKind::Meteor
                };
                (lane, kind)
            })
            .collect();

        // Photons prefer free lanes by row, rotating the row order each wave.
        // The sort is stable, so columns keep their shuffled order within a row.
        let rotation = self.wave_index as usize % LANE_ROWS;
        let mut free = free.to_vec();
        free.sort_by_key(|&lane| (lane / LANE_COLS + LANE_ROWS - rotation) % LANE_ROWS);
        let photons = free.into_iter().take(tuning.photons_per_wave).collect();

        let roll = rng.random::<f32>();
        let spaced = self
            .last_black_hole_z
            .is_none_or(|last| last - z >= tuning.black_hole_min_spacing);
        let black_hole = if roll < tuning.black_hole_chance
            && difficulty >= tuning.black_hole_min_difficulty
            && spaced
        {
            self.last_black_hole_z = Some(z);
            let col = rng.random_range(0..LANE_COLS);
            let x = (col as f32 - 1.0) * tuning.lane_spacing;
            Some(Vec3::new(x, 0.0, z - tuning.spawn_interval * 0.5))
        } else {
            None
        };

        self.wave_index += 1;
        WavePlan {
            z,
            obstacles,
            photons,
            black_hole,
        }
    }
}

/// Entity is too far behind, or implausibly far ahead of, the player
pub fn should_despawn(entity_z: f32, player_z: f32, tuning: &VelocityTuning) -> bool {
    entity_z > player_z + tuning.despawn_behind_distance
        || entity_z < player_z - (tuning.spawn_ahead_distance + tuning.far_ahead_margin)
}
