//! Data-driven game balance
//!
//! Every value has a compile-time default; a JSON document may override any
//! subset of them. Invalid documents fall back to the defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_LUMEN;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Player movement, energy and pulse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    pub mass: f32,
    pub max_lumen: f32,
    /// Lumen lost per second
    pub lumen_decay: f32,
    /// Force applied by movement keys (free-flight chapters)
    pub move_force: f32,
    pub damping: f32,
    /// Lateral speed in lane chapters (units/s)
    pub lateral_speed: f32,
    pub pulse_cooldown: f32,
    pub pulse_max_radius: f32,
    pub pulse_duration: f32,
    /// Half-width of the band around the wave front that reveals
    pub pulse_tolerance: f32,
    pub reveal_duration: f32,
    /// Colour/intensity approach rate toward the visual-state target
    pub visual_rate: f32,
    /// Invulnerability after a hazard hit (seconds)
    pub hit_invulnerability: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.6,
            mass: 1.0,
            max_lumen: MAX_LUMEN,
            lumen_decay: 0.6,
            move_force: 18.0,
            damping: 2.5,
            lateral_speed: 9.0,
            pulse_cooldown: 1.5,
            pulse_max_radius: 30.0,
            pulse_duration: 1.2,
            pulse_tolerance: 1.5,
            reveal_duration: 4.0,
            visual_rate: 4.0,
            hit_invulnerability: 0.6,
        }
    }
}

/// Chapter 1: orb collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialTuning {
    pub orb_count: usize,
    pub orb_ring_radius: f32,
    pub orb_radius: f32,
    pub collect_radius: f32,
    /// Orbs that start visible; the rest must be found with the pulse
    pub visible_orbs: usize,
    pub orb_lumen_restore: f32,
    pub collect_anim_duration: f32,
    pub bloom_base: f32,
    pub bloom_flash: f32,
    pub bloom_flash_duration: f32,
    pub beam_count: usize,
    pub beam_duration: f32,
    pub beam_distance: f32,
    pub portal_radius: f32,
    pub portal_trigger_distance: f32,
}

impl Default for TutorialTuning {
    fn default() -> Self {
        Self {
            orb_count: 5,
            orb_ring_radius: 18.0,
            orb_radius: 0.5,
            collect_radius: 1.4,
            visible_orbs: 1,
            orb_lumen_restore: 20.0,
            collect_anim_duration: 0.6,
            bloom_base: 0.8,
            bloom_flash: 2.5,
            bloom_flash_duration: 1.5,
            beam_count: 6,
            beam_duration: 2.5,
            beam_distance: 40.0,
            portal_radius: 3.0,
            portal_trigger_distance: 2.5,
        }
    }
}

/// Chapter 2: lane dodging at speed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityTuning {
    pub start_speed: f32,
    pub max_speed: f32,
    /// Passive acceleration per second
    pub passive_accel: f32,
    /// Passive acceleration stops at this fraction of max speed
    pub passive_cap_fraction: f32,
    pub speed_tolerance: f32,
    pub max_speed_required_duration: f32,
    /// World units travelled per second per unit of speed
    pub world_speed_scale: f32,
    pub lane_spacing: f32,
    pub lane_margin: f32,
    pub spawn_interval: f32,
    pub spawn_ahead_distance: f32,
    pub despawn_behind_distance: f32,
    pub far_ahead_margin: f32,
    pub max_active_entities: usize,
    pub base_obstacles: f32,
    pub photons_per_wave: usize,
    pub min_difficulty: f32,
    pub max_difficulty: f32,
    pub comet_chance: f32,
    pub comet_min_difficulty: f32,
    pub meteor_radius: f32,
    pub comet_radius: f32,
    /// Comets fly toward the player at this speed (units/s)
    pub comet_speed: f32,
    pub photon_radius: f32,
    pub photon_speed_bonus: f32,
    pub photon_lumen: f32,
    pub meteor_penalty: f32,
    pub meteor_speed_floor: f32,
    pub meteor_lumen_damage: f32,
    pub comet_penalty: f32,
    pub comet_speed_floor: f32,
    pub comet_lumen_damage: f32,
    pub black_hole_chance: f32,
    pub black_hole_min_difficulty: f32,
    pub black_hole_min_spacing: f32,
    pub portal_distance: f32,
    pub portal_radius: f32,
    pub portal_trigger_distance: f32,
    pub light_speed: f32,
    pub centering_rate: f32,
    pub light_speed_duration: f32,
    pub light_speed_grace: f32,
}

impl Default for VelocityTuning {
    fn default() -> Self {
        Self {
            start_speed: 20.0,
            max_speed: 100.0,
            passive_accel: 4.0,
            passive_cap_fraction: 0.6,
            speed_tolerance: 2.0,
            max_speed_required_duration: 5.0,
            world_speed_scale: 0.5,
            lane_spacing: 4.0,
            lane_margin: 1.0,
            spawn_interval: 25.0,
            spawn_ahead_distance: 200.0,
            despawn_behind_distance: 30.0,
            far_ahead_margin: 100.0,
            max_active_entities: 120,
            base_obstacles: 2.0,
            photons_per_wave: 1,
            min_difficulty: 1.0,
            max_difficulty: 3.0,
            comet_chance: 0.2,
            comet_min_difficulty: 1.6,
            meteor_radius: 1.2,
            comet_radius: 0.9,
            comet_speed: 15.0,
            photon_radius: 0.5,
            photon_speed_bonus: 8.0,
            photon_lumen: 4.0,
            meteor_penalty: 15.0,
            meteor_speed_floor: 10.0,
            meteor_lumen_damage: 10.0,
            comet_penalty: 25.0,
            comet_speed_floor: 5.0,
            comet_lumen_damage: 15.0,
            black_hole_chance: 0.15,
            black_hole_min_difficulty: 1.5,
            black_hole_min_spacing: 150.0,
            portal_distance: 400.0,
            portal_radius: 4.0,
            portal_trigger_distance: 4.0,
            light_speed: 150.0,
            centering_rate: 2.0,
            light_speed_duration: 4.0,
            light_speed_grace: 2.0,
        }
    }
}

/// Black hole geometry and gravity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackHoleTuning {
    /// Base size (the event horizon radius)
    pub size: f32,
    /// Trap radius = size * trap_factor
    pub trap_factor: f32,
    /// Slingshot radius = size * slingshot_factor
    pub slingshot_factor: f32,
    pub danger_pull: f32,
    pub ring_pull: f32,
    pub outer_pull: f32,
    pub far_pull: f32,
    /// Speed drains per second
    pub danger_speed_drain: f32,
    pub danger_speed_floor: f32,
    pub outer_speed_drain: f32,
    pub far_speed_drain: f32,
    /// Lumen per second inside the trap (doubled inside the horizon)
    pub danger_lumen_drain: f32,
    pub slingshot_boost: f32,
    pub boost_duration: f32,
    pub slingshot_cooldown: f32,
}

impl Default for BlackHoleTuning {
    fn default() -> Self {
        Self {
            size: 3.0,
            trap_factor: 2.0,
            slingshot_factor: 4.0,
            danger_pull: 6.0,
            ring_pull: 1.5,
            outer_pull: 3.0,
            far_pull: 1.0,
            danger_speed_drain: 20.0,
            danger_speed_floor: 5.0,
            outer_speed_drain: 6.0,
            far_speed_drain: 2.0,
            danger_lumen_drain: 8.0,
            slingshot_boost: 25.0,
            boost_duration: 2.0,
            slingshot_cooldown: 4.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub tutorial: TutorialTuning,
    pub velocity: VelocityTuning,
    pub black_hole: BlackHoleTuning,
}

impl Tuning {
    /// Parse and validate an override document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse if present; any problem is logged and defaults are used
    pub fn load_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(tuning)) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Some(Err(e)) => {
                log::warn!("{}, using default tuning", e);
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let bh = &self.black_hole;
        if bh.size <= 0.0 {
            return Err(TuningError::Invalid("black hole size must be positive".into()));
        }
        if !(1.0 < bh.trap_factor && bh.trap_factor < bh.slingshot_factor) {
            return Err(TuningError::Invalid(
                "black hole radii must satisfy horizon < trap < slingshot".into(),
            ));
        }
        let v = &self.velocity;
        if v.max_speed <= 0.0 || v.speed_tolerance < 0.0 || v.speed_tolerance >= v.max_speed {
            return Err(TuningError::Invalid("speed range is empty".into()));
        }
        if v.spawn_interval <= 0.0 {
            return Err(TuningError::Invalid("spawn interval must be positive".into()));
        }
        if v.min_difficulty > v.max_difficulty {
            return Err(TuningError::Invalid("difficulty range is inverted".into()));
        }
        let p = &self.player;
        if p.pulse_duration <= 0.0 || p.max_lumen <= 0.0 {
            return Err(TuningError::Invalid("pulse duration and max lumen must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "velocity": { "max_speed": 80.0 } }"#).unwrap();
        assert_eq!(tuning.velocity.max_speed, 80.0);
        // Untouched values keep their defaults
        assert_eq!(tuning.velocity.start_speed, VelocityTuning::default().start_speed);
        assert_eq!(tuning.tutorial.orb_count, 5);
    }

    #[test]
    fn test_bad_radii_rejected() {
        let err = Tuning::from_json(r#"{ "black_hole": { "trap_factor": 5.0 } }"#);
        assert!(matches!(err, Err(TuningError::Invalid(_))));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let tuning = Tuning::load_or_default(Some("{ not json"));
        assert_eq!(tuning.player.max_lumen, MAX_LUMEN);
        let tuning = Tuning::load_or_default(None);
        assert_eq!(tuning.tutorial.beam_count, 6);
    }
}
