//! Chapter 2: hold top speed through the lanes
//!
//! The player streaks forward down a 3x3 lane corridor. Photons add speed,
//! meteors and comets take it away, black holes drag and drain but can be
//! used as slingshots. Holding max speed long enough opens the way to light
//! speed and the final portal.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::chapter::{ChapterEvent, ChapterRules, ChapterState, Hud};
use super::collectible::Photon;
use super::economy::SpeedEconomy;
use super::entity::{EntityId, EntityKind};
use super::gravity::{BlackHoleZones, GravityReport, GravityZone, Slingshot, apply_gravity};
use super::hazard::{BlackHole, Meteor, ShadowComet};
use super::input::Key;
use super::player::VisualState;
use super::portal::Portal;
use super::services::{FrameContext, SoundCue};
use super::spawner::{ObstacleKind, Spawner, WavePlan, lane_offset, should_despawn};
use crate::{lerp, smoothing};
use crate::tuning::{BlackHoleTuning, VelocityTuning};

/// Where the spawn cursor starts, relative to the player
const FIRST_WAVE_GAP: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flight {
    Cruising,
    LightSpeed { started_at: f32 },
    Arrived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Meteor,
    Comet,
}

pub struct VelocityRules {
    tuning: VelocityTuning,
    black_hole: BlackHoleTuning,
    speed: SpeedEconomy,
    difficulty: f32,
    /// Seconds held at max speed
    sustained: f32,
    holding: bool,
    spawner: Spawner,
    slingshot: Slingshot,
    report: GravityReport,
    flight: Flight,
    portal: Option<EntityId>,
}

impl VelocityRules {
    pub fn new(tuning: VelocityTuning, black_hole: BlackHoleTuning) -> Self {
        let speed = SpeedEconomy::new(tuning.start_speed, tuning.max_speed);
        let difficulty = speed.difficulty(tuning.min_difficulty, tuning.max_difficulty);
        Self {
            tuning,
            black_hole,
            speed,
            difficulty,
            sustained: 0.0,
            holding: false,
            spawner: Spawner::new(-FIRST_WAVE_GAP),
            slingshot: Slingshot::default(),
            report: GravityReport::default(),
            flight: Flight::Cruising,
            portal: None,
        }
    }

    fn lateral_bound(&self) -> f32 {
        self.tuning.lane_spacing + self.tuning.lane_margin
    }

    fn update_sustained(&mut self, dt: f32) {
        if self.speed.current() >= self.speed.max() {
            self.holding = true;
        }
        if self.holding && self.speed.at_max(self.tuning.speed_tolerance) {
            self.sustained += dt;
        } else {
            self.holding = false;
            self.sustained = 0.0;
        }
    }

    fn steer(&self, state: &mut ChapterState, ctx: &FrameContext, dt: f32) {
        let axis = ctx.input.move_axis();
        let lift = (axis.y + ctx.input.vertical_axis()).clamp(-1.0, 1.0);
        let lateral = Vec2::new(axis.x, lift) * state.tuning.player.lateral_speed * dt;
        let player = &mut state.player;
        player.position.x += lateral.x;
        player.position.y += lateral.y;
        player.position.z -= self.speed.current() * self.tuning.world_speed_scale * dt;
    }

    fn clamp_to_corridor(&self, state: &mut ChapterState) {
        let bound = self.lateral_bound();
        let p = &mut state.player.position;
        p.x = p.x.clamp(-bound, bound);
        p.y = p.y.clamp(-bound, bound);
    }

    /// First overlapping hazard in list order hits; one hit per frame
    fn resolve_hazards(&mut self, state: &mut ChapterState, ctx: &mut FrameContext) {
        if state.player.is_invulnerable() {
            return;
        }
        let center = state.player.position;
        let radius = state.player.radius;

        let mut hit = None;
        for entity in state.entities.iter_mut().filter(|e| !e.is_destroyed()) {
            if !entity.overlaps(center, radius) {
                continue;
            }
            let kind = match &mut entity.kind {
                EntityKind::Meteor(_) => Some(Hit::Meteor),
                EntityKind::ShadowComet(comet) if !comet.spent => {
                    comet.spent = true;
                    Some(Hit::Comet)
                }
                _ => None,
            };
            if let Some(kind) = kind {
                if kind == Hit::Meteor {
                    entity.destroy(ctx.physics, ctx.scene);
                }
                hit = Some(kind);
                break;
            }
        }

        let Some(hit) = hit else { return };
        let t = &self.tuning;
        let (penalty, floor, damage, cue, shake) = match hit {
            Hit::Meteor => (
                t.meteor_penalty,
                t.meteor_speed_floor,
                t.meteor_lumen_damage,
                SoundCue::MeteorHit,
                0.5,
            ),
            Hit::Comet => (
                t.comet_penalty,
                t.comet_speed_floor,
                t.comet_lumen_damage,
                SoundCue::CometHit,
                0.7,
            ),
        };
        self.speed.reduce(penalty, floor);
        state.player.drain_lumen(damage);
        state.player.hit_timer = state.tuning.player.hit_invulnerability;
        state.shake = state.shake.max(shake);
        ctx.play(cue);
        log::info!("{:?} hit, speed now {:.1}", hit, self.speed.current());
    }

    /// Every overlapping photon is collected
    fn collect_photons(&mut self, state: &mut ChapterState, ctx: &mut FrameContext) {
        let now = state.time;
        let center = state.player.position;
        let radius = state.player.radius;

        let mut collected = 0;
        for entity in state.entities.iter_mut().filter(|e| !e.is_destroyed()) {
            let touching = entity.overlaps(center, radius);
            if let EntityKind::Photon(photon) = &mut entity.kind {
                if touching && photon.collect(now) {
                    collected += 1;
                }
            }
        }
        for _ in 0..collected {
            self.speed.add(self.tuning.photon_speed_bonus);
            state.player.add_lumen(self.tuning.photon_lumen);
            ctx.play(SoundCue::PhotonCollect);
        }
    }

    fn spawn_wave(&self, plan: WavePlan, state: &mut ChapterState, ctx: &mut FrameContext) {
        let cap = self.tuning.max_active_entities;
        let mut live = state.live().count();
        if live >= cap {
            log::debug!("Entity cap reached, skipping wave at z={:.0}", plan.z);
            return;
        }

        let t = &self.tuning;
        let mut spawns: Vec<(EntityKind, Vec3, f32)> = Vec::new();
        for (lane, kind) in &plan.obstacles {
            let offset = lane_offset(*lane, t.lane_spacing);
            let position = Vec3::new(offset.x, offset.y, plan.z);
            match kind {
                ObstacleKind::Meteor => {
                    let axis = Vec3::new(
                        state.rng.random_range(-1.0..1.0),
                        state.rng.random_range(-1.0..1.0),
                        state.rng.random_range(-1.0..1.0),
                    );
                    let spin = state.rng.random_range(0.5..2.5);
                    spawns.push((EntityKind::Meteor(Meteor::new(axis, spin)), position, t.meteor_radius));
                }
                ObstacleKind::ShadowComet => {
                    let phase = state.rng.random_range(0.0..std::f32::consts::TAU);
                    let comet = ShadowComet::new(offset.x, t.comet_speed, t.lane_spacing * 0.25, phase);
                    spawns.push((EntityKind::ShadowComet(comet), position, t.comet_radius));
                }
            }
        }
        for lane in &plan.photons {
            let offset = lane_offset(*lane, t.lane_spacing);
            let position = Vec3::new(offset.x, offset.y, plan.z);
            spawns.push((EntityKind::Photon(Photon::new()), position, t.photon_radius));
        }
        if let Some(position) = plan.black_hole {
            let zones = BlackHoleZones::from_tuning(&self.black_hole);
            spawns.push((EntityKind::BlackHole(BlackHole::new(zones)), position, zones.event_horizon));
            log::info!("Black hole spawned at z={:.0}", position.z);
        }

        for (kind, position, radius) in spawns {
            if live >= cap {
                break;
            }
            state.spawn(kind, position, radius, ctx.physics, ctx.scene);
            live += 1;
        }
    }

    fn cruise(&mut self, state: &mut ChapterState, ctx: &mut FrameContext, dt: f32) {
        self.slingshot.tick(dt);
        let cap = self.tuning.passive_cap_fraction * self.tuning.max_speed;
        self.speed.accelerate_to(self.tuning.passive_accel * dt, cap);
        self.difficulty = self
            .speed
            .difficulty(self.tuning.min_difficulty, self.tuning.max_difficulty);

        self.steer(state, ctx, dt);

        let holes: Vec<(Vec3, BlackHoleZones)> = state
            .live()
            .filter_map(|e| e.as_black_hole().map(|hole| (e.position, hole.zones)))
            .collect();
        let report = apply_gravity(&mut state.player, &holes, &self.black_hole, &mut self.speed, dt);
        self.clamp_to_corridor(state);

        if self.slingshot.became_available(&report) {
            ctx.play(SoundCue::SlingshotReady);
        }
        if ctx.input.just_pressed(Key::Action)
            && self
                .slingshot
                .try_activate(&report, &mut state.player, &mut self.speed, &self.black_hole)
        {
            ctx.play(SoundCue::SlingshotBoost);
            state.shake = state.shake.max(0.3);
        }
        self.report = report;

        self.resolve_hazards(state, ctx);
        self.collect_photons(state, ctx);

        let player_z = state.player.position.z;
        for z in self.spawner.advance(player_z, &self.tuning) {
            let plan = self
                .spawner
                .plan_wave(z, self.difficulty, &self.tuning, &mut state.rng);
            self.spawn_wave(plan, state, ctx);
        }
        for entity in state.entities.iter_mut() {
            if should_despawn(entity.position.z, player_z, &self.tuning) {
                entity.destroy(ctx.physics, ctx.scene);
            }
        }

        self.update_sustained(dt);

        state.player.visual_state = self.cruise_visual(state);
    }

    /// Boost, then danger, then the nearest hole's zone, then the max speed glow
    fn cruise_visual(&self, state: &ChapterState) -> VisualState {
        let player = &state.player;
        if player.is_boosting() {
            return VisualState::Boost;
        }
        if self.report.danger || player.hit_timer > 0.0 {
            return VisualState::Danger;
        }
        match self.report.zone() {
            GravityZone::SlingshotRing => VisualState::Slingshot,
            GravityZone::OuterPull | GravityZone::FarPull => VisualState::Pull,
            GravityZone::Danger | GravityZone::None if self.holding => VisualState::Climax,
            GravityZone::Danger | GravityZone::None => VisualState::Normal,
        }
    }

    fn arrive(&mut self, state: &mut ChapterState, ctx: &mut FrameContext) {
        self.flight = Flight::Arrived;
        ctx.play(SoundCue::PortalEnter);
        state.finish();
        state.emit(ChapterEvent::ShowCompletionOverlay);
    }
}

impl ChapterRules for VelocityRules {
    fn title(&self) -> &'static str {
        "Velocity"
    }

    fn kinematic_player(&self) -> bool {
        true
    }

    fn setup(&mut self, state: &mut ChapterState, _ctx: &mut FrameContext) {
        state.camera_offset = Vec3::new(0.0, 2.5, 9.0);
        state.bloom = 1.0;
        state.set_narration(vec![
            (0.5, "Faster now.".to_string()),
            (3.0, "Gather photons, dodge the stones.".to_string()),
            (8.0, "Skim a black hole's edge and press E to slingshot.".to_string()),
        ]);
    }

    fn update(&mut self, state: &mut ChapterState, ctx: &mut FrameContext, dt: f32) {
        match self.flight {
            Flight::Cruising => self.cruise(state, ctx, dt),
            Flight::LightSpeed { started_at } => {
                let k = smoothing(self.tuning.centering_rate, dt);
                let p = &mut state.player.position;
                p.z -= self.tuning.light_speed * dt;
                p.x = lerp(p.x, 0.0, k);
                p.y = lerp(p.y, 0.0, k);
                state.player.visual_state = VisualState::Climax;

                let player_z = state.player.position.z;
                let reached = self
                    .portal
                    .and_then(|id| state.entity(id))
                    .is_some_and(|portal| player_z - portal.position.z <= self.tuning.portal_trigger_distance);
                let limit = self.tuning.light_speed_duration + self.tuning.light_speed_grace;
                if reached {
                    self.arrive(state, ctx);
                } else if state.time - started_at >= limit {
                    log::warn!("Portal not reached after {:.1}s, completing anyway", limit);
                    self.arrive(state, ctx);
                }
            }
            Flight::Arrived => {
                state.player.position.z -= self.tuning.light_speed * 0.1 * dt;
            }
        }
    }

    fn check_win_condition(&self, _state: &ChapterState) -> bool {
        self.flight == Flight::Cruising && self.sustained >= self.tuning.max_speed_required_duration
    }

    fn complete(&mut self, state: &mut ChapterState, ctx: &mut FrameContext) {
        state.destroy_all_entities(ctx.physics, ctx.scene);
        let position = Vec3::new(0.0, 0.0, state.player.position.z - self.tuning.portal_distance);
        let id = state.spawn(
            EntityKind::Portal(Portal::new(state.time)),
            position,
            self.tuning.portal_radius,
            ctx.physics,
            ctx.scene,
        );
        self.portal = Some(id);
        self.flight = Flight::LightSpeed {
            started_at: state.time,
        };
        state.climax = true;
        state.bloom = 2.0;
        ctx.play(SoundCue::LightSpeed);
        state.emit(ChapterEvent::LightSpeed);
        log::info!("Light speed engaged after {:.1}s at max", self.sustained);
    }

    fn progress(&self, _state: &ChapterState) -> f32 {
        match self.flight {
            Flight::Cruising => self.speed.ratio(),
            _ => 1.0,
        }
    }

    fn fill_hud(&self, _state: &ChapterState, hud: &mut Hud) {
        hud.speed = Some(self.speed.current());
        hud.max_speed = Some(self.speed.max());
        hud.sustained = Some(self.sustained);
        hud.slingshot_ready = self.flight == Flight::Cruising && self.slingshot.is_available(&self.report);
    }
}
