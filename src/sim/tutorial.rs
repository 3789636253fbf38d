//! Chapter 1: gather the scattered orbs
//!
//! The player drifts freely. One orb glows openly; the rest stay dark until a
//! pulse passes over them. Collecting the last orb starts the finale: a bloom
//! flash, beams of light racing ahead, and a portal opening where they land.

use std::f32::consts::TAU;

use glam::Vec3;

use super::chapter::{ChapterEvent, ChapterRules, ChapterState, Hud};
use super::collectible::Orb;
use super::entity::{EntityId, EntityKind, EntitySignal};
use super::player::VisualState;
use super::portal::{Portal, PortalBeam};
use super::services::{FrameContext, SoundCue};
use super::tween::{Easing, Tween};
use crate::tuning::TutorialTuning;

/// Pull toward an open portal so the finale always lands
const PORTAL_ATTRACTION: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finale {
    Gathering,
    Beams,
    PortalOpen,
    Entered,
}

pub struct TutorialRules {
    tuning: TutorialTuning,
    orbs_spawned: usize,
    finale: Finale,
    flash: Option<Tween>,
    beams_pending: usize,
    portal: Option<EntityId>,
}

impl TutorialRules {
    pub fn new(tuning: TutorialTuning) -> Self {
        Self {
            tuning,
            orbs_spawned: 0,
            finale: Finale::Gathering,
            flash: None,
            beams_pending: 0,
            portal: None,
        }
    }

    /// Orbs still waiting to be collected
    pub fn remaining_orbs(state: &ChapterState) -> usize {
        state
            .live()
            .filter(|e| e.as_orb().is_some_and(|orb| !orb.collected))
            .count()
    }

    fn collect_orbs(&self, state: &mut ChapterState, ctx: &mut FrameContext) {
        let now = state.time;
        let reach = self.tuning.collect_radius;
        let player = state.player.position;

        let mut notes = Vec::new();
        for entity in state.entities.iter_mut().filter(|e| !e.is_destroyed()) {
            let in_reach = entity.position.distance(player) < reach;
            if let EntityKind::Orb(orb) = &mut entity.kind {
                if in_reach && orb.can_collect() && orb.collect(now, self.tuning.collect_anim_duration) {
                    notes.push(orb.note);
                }
            }
        }

        for note in notes {
            state.player.orbs_collected += 1;
            state.player.add_lumen(self.tuning.orb_lumen_restore);
            ctx.play(SoundCue::Note(note));
            state.emit(ChapterEvent::OrbCollected {
                collected: state.player.orbs_collected,
                total: self.orbs_spawned as u32,
            });
            log::info!(
                "Orb collected ({}/{})",
                state.player.orbs_collected,
                self.orbs_spawned
            );
        }
    }

    fn open_portal(&mut self, state: &mut ChapterState, destination: Vec3, ctx: &mut FrameContext) {
        let portal = Portal::new(state.time);
        let id = state.spawn(
            EntityKind::Portal(portal),
            destination,
            self.tuning.portal_radius,
            ctx.physics,
            ctx.scene,
        );
        self.portal = Some(id);
        self.finale = Finale::PortalOpen;
        ctx.play(SoundCue::PortalOpen);
        state.emit(ChapterEvent::ShowCompletionOverlay);
        log::info!("Portal opened at {:?}", destination);
    }
}

impl ChapterRules for TutorialRules {
    fn title(&self) -> &'static str {
        "Awakening"
    }

    fn setup(&mut self, state: &mut ChapterState, ctx: &mut FrameContext) {
        let count = self.tuning.orb_count;
        for i in 0..count {
            let angle = i as f32 * TAU / count.max(1) as f32;
            // Alternate heights so the ring is not flat
            let height = if i % 2 == 0 { 0.0 } else { 2.0 };
            let position = Vec3::new(
                angle.sin() * self.tuning.orb_ring_radius,
                height,
                -angle.cos() * self.tuning.orb_ring_radius,
            );
            let hidden = i >= self.tuning.visible_orbs;
            let orb = Orb::new(i as u8, position, hidden);
            state.spawn(
                EntityKind::Orb(orb),
                position,
                self.tuning.orb_radius,
                ctx.physics,
                ctx.scene,
            );
        }
        self.orbs_spawned = count;

        state.bloom = self.tuning.bloom_base;
        state.camera_offset = Vec3::new(0.0, 4.0, 12.0);
        state.set_narration(vec![
            (0.5, "A spark wakes in the dark.".to_string()),
            (4.0, "Gather the light that glows ahead.".to_string()),
            (9.0, "Some lights hide. Press Space to pulse and find them.".to_string()),
        ]);
    }

    fn update(&mut self, state: &mut ChapterState, ctx: &mut FrameContext, _dt: f32) {
        let now = state.time;

        // Free flight on XZ, Up/Down on Y
        let axis = ctx.input.move_axis();
        let lift = ctx.input.vertical_axis();
        let force = Vec3::new(axis.x, lift, -axis.y) * state.tuning.player.move_force;
        if force != Vec3::ZERO {
            state.player.apply_force(ctx.physics, force);
        }

        if self.finale == Finale::Gathering {
            self.collect_orbs(state, ctx);
        }

        let portal = self.portal.and_then(|id| state.entity(id)).map(|e| e.position);
        if let (Some(portal), Finale::PortalOpen) = (portal, self.finale) {
            let to_portal = portal - state.player.position;
            if to_portal.length() < self.tuning.portal_trigger_distance {
                self.finale = Finale::Entered;
                ctx.play(SoundCue::PortalEnter);
                state.finish();
            } else {
                let pull = to_portal.normalize_or_zero() * PORTAL_ATTRACTION;
                state.player.apply_force(ctx.physics, pull);
            }
        }

        state.bloom = match self.flash {
            Some(flash) => {
                self.tuning.bloom_base + self.tuning.bloom_flash * (1.0 - flash.progress(now))
            }
            None => self.tuning.bloom_base,
        };
        state.player.visual_state = if state.climax {
            VisualState::Climax
        } else {
            VisualState::Normal
        };
    }

    fn check_win_condition(&self, state: &ChapterState) -> bool {
        self.orbs_spawned > 0 && Self::remaining_orbs(state) == 0
    }

    fn complete(&mut self, state: &mut ChapterState, ctx: &mut FrameContext) {
        let now = state.time;
        self.flash = Some(Tween::new(now, self.tuning.bloom_flash_duration, Easing::EaseOutCubic));
        state.climax = true;
        ctx.play(SoundCue::ChapterComplete);

        let origin = state.player.position;
        let destination = origin + Vec3::new(0.0, 4.0, -self.tuning.beam_distance);
        let count = self.tuning.beam_count;
        for i in 0..count {
            let swirl = i as f32 * TAU / count as f32;
            let beam = PortalBeam::new(origin, destination, now, self.tuning.beam_duration, swirl);
            state.spawn(EntityKind::PortalBeam(beam), origin, 0.2, ctx.physics, ctx.scene);
        }
        self.beams_pending = count;
        self.finale = Finale::Beams;

        if count == 0 {
            self.open_portal(state, destination, ctx);
        }
    }

    fn on_signal(&mut self, state: &mut ChapterState, signal: EntitySignal, ctx: &mut FrameContext) {
        match signal {
            EntitySignal::BeamArrived { destination } => {
                self.beams_pending = self.beams_pending.saturating_sub(1);
                if self.beams_pending == 0 && self.finale == Finale::Beams {
                    self.open_portal(state, destination, ctx);
                }
            }
        }
    }

    fn progress(&self, state: &ChapterState) -> f32 {
        if self.orbs_spawned == 0 {
            return 0.0;
        }
        state.player.orbs_collected as f32 / self.orbs_spawned as f32
    }

    fn fill_hud(&self, _state: &ChapterState, hud: &mut Hud) {
        hud.orbs_total = self.orbs_spawned as u32;
    }
}
