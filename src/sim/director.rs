//! Chapter director
//!
//! Owns the active chapter and swaps it behind a fade. A transition runs
//! fade-out, swap at the midpoint, fade-in; the chapter is frozen meanwhile.

use super::chapter::{Chapter, ChapterRules};
use super::services::FrameContext;
use super::tutorial::TutorialRules;
use super::velocity::VelocityRules;
use crate::tuning::Tuning;

/// Default fade duration (out + in), seconds
pub const DEFAULT_FADE: f32 = 0.8;

/// Where a transition ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Chapter(usize),
    Menu,
}

/// What happened during one transition step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStep {
    Running,
    /// The midpoint was crossed; the old scene must be replaced now
    Swap,
    Done,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub destination: Destination,
    duration: f32,
    elapsed: f32,
    swapped: bool,
}

impl Transition {
    pub fn new(destination: Destination, duration: f32) -> Self {
        Self {
            destination,
            duration: duration.max(0.0),
            elapsed: 0.0,
            swapped: false,
        }
    }

    /// 0.0 at start, 1.0 when complete
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }

    /// Black overlay: rises to 1 at the midpoint, then falls back to 0
    pub fn overlay_alpha(&self) -> f32 {
        let p = self.progress();
        if p < 0.5 { p * 2.0 } else { (1.0 - p) * 2.0 }
    }

    pub fn advance(&mut self, dt: f32) -> TransitionStep {
        self.elapsed += dt;
        let p = self.progress();
        if !self.swapped && p >= 0.5 {
            self.swapped = true;
            return TransitionStep::Swap;
        }
        if p >= 1.0 {
            TransitionStep::Done
        } else {
            TransitionStep::Running
        }
    }
}

/// Rules for a chapter index
pub fn rules_for(id: usize, tuning: &Tuning) -> Option<Box<dyn ChapterRules>> {
    match id {
        0 => Some(Box::new(TutorialRules::new(tuning.tutorial.clone()))),
        1 => Some(Box::new(VelocityRules::new(
            tuning.velocity.clone(),
            tuning.black_hole.clone(),
        ))),
        _ => None,
    }
}

pub struct Director {
    active: Option<Chapter>,
    transition: Option<Transition>,
    pub fade_duration: f32,
    /// Chapter loads so far (varies the seed between attempts)
    loads: u64,
}

impl Default for Director {
    fn default() -> Self {
        Self::new()
    }
}

impl Director {
    pub fn new() -> Self {
        Self {
            active: None,
            transition: None,
            fade_duration: DEFAULT_FADE,
            loads: 0,
        }
    }

    pub fn active(&self) -> Option<&Chapter> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Chapter> {
        self.active.as_mut()
    }

    pub fn active_id(&self) -> Option<usize> {
        self.active.as_ref().map(Chapter::id)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn overlay_alpha(&self) -> f32 {
        self.transition.as_ref().map_or(0.0, Transition::overlay_alpha)
    }

    /// Start a transition; ignored while one is already running
    pub fn request(&mut self, destination: Destination) -> bool {
        if let Some(current) = &self.transition {
            log::debug!(
                "Transition to {:?} ignored, {:?} in progress",
                destination,
                current.destination
            );
            return false;
        }
        log::info!("Transition to {:?}", destination);
        self.transition = Some(Transition::new(destination, self.fade_duration));
        true
    }

    /// Advance the running transition. Returns true on the frame the scene swapped.
    pub fn update(&mut self, dt: f32, ctx: &mut FrameContext, tuning: &Tuning, seed: u64) -> bool {
        let Some(transition) = self.transition.as_mut() else {
            return false;
        };
        let destination = transition.destination;
        let step = transition.advance(dt);
        // A zero-length fade swaps and finishes in the same frame
        let done = step == TransitionStep::Done || transition.progress() >= 1.0;
        let swapped = step == TransitionStep::Swap;
        if swapped {
            self.swap(destination, ctx, tuning, seed);
        }
        if done {
            self.transition = None;
        }
        swapped
    }

    fn swap(&mut self, destination: Destination, ctx: &mut FrameContext, tuning: &Tuning, seed: u64) {
        if let Some(mut old) = self.active.take() {
            old.unload(ctx);
        }
        ctx.scene.clear();

        let Destination::Chapter(id) = destination else {
            return;
        };
        match rules_for(id, tuning) {
            Some(rules) => {
                let seed = seed.wrapping_add(self.loads);
                self.loads += 1;
                self.active = Some(Chapter::new(id, rules, tuning.clone(), seed, ctx));
            }
            None => log::warn!("No chapter {}, staying on the menu", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::PhysicsWorld;
    use crate::sim::scene::SceneGraph;
    use crate::sim::testing::Rig;

    const DT: f32 = 0.125;

    #[test]
    fn test_overlay_rises_then_falls() {
        let mut t = Transition::new(Destination::Menu, 1.0);
        assert_eq!(t.overlay_alpha(), 0.0);
        assert_eq!(t.advance(0.25), TransitionStep::Running);
        assert!((t.overlay_alpha() - 0.5).abs() < 1e-5);
        assert_eq!(t.advance(0.25), TransitionStep::Swap);
        assert!((t.overlay_alpha() - 1.0).abs() < 1e-5);
        assert_eq!(t.advance(0.25), TransitionStep::Running);
        assert_eq!(t.advance(0.25), TransitionStep::Done);
        assert!(t.overlay_alpha().abs() < 1e-5);
    }

    #[test]
    fn test_swap_loads_chapter_at_midpoint() {
        let mut rig = Rig::new();
        let tuning = Tuning::default();
        let mut director = Director::new();
        director.fade_duration = 0.5;
        assert!(director.request(Destination::Chapter(0)));
        // Second request while fading is dropped
        assert!(!director.request(Destination::Chapter(1)));

        assert!(!director.update(DT, &mut rig.ctx(), &tuning, 1));
        assert!(director.active().is_none());
        assert!(director.update(DT, &mut rig.ctx(), &tuning, 1));
        assert_eq!(director.active_id(), Some(0));
        assert!(director.is_transitioning());

        director.update(DT, &mut rig.ctx(), &tuning, 1);
        director.update(DT, &mut rig.ctx(), &tuning, 1);
        assert!(!director.is_transitioning());
        assert_eq!(director.overlay_alpha(), 0.0);
    }

    #[test]
    fn test_swap_releases_previous_chapter() {
        let mut rig = Rig::new();
        let tuning = Tuning::default();
        let mut director = Director::new();
        director.fade_duration = 0.0;

        director.request(Destination::Chapter(0));
        director.update(DT, &mut rig.ctx(), &tuning, 1);
        assert!(rig.scene.node_count() > 0);
        assert!(!director.is_transitioning());

        director.request(Destination::Menu);
        director.update(DT, &mut rig.ctx(), &tuning, 1);
        assert!(director.active().is_none());
        assert_eq!(rig.scene.node_count(), 0);
        assert_eq!(rig.physics.body_count(), 0);
    }

    #[test]
    fn test_unknown_chapter_falls_back_to_menu() {
        let mut rig = Rig::new();
        let mut director = Director::new();
        director.fade_duration = 0.0;
        director.request(Destination::Chapter(7));
        director.update(DT, &mut rig.ctx(), &Tuning::default(), 1);
        assert!(director.active().is_none());
        assert!(!director.is_transitioning());
    }
}
