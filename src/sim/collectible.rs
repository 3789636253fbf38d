//! Collectibles and the expanding reveal pulse
//!
//! Orbs (free-flight chapter) and photons (lane chapter) share the reveal
//! state driven by [`PulseEvent`]. A pulse is a ring that expands from its
//! origin at `max_radius / duration` units per second; a collectible is found
//! when the ring front passes over it.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::entity::Animated;
use super::scene::Appearance;
use super::tween::{Easing, Tween};

/// A pulse fired by the player, timed in chapter seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseEvent {
    pub origin: Vec3,
    pub started_at: f32,
    pub max_radius: f32,
    pub duration: f32,
    pub tolerance: f32,
    pub reveal_duration: f32,
}

impl PulseEvent {
    pub fn elapsed(&self, now: f32) -> f32 {
        now - self.started_at
    }

    pub fn is_active(&self, now: f32) -> bool {
        let elapsed = self.elapsed(now);
        (0.0..=self.duration).contains(&elapsed)
    }

    /// Radius of the wave front at `now`
    pub fn wave_radius(&self, now: f32) -> f32 {
        self.elapsed(now) * (self.max_radius / self.duration)
    }

    /// Whether a point `distance` away sits on the wave front right now
    pub fn touches(&self, distance: f32, now: f32) -> bool {
        self.is_active(now)
            && distance < self.max_radius
            && (distance - self.wave_radius(now)).abs() < self.tolerance
    }
}

/// Found/hidden state of a collectible
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    revealed: bool,
    until: f32,
}

impl Reveal {
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Offer a pulse; returns true if this call revealed the collectible
    pub fn receive_pulse(&mut self, distance: f32, pulse: &PulseEvent, now: f32) -> bool {
        if self.revealed || !pulse.touches(distance, now) {
            return false;
        }
        self.revealed = true;
        self.until = now + pulse.reveal_duration;
        true
    }

    /// Hide again once the reveal timer lapses
    pub fn expire(&mut self, now: f32) {
        if self.revealed && now >= self.until {
            self.revealed = false;
        }
    }
}

const ORB_COLOR: Vec3 = Vec3::new(1.0, 0.85, 0.45);
const ORB_FOUND_COLOR: Vec3 = Vec3::new(1.0, 0.95, 0.7);
const PHOTON_COLOR: Vec3 = Vec3::new(0.45, 0.9, 1.0);

/// A light orb; hidden orbs can only be collected while revealed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orb {
    /// Scale degree of the note played on pickup
    pub note: u8,
    pub hidden: bool,
    pub reveal: Reveal,
    pub collected: bool,
    anchor: Vec3,
    phase: f32,
    collect_anim: Option<Tween>,
}

impl Orb {
    pub fn new(note: u8, anchor: Vec3, hidden: bool) -> Self {
        Self {
            note,
            hidden,
            reveal: Reveal::default(),
            collected: false,
            anchor,
            phase: note as f32 * 1.7,
            collect_anim: None,
        }
    }

    pub fn can_collect(&self) -> bool {
        !self.collected && (!self.hidden || self.reveal.is_revealed())
    }

    pub fn collect(&mut self, now: f32, duration: f32) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        self.collect_anim = Some(Tween::new(now, duration, Easing::EaseInCubic));
        true
    }

    pub(crate) fn animate(&mut self, position: &mut Vec3, now: f32) -> Animated {
        self.reveal.expire(now);

        let bob = (now * 1.5 + self.phase).sin() * 0.3;
        *position = self.anchor + Vec3::Y * bob;

        if let Some(anim) = self.collect_anim {
            // Shrink, brighten and fade out
            let t = anim.progress(now);
            return Animated {
                appearance: Appearance::new(ORB_FOUND_COLOR, 2.0 + t * 3.0, 1.0 - t),
                scale: (1.0 - t).max(0.0),
                rotation: Quat::IDENTITY,
                finished: anim.is_finished(now),
            };
        }

        let appearance = if self.reveal.is_revealed() {
            Appearance::new(ORB_FOUND_COLOR, 2.0, 1.0)
        } else if self.hidden {
            let flicker = 0.05 * (now * 7.0 + self.phase).sin();
            Appearance::new(ORB_COLOR, 0.1 + flicker, 0.15)
        } else {
            let glow = 1.2 + 0.3 * (now * 2.0 + self.phase).sin();
            Appearance::new(ORB_COLOR, glow, 1.0)
        };
        Animated::still(appearance)
    }
}

/// Speed pickup in the lane chapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photon {
    pub reveal: Reveal,
    pub collected: bool,
    spin: f32,
    collect_anim: Option<Tween>,
}

impl Default for Photon {
    fn default() -> Self {
        Self::new()
    }
}

impl Photon {
    pub fn new() -> Self {
        Self {
            reveal: Reveal::default(),
            collected: false,
            spin: 0.0,
            collect_anim: None,
        }
    }

    pub fn collect(&mut self, now: f32) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        self.collect_anim = Some(Tween::new(now, 0.3, Easing::EaseOutQuad));
        true
    }

    pub(crate) fn animate(&mut self, now: f32, dt: f32) -> Animated {
        self.reveal.expire(now);
        self.spin += dt * 3.0;
        let rotation = Quat::from_rotation_y(self.spin);

        if let Some(anim) = self.collect_anim {
            let t = anim.progress(now);
            return Animated {
                appearance: Appearance::new(PHOTON_COLOR, 3.0, 1.0 - t),
                scale: 1.0 + t,
                rotation,
                finished: anim.is_finished(now),
            };
        }

        let intensity = if self.reveal.is_revealed() { 2.5 } else { 1.4 };
        Animated {
            appearance: Appearance::new(PHOTON_COLOR, intensity, 1.0),
            scale: 1.0,
            rotation,
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse() -> PulseEvent {
        PulseEvent {
            origin: Vec3::ZERO,
            started_at: 10.0,
            max_radius: 30.0,
            duration: 1.2,
            tolerance: 1.5,
            reveal_duration: 4.0,
        }
    }

    #[test]
    fn test_wave_radius_expands_linearly() {
        let p = pulse();
        assert_eq!(p.wave_radius(10.0), 0.0);
        assert!((p.wave_radius(10.6) - 15.0).abs() < 1e-4);
        assert!(p.is_active(11.2));
        assert!(!p.is_active(11.3));
        assert!(!p.is_active(9.9));
    }

    #[test]
    fn test_reveal_only_when_front_passes() {
        let p = pulse();
        let mut reveal = Reveal::default();
        // Front at 5 when t = 10.2; object at 20 is not touched yet
        assert!(!reveal.receive_pulse(20.0, &p, 10.2));
        // Front at 20 when t = 10.8
        assert!(reveal.receive_pulse(20.0, &p, 10.8));
        assert!(reveal.is_revealed());
        // Already revealed: no second reveal
        assert!(!reveal.receive_pulse(20.0, &p, 10.8));
    }

    #[test]
    fn test_no_reveal_at_or_beyond_max_radius() {
        let p = pulse();
        let mut reveal = Reveal::default();
        // At the very end the front is at 30 and a point at 30.5 is within tolerance,
        // but it lies outside the pulse radius
        assert!(!reveal.receive_pulse(30.5, &p, 11.2));
        assert!(!reveal.receive_pulse(30.0, &p, 11.2));
        assert!(!reveal.is_revealed());
    }

    #[test]
    fn test_reveal_lapses_and_can_repeat() {
        let p = pulse();
        let mut reveal = Reveal::default();
        assert!(reveal.receive_pulse(6.0, &p, 10.24));
        reveal.expire(12.0);
        assert!(reveal.is_revealed());
        reveal.expire(14.3);
        assert!(!reveal.is_revealed());

        let later = PulseEvent {
            started_at: 20.0,
            ..p
        };
        assert!(reveal.receive_pulse(6.0, &later, 20.24));
    }

    #[test]
    fn test_hidden_orb_needs_reveal() {
        let mut orb = Orb::new(0, Vec3::ZERO, true);
        assert!(!orb.can_collect());
        orb.reveal.receive_pulse(0.5, &pulse(), 10.0);
        assert!(orb.can_collect());
        assert!(orb.collect(10.0, 0.5));
        assert!(!orb.collect(10.1, 0.5));
        assert!(!orb.can_collect());
    }

    #[test]
    fn test_collect_animation_finishes() {
        let mut orb = Orb::new(2, Vec3::ONE, false);
        orb.collect(1.0, 0.5);
        let mut pos = Vec3::ZERO;
        assert!(!orb.animate(&mut pos, 1.2).finished);
        let done = orb.animate(&mut pos, 1.6);
        assert!(done.finished);
        assert_eq!(done.scale, 0.0);
    }
}
