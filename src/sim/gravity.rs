//! Black hole gravity zones and the slingshot
//!
//! Zones are tested innermost first, so every distance maps to exactly one:
//!
//! | zone            | distance                         |
//! |-----------------|----------------------------------|
//! | `Danger`        | `d < trap`                       |
//! | `SlingshotRing` | `0.85 * sling <= d <= sling`     |
//! | `OuterPull`     | `d < sling` (outside the band)   |
//! | `FarPull`       | `d < 1.3 * sling`                |
//! | `None`          | otherwise                        |

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::economy::SpeedEconomy;
use super::player::Player;
use crate::consts::{FAR_PULL_FACTOR, SLINGSHOT_RING_INNER};
use crate::tuning::BlackHoleTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GravityZone {
    Danger,
    SlingshotRing,
    OuterPull,
    FarPull,
    None,
}

/// Radii of a black hole's nested zones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlackHoleZones {
    pub event_horizon: f32,
    pub trap_radius: f32,
    pub slingshot_radius: f32,
}

impl BlackHoleZones {
    pub fn from_tuning(tuning: &BlackHoleTuning) -> Self {
        Self {
            event_horizon: tuning.size,
            trap_radius: tuning.size * tuning.trap_factor,
            slingshot_radius: tuning.size * tuning.slingshot_factor,
        }
    }

    pub fn classify(&self, distance: f32) -> GravityZone {
        let sling = self.slingshot_radius;
        if distance < self.trap_radius {
            GravityZone::Danger
        } else if distance >= SLINGSHOT_RING_INNER * sling && distance <= sling {
            GravityZone::SlingshotRing
        } else if distance < sling {
            GravityZone::OuterPull
        } else if distance < FAR_PULL_FACTOR * sling {
            GravityZone::FarPull
        } else {
            GravityZone::None
        }
    }
}

/// The black hole closest to the player this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearestHole {
    pub position: Vec3,
    pub distance: f32,
    pub zone: GravityZone,
    /// The hole lies further along the flight direction (-Z)
    pub ahead: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GravityReport {
    pub nearest: Option<NearestHole>,
    /// Inside any trap radius this frame
    pub danger: bool,
    /// Effects were skipped because a boost is active
    pub suppressed: bool,
}

impl GravityReport {
    /// Zone of the nearest hole, `None` when there is no hole
    pub fn zone(&self) -> GravityZone {
        self.nearest.map_or(GravityZone::None, |n| n.zone)
    }
}

/// Apply every black hole's zone effect to the player
pub fn apply_gravity(
    player: &mut Player,
    holes: &[(Vec3, BlackHoleZones)],
    tuning: &BlackHoleTuning,
    speed: &mut SpeedEconomy,
    dt: f32,
) -> GravityReport {
    let mut report = GravityReport::default();

    for &(center, zones) in holes {
        let distance = player.position.distance(center);
        let zone = zones.classify(distance);
        if report.nearest.is_none_or(|n| distance < n.distance) {
            report.nearest = Some(NearestHole {
                position: center,
                distance,
                zone,
                ahead: center.z < player.position.z,
            });
        }
    }

    if player.is_boosting() {
        report.suppressed = true;
        return report;
    }

    for &(center, zones) in holes {
        let distance = player.position.distance(center);
        let toward = (center - player.position).normalize_or_zero();
        match zones.classify(distance) {
            GravityZone::Danger => {
                player.position += toward * tuning.danger_pull * dt;
                speed.reduce(tuning.danger_speed_drain * dt, tuning.danger_speed_floor);
                let drain = if distance < zones.event_horizon {
                    tuning.danger_lumen_drain * 2.0
                } else {
                    tuning.danger_lumen_drain
                };
                player.drain_lumen(drain * dt);
                report.danger = true;
            }
            GravityZone::SlingshotRing => {
                player.position += toward * tuning.ring_pull * dt;
            }
            GravityZone::OuterPull => {
                player.position += toward * tuning.outer_pull * dt;
                speed.reduce(tuning.outer_speed_drain * dt, 0.0);
            }
            GravityZone::FarPull => {
                player.position += toward * tuning.far_pull * dt;
                speed.reduce(tuning.far_speed_drain * dt, 0.0);
            }
            GravityZone::None => {}
        }
    }

    report
}

/// Slingshot availability and cooldown
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Slingshot {
    cooldown: f32,
    was_available: bool,
}

impl Slingshot {
    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    pub fn is_available(&self, report: &GravityReport) -> bool {
        self.cooldown <= 0.0
            && report
                .nearest
                .is_some_and(|n| n.zone == GravityZone::SlingshotRing && n.ahead)
    }

    /// Track availability; true on the frame it becomes available
    pub fn became_available(&mut self, report: &GravityReport) -> bool {
        let available = self.is_available(report);
        let rising = available && !self.was_available;
        self.was_available = available;
        rising
    }

    /// Boost the player if the slingshot is available
    pub fn try_activate(
        &mut self,
        report: &GravityReport,
        player: &mut Player,
        speed: &mut SpeedEconomy,
        tuning: &BlackHoleTuning,
    ) -> bool {
        if !self.is_available(report) {
            return false;
        }
        speed.add(tuning.slingshot_boost);
        player.boost_timer = tuning.boost_duration;
        self.cooldown = tuning.slingshot_cooldown;
        self.was_available = false;
        log::info!("Slingshot: speed now {:.1}", speed.current());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::PointMassWorld;
    use crate::sim::scene::RetainedScene;
    use crate::tuning::PlayerTuning;
    use proptest::prelude::*;

    fn zones() -> BlackHoleZones {
        BlackHoleZones::from_tuning(&BlackHoleTuning::default())
    }

    fn player_at(position: Vec3) -> Player {
        let mut physics = PointMassWorld::new();
        let mut scene = RetainedScene::new();
        Player::spawn(&PlayerTuning::default(), position, true, &mut physics, &mut scene)
    }

    #[test]
    fn test_zone_boundaries() {
        // size 3: trap 6, slingshot 12, ring band [10.2, 12], far < 15.6
        let z = zones();
        assert_eq!(z.classify(0.0), GravityZone::Danger);
        assert_eq!(z.classify(5.99), GravityZone::Danger);
        assert_eq!(z.classify(6.0), GravityZone::OuterPull);
        assert_eq!(z.classify(10.1), GravityZone::OuterPull);
        assert_eq!(z.classify(10.3), GravityZone::SlingshotRing);
        assert_eq!(z.classify(12.0), GravityZone::SlingshotRing);
        assert_eq!(z.classify(12.01), GravityZone::FarPull);
        assert_eq!(z.classify(15.7), GravityZone::None);
    }

    #[test]
    fn test_boost_suppresses_gravity() {
        let tuning = BlackHoleTuning::default();
        let mut player = player_at(Vec3::new(0.0, 0.0, 0.0));
        player.boost_timer = 1.0;
        let mut speed = SpeedEconomy::new(50.0, 100.0);
        let holes = [(Vec3::new(1.0, 0.0, 0.0), zones())];
        let report = apply_gravity(&mut player, &holes, &tuning, &mut speed, 0.1);
        assert!(report.suppressed);
        assert_eq!(player.position, Vec3::ZERO);
        assert_eq!(speed.current(), 50.0);
        assert_eq!(player.lumen(), 100.0);
    }

    #[test]
    fn test_danger_drains_and_pulls() {
        let tuning = BlackHoleTuning::default();
        let mut player = player_at(Vec3::ZERO);
        let mut speed = SpeedEconomy::new(50.0, 100.0);
        // Inside the horizon: double lumen drain
        let holes = [(Vec3::new(2.0, 0.0, 0.0), zones())];
        let report = apply_gravity(&mut player, &holes, &tuning, &mut speed, 0.5);
        assert!(report.danger);
        assert!(player.position.x > 0.0);
        assert_eq!(speed.current(), 40.0);
        assert!((player.lumen() - 92.0).abs() < 1e-4);
        assert_eq!(report.nearest.unwrap().zone, GravityZone::Danger);
    }

    #[test]
    fn test_slingshot_requires_ring_and_hole_ahead() {
        let tuning = BlackHoleTuning::default();
        let mut player = player_at(Vec3::ZERO);
        let mut speed = SpeedEconomy::new(50.0, 100.0);
        let mut sling = Slingshot::default();

        // Hole behind the player: ring but not ahead
        let behind = [(Vec3::new(0.0, 0.0, 11.0), zones())];
        let report = apply_gravity(&mut player, &behind, &tuning, &mut speed, 0.0);
        assert_eq!(report.nearest.unwrap().zone, GravityZone::SlingshotRing);
        assert!(!sling.try_activate(&report, &mut player, &mut speed, &tuning));

        // Hole ahead in the ring
        let ahead = [(Vec3::new(0.0, 0.0, -11.0), zones())];
        let report = apply_gravity(&mut player, &ahead, &tuning, &mut speed, 0.0);
        assert!(sling.became_available(&report));
        assert!(!sling.became_available(&report));
        assert!(sling.try_activate(&report, &mut player, &mut speed, &tuning));
        assert_eq!(speed.current(), 75.0);
        assert!(player.is_boosting());

        // Cooldown blocks reactivation until it lapses
        assert!(!sling.try_activate(&report, &mut player, &mut speed, &tuning));
        sling.tick(tuning.slingshot_cooldown);
        assert!(sling.try_activate(&report, &mut player, &mut speed, &tuning));
    }

    proptest! {
        #[test]
        fn test_zones_partition_distances(d in 0.0f32..40.0, size in 0.5f32..10.0) {
            let z = BlackHoleZones {
                event_horizon: size,
                trap_radius: size * 2.0,
                slingshot_radius: size * 4.0,
            };
            let zone = z.classify(d);
            let expected = if d < z.trap_radius {
                GravityZone::Danger
            } else if d >= 0.85 * z.slingshot_radius && d <= z.slingshot_radius {
                GravityZone::SlingshotRing
            } else if d < z.slingshot_radius {
                GravityZone::OuterPull
            } else if d < 1.3 * z.slingshot_radius {
                GravityZone::FarPull
            } else {
                GravityZone::None
            };
            prop_assert_eq!(zone, expected);
        }
    }
}
