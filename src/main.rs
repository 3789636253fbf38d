//! Lumina Voyage entry point
//!
//! The browser build starts from `web::wasm_start`. Natively this runs a
//! headless autopilot through both chapters and logs what happens.

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec3;

    use lumina_voyage::consts::{CHAPTER_COUNT, LANE_COLS, LANE_ROWS};
    use lumina_voyage::lateral_distance;
    use lumina_voyage::persistence::MemoryStore;
    use lumina_voyage::sim::spawner::lane_offset;
    use lumina_voyage::sim::{
        AppCommand, ChapterEvent, Engine, Key, PointMassWorld, RetainedScene,
    };
    use lumina_voyage::tuning::Tuning;

    const DT: f32 = 1.0 / 60.0;
    /// Give up on a chapter after this many simulated seconds
    const CHAPTER_TIME_LIMIT: f32 = 180.0;
    const PULSE_INTERVAL: u32 = 120;
    /// How far ahead the velocity autopilot looks for hazards
    const LOOKAHEAD: f32 = 35.0;
    /// Extra lateral room kept around each hazard
    const CLEARANCE: f32 = 1.2;

    type HeadlessEngine = Engine<PointMassWorld, RetainedScene>;

    /// Hold exactly the keys in `keys`
    fn hold(engine: &mut HeadlessEngine, keys: &[Key]) {
        for key in [Key::Forward, Key::Back, Key::Left, Key::Right, Key::Up, Key::Down] {
            if keys.contains(&key) {
                engine.input.key_down(key);
            } else {
                engine.input.key_up(key);
            }
        }
    }

    fn tap(engine: &mut HeadlessEngine, key: Key) {
        engine.input.key_down(key);
        engine.input.key_up(key);
    }

    /// Steer toward the nearest orb that can be collected right now
    fn steer_tutorial(engine: &mut HeadlessEngine) {
        let Some(chapter) = engine.director.active() else {
            return;
        };
        let player = chapter.state.player.position;
        let target = chapter
            .state
            .live()
            .filter(|e| e.as_orb().is_some_and(|orb| orb.can_collect()))
            .map(|e| e.position)
            .min_by(|a, b| a.distance(player).total_cmp(&b.distance(player)));

        let delta = target.map_or(Vec3::ZERO, |t| t - player);
        let mut keys = Vec::new();
        if delta.x > 0.5 {
            keys.push(Key::Right);
        } else if delta.x < -0.5 {
            keys.push(Key::Left);
        }
        if delta.z < -0.5 {
            keys.push(Key::Forward);
        } else if delta.z > 0.5 {
            keys.push(Key::Back);
        }
        if delta.y > 0.5 {
            keys.push(Key::Up);
        } else if delta.y < -0.5 {
            keys.push(Key::Down);
        }
        hold(engine, &keys);
    }

    /// Centre of the lane with the fewest hazards in reach, nearest first
    pub(crate) fn safest_lane(player: Vec3, ahead: &[(Vec3, f32)], spacing: f32) -> Vec3 {
        let threats = |spot: Vec3| {
            ahead
                .iter()
                .filter(|(position, reach)| lateral_distance(*position, spot) < *reach)
                .count()
        };
        (0..LANE_ROWS * LANE_COLS)
            .map(|lane| {
                let offset = lane_offset(lane, spacing);
                Vec3::new(offset.x, offset.y, player.z)
            })
            .min_by(|a, b| {
                threats(*a)
                    .cmp(&threats(*b))
                    .then(a.distance(player).total_cmp(&b.distance(player)))
            })
            .unwrap_or(player)
    }

    /// Head for the nearest lane with the fewest hazards ahead of it
    fn steer_velocity(engine: &mut HeadlessEngine) {
        let Some(chapter) = engine.director.active() else {
            return;
        };
        let player = chapter.state.player.position;
        let spacing = engine.tuning.velocity.lane_spacing;
        let ahead: Vec<(Vec3, f32)> = chapter
            .state
            .live()
            .filter(|e| e.position.z < player.z + 1.0 && player.z - e.position.z < LOOKAHEAD)
            .filter_map(|e| match e.as_black_hole() {
                Some(hole) => Some((e.position, hole.zones.trap_radius + CLEARANCE)),
                None if e.kind.is_hazard() => Some((e.position, e.radius + CLEARANCE)),
                None => None,
            })
            .collect();
        let target = safest_lane(player, &ahead, spacing);

        let delta = target - player;
        let mut keys = Vec::new();
        if delta.x > 0.3 {
            keys.push(Key::Right);
        } else if delta.x < -0.3 {
            keys.push(Key::Left);
        }
        if delta.y > 0.3 {
            keys.push(Key::Up);
        } else if delta.y < -0.3 {
            keys.push(Key::Down);
        }
        let slingshot_ready = chapter.hud().slingshot_ready;
        hold(engine, &keys);
        if slingshot_ready {
            tap(engine, Key::Action);
        }
    }

    fn run_chapter(engine: &mut HeadlessEngine, id: usize) -> bool {
        engine.push_command(AppCommand::StartChapter(id));
        // Let the fade swap the chapter in
        while engine.director.active_id() != Some(id) || engine.director.is_transitioning() {
            engine.frame(DT);
        }
        let title = engine
            .director
            .active()
            .map_or("?", |chapter| chapter.title());
        log::info!("=== Chapter {}: {} ===", id, title);

        let mut frame = 0u32;
        loop {
            if id == 0 {
                steer_tutorial(engine);
            } else {
                steer_velocity(engine);
            }
            if frame % PULSE_INTERVAL == 0 {
                tap(engine, Key::Pulse);
            }
            engine.frame(DT);
            frame += 1;

            for event in engine.take_events() {
                match event {
                    ChapterEvent::Completed { elapsed, orbs, .. } => {
                        log::info!("Completed in {:.2}s with {} orbs", elapsed, orbs);
                        return true;
                    }
                    ChapterEvent::Depleted => {
                        log::info!("Lumen depleted, restarting");
                        frame = 0;
                    }
                    other => log::info!("{:?}", other),
                }
            }

            let elapsed = frame as f32 * DT;
            if frame % 600 == 0 {
                if let Some(hud) = engine.hud() {
                    log::info!(
                        "t={:.0}s lumen={:.0} orbs={}/{} speed={:?}",
                        elapsed,
                        hud.lumen,
                        hud.orbs_collected,
                        hud.orbs_total,
                        hud.speed.map(|s| s.round())
                    );
                }
            }
            if elapsed > CHAPTER_TIME_LIMIT {
                log::warn!("Autopilot gave up on chapter {}", id);
                return false;
            }
        }
    }

    pub fn run() {
        let mut engine = Engine::new(
            PointMassWorld::new(),
            RetainedScene::new(),
            Box::new(MemoryStore::new()),
            Tuning::default(),
            42,
        );
        for id in 0..CHAPTER_COUNT {
            if !run_chapter(&mut engine, id) {
                break;
            }
        }
        log::info!(
            "Total orbs: {}, unlocked: {:?}",
            engine.progress().total_orbs,
            engine.progress().unlocked
        );
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::autopilot::safest_lane;
    use glam::Vec3;

    #[test]
    fn test_autopilot_sidesteps_blocked_lane() {
        let ahead = [(Vec3::new(0.0, 0.0, -10.0), 2.2)];
        let target = safest_lane(Vec3::ZERO, &ahead, 4.0);
        assert_ne!(target, Vec3::ZERO);
        assert!((target.distance(Vec3::ZERO) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_autopilot_changes_row_when_row_is_blocked() {
        let ahead = [
            (Vec3::new(-4.0, 0.0, -10.0), 2.2),
            (Vec3::new(0.0, 0.0, -10.0), 2.2),
            (Vec3::new(4.0, 0.0, -10.0), 2.2),
        ];
        let target = safest_lane(Vec3::ZERO, &ahead, 4.0);
        assert_eq!(target.x, 0.0);
        assert_eq!(target.y.abs(), 4.0);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lumina Voyage (native) starting headless autopilot...");
    autopilot::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::wasm_start, this is just to satisfy the compiler
}
