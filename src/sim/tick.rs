//! Per-frame simulation step
//!
//! Advances the in-flight projectile by one caller-supplied timestep and, when
//! it comes to rest, settles it into the board and resolves bursts and falls.

use std::collections::BTreeSet;

use glam::Vec2;

use super::bubble::BubbleId;
use super::events::{GameEvent, RemovalReason};
use super::projectile::Projectile;
use super::state::{GameEngine, GamePhase};

/// Upper bound on successive backtracks in a single frame
const MAX_SETTLE_STEPS: usize = 16;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim from the first point toward the second and fire
    pub launch: Option<(Vec2, Vec2)>,
    /// Drop the session (back to `Idle`)
    pub reset: bool,
}

/// Advance the engine by one frame
pub fn tick(engine: &mut GameEngine, input: &TickInput, dt: f32) {
    if input.reset {
        engine.clear();
        return;
    }
    if let Some((origin, target)) = input.launch {
        engine.launch(origin, target);
    }
    engine.move_projectile(dt);
}

impl GameEngine {
    /// Fire the waiting projectile.
    ///
    /// Returns false (and changes nothing) unless a projectile is waiting and
    /// `target` lies strictly above `origin`.
    pub fn launch(&mut self, origin: Vec2, target: Vec2) -> bool {
        if self.phase != GamePhase::AwaitingLaunch {
            return false;
        }
        let Some(projectile) = self.current.as_mut() else {
            return false;
        };
        if !projectile.set_launch_direction(origin, target) {
            log::debug!("Launch toward ({}, {}) rejected", target.x, target.y);
            return false;
        }

        let direction = projectile.direction();
        self.projectiles_remaining = self.projectiles_remaining.saturating_sub(1);
        self.phase = GamePhase::InFlight;
        self.events.push(GameEvent::ProjectileLaunched { direction });
        true
    }

    /// Advance the in-flight projectile by `dt` seconds; no-op in any other phase
    pub fn move_projectile(&mut self, dt: f32) {
        if self.phase != GamePhase::InFlight {
            return;
        }
        let Some(mut projectile) = self.current.take() else {
            return;
        };
        self.time_ticks += 1;
        let margin = self.config.calculation_margin;

        self.backtrack_into_screen(&mut projectile);

        if self.settle_on_contact(&mut projectile) || projectile.bubble.top_y() <= margin {
            self.resolve(projectile);
            return;
        }

        let heading = projectile.direction().x;
        let at_left = projectile.bubble.left_x() <= margin && heading < 0.0;
        let at_right = projectile.bubble.right_x() >= self.config.screen_width - margin && heading > 0.0;
        if at_left || at_right {
            projectile.reverse();
        }

        self.refresh_magnets(&mut projectile, true);
        projectile.move_for_time(dt);

        if projectile.bubble.top_y() > self.config.screen_height {
            log::debug!("Projectile lost below the screen at tick {}", self.time_ticks);
            self.events.push(GameEvent::ProjectileLost);
            self.phase = GamePhase::Resolving;
            self.finish_turn();
            return;
        }
        self.current = Some(projectile);
    }

    /// Pull the projectile back along its path until it is inside the side
    /// walls and below the ceiling
    fn backtrack_into_screen(&self, projectile: &mut Projectile) {
        let left = projectile.bubble.left_x();
        if left < 0.0 {
            projectile.move_for_x(-left);
        }
        let overshoot = projectile.bubble.right_x() - self.config.screen_width;
        if overshoot > 0.0 {
            projectile.move_for_x(-overshoot);
        }
        let top = projectile.bubble.top_y();
        if top < 0.0 {
            projectile.move_for_y(-top);
        }
    }

    /// Back the projectile out of every bubble it overlaps.
    ///
    /// Returns true if it is in contact with the board. Touching a
    /// non-snapping bubble makes the projectile non-snapping.
    fn settle_on_contact(&self, projectile: &mut Projectile) -> bool {
        let margin = self.config.calculation_margin;
        let mut contact = false;
        for _ in 0..MAX_SETTLE_STEPS {
            let Some((id, gap)) = self.graph.closest_collided_bubble_and_distance(&projectile.bubble) else {
                break;
            };
            contact = true;
            if self.graph.get(id).is_some_and(|b| !b.snapping) {
                projectile.set_non_snapping();
            }
            if gap >= -margin || !self.graph.backtrack_to_touching(projectile, id) {
                break;
            }
        }
        contact
    }

    /// Snap to the hex grid unless the slot would leave the screen or overlap the board
    fn snap_into_place(&self, projectile: &mut Projectile) {
        if !projectile.bubble.snapping {
            return;
        }
        let margin = self.config.calculation_margin;
        let mut probe = projectile.bubble;
        probe.center = self.layout.snapped_center(projectile.center());

        let inside = probe.left_x() >= -margin && probe.right_x() <= self.config.screen_width + margin;
        let clear = self.graph.closest_distance_from_existing_bubble(&probe) >= -margin;
        if inside && clear {
            projectile.set_center(probe.center);
        } else {
            log::debug!("Snap slot ({}, {}) unavailable, keeping raw position", probe.center.x, probe.center.y);
            projectile.set_non_snapping();
        }
    }

    /// The projectile has stopped: place it, burst, drop, score, then end the turn
    fn resolve(&mut self, mut projectile: Projectile) {
        self.phase = GamePhase::Resolving;
        projectile.stop();
        self.snap_into_place(&mut projectile);

        let bubble = projectile.bubble;
        let margin = self.config.calculation_margin;
        let residual = self.graph.closest_distance_from_existing_bubble(&bubble);
        if residual < -margin {
            log::warn!(
                "Projectile at ({}, {}) overlaps the board by {}",
                bubble.center.x,
                bubble.center.y,
                -residual
            );
            debug_assert!(residual >= -margin, "resting projectile overlaps by {}", -residual);
        }

        let Some(id) = self.graph.add_to_graph(bubble) else {
            log::warn!("Projectile landed on an occupied center ({}, {})", bubble.center.x, bubble.center.y);
            self.finish_turn();
            return;
        };
        self.events.push(GameEvent::BubblePlaced { id, bubble });

        let mut bursted = self.graph.bubbles_bursted_by_power(id);
        bursted.extend(self.graph.bursted_bubbles(id));
        let fell = self.graph.fell_bubbles(&bursted);

        let bursted_targets = self.remove_all(&bursted, RemovalReason::Bursted);
        let fell_targets = self.remove_all(&fell, RemovalReason::Fell);
        log::debug!(
            "Shot resolved: {} bursted ({} targets), {} fell ({} targets)",
            bursted.len(),
            bursted_targets,
            fell.len(),
            fell_targets
        );

        let points = bursted_targets * u64::from(self.config.burst_points)
            + fell_targets * u64::from(self.config.fell_points);
        if points > 0 {
            self.add_score(points);
        }
        debug_assert!(self.graph.is_consistent());

        self.finish_turn();
    }

    /// Remove `ids` from the board, returning how many were targets
    fn remove_all(&mut self, ids: &BTreeSet<BubbleId>, reason: RemovalReason) -> u64 {
        let mut targets = 0;
        for &id in ids {
            if let Some(bubble) = self.graph.remove_bubble_from_graph(id) {
                self.active_magnets.remove(&id);
                if bubble.is_target {
                    targets += 1;
                }
                self.events.push(GameEvent::BubbleRemoved { id, bubble, reason });
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::sim::{Bubble, BubbleColor, BubblePower, BubbleSpec};

    const DT: f32 = 0.01;

    fn engine(width: f32, height: f32) -> GameEngine {
        let config = EngineConfig {
            allow_non_snapping: false,
            ..EngineConfig::for_screen(width, height, 20.0)
        };
        GameEngine::new(config, 42).expect("valid config")
    }

    fn fire_straight_up(engine: &mut GameEngine) -> bool {
        let origin = engine.config().launch_origin();
        engine.launch(origin, origin - Vec2::new(0.0, 100.0))
    }

    /// Tick until the projectile stops flying; returns the number of ticks taken
    fn run_shot(engine: &mut GameEngine) -> usize {
        for n in 1..=10_000 {
            tick(engine, &TickInput::default(), DT);
            if engine.phase() != GamePhase::InFlight {
                return n;
            }
        }
        panic!("projectile never came to rest");
    }

    #[test]
    fn test_straight_up_reaches_ceiling() {
        let mut engine = engine(400.0, 600.0);
        let specs = [BubbleSpec::colored(20.0, 20.0, BubbleColor::Red)];
        engine.start_session(&specs, 3).expect("valid layout");
        assert_eq!(engine.config().launch_origin(), Vec2::new(200.0, 500.0));

        assert!(fire_straight_up(&mut engine));
        assert_eq!(engine.phase(), GamePhase::InFlight);
        let ticks = run_shot(&mut engine);
        // (500 - 20) / (1000 * 0.01) = 48 moves, stop detected on the next frame
        assert!((48..=50).contains(&ticks), "took {ticks} ticks");
        assert_eq!(engine.time_ticks(), ticks as u64);

        let placed: Vec<_> = engine
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::BubblePlaced { bubble, .. } if !bubble.is_target => Some(bubble),
                _ => None,
            })
            .collect();
        assert_eq!(placed.len(), 1);
        // 200 is a slot boundary; snapping rounds left
        assert!((placed[0].center.x - 180.0).abs() < 1e-3);
        assert!((placed[0].center.y - 20.0).abs() < 1e-3);
        assert_eq!(engine.graph().len(), 2);
        assert_eq!(engine.phase(), GamePhase::AwaitingLaunch);
        assert_eq!(engine.projectiles_remaining(), 2);
    }

    #[test]
    fn test_non_snapping_keeps_raw_position() {
        let mut engine = engine(400.0, 600.0);
        engine
            .start_session(&[BubbleSpec::colored(20.0, 20.0, BubbleColor::Red)], 3)
            .expect("valid layout");
        if let Some(p) = engine.current.as_mut() {
            p.set_non_snapping();
        }
        fire_straight_up(&mut engine);
        run_shot(&mut engine);

        let resting = engine
            .graph()
            .iter()
            .find(|(_, b)| !b.is_target)
            .map(|(_, b)| *b)
            .expect("projectile placed");
        assert!((resting.center.x - 200.0).abs() < 1e-3);
        assert!(resting.top_y().abs() < 0.1);
        assert!(!resting.snapping);
    }

    #[test]
    fn test_clearing_last_targets_wins() {
        let mut engine = engine(120.0, 400.0);
        let specs = [
            BubbleSpec::colored(20.0, 20.0, BubbleColor::Red),
            BubbleSpec::colored(60.0, 20.0, BubbleColor::Red),
        ];
        engine.start_session(&specs, 5).expect("valid layout");
        assert_eq!(engine.current_projectile().map(|p| p.bubble.color), Some(BubbleColor::Red));

        fire_straight_up(&mut engine);
        run_shot(&mut engine);

        assert_eq!(engine.phase(), GamePhase::Won);
        assert!(engine.graph().is_empty());
        // Two targets at 10 each plus 4 unfired at 20 each
        assert_eq!(engine.score(), 100);

        let events = engine.drain_events();
        let placed = events.iter().find_map(|e| match e {
            GameEvent::BubblePlaced { bubble, .. } if !bubble.is_target => Some(*bubble),
            _ => None,
        });
        let placed = placed.expect("projectile placed");
        assert!((placed.center - Vec2::new(40.0, 54.641)).length() < 1e-2);

        let bursts = events
            .iter()
            .filter(|e| matches!(e, GameEvent::BubbleRemoved { reason: RemovalReason::Bursted, .. }))
            .count();
        assert_eq!(bursts, 3);
        assert_eq!(events.last(), Some(&GameEvent::Won { score: 100 }));

        // Terminal: nothing moves any more
        assert!(!fire_straight_up(&mut engine));
        engine.move_projectile(DT);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_fallen_targets_score_more() {
        let mut engine = engine(160.0, 400.0);
        // Blue hangs from the left red only
        let specs = [
            BubbleSpec::colored(60.0, 20.0, BubbleColor::Red),
            BubbleSpec::colored(100.0, 20.0, BubbleColor::Red),
            BubbleSpec::colored(40.0, 54.641_016, BubbleColor::Blue),
        ];
        engine.start_session(&specs, 5).expect("valid layout");
        if let Some(p) = engine.current.as_mut() {
            p.bubble.color = BubbleColor::Red;
        }
        fire_straight_up(&mut engine);
        run_shot(&mut engine);

        let events = engine.drain_events();
        let fell: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::BubbleRemoved {
                    bubble,
                    reason: RemovalReason::Fell,
                    ..
                } => Some(bubble.color),
                _ => None,
            })
            .collect();
        assert_eq!(fell, vec![BubbleColor::Blue]);
        assert!(engine.graph().is_empty());
        assert_eq!(engine.phase(), GamePhase::Won);
        // Two bursted reds, one fallen blue, four unfired
        assert_eq!(engine.score(), 2 * 10 + 30 + 4 * 20);
    }

    #[test]
    fn test_running_out_loses() {
        let mut engine = engine(200.0, 400.0);
        let specs = [
            BubbleSpec::colored(20.0, 20.0, BubbleColor::Red),
            BubbleSpec::colored(180.0, 20.0, BubbleColor::Blue),
        ];
        engine.start_session(&specs, 1).expect("valid layout");
        assert!(engine.next_projectile().is_none());

        fire_straight_up(&mut engine);
        assert_eq!(engine.projectiles_remaining(), 0);
        run_shot(&mut engine);

        assert_eq!(engine.phase(), GamePhase::Lost);
        assert_eq!(engine.graph().len(), 3);
        assert_eq!(engine.drain_events().last(), Some(&GameEvent::Lost));
    }

    #[test]
    fn test_invalid_launch_changes_nothing() {
        let mut engine = engine(400.0, 600.0);
        engine
            .start_session(&[BubbleSpec::colored(20.0, 20.0, BubbleColor::Red)], 3)
            .expect("valid layout");
        engine.drain_events();

        let origin = engine.config().launch_origin();
        assert!(!engine.launch(origin, origin + Vec2::new(50.0, 10.0)));
        assert!(!engine.launch(origin, origin + Vec2::new(50.0, 0.0)));
        assert_eq!(engine.phase(), GamePhase::AwaitingLaunch);
        assert_eq!(engine.projectiles_remaining(), 3);

        // Frames while waiting do nothing
        let before = engine.current_projectile().map(|p| p.center());
        engine.move_projectile(DT);
        assert_eq!(engine.current_projectile().map(|p| p.center()), before);
        assert!(engine.drain_events().is_empty());

        // Only one launch per projectile
        assert!(fire_straight_up(&mut engine));
        assert!(!fire_straight_up(&mut engine));
        assert_eq!(engine.projectiles_remaining(), 2);
    }

    #[test]
    fn test_wall_bounce() {
        let mut engine = engine(400.0, 600.0);
        engine
            .start_session(&[BubbleSpec::colored(20.0, 20.0, BubbleColor::Red)], 3)
            .expect("valid layout");
        let origin = engine.config().launch_origin();
        engine.launch(origin, origin + Vec2::new(100.0, -100.0));

        let mut bounced = false;
        for _ in 0..200 {
            tick(&mut engine, &TickInput::default(), DT);
            let Some(p) = engine.current_projectile() else {
                break;
            };
            assert!(p.bubble.right_x() <= 400.0 + 15.0);
            if p.direction().x < 0.0 {
                bounced = true;
                break;
            }
        }
        assert!(bounced);
    }

    #[test]
    fn test_magnet_bends_path() {
        let mut engine = engine(400.0, 600.0);
        let specs = [
            BubbleSpec::colored(20.0, 20.0, BubbleColor::Red),
            BubbleSpec::special(380.0, 20.0, BubblePower::Magnetic),
        ];
        engine.start_session(&specs, 3).expect("valid layout");
        fire_straight_up(&mut engine);
        tick(&mut engine, &TickInput::default(), DT);

        let p = engine.current_projectile().expect("still flying");
        assert!(p.velocity().x > 0.0);
        assert!(p.center().x > 200.0);
    }

    #[test]
    fn test_tick_input_launch_and_reset() {
        let mut engine = engine(400.0, 600.0);
        engine
            .start_session(&[BubbleSpec::colored(20.0, 20.0, BubbleColor::Red)], 3)
            .expect("valid layout");
        let origin = engine.config().launch_origin();
        let input = TickInput {
            launch: Some((origin, Vec2::new(200.0, 0.0))),
            ..Default::default()
        };
        tick(&mut engine, &input, DT);
        assert_eq!(engine.phase(), GamePhase::InFlight);
        assert!(engine.current_projectile().expect("flying").center().y < origin.y);

        tick(
            &mut engine,
            &TickInput {
                reset: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(engine.phase(), GamePhase::Idle);
        assert!(engine.graph().is_empty());
    }

    #[test]
    fn test_same_seed_same_game() {
        let config = EngineConfig::for_screen(400.0, 600.0, 20.0);
        let specs: Vec<BubbleSpec> = (0..10)
            .map(|i| BubbleSpec::colored(20.0 + 40.0 * i as f32, 20.0, BubbleColor::BASE[i % 4]))
            .collect();
        let aims = [Vec2::new(100.0, 0.0), Vec2::new(320.0, 100.0), Vec2::new(200.0, 0.0)];

        let play = || {
            let mut engine = GameEngine::new(config.clone(), 2024).expect("valid config");
            engine.start_session(&specs, 10).expect("valid layout");
            let mut log = engine.drain_events();
            for aim in aims {
                let origin = engine.config().launch_origin();
                let input = TickInput {
                    launch: Some((origin, aim)),
                    ..Default::default()
                };
                tick(&mut engine, &input, DT);
                for _ in 0..300 {
                    tick(&mut engine, &TickInput::default(), DT);
                }
                log.extend(engine.drain_events());
            }
            (log, engine.score())
        };

        let (a, score_a) = play();
        let (b, score_b) = play();
        assert_eq!(a, b);
        assert_eq!(score_a, score_b);
    }

    fn resting_projectile(engine: &GameEngine) -> (BubbleId, Bubble) {
        engine
            .graph()
            .iter()
            .find(|(_, b)| !b.is_target)
            .map(|(id, b)| (id, *b))
            .expect("projectile placed")
    }

    #[test]
    fn test_touching_non_snapping_bubble_disables_snap() {
        let mut engine = engine(400.0, 600.0);
        let specs = [BubbleSpec {
            snapping: false,
            ..BubbleSpec::colored(203.0, 20.0, BubbleColor::Red)
        }];
        engine.start_session(&specs, 3).expect("valid layout");
        assert!(engine.current_projectile().expect("supplied").bubble.snapping);

        fire_straight_up(&mut engine);
        run_shot(&mut engine);

        let (_, resting) = resting_projectile(&engine);
        assert!(!resting.snapping);
        // Contact at dy = sqrt(40² - 3²)
        assert!((resting.center - Vec2::new(200.0, 59.887)).length() < 1e-2);
        let (_, other) = engine
            .graph()
            .iter()
            .find(|(_, b)| b.is_target)
            .expect("target untouched");
        assert!(engine.graph().distance_between(&resting, other).abs() < 1e-2);
    }

    #[test]
    fn test_blocked_slot_keeps_raw_position() {
        let mut engine = engine(400.0, 600.0);
        // Overlaps the (180, 20) slot the projectile would snap to
        let specs = [BubbleSpec {
            snapping: false,
            ..BubbleSpec::colored(150.0, 20.0, BubbleColor::Red)
        }];
        engine.start_session(&specs, 3).expect("valid layout");

        fire_straight_up(&mut engine);
        run_shot(&mut engine);

        let (id, resting) = resting_projectile(&engine);
        assert!(!resting.snapping);
        assert!((resting.center.x - 200.0).abs() < 1e-3);
        assert!(resting.top_y().abs() < 0.1);
        for (_, other) in engine.graph().iter().filter(|(other, _)| *other != id) {
            assert!(engine.graph().distance_between(&resting, other) > 0.0);
        }
        assert!(engine.graph().is_consistent());
    }

    #[test]
    fn test_settles_through_several_overlaps_in_one_frame() {
        let mut engine = engine(400.0, 600.0);
        let specs = [
            BubbleSpec::colored(200.0, 100.0, BubbleColor::Red),
            BubbleSpec::colored(225.0, 135.0, BubbleColor::Blue),
        ];
        engine.start_session(&specs, 3).expect("valid layout");
        // Isolate settling from snapping
        if let Some(p) = engine.current.as_mut() {
            p.set_non_snapping();
        }
        fire_straight_up(&mut engine);

        // One 400-unit step lands right on the first bubble, past the second
        tick(&mut engine, &TickInput::default(), 0.4);
        let flying = engine.current_projectile().expect("still flying");
        assert!((flying.center().y - 100.0).abs() < 1e-3);
        tick(&mut engine, &TickInput::default(), 0.4);
        assert_ne!(engine.phase(), GamePhase::InFlight);

        let (id, resting) = resting_projectile(&engine);
        let margin = engine.config().calculation_margin;
        // Backed out of the first, then out of the second, ending in contact with it
        assert!((resting.center - Vec2::new(200.0, 166.22)).length() < 1e-2);
        let gaps: Vec<f32> = engine
            .graph()
            .iter()
            .filter(|(other, _)| *other != id)
            .map(|(_, other)| engine.graph().distance_between(&resting, other))
            .collect();
        assert_eq!(gaps.len(), 2);
        assert!(gaps.iter().all(|&gap| gap >= -margin), "gaps {gaps:?}");
        assert!(gaps.iter().any(|&gap| gap.abs() < 1e-2));
    }

    #[test]
    fn test_removed_magnet_gets_no_state_change() {
        let config = EngineConfig {
            allow_non_snapping: false,
            magnetic_attraction: 0.0,
            ..EngineConfig::for_screen(400.0, 600.0, 20.0)
        };
        let mut engine = GameEngine::new(config, 42).expect("valid config");
        let specs = [
            BubbleSpec::colored(20.0, 20.0, BubbleColor::Green),
            BubbleSpec::special(180.0, 20.0, BubblePower::Bomb),
            BubbleSpec::special(220.0, 20.0, BubblePower::Magnetic),
        ];
        engine.start_session(&specs, 3).expect("valid layout");
        let magnet = engine.graph().ids_with_power(BubblePower::Magnetic)[0];
        assert!(engine.active_magnets().contains(&magnet));
        engine.drain_events();

        // Lands between bomb and magnet; the blast takes the magnet
        fire_straight_up(&mut engine);
        run_shot(&mut engine);
        assert!(!engine.graph().contains(magnet));
        assert_eq!(engine.phase(), GamePhase::AwaitingLaunch);

        let events = engine.drain_events();
        let removed_at = events
            .iter()
            .position(|e| matches!(e, GameEvent::BubbleRemoved { id, .. } if *id == magnet))
            .expect("magnet removed");
        assert!(!events[removed_at..]
            .iter()
            .any(|e| matches!(e, GameEvent::MagnetStateChanged { id, .. } if *id == magnet)));
        assert!(engine.active_magnets().is_empty());
    }

    #[test]
    fn test_dispatch_to_sink() {
        let mut engine = engine(120.0, 400.0);
        let specs = [
            BubbleSpec::colored(20.0, 20.0, BubbleColor::Red),
            BubbleSpec::colored(60.0, 20.0, BubbleColor::Red),
        ];
        engine.start_session(&specs, 5).expect("valid layout");
        fire_straight_up(&mut engine);
        run_shot(&mut engine);

        let mut removed = 0;
        let mut won = None;
        engine.dispatch_events(&mut |event: &GameEvent| match event {
            GameEvent::BubbleRemoved { .. } => removed += 1,
            GameEvent::Won { score } => won = Some(*score),
            _ => {}
        });
        assert_eq!(removed, 3);
        assert_eq!(won, Some(100));
        assert!(engine.drain_events().is_empty());
    }
}
