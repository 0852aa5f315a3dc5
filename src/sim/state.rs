//! Game session state
//!
//! One [`GameEngine`] owns everything a session needs: the connectivity
//! graph, the waiting and lookahead projectiles, score, and the seeded RNG
//! used for projectile draws. Nothing is shared between sessions.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleColor, BubbleId, BubblePower, BubbleSpec};
use super::events::{EventSink, GameEvent};
use super::graph::ConnectivityGraph;
use super::grid::HexLayout;
use super::projectile::Projectile;
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session running
    Idle,
    /// Projectile waiting at the cannon
    AwaitingLaunch,
    /// Projectile moving; `move_projectile` advances it
    InFlight,
    /// Projectile stopped, removals being computed (never observed between ticks)
    Resolving,
    /// Every target cleared
    Won,
    /// Out of projectiles
    Lost,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }
}

/// One game session
#[derive(Debug, Clone)]
pub struct GameEngine {
    pub(super) config: EngineConfig,
    pub(super) layout: HexLayout,
    pub(super) graph: ConnectivityGraph,
    pub(super) phase: GamePhase,
    pub(super) current: Option<Projectile>,
    pub(super) next: Option<Projectile>,
    pub(super) projectiles_remaining: u32,
    pub(super) score: u64,
    /// Magnets currently highlighted as having line of sight
    pub(super) active_magnets: BTreeSet<BubbleId>,
    pub(super) events: Vec<GameEvent>,
    pub(super) time_ticks: u64,
    rng: Pcg32,
}

impl GameEngine {
    /// Create an idle engine whose random draws come from `seed`
    pub fn new(config: EngineConfig, seed: u64) -> Result<Self, EngineError> {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }

    /// Create an idle engine with an explicit random source
    pub fn with_rng(config: EngineConfig, rng: Pcg32) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            layout: HexLayout::from_config(&config),
            graph: ConnectivityGraph::from_config(&config),
            config,
            phase: GamePhase::Idle,
            current: None,
            next: None,
            projectiles_remaining: 0,
            score: 0,
            active_magnets: BTreeSet::new(),
            events: Vec::new(),
            time_ticks: 0,
            rng,
        })
    }

    // === Accessors ===

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn graph(&self) -> &ConnectivityGraph {
        &self.graph
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_projectile(&self) -> Option<&Projectile> {
        self.current.as_ref()
    }

    pub fn next_projectile(&self) -> Option<&Projectile> {
        self.next.as_ref()
    }

    pub fn projectiles_remaining(&self) -> u32 {
        self.projectiles_remaining
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn active_magnets(&self) -> &BTreeSet<BubbleId> {
        &self.active_magnets
    }

    // === Lifecycle ===

    /// Start a session from an initial layout.
    ///
    /// Fails without touching the current state if two specs share a center.
    /// A layout with no targets is won immediately; a zero limit is lost
    /// immediately.
    pub fn start_session(&mut self, specs: &[BubbleSpec], projectile_limit: u32) -> Result<(), EngineError> {
        for (i, a) in specs.iter().enumerate() {
            if let Some(b) = specs[i + 1..].iter().find(|b| b.center == a.center) {
                return Err(EngineError::DuplicateCenter {
                    x: b.center.x,
                    y: b.center.y,
                });
            }
        }

        self.clear();
        let radius = self.config.bubble_radius;
        let ids = self
            .graph
            .build_graph(specs.iter().map(|spec| Bubble::from_spec(spec, radius)));
        // Duplicates were rejected above
        debug_assert_eq!(ids.len(), specs.len());
        for id in ids {
            if let Some(bubble) = self.graph.get(id) {
                self.events.push(GameEvent::BubblePlaced { id, bubble: *bubble });
            }
        }
        self.projectiles_remaining = projectile_limit;
        log::info!(
            "Session started: {} bubbles, {} projectiles",
            self.graph.len(),
            projectile_limit
        );

        self.finish_turn();
        Ok(())
    }

    /// Start a session with the configured projectile limit
    pub fn start_default_session(&mut self, specs: &[BubbleSpec]) -> Result<(), EngineError> {
        self.start_session(specs, self.config.projectile_limit)
    }

    /// Drop all session state; safe to call at any time between ticks
    pub fn clear(&mut self) {
        self.graph.clear();
        self.phase = GamePhase::Idle;
        self.current = None;
        self.next = None;
        self.projectiles_remaining = 0;
        self.score = 0;
        self.active_magnets.clear();
        self.events.clear();
        self.time_ticks = 0;
    }

    /// End the session, handing back any undelivered events
    pub fn teardown(self) -> Vec<GameEvent> {
        log::debug!("Session torn down at tick {}", self.time_ticks);
        self.events
    }

    // === Events ===

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn dispatch_events(&mut self, sink: &mut impl EventSink) {
        for event in self.events.drain(..) {
            sink.on_event(&event);
        }
    }

    // === Turn bookkeeping ===

    /// After a shot (or at session start): decide win / loss or supply the next projectile
    pub(super) fn finish_turn(&mut self) {
        if !self.graph.has_target() {
            let bonus = u64::from(self.projectiles_remaining) * u64::from(self.config.unused_points);
            if bonus > 0 {
                self.add_score(bonus);
            }
            self.phase = GamePhase::Won;
            self.current = None;
            self.next = None;
            log::info!("Won with score {}", self.score);
            self.events.push(GameEvent::Won { score: self.score });
            return;
        }
        if self.projectiles_remaining == 0 {
            self.phase = GamePhase::Lost;
            self.current = None;
            self.next = None;
            log::info!("Lost with score {}", self.score);
            self.events.push(GameEvent::Lost);
            return;
        }
        self.supply_projectile();
    }

    pub(super) fn add_score(&mut self, points: u64) {
        self.score += points;
        self.events.push(GameEvent::ScoreChanged { score: self.score });
    }

    fn supply_projectile(&mut self) {
        let projectile = match self.next.take() {
            Some(projectile) => projectile,
            None => self.draw_projectile(),
        };
        self.next = if self.projectiles_remaining > 1 {
            Some(self.draw_projectile())
        } else {
            None
        };

        self.events.push(GameEvent::ProjectileSupplied {
            color: projectile.bubble.color,
            snapping: projectile.bubble.snapping,
            remaining: self.projectiles_remaining,
        });
        let mut projectile = projectile;
        self.refresh_magnets(&mut projectile, false);
        self.current = Some(projectile);
        self.phase = GamePhase::AwaitingLaunch;
    }

    /// A fresh projectile at the cannon.
    ///
    /// Color is uniform over colors still on target bubbles (all base colors
    /// if none); one in `snapping_ratio + 1` is non-snapping.
    fn draw_projectile(&mut self) -> Projectile {
        let colors: Vec<BubbleColor> = {
            let present = self.graph.target_colors();
            if present.is_empty() {
                BubbleColor::BASE.to_vec()
            } else {
                present.into_iter().collect()
            }
        };
        let color = colors[self.rng.random_range(0..colors.len())];

        let mut bubble = Bubble::colored(self.config.launch_origin(), self.config.bubble_radius, color);
        if self.config.allow_non_snapping && self.rng.random_range(0..=self.config.snapping_ratio) == 0 {
            bubble.snapping = false;
        }
        Projectile::new(
            bubble,
            self.config.projectile_speed,
            self.config.magnetic_attraction,
        )
    }

    /// Recompute which magnets see `projectile`, optionally pulling it toward them
    pub(super) fn refresh_magnets(&mut self, projectile: &mut Projectile, attract: bool) {
        let magnets = self.graph.ids_with_power(BubblePower::Magnetic);
        let mut visible = BTreeSet::new();
        for id in magnets {
            let Some(magnet) = self.graph.get(id) else {
                continue;
            };
            let center = magnet.center;
            if self.graph.clear_path(projectile.center(), center) {
                visible.insert(id);
                if attract {
                    projectile.attracts_towards(center);
                }
            }
        }

        for &id in visible.difference(&self.active_magnets) {
            self.events.push(GameEvent::MagnetStateChanged { id, active: true });
        }
        for &id in self.active_magnets.difference(&visible) {
            self.events.push(GameEvent::MagnetStateChanged { id, active: false });
        }
        self.active_magnets = visible;
    }
}
