//! Bubble Burst - a bubble-shooter physics core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (connectivity graph, projectile, game session)
//! - `config`: Data-driven engine tunables
//! - `level`: Grid layouts flattened into initial bubble specs
//! - `error`: Caller-facing failures
//!
//! Coordinates are screen space: x grows right, y grows down, the ceiling is y = 0.

pub mod config;
pub mod error;
pub mod level;
pub mod sim;

pub use config::EngineConfig;
pub use error::EngineError;
pub use level::{LevelCell, LevelLayout};

use glam::Vec2;

/// Default engine tunables
pub mod consts {
    /// Playfield dimensions
    pub const SCREEN_WIDTH: f32 = 480.0;
    pub const SCREEN_HEIGHT: f32 = 800.0;

    /// Shared bubble radius
    pub const BUBBLE_RADIUS: f32 = 20.0;
    /// Height of the cannon the waiting projectile sits on
    pub const CANNON_HEIGHT: f32 = BUBBLE_RADIUS * 4.0;

    /// Projectile speed (units/second)
    pub const PROJECTILE_SPEED: f32 = 1_000.0;
    /// Magnet pull strength (velocity gain = attraction / distance per frame)
    pub const MAGNETIC_ATTRACTION: f32 = 1_000.0;
    /// One in (ratio + 1) projectiles is non-snapping
    pub const SNAPPING_TO_NON_SNAPPING_RATIO: u32 = 5;

    /// Gap under which two bubbles count as touching
    pub const CONNECT_TOLERANCE: f32 = 1.0;
    /// Slack for wall/ceiling contact and residual overlap
    pub const CALCULATION_MARGIN: f32 = 0.05;

    /// Minimum same-color group that bursts
    pub const MIN_BURST: usize = 3;

    /// Scoring
    pub const BURST_POINTS: u32 = 10;
    pub const FELL_POINTS: u32 = 30;
    pub const UNUSED_POINTS: u32 = 20;

    /// Projectiles per session unless the level says otherwise
    pub const PROJECTILE_LIMIT: u32 = 100;
}

/// Gap between two circles of equal radius (negative when overlapping)
#[inline]
pub fn gap(a: Vec2, b: Vec2, radius: f32) -> f32 {
    a.distance(b) - 2.0 * radius
}

/// Unit vector from `from` toward `to`, or `None` when the points coincide
#[inline]
pub fn unit_towards(from: Vec2, to: Vec2) -> Option<(Vec2, f32)> {
    let delta = to - from;
    let dist = delta.length();
    if dist > 0.0 && dist.is_finite() {
        Some((delta / dist, dist))
    } else {
        None
    }
}
