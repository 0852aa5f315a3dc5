//! Engine tunables
//!
//! Serializable so a level pack can ship its own balance alongside the layout.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::EngineError;

/// Engine configuration for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Playfield ===
    pub screen_width: f32,
    pub screen_height: f32,
    /// Radius shared by every bubble in the session
    pub bubble_radius: f32,
    /// Distance from the bottom edge to the cannon mouth
    pub cannon_height: f32,

    // === Projectile ===
    /// Launch speed (units/second)
    pub projectile_speed: f32,
    /// Magnet pull strength
    pub magnetic_attraction: f32,
    /// One in (ratio + 1) projectiles is non-snapping
    pub snapping_ratio: u32,
    /// Disable to make every projectile snap to the grid
    pub allow_non_snapping: bool,

    // === Geometry ===
    /// Gap under which two bubbles are connected
    pub connect_tolerance: f32,
    /// Slack for wall/ceiling contact and residual overlap
    pub calculation_margin: f32,

    // === Rules ===
    /// Minimum same-color group that bursts
    pub min_burst: usize,
    pub burst_points: u32,
    pub fell_points: u32,
    /// Bonus per unfired projectile on a win
    pub unused_points: u32,
    /// Projectiles available when a session starts without an explicit limit
    pub projectile_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            bubble_radius: BUBBLE_RADIUS,
            cannon_height: CANNON_HEIGHT,

            projectile_speed: PROJECTILE_SPEED,
            magnetic_attraction: MAGNETIC_ATTRACTION,
            snapping_ratio: SNAPPING_TO_NON_SNAPPING_RATIO,
            allow_non_snapping: true,

            connect_tolerance: CONNECT_TOLERANCE,
            calculation_margin: CALCULATION_MARGIN,

            min_burst: MIN_BURST,
            burst_points: BURST_POINTS,
            fell_points: FELL_POINTS,
            unused_points: UNUSED_POINTS,
            projectile_limit: PROJECTILE_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Config for a custom playfield, everything else default
    pub fn for_screen(width: f32, height: f32, radius: f32) -> Self {
        Self {
            screen_width: width,
            screen_height: height,
            bubble_radius: radius,
            cannon_height: radius * 4.0,
            ..Self::default()
        }
    }

    #[inline]
    pub fn bubble_diameter(&self) -> f32 {
        self.bubble_radius * 2.0
    }

    /// Vertical distance between hex rows
    #[inline]
    pub fn row_height(&self) -> f32 {
        3.0_f32.sqrt() * self.bubble_radius
    }

    /// Center of a freshly supplied projectile
    pub fn launch_origin(&self) -> Vec2 {
        Vec2::new(
            self.screen_width / 2.0,
            self.screen_height - self.bubble_radius - self.cannon_height,
        )
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("bubble_radius", self.bubble_radius),
            ("projectile_speed", self.projectile_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.bubble_diameter() > self.screen_width {
            return Err(EngineError::InvalidConfig(format!(
                "bubble diameter {} does not fit in screen width {}",
                self.bubble_diameter(),
                self.screen_width
            )));
        }
        if self.launch_origin().y - self.bubble_radius <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "cannon leaves no room below the ceiling".into(),
            ));
        }
        for (name, value) in [
            ("cannon_height", self.cannon_height),
            ("magnetic_attraction", self.magnetic_attraction),
            ("connect_tolerance", self.connect_tolerance),
            ("calculation_margin", self.calculation_margin),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if self.min_burst == 0 {
            return Err(EngineError::InvalidConfig("min_burst must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse a config, filling missing fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded engine config: {}x{} radius {}",
            config.screen_width,
            config.screen_height,
            config.bubble_radius
        );
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
