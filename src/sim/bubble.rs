//! Bubble primitives
//!
//! A bubble is a fixed-radius circle with a color and/or a power. Plain
//! bubbles carry a color and no power; special bubbles carry a power and no
//! color. Identity inside the graph is a [`BubbleId`] handed out on
//! insertion, so float centers are never used as map keys.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable handle of a bubble resident in the connectivity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BubbleId(pub u32);

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bubble colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleColor {
    Red,
    Green,
    Blue,
    Orange,
    #[default]
    None,
}

impl BubbleColor {
    /// Colors a projectile can be drawn from
    pub const BASE: [BubbleColor; 4] = [
        BubbleColor::Red,
        BubbleColor::Orange,
        BubbleColor::Green,
        BubbleColor::Blue,
    ];

    pub fn is_colored(self) -> bool {
        self != BubbleColor::None
    }
}

/// Special abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubblePower {
    /// Never bursts; can still fall
    Indestructible,
    /// Pulls projectiles it can see
    Magnetic,
    /// Clears its whole row
    Lightning,
    /// Clears every bubble of the activating color
    Star,
    /// Clears itself and its neighbors
    Bomb,
    #[default]
    None,
}

impl BubblePower {
    /// Powers that keep a chain reaction going when caught in a burst
    pub fn chains(self) -> bool {
        matches!(self, BubblePower::Lightning | BubblePower::Bomb)
    }
}

/// A positioned circular bubble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub center: Vec2,
    pub radius: f32,
    pub color: BubbleColor,
    pub power: BubblePower,
    /// Must be cleared for the player to win
    pub is_target: bool,
    /// Aligns to the hex lattice when it comes to rest
    pub snapping: bool,
}

impl Bubble {
    /// A plain colored target bubble
    pub fn colored(center: Vec2, radius: f32, color: BubbleColor) -> Self {
        Self {
            center,
            radius,
            color,
            power: BubblePower::None,
            is_target: true,
            snapping: true,
        }
    }

    /// A special (power) bubble; not a target
    pub fn special(center: Vec2, radius: f32, power: BubblePower) -> Self {
        Self {
            center,
            radius,
            color: BubbleColor::None,
            power,
            is_target: false,
            snapping: true,
        }
    }

    pub fn from_spec(spec: &BubbleSpec, radius: f32) -> Self {
        Self {
            center: spec.center,
            radius,
            color: spec.color,
            power: spec.power,
            is_target: spec.is_target,
            snapping: spec.snapping,
        }
    }

    #[inline]
    pub fn top_y(&self) -> f32 {
        self.center.y - self.radius
    }

    #[inline]
    pub fn bottom_y(&self) -> f32 {
        self.center.y + self.radius
    }

    #[inline]
    pub fn left_x(&self) -> f32 {
        self.center.x - self.radius
    }

    #[inline]
    pub fn right_x(&self) -> f32 {
        self.center.x + self.radius
    }

    pub fn touches_ceiling(&self, margin: f32) -> bool {
        self.top_y().abs() <= margin
    }

    pub fn is_destructible(&self) -> bool {
        self.power != BubblePower::Indestructible
    }
}

/// Caller-supplied description of an initial bubble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleSpec {
    pub center: Vec2,
    #[serde(default)]
    pub color: BubbleColor,
    #[serde(default)]
    pub power: BubblePower,
    pub is_target: bool,
    #[serde(default = "default_snapping")]
    pub snapping: bool,
}

fn default_snapping() -> bool {
    true
}

impl BubbleSpec {
    pub fn colored(x: f32, y: f32, color: BubbleColor) -> Self {
        Self {
            center: Vec2::new(x, y),
            color,
            power: BubblePower::None,
            is_target: true,
            snapping: true,
        }
    }

    pub fn special(x: f32, y: f32, power: BubblePower) -> Self {
        Self {
            center: Vec2::new(x, y),
            color: BubbleColor::None,
            power,
            is_target: false,
            snapping: true,
        }
    }
}
