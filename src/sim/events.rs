//! Outbound notifications
//!
//! The engine never calls into a renderer. It queues events during a tick and
//! the collaborator drains them afterwards, either as a batch or through an
//! [`EventSink`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleColor, BubbleId};

/// Why a bubble left the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    Bursted,
    Fell,
}

/// Game event data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A bubble joined the board (initial layout or a resting projectile)
    BubblePlaced { id: BubbleId, bubble: Bubble },
    /// A bubble left the board
    BubbleRemoved {
        id: BubbleId,
        bubble: Bubble,
        reason: RemovalReason,
    },
    /// A new projectile is waiting at the cannon
    ProjectileSupplied {
        color: BubbleColor,
        snapping: bool,
        /// Projectiles left including this one
        remaining: u32,
    },
    ProjectileLaunched { direction: Vec2 },
    /// The projectile left through the bottom edge and was discarded
    ProjectileLost,
    ScoreChanged { score: u64 },
    Won { score: u64 },
    Lost,
    /// A magnet gained or lost line of sight to the projectile
    MagnetStateChanged { id: BubbleId, active: bool },
}

/// Receiver for engine events
pub trait EventSink {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventSink for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}
