//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by bubble ID)
//! - No rendering or platform dependencies

pub mod bubble;
pub mod collision;
pub mod events;
pub mod graph;
pub mod grid;
pub mod projectile;
pub mod state;
pub mod tick;

pub use bubble::{Bubble, BubbleColor, BubbleId, BubblePower, BubbleSpec};
pub use collision::{backtrack_distance, segment_blocked_by};
pub use events::{EventSink, GameEvent, RemovalReason};
pub use graph::ConnectivityGraph;
pub use grid::HexLayout;
pub use projectile::Projectile;
pub use state::{GameEngine, GamePhase};
pub use tick::{TickInput, tick};
