//! The in-flight bubble
//!
//! A projectile is a bubble plus a unit direction and a velocity. Magnet
//! attraction bends the velocity; the direction is kept as its unit vector so
//! that backtracking always retraces the path actually taken.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::Bubble;
use crate::unit_towards;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub bubble: Bubble,
    direction: Vec2,
    velocity: Vec2,
    speed: f32,
    magnetic_attraction: f32,
    launched: bool,
}

impl Projectile {
    /// A projectile waiting at the cannon; never a target
    pub fn new(mut bubble: Bubble, speed: f32, magnetic_attraction: f32) -> Self {
        bubble.is_target = false;
        Self {
            bubble,
            direction: Vec2::ZERO,
            velocity: Vec2::ZERO,
            speed,
            magnetic_attraction,
            launched: false,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.bubble.center
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.bubble.center = center;
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn set_non_snapping(&mut self) {
        self.bubble.snapping = false;
    }

    /// Aim from `origin` toward `target`.
    ///
    /// Rejected (returns false, nothing changes) if already launched or if
    /// `target` is not strictly above `origin`.
    pub fn set_launch_direction(&mut self, origin: Vec2, target: Vec2) -> bool {
        if self.launched {
            return false;
        }
        if target.y >= origin.y {
            return false;
        }
        let Some((dir, _)) = unit_towards(origin, target) else {
            return false;
        };
        self.direction = dir;
        self.velocity = dir * self.speed;
        self.launched = true;
        true
    }

    pub fn move_for_time(&mut self, dt: f32) {
        self.bubble.center += self.velocity * dt;
    }

    /// Move along the direction ray (negative moves backwards)
    pub fn move_for_distance(&mut self, distance: f32) {
        self.bubble.center += self.direction * distance;
    }

    /// Move along the ray so that x changes by exactly `dx`
    pub fn move_for_x(&mut self, dx: f32) {
        if self.direction.x == 0.0 {
            return;
        }
        let dy = dx * self.direction.y / self.direction.x;
        self.bubble.center += Vec2::new(dx, dy);
    }

    /// Move along the ray so that y changes by exactly `dy`
    pub fn move_for_y(&mut self, dy: f32) {
        if self.direction.y == 0.0 {
            return;
        }
        let dx = dy * self.direction.x / self.direction.y;
        self.bubble.center += Vec2::new(dx, dy);
    }

    /// Bend the velocity toward `point`, stronger when closer
    pub fn attracts_towards(&mut self, point: Vec2) {
        let Some((unit, dist)) = unit_towards(self.bubble.center, point) else {
            return;
        };
        self.velocity += unit * (self.magnetic_attraction / dist);
        if let Some((dir, _)) = unit_towards(Vec2::ZERO, self.velocity) {
            self.direction = dir;
        }
    }

    /// Bounce off a side wall
    pub fn reverse(&mut self) {
        self.direction.x = -self.direction.x;
        self.velocity.x = -self.velocity.x;
    }

    pub fn stop(&mut self) {
        self.direction = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
    }
}
