//! Collision geometry for equal-radius circles
//!
//! Pure functions over centers and directions. The graph and the game loop
//! build on these; nothing here knows about bubbles or sessions.

use glam::Vec2;

/// Distance to move a circle *backwards* along `direction` so that it
/// exactly touches a circle at `other` (both of radius `radius`).
///
/// Solves `|center - dist * direction - other| = 2r` for the larger root:
/// with `diff = center - other` the quadratic is
/// `dist² - 2(d·diff)·dist + |diff|² - (2r)² = 0`.
///
/// Returns `None` for a zero direction or when no real root exists (the
/// line of travel never passes within touching distance).
pub fn backtrack_distance(center: Vec2, direction: Vec2, other: Vec2, radius: f32) -> Option<f32> {
    if direction.length_squared() < 1e-12 {
        return None;
    }
    let dir = direction.normalize();
    let diff = center - other;
    let diameter = 2.0 * radius;

    let b = -2.0 * dir.dot(diff);
    let c = diff.length_squared() - diameter * diameter;
    let discriminant = b * b - 4.0 * c;
    if discriminant < 0.0 {
        return None;
    }
    let dist = (-b + discriminant.sqrt()) / 2.0;
    dist.is_finite().then_some(dist)
}

/// Whether a circle of `radius` centered at `point` blocks the straight
/// segment from `from` to `to`.
///
/// Only points strictly inside the segment's extent along its dominant axis
/// (the one with the shallower slope) are considered, so the endpoints never
/// block themselves.
pub fn segment_blocked_by(from: Vec2, to: Vec2, point: Vec2, radius: f32) -> bool {
    let delta = to - from;
    let len = delta.length();
    if len < 1e-6 {
        return false;
    }

    let along_x = delta.x.abs() >= delta.y.abs();
    let (lo, hi, p) = if along_x {
        (from.x.min(to.x), from.x.max(to.x), point.x)
    } else {
        (from.y.min(to.y), from.y.max(to.y), point.y)
    };
    if p <= lo || p >= hi {
        return false;
    }

    let perpendicular = delta.perp_dot(point - from).abs() / len;
    perpendicular < radius
}
