//! Hex lattice placement
//!
//! Rows are √3·r apart. Even rows start flush with the left wall, odd rows
//! are shifted right by one radius and hold one slot fewer, so every row fits
//! inside the screen width.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HexLayout {
    pub radius: f32,
    pub screen_width: f32,
}

impl HexLayout {
    pub fn new(radius: f32, screen_width: f32) -> Self {
        Self { radius, screen_width }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.bubble_radius, config.screen_width)
    }

    #[inline]
    pub fn diameter(&self) -> f32 {
        2.0 * self.radius
    }

    #[inline]
    pub fn row_height(&self) -> f32 {
        3.0_f32.sqrt() * self.radius
    }

    /// Number of slots in `row`
    pub fn columns(&self, row: usize) -> usize {
        let even = (self.screen_width / self.diameter()).floor().max(0.0) as usize;
        if row % 2 == 0 {
            even
        } else {
            even.saturating_sub(1)
        }
    }

    /// Center of slot (`row`, `col`)
    pub fn slot_center(&self, row: usize, col: usize) -> Vec2 {
        let offset = if row % 2 == 0 { 0.0 } else { self.radius };
        Vec2::new(
            offset + col as f32 * self.diameter() + self.radius,
            row as f32 * self.row_height() + self.radius,
        )
    }

    /// Nearest slot to a bubble centered at `center`.
    ///
    /// Rounds the top-left origin to the nearest row, then to the nearest
    /// column of that row, clamped to the row's slots. Exact halves round
    /// toward the ceiling / left wall.
    pub fn snapped_center(&self, center: Vec2) -> Vec2 {
        let (row, col) = self.nearest_slot(center);
        self.slot_center(row, col)
    }

    pub fn nearest_slot(&self, center: Vec2) -> (usize, usize) {
        let origin = center - Vec2::splat(self.radius);
        let row_height = self.row_height();

        let mut row = (origin.y / row_height).floor();
        if origin.y - row * row_height > row_height / 2.0 {
            row += 1.0;
        }
        let row = row.max(0.0) as usize;

        let x = if row % 2 == 0 { origin.x } else { origin.x - self.radius };
        let mut col = (x / self.diameter()).floor();
        if x - col * self.diameter() > self.radius {
            col += 1.0;
        }
        let max_col = self.columns(row).saturating_sub(1);
        let col = (col.max(0.0) as usize).min(max_col);

        (row, col)
    }
}
