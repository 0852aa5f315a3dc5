//! Level layouts
//!
//! Levels are authored as rows of optional cells on the hex grid. The engine
//! only consumes flat bubble specs, so a layout is converted once at session
//! start.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::sim::{BubbleColor, BubblePower, BubbleSpec, HexLayout};

/// One occupied grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LevelCell {
    /// An ordinary bubble that must be cleared
    Colored { color: BubbleColor },
    /// A power bubble; never counts toward clearing the level
    Special { power: BubblePower },
}

/// Rows of cells, top row first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub cells: Vec<Vec<Option<LevelCell>>>,
    /// Projectiles for this level (engine default if absent)
    #[serde(default)]
    pub projectile_limit: Option<u32>,
}

impl LevelLayout {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let layout: Self = serde_json::from_str(json)?;
        log::info!("Loaded level with {} rows", layout.cells.len());
        Ok(layout)
    }

    /// Place every occupied cell at its slot center
    pub fn to_bubble_specs(&self, grid: &HexLayout) -> Vec<BubbleSpec> {
        let mut specs = Vec::new();
        for (row, cells) in self.cells.iter().enumerate() {
            let columns = grid.columns(row);
            for (col, cell) in cells.iter().enumerate() {
                let Some(cell) = cell else {
                    continue;
                };
                if col >= columns {
                    log::warn!("Level cell ({row}, {col}) is outside the {columns}-slot row, skipped");
                    continue;
                }
                let center = grid.slot_center(row, col);
                specs.push(match *cell {
                    LevelCell::Colored { color } => BubbleSpec::colored(center.x, center.y, color),
                    LevelCell::Special { power } => BubbleSpec::special(center.x, center.y, power),
                });
            }
        }
        specs
    }
}
