//! Caller-facing failures
//!
//! Only session setup can fail. In-game validation (bad launch direction,
//! missing graph keys, degenerate geometry) is silent and never surfaces here.

/// Engine errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two initial bubbles share the exact same center.
    #[error("Duplicate bubble center at ({x}, {y})")]
    DuplicateCenter { x: f32, y: f32 },

    /// Config or layout JSON could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
