//! Error types for the simulation core.

use thiserror::Error;

/// Result type alias using [`WorldError`].
pub type Result<T> = std::result::Result<T, WorldError>;

/// Top-level error type for world-state operations.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Agent id outside the world's index range.
    #[error("Invalid agent ID: {0}")]
    InvalidAgent(usize),

    /// A position that is not aligned to the world grid.
    #[error("Position ({x}, {y}) is not aligned to grid step {grid_size}")]
    OffGrid {
        /// X coordinate of the offending position.
        x: f32,
        /// Y coordinate of the offending position.
        y: f32,
        /// The world's grid step.
        grid_size: f32,
    },
}
