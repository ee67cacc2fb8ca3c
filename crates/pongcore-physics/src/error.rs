//! Error types for the physics layer.

/// Errors raised when an entity would be placed somewhere it can't be.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    /// The position puts the entity (partly) outside the field.
    #[error("position ({x}, {y}) is out of bounds")]
    OutOfBounds { x: f64, y: f64 },

    /// Paddle or ball dimensions don't fit the field.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}
