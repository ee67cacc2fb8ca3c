//! Unified error type for pongcore.

use pongcore_arena::ArenaError;
use pongcore_physics::PhysicsError;
use pongcore_protocol::ProtocolError;

use crate::ProvisionError;

/// Top-level error wrapping every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum PongError {
    /// Encoding or decoding a frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An arena or channel operation was refused.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error(transparent)]
    Physics(#[from] PhysicsError),

    /// The bot service failed.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("invalid configuration: {0}")]
    Config(serde_json::Error),
}
