//! Error types for the arena layer.

use std::fmt;

use pongcore_protocol::{ArenaId, ChannelId, ErrorCode, GameStatus, UserId};

/// What a [`ArenaError::NotFound`] was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Channel(ChannelId),
    Arena(ArenaId),
    /// The user has no entry in the assignment table.
    User(UserId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "channel {id}"),
            Self::Arena(id) => write!(f, "arena {id}"),
            Self::User(id) => write!(f, "seat for user {id}"),
        }
    }
}

/// Errors that can occur during arena and channel operations.
///
/// A failed operation never changes the arena it was aimed at.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArenaError {
    /// The request itself is malformed (bad specs, bad position).
    #[error("invalid request: {0}")]
    Validation(String),

    /// No free seat left.
    #[error("arena {0} is full")]
    Capacity(ArenaId),

    /// The user has no active seat here (never joined, gave up, or was
    /// evicted).
    #[error("user {0} has not joined this arena")]
    NotJoined(UserId),

    /// The user already holds a seat in this arena.
    #[error("user {0} already joined arena {1}")]
    AlreadyJoined(UserId, ArenaId),

    /// The user is seated in another arena.
    #[error("user {user} is already assigned to arena {arena}")]
    AlreadyAssigned { user: UserId, arena: ArenaId },

    #[error("{0} not found")]
    NotFound(Missing),

    /// The game is in a status that doesn't allow this operation.
    #[error("cannot {operation} while the game is {status}")]
    InvalidState {
        operation: &'static str,
        status: GameStatus,
    },

    /// The arena's command channel is full or closed.
    #[error("arena {0} is unavailable")]
    Unavailable(ArenaId),
}

impl ArenaError {
    /// The code reported to clients.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Malformed,
            Self::Capacity(_) => ErrorCode::ArenaFull,
            Self::NotJoined(_) => ErrorCode::NotJoined,
            Self::AlreadyJoined(..) => ErrorCode::AlreadyJoined,
            Self::AlreadyAssigned { .. } => ErrorCode::AlreadyAssigned,
            Self::NotFound(Missing::Channel(_)) => ErrorCode::InvalidChannel,
            Self::NotFound(Missing::Arena(_)) => ErrorCode::InvalidArena,
            Self::NotFound(Missing::User(_)) => ErrorCode::NotEntered,
            Self::InvalidState { .. } => ErrorCode::InvalidState,
            Self::Unavailable(_) => ErrorCode::Unavailable,
        }
    }
}
