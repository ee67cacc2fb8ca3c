//! Client and server frames.
//!
//! Every frame is a JSON object with a `type` tag. Client frames carry
//! their arguments under `message`:
//!
//! ```json
//! {"type": "move_paddle", "message": {"direction": "up"}}
//! {"type": "give_up", "message": {}}
//! ```
//!
//! The set of client commands is closed: a frame whose `type` is not one
//! of the [`ClientMessage`] variants fails to decode and is answered with
//! an [`ServerMessage::Error`].

use serde::{Deserialize, Serialize};

use crate::{ArenaId, ArenaSnapshot, ChannelId, Direction, PaddleSnapshot, PlayerSnapshot, UserId};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// A command from a connected client. The sender's identity comes from
/// the connection, never from the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Take a seat in an arena the allocator handed out.
    Join {
        channel_id: ChannelId,
        arena_id: ArenaId,
        name: String,
    },
    /// Leave the current arena (a disconnect does the same).
    Leave {},
    GiveUp {},
    /// Ask for another round once the game is over.
    Rematch {},
    MovePaddle { direction: Direction },
}

impl ClientMessage {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave {} => "leave",
            Self::GiveUp {} => "give_up",
            Self::Rematch {} => "rematch",
            Self::MovePaddle { .. } => "move_paddle",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// The state change carried by a [`ServerMessage::GameUpdate`].
///
/// Externally tagged, so `Paddle(..)` becomes `{"paddle": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameUpdate {
    Arena(ArenaSnapshot),
    PlayerList(Vec<PlayerSnapshot>),
    Paddle(PaddleSnapshot),
}

/// Wire error codes. The first five keep the numbering clients already
/// know; see [`ErrorCode::as_u16`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotJoined,
    InvalidArena,
    InvalidChannel,
    NotEntered,
    GivenUp,
    AlreadyJoined,
    ArenaFull,
    AlreadyAssigned,
    InvalidState,
    Unavailable,
    Malformed,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::NotJoined => 1,
            Self::InvalidArena => 2,
            Self::InvalidChannel => 3,
            Self::NotEntered => 4,
            Self::GivenUp => 5,
            Self::AlreadyJoined => 6,
            Self::ArenaFull => 7,
            Self::AlreadyAssigned => 8,
            Self::InvalidState => 9,
            Self::Unavailable => 10,
            Self::Malformed => 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameUpdate { update: GameUpdate },
    /// Human-readable notice ("alice has joined the game.").
    GameMessage { message: String },
    /// Sent once per countdown step after a game ends.
    GameOver {
        winner: Option<UserId>,
        message: String,
        seconds: u64,
    },
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    pub fn update(update: GameUpdate) -> Self {
        Self::GameUpdate { update }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::GameMessage {
            message: message.into(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}
