//! Wire protocol for pongcore.
//!
//! Everything that crosses the boundary between the game core and the
//! transport layer lives here:
//!
//! - **Identity and status types** ([`UserId`], [`ArenaId`],
//!   [`ChannelId`], [`GameStatus`], [`PlayerStatus`]).
//! - **Snapshots** ([`ArenaSnapshot`] and friends): immutable copies of
//!   arena state. They are the only arena data ever stored outside the
//!   arena or sent to clients.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): the JSON frames
//!   exchanged with connected clients.
//! - **Codec** ([`Codec`], [`JsonCodec`]) and [`ProtocolError`].
//!
//! The crate knows nothing about arenas as running things. It only
//! describes what they look like from the outside.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Monitor → Arena
//! Arena → ArenaSnapshot → Protocol (ServerMessage) → Transport (bytes)
//! ```

mod codec;
mod error;
mod message;
mod snapshot;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, ErrorCode, GameUpdate, ServerMessage};
pub use snapshot::{ArenaSnapshot, BallSnapshot, PaddleSnapshot, PlayerSnapshot};
pub use types::{ArenaId, ChannelId, GameStatus, PlayerStatus, UserId, Visibility};

/// Physics types that appear inside snapshots and messages.
pub use pongcore_physics::{Direction, Position, Side, Vector};
