//! # pongcore
//!
//! Session orchestration and physics core for real-time multi-arena Pong.
//!
//! A [`Monitor`] allocates channels (one arena for classic play, several
//! for a tournament), seats users, forwards their commands to the arena
//! actors and runs two loops per channel: a physics tick loop and a
//! lifecycle loop that supervises and reaps arenas. Snapshots and
//! game-over notices leave through the [`ArenaSink`](pongcore_arena::ArenaSink)
//! the monitor was built with; the transport turns them into frames with
//! [`outbound`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pongcore::prelude::*;
//!
//! # async fn run() -> Result<(), PongError> {
//! let (sink, mut events) = ChannelSink::new();
//! let monitor = Monitor::new(MonitorConfig::default(), Arc::new(sink));
//!
//! let seat = monitor
//!     .get_or_create_channel(UserId(1), &PlayerSpecs::default())
//!     .await?;
//! monitor
//!     .join(&seat.channel_id, seat.arena_id(), UserId(2), "bob")
//!     .await?;
//!
//! while let Some(event) = events.recv().await {
//!     let _frame = JsonCodec.encode(&outbound(&event))?;
//! }
//! # Ok(())
//! # }
//! ```

mod bots;
mod config;
mod error;
mod handler;
mod monitor;
pub mod scheduler;

pub use bots::{BotProvisioner, NoBots, ProvisionError};
#[cfg(feature = "http-bots")]
pub use bots::HttpBotProvisioner;
pub use config::MonitorConfig;
pub use error::PongError;
pub use handler::{dispatch, outbound};
pub use monitor::Monitor;
pub use scheduler::{ChannelLoops, spawn_channel_loops, supervise_channel};

/// Installs a `tracing` subscriber that reads `RUST_LOG` and falls back to
/// `info`. Does nothing if a subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::{
        BotProvisioner, Monitor, MonitorConfig, NoBots, PongError, dispatch, outbound,
    };
    pub use pongcore_arena::{
        ArenaSink, ChannelAssignment, ChannelKind, ChannelSink, GameSettings, MatchOptions,
        PlayerSpecs, SinkEvent,
    };
    pub use pongcore_protocol::{
        ArenaId, ArenaSnapshot, ChannelId, ClientMessage, Codec, Direction, GameStatus,
        JsonCodec, ServerMessage, UserId,
    };
}
