//! Arena lifecycle and matchmaking for pongcore.
//!
//! Each arena runs as an isolated Tokio task (actor model) that owns its
//! game, ball, paddles and roster. Everything that mutates an arena
//! (player commands, physics ticks, lifecycle passes) is a command in the
//! arena's inbox, applied one at a time in arrival order.
//!
//! # Key types
//!
//! - [`Arena`]: the synchronous game rules for one match
//! - [`ArenaHandle`]: send commands to a running arena actor
//! - [`ArenaSink`]: where snapshots and game-over notices go
//! - [`ChannelManager`]: creates/reaps channels, routes users to arenas
//! - [`AssignmentTable`]: which user sits in which arena
//! - [`GameSettings`], [`PlayerSpecs`], [`ManagerConfig`]: configuration

mod actor;
mod arena;
mod assignment;
mod config;
mod error;
mod game;
mod manager;
mod player;
mod sink;

pub use actor::{ArenaHandle, spawn_arena};
pub use arena::{Arena, GAME_OVER_MESSAGE, GameOverNotice, GiveUpOutcome, SuperviseReport};
pub use assignment::{AssignmentTable, ChannelAssignment};
pub use config::{
    ArenaConfig, BallSpeed, ChannelKind, GameSettings, ManagerConfig, MatchOptions, PaddleSize,
    PlayerSpecs,
};
pub use error::{ArenaError, Missing};
pub use game::Game;
pub use manager::{ChannelManager, DeleteOutcome, random_id};
pub use player::Player;
pub use sink::{ArenaSink, ChannelSink, NoopSink, SinkError, SinkEvent};
