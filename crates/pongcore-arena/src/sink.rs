//! Where arena output goes.
//!
//! An arena actor pushes every fresh snapshot and every game-over
//! countdown step into the [`ArenaSink`] it was spawned with. Delivery is
//! fire-and-forget: a failing sink is logged by the actor and never
//! affects the game.

use pongcore_protocol::{ArenaId, ArenaSnapshot, ChannelId};
use tokio::sync::mpsc;

use crate::GameOverNotice;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sink delivery failed: {0}")]
pub struct SinkError(pub String);

/// Receives arena output. Implemented by the transport layer.
///
/// Methods are synchronous and must not block: they run inside the arena
/// actor, between two commands.
pub trait ArenaSink: Send + Sync + 'static {
    /// Called after every state change (join, move, tick, rematch, ...).
    fn on_update(&self, channel: &ChannelId, snapshot: &ArenaSnapshot) -> Result<(), SinkError>;

    /// Called once per game-over countdown step, down to zero.
    fn on_game_over(
        &self,
        channel: &ChannelId,
        arena: &ArenaId,
        notice: &GameOverNotice,
    ) -> Result<(), SinkError>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ArenaSink for NoopSink {
    fn on_update(&self, _: &ChannelId, _: &ArenaSnapshot) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_game_over(&self, _: &ChannelId, _: &ArenaId, _: &GameOverNotice) -> Result<(), SinkError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChannelSink
// ---------------------------------------------------------------------------

/// Arena output as a value, as delivered by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Update {
        channel: ChannelId,
        snapshot: ArenaSnapshot,
    },
    GameOver {
        channel: ChannelId,
        arena: ArenaId,
        notice: GameOverNotice,
    },
}

/// Forwards arena output into an unbounded channel, for a transport task
/// (or a test) to consume.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SinkEvent) -> Result<(), SinkError> {
        self.tx
            .send(event)
            .map_err(|_| SinkError("receiver dropped".into()))
    }
}

impl ArenaSink for ChannelSink {
    fn on_update(&self, channel: &ChannelId, snapshot: &ArenaSnapshot) -> Result<(), SinkError> {
        self.forward(SinkEvent::Update {
            channel: channel.clone(),
            snapshot: snapshot.clone(),
        })
    }

    fn on_game_over(
        &self,
        channel: &ChannelId,
        arena: &ArenaId,
        notice: &GameOverNotice,
    ) -> Result<(), SinkError> {
        self.forward(SinkEvent::GameOver {
            channel: channel.clone(),
            arena: arena.clone(),
            notice: notice.clone(),
        })
    }
}
