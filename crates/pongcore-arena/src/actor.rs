//! Arena actor: an isolated Tokio task that owns one [`Arena`].
//!
//! Player commands, physics ticks and lifecycle passes all arrive through
//! the same bounded inbox and are applied one at a time, so no two of them
//! ever interleave on the same arena.

use std::sync::Arc;

use pongcore_physics::Direction;
use pongcore_protocol::{ArenaId, ArenaSnapshot, ChannelId, PaddleSnapshot, UserId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::{Arena, ArenaError, ArenaSink, GiveUpOutcome, SuperviseReport};

type Reply<T> = oneshot::Sender<Result<T, ArenaError>>;

/// Commands sent to an arena actor through its inbox.
pub(crate) enum ArenaCommand {
    Enter {
        user_id: UserId,
        name: String,
        reply: Reply<ArenaSnapshot>,
    },
    Reconnect {
        user_id: UserId,
        name: String,
        reply: Reply<ArenaSnapshot>,
    },
    MovePaddle {
        user_id: UserId,
        direction: Direction,
        reply: Reply<PaddleSnapshot>,
    },
    GiveUp {
        user_id: UserId,
        reply: Reply<GiveUpOutcome>,
    },
    Leave {
        user_id: UserId,
        reply: Reply<ArenaSnapshot>,
    },
    Rematch {
        user_id: UserId,
        reply: Reply<Option<ArenaSnapshot>>,
    },
    Snapshot {
        reply: Reply<ArenaSnapshot>,
    },
    /// One physics step (fire-and-forget).
    Tick,
    /// One lifecycle pass.
    Supervise {
        reply: Reply<SuperviseReport>,
    },
    CloseUnused {
        reply: Reply<bool>,
    },
    Shutdown,
}

/// Handle to a running arena actor.
///
/// Cheap to clone: the channel manager keeps one per arena and the
/// scheduler loops keep their own copies.
#[derive(Debug, Clone)]
pub struct ArenaHandle {
    arena_id: ArenaId,
    channel_id: ChannelId,
    sender: mpsc::Sender<ArenaCommand>,
}

impl ArenaHandle {
    pub fn arena_id(&self) -> &ArenaId {
        &self.arena_id
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> ArenaCommand,
    ) -> Result<T, ArenaError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    fn unavailable(&self) -> ArenaError {
        ArenaError::Unavailable(self.arena_id.clone())
    }

    /// Seats a user. The game starts right away if this fills the roster.
    pub async fn enter(&self, user_id: UserId, name: &str) -> Result<ArenaSnapshot, ArenaError> {
        let name = name.to_owned();
        self.request(|reply| ArenaCommand::Enter {
            user_id,
            name,
            reply,
        })
        .await
    }

    pub async fn reconnect(&self, user_id: UserId, name: &str) -> Result<ArenaSnapshot, ArenaError> {
        let name = name.to_owned();
        self.request(|reply| ArenaCommand::Reconnect {
            user_id,
            name,
            reply,
        })
        .await
    }

    pub async fn move_paddle(
        &self,
        user_id: UserId,
        direction: Direction,
    ) -> Result<PaddleSnapshot, ArenaError> {
        self.request(|reply| ArenaCommand::MovePaddle {
            user_id,
            direction,
            reply,
        })
        .await
    }

    pub async fn give_up(&self, user_id: UserId) -> Result<GiveUpOutcome, ArenaError> {
        self.request(|reply| ArenaCommand::GiveUp { user_id, reply })
            .await
    }

    pub async fn leave(&self, user_id: UserId) -> Result<ArenaSnapshot, ArenaError> {
        self.request(|reply| ArenaCommand::Leave { user_id, reply })
            .await
    }

    pub async fn rematch(&self, user_id: UserId) -> Result<Option<ArenaSnapshot>, ArenaError> {
        self.request(|reply| ArenaCommand::Rematch { user_id, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<ArenaSnapshot, ArenaError> {
        self.request(|reply| ArenaCommand::Snapshot { reply }).await
    }

    pub async fn supervise(&self) -> Result<SuperviseReport, ArenaError> {
        self.request(|reply| ArenaCommand::Supervise { reply })
            .await
    }

    /// Moves a never-joined arena to `Dead`. Returns whether it did.
    pub async fn close_unused(&self) -> Result<bool, ArenaError> {
        self.request(|reply| ArenaCommand::CloseUnused { reply })
            .await
    }

    /// Queues a physics step without waiting. Returns `false` when the
    /// inbox is full and the step was dropped.
    ///
    /// # Errors
    /// `Unavailable` once the actor has stopped.
    pub fn tick(&self) -> Result<bool, ArenaError> {
        match self.sender.try_send(ArenaCommand::Tick) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Closed(_)) => Err(self.unavailable()),
        }
    }

    /// Tells the actor to stop. Commands still queued are discarded.
    pub async fn shutdown(&self) -> Result<(), ArenaError> {
        self.sender
            .send(ArenaCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The actor state. Runs inside a Tokio task.
struct ArenaActor {
    arena: Arena,
    sink: Arc<dyn ArenaSink>,
    receiver: mpsc::Receiver<ArenaCommand>,
}

impl ArenaActor {
    async fn run(mut self) {
        let arena_id = self.arena.id().clone();
        tracing::info!(%arena_id, "arena actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ArenaCommand::Enter {
                    user_id,
                    name,
                    reply,
                } => {
                    let result = self.handle_enter(user_id, &name);
                    let _ = reply.send(result);
                }
                ArenaCommand::Reconnect {
                    user_id,
                    name,
                    reply,
                } => {
                    let result = self.arena.reconnect(user_id, &name);
                    self.publish_ok(&result);
                    let _ = reply.send(result);
                }
                ArenaCommand::MovePaddle {
                    user_id,
                    direction,
                    reply,
                } => {
                    let result = self.arena.move_paddle(user_id, direction);
                    if result.is_ok() {
                        self.publish(&self.arena.snapshot());
                    }
                    let _ = reply.send(result);
                }
                ArenaCommand::GiveUp { user_id, reply } => {
                    let result = self.arena.give_up(user_id);
                    if let Ok(GiveUpOutcome::GaveUp(snapshot)) = &result {
                        self.publish(snapshot);
                    }
                    let _ = reply.send(result);
                }
                ArenaCommand::Leave { user_id, reply } => {
                    let result = self.arena.player_leave(user_id);
                    self.publish_ok(&result);
                    let _ = reply.send(result);
                }
                ArenaCommand::Rematch { user_id, reply } => {
                    let result = self.arena.rematch(user_id);
                    match &result {
                        Ok(Some(snapshot)) => self.publish(snapshot),
                        Ok(None) => self.publish(&self.arena.snapshot()),
                        Err(_) => {}
                    }
                    let _ = reply.send(result);
                }
                ArenaCommand::Snapshot { reply } => {
                    let _ = reply.send(Ok(self.arena.snapshot()));
                }
                ArenaCommand::Tick => self.handle_tick(),
                ArenaCommand::Supervise { reply } => {
                    let result = self.handle_supervise();
                    let _ = reply.send(result);
                }
                ArenaCommand::CloseUnused { reply } => {
                    let _ = reply.send(self.arena.close_unused());
                }
                ArenaCommand::Shutdown => {
                    self.receiver.close();
                    let mut discarded = 0usize;
                    while self.receiver.try_recv().is_ok() {
                        discarded += 1;
                    }
                    tracing::info!(%arena_id, discarded, "arena shutting down");
                    break;
                }
            }
        }

        tracing::info!(%arena_id, "arena actor stopped");
    }

    fn handle_enter(&mut self, user_id: UserId, name: &str) -> Result<ArenaSnapshot, ArenaError> {
        let mut snapshot = self.arena.enter(user_id, name)?;
        if self.arena.try_start()? {
            snapshot = self.arena.snapshot();
        }
        self.publish(&snapshot);
        Ok(snapshot)
    }

    fn handle_tick(&mut self) {
        match self.arena.tick() {
            Ok(Some(snapshot)) => self.publish(&snapshot),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(arena_id = %self.arena.id(), error = %e, "tick failed");
            }
        }
    }

    fn handle_supervise(&mut self) -> Result<SuperviseReport, ArenaError> {
        let report = self.arena.supervise()?;
        if let Some(notice) = &report.game_over {
            if let Err(e) = self
                .sink
                .on_game_over(self.arena.channel_id(), self.arena.id(), notice)
            {
                tracing::warn!(arena_id = %self.arena.id(), error = %e, "game over delivery failed");
            }
        }
        if report.changed {
            self.publish(&self.arena.snapshot());
        }
        Ok(report)
    }

    fn publish_ok(&self, result: &Result<ArenaSnapshot, ArenaError>) {
        if let Ok(snapshot) = result {
            self.publish(snapshot);
        }
    }

    /// Hands a snapshot to the sink. Failures are logged and dropped.
    fn publish(&self, snapshot: &ArenaSnapshot) {
        if let Err(e) = self.sink.on_update(self.arena.channel_id(), snapshot) {
            tracing::warn!(arena_id = %self.arena.id(), error = %e, "update delivery failed");
        }
    }
}

/// Spawns an arena actor task and returns a handle to it.
///
/// `inbox_size` bounds the command queue: senders wait when it is full,
/// except [`ArenaHandle::tick`] which drops the step instead.
pub fn spawn_arena(arena: Arena, sink: Arc<dyn ArenaSink>, inbox_size: usize) -> ArenaHandle {
    let (tx, rx) = mpsc::channel(inbox_size.max(1));
    let handle = ArenaHandle {
        arena_id: arena.id().clone(),
        channel_id: arena.channel_id().clone(),
        sender: tx,
    };

    let actor = ArenaActor {
        arena,
        sink,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    handle
}
