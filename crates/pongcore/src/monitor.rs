//! The entry point the transport and the channel allocator talk to.
//!
//! A [`Monitor`] owns the channel manager and starts the per-channel loops
//! whenever it creates a channel. It is an explicit value: build one at
//! startup and share it (usually in an `Arc`).

use std::sync::Arc;

use pongcore_arena::{
    ArenaError, ArenaSink, ChannelAssignment, ChannelKind, ChannelManager, GiveUpOutcome,
    PlayerSpecs,
};
use pongcore_physics::Direction;
use pongcore_protocol::{ArenaId, ArenaSnapshot, ChannelId, PaddleSnapshot, UserId};

use crate::scheduler::spawn_channel_loops;
use crate::{BotProvisioner, MonitorConfig, NoBots};

pub struct Monitor<B: BotProvisioner = NoBots> {
    config: MonitorConfig,
    manager: Arc<ChannelManager>,
    bots: B,
}

impl Monitor<NoBots> {
    /// A monitor that never provisions bots.
    pub fn new(config: MonitorConfig, sink: Arc<dyn ArenaSink>) -> Self {
        Self::with_bots(config, sink, NoBots)
    }
}

impl<B: BotProvisioner> Monitor<B> {
    pub fn with_bots(config: MonitorConfig, sink: Arc<dyn ArenaSink>, bots: B) -> Self {
        let manager = ChannelManager::new(config.manager_config(), sink);
        Self {
            config,
            manager: Arc::new(manager),
            bots,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Shared access to the channel manager, for inspection and tests.
    pub fn manager(&self) -> &Arc<ChannelManager> {
        &self.manager
    }

    // =====================================================================
    // Allocation
    // =====================================================================

    /// Returns the user's current seat, or creates a classic channel for
    /// them with the given specs.
    ///
    /// # Errors
    /// `Validation` for bad specs.
    pub async fn get_or_create_channel(
        &self,
        user_id: UserId,
        specs: &PlayerSpecs,
    ) -> Result<ChannelAssignment, ArenaError> {
        if let Some(seat) = self.current_seat(user_id).await {
            return Ok(seat);
        }
        self.create_channel(user_id, specs, ChannelKind::Classic).await
    }

    /// Finds an open tournament arena (first fit), or creates a new
    /// tournament channel seating the user. An open arena is only
    /// reported; the user takes the seat with [`Monitor::join`].
    ///
    /// # Errors
    /// `Validation` if the configured tournament specs are invalid.
    pub async fn join_tournament(&self, user_id: UserId) -> Result<ChannelAssignment, ArenaError> {
        if let Some(seat) = self.current_seat(user_id).await {
            return Ok(seat);
        }
        let open = self
            .manager
            .find_joinable(ChannelKind::Tournament, false)
            .await;
        match open {
            Some(found) => Ok(found),
            None => {
                let specs = self.config.tournament_specs;
                self.create_channel(user_id, &specs, ChannelKind::Tournament)
                    .await
            }
        }
    }

    /// Creates a channel, seats the requester, asks for the requested
    /// bots and starts the channel's loops.
    ///
    /// # Errors
    /// `AlreadyAssigned` if the user sits elsewhere, `Validation` for bad
    /// specs.
    pub async fn create_channel(
        &self,
        user_id: UserId,
        specs: &PlayerSpecs,
        kind: ChannelKind,
    ) -> Result<ChannelAssignment, ArenaError> {
        // The real display name arrives with the user's join frame.
        let seat = self
            .manager
            .create_channel(user_id, &user_id.to_string(), specs, kind)
            .await?;

        self.seat_bots(&seat.channel_id, seat.arena_id(), specs.options.bots())
            .await;

        let handles = self.manager.channel_handles(&seat.channel_id).await;
        spawn_channel_loops(
            seat.channel_id.clone(),
            handles,
            Arc::clone(&self.manager),
            &self.config,
        );

        Ok(self.current_seat(user_id).await.unwrap_or(seat))
    }

    /// Requests `count` bots and seats each one that arrives.
    async fn seat_bots(&self, channel_id: &ChannelId, arena_id: &ArenaId, count: usize) {
        for _ in 0..count {
            let bot = match self.bots.spawn_bot(channel_id, arena_id).await {
                Ok(bot) => bot,
                Err(e) => {
                    tracing::warn!(%channel_id, %arena_id, error = %e, "bot provisioning failed");
                    continue;
                }
            };
            let joined = self
                .manager
                .join(bot, channel_id, arena_id, &format!("bot-{}", bot.0))
                .await;
            match joined {
                Ok(_) => tracing::info!(%channel_id, %arena_id, user_id = %bot, "bot seated"),
                Err(e) => {
                    tracing::warn!(%channel_id, %arena_id, user_id = %bot, error = %e, "bot could not be seated");
                }
            }
        }
    }

    /// The user's seat with a fresh arena snapshot.
    async fn current_seat(&self, user_id: UserId) -> Option<ChannelAssignment> {
        let seat = self.manager.channel_of(user_id).await?;
        match self
            .manager
            .assign(user_id, &seat.channel_id, seat.arena_id())
            .await
        {
            Ok(fresh) => Some(fresh),
            Err(e) => {
                tracing::debug!(%user_id, error = %e, "stale seat dropped");
                self.manager.release(user_id).await;
                None
            }
        }
    }

    // =====================================================================
    // Player commands
    // =====================================================================

    /// # Errors
    /// See [`ChannelManager::join`].
    pub async fn join(
        &self,
        channel_id: &ChannelId,
        arena_id: &ArenaId,
        user_id: UserId,
        name: &str,
    ) -> Result<ArenaSnapshot, ArenaError> {
        self.manager.join(user_id, channel_id, arena_id, name).await
    }

    /// Also what a disconnect does.
    ///
    /// # Errors
    /// `NotFound(User)` if the user has no seat.
    pub async fn leave(&self, user_id: UserId) -> Result<ArenaSnapshot, ArenaError> {
        self.manager.leave_arena(user_id).await
    }

    /// The seat is released once the arena has the give-up, so repeating
    /// it afterwards fails with `NotFound(User)`. Only a give-up racing
    /// the first one sees [`GiveUpOutcome::AlreadyGivenUp`].
    ///
    /// # Errors
    /// `NotFound(User)` if the user has no seat.
    pub async fn give_up(&self, user_id: UserId) -> Result<GiveUpOutcome, ArenaError> {
        self.manager.give_up(user_id).await
    }

    /// # Errors
    /// `NotFound(User)` if the user has no seat, `InvalidState` unless the
    /// game is over.
    pub async fn rematch(&self, user_id: UserId) -> Result<Option<ArenaSnapshot>, ArenaError> {
        self.manager.rematch(user_id).await
    }

    /// # Errors
    /// `NotFound(User)` if the user has no seat, `NotJoined` if their
    /// paddle is no longer active.
    pub async fn move_paddle(
        &self,
        user_id: UserId,
        direction: Direction,
    ) -> Result<PaddleSnapshot, ArenaError> {
        self.manager.move_paddle(user_id, direction).await
    }
}
