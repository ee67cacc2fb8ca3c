//! Channel manager: creates channels of arenas, routes users to them and
//! reaps them once they are done.

use std::collections::HashMap;
use std::sync::Arc;

use pongcore_physics::Direction;
use pongcore_protocol::{ArenaId, ArenaSnapshot, ChannelId, PaddleSnapshot, UserId};
use rand::Rng;
use tokio::sync::Mutex;

use crate::{
    Arena, ArenaConfig, ArenaError, ArenaHandle, ArenaSink, AssignmentTable, ChannelAssignment,
    ChannelKind, GiveUpOutcome, ManagerConfig, Missing, PlayerSpecs, spawn_arena,
};

/// Length of generated channel and arena ids.
const ID_LENGTH: usize = 10;

/// A random alphanumeric id for a channel or arena.
pub fn random_id() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect()
}

/// A group of arenas created together.
struct Channel {
    kind: ChannelKind,
    /// In creation order.
    arenas: Vec<ArenaHandle>,
}

/// What [`ChannelManager::delete_arena`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Users whose assignment was removed.
    pub released: Vec<UserId>,
    /// The arena was the channel's last, so the channel went too.
    pub channel_deleted: bool,
}

/// Channels plus the assignment table: the state every channel shares.
#[derive(Default)]
struct Registry {
    channels: HashMap<ChannelId, Channel>,
    /// Channel ids in creation order, for first-fit matchmaking.
    order: Vec<ChannelId>,
    assignments: AssignmentTable,
}

impl Registry {
    fn arena_handle(
        &self,
        channel_id: &ChannelId,
        arena_id: &ArenaId,
    ) -> Result<ArenaHandle, ArenaError> {
        let channel = self
            .channels
            .get(channel_id)
            .ok_or_else(|| ArenaError::NotFound(Missing::Channel(channel_id.clone())))?;
        channel
            .arenas
            .iter()
            .find(|h| h.arena_id() == arena_id)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(Missing::Arena(arena_id.clone())))
    }

    fn handle_for(&self, user_id: UserId) -> Result<ArenaHandle, ArenaError> {
        let current = self
            .assignments
            .get(user_id)
            .ok_or(ArenaError::NotFound(Missing::User(user_id)))?;
        self.arena_handle(&current.channel_id, current.arena_id())
    }

    fn check_unassigned(&self, user_id: UserId) -> Result<(), ArenaError> {
        match self.assignments.get(user_id) {
            Some(current) => Err(ArenaError::AlreadyAssigned {
                user: user_id,
                arena: current.arena_id().clone(),
            }),
            None => Ok(()),
        }
    }

    fn remove_channel(&mut self, channel_id: &ChannelId) -> Option<Channel> {
        let channel = self.channels.remove(channel_id)?;
        self.order.retain(|id| id != channel_id);
        Some(channel)
    }
}

/// Owns every channel and the assignment table.
///
/// A user holds at most one seat at a time across all channels. The
/// manager is shared as is (usually in an `Arc`): its lock only covers
/// reads and writes of the registry and is never held while an arena
/// answers, so a slow arena holds up its own users and nobody else.
/// Writes that follow an arena's reply check the registry again first.
pub struct ChannelManager {
    config: ManagerConfig,
    sink: Arc<dyn ArenaSink>,
    registry: Mutex<Registry>,
}

impl ChannelManager {
    pub fn new(config: ManagerConfig, sink: Arc<dyn ArenaSink>) -> Self {
        Self {
            config,
            sink,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// A copy of the assignment table as it stands.
    pub async fn assignments(&self) -> AssignmentTable {
        self.registry.lock().await.assignments.clone()
    }

    // =====================================================================
    // Channels
    // =====================================================================

    /// Creates a channel (one arena, or the configured number for a
    /// tournament) and seats the requester in its first arena.
    ///
    /// # Errors
    /// `AlreadyAssigned` if the requester sits elsewhere, `Validation`
    /// for bad specs.
    pub async fn create_channel(
        &self,
        user_id: UserId,
        name: &str,
        specs: &PlayerSpecs,
        kind: ChannelKind,
    ) -> Result<ChannelAssignment, ArenaError> {
        self.registry.lock().await.check_unassigned(user_id)?;
        let arena_config = ArenaConfig::from_specs(&self.config, specs)?;
        let count = match kind {
            ChannelKind::Classic => 1,
            ChannelKind::Tournament => self.config.tournament_arenas.max(1),
        };

        let channel_id = ChannelId::new(random_id());
        let arenas: Vec<ArenaHandle> = (0..count)
            .map(|_| self.spawn(&channel_id, &arena_config))
            .collect();
        let first = arenas[0].clone();

        let entered = first.enter(user_id, name).await;
        let mut registry = self.registry.lock().await;
        // Another request may have seated the user while the arena answered.
        let checked = entered
            .and_then(|snapshot| registry.check_unassigned(user_id).map(|()| snapshot));
        let snapshot = match checked {
            Ok(snapshot) => snapshot,
            Err(e) => {
                drop(registry);
                shutdown_all(&arenas).await;
                return Err(e);
            }
        };

        tracing::info!(
            %channel_id,
            ?kind,
            arenas = arenas.len(),
            %user_id,
            "channel created"
        );
        registry
            .channels
            .insert(channel_id.clone(), Channel { kind, arenas });
        registry.order.push(channel_id.clone());
        registry
            .assignments
            .assign(user_id, channel_id, snapshot)
            .cloned()
    }

    fn spawn(&self, channel_id: &ChannelId, config: &ArenaConfig) -> ArenaHandle {
        let arena = Arena::new(ArenaId::new(random_id()), channel_id.clone(), config.clone());
        tracing::debug!(%channel_id, arena_id = %arena.id(), "arena created");
        spawn_arena(arena, Arc::clone(&self.sink), self.config.inbox_size)
    }

    /// First-fit scan, in channel creation order, for an arena of `kind`
    /// that is still joinable and has a free seat. Private arenas are
    /// skipped unless `include_private` is set.
    ///
    /// Arenas that fail to answer (shutting down) are skipped.
    pub async fn find_joinable(
        &self,
        kind: ChannelKind,
        include_private: bool,
    ) -> Option<ChannelAssignment> {
        let candidates: Vec<(ChannelId, Vec<ArenaHandle>)> = {
            let registry = self.registry.lock().await;
            registry
                .order
                .iter()
                .filter_map(|id| {
                    let channel = registry.channels.get(id)?;
                    (channel.kind == kind).then(|| (id.clone(), channel.arenas.clone()))
                })
                .collect()
        };

        for (channel_id, arenas) in candidates {
            for handle in arenas {
                let Ok(snapshot) = handle.snapshot().await else {
                    continue;
                };
                let open = if include_private {
                    snapshot.status.is_joinable() && !snapshot.is_full()
                } else {
                    snapshot.accepts_strangers()
                };
                if open {
                    return Some(ChannelAssignment {
                        channel_id,
                        arena: snapshot,
                    });
                }
            }
        }
        None
    }

    /// Deletes a whole channel: every arena is shut down and everyone
    /// seated in it released. Unknown channels are a no-op.
    pub async fn delete_channel(&self, channel_id: &ChannelId) -> Vec<UserId> {
        let (channel, released) = {
            let mut registry = self.registry.lock().await;
            let Some(channel) = registry.remove_channel(channel_id) else {
                return Vec::new();
            };
            let mut released = Vec::new();
            for handle in &channel.arenas {
                released.extend(registry.assignments.release_arena(handle.arena_id()));
            }
            (channel, released)
        };

        shutdown_all(&channel.arenas).await;
        tracing::info!(%channel_id, released = released.len(), "channel deleted");
        released
    }

    /// Shuts down one arena and releases its users. Deleting a channel's
    /// last arena deletes the channel. Unknown arenas are a no-op.
    pub async fn delete_arena(&self, channel_id: &ChannelId, arena_id: &ArenaId) -> DeleteOutcome {
        let (handle, outcome) = {
            let mut guard = self.registry.lock().await;
            let registry = &mut *guard;
            let Some(channel) = registry.channels.get_mut(channel_id) else {
                return DeleteOutcome::default();
            };
            let Some(index) = channel.arenas.iter().position(|h| h.arena_id() == arena_id) else {
                return DeleteOutcome::default();
            };
            let handle = channel.arenas.remove(index);
            let channel_deleted = channel.arenas.is_empty();
            if channel_deleted {
                registry.remove_channel(channel_id);
            }
            let released = registry.assignments.release_arena(arena_id);
            (
                handle,
                DeleteOutcome {
                    released,
                    channel_deleted,
                },
            )
        };

        let _ = handle.shutdown().await;
        tracing::info!(
            %channel_id,
            %arena_id,
            released = outcome.released.len(),
            "arena deleted"
        );
        if outcome.channel_deleted {
            tracing::info!(%channel_id, "channel deleted");
        }
        outcome
    }

    // =====================================================================
    // Assignments
    // =====================================================================

    /// Records the user as seated in the given arena, using the arena's
    /// current snapshot.
    ///
    /// # Errors
    /// `AlreadyAssigned` if the user is recorded under another arena,
    /// `NotFound` for unknown ids.
    pub async fn assign(
        &self,
        user_id: UserId,
        channel_id: &ChannelId,
        arena_id: &ArenaId,
    ) -> Result<ChannelAssignment, ArenaError> {
        let handle = self.arena_handle(channel_id, arena_id).await?;
        let snapshot = handle.snapshot().await?;

        let mut registry = self.registry.lock().await;
        // The arena may have been reaped while it answered.
        registry.arena_handle(channel_id, arena_id)?;
        registry
            .assignments
            .assign(user_id, channel_id.clone(), snapshot)
            .cloned()
    }

    /// Forgets the user's seat. The arena itself is left alone.
    pub async fn release(&self, user_id: UserId) -> Option<ChannelAssignment> {
        self.registry.lock().await.assignments.release(user_id)
    }

    pub async fn channel_of(&self, user_id: UserId) -> Option<ChannelAssignment> {
        self.registry.lock().await.assignments.get(user_id).cloned()
    }

    /// Updates the stored snapshot for everyone in that arena.
    pub async fn refresh(&self, snapshot: &ArenaSnapshot) {
        self.registry.lock().await.assignments.refresh(snapshot);
    }

    /// Brings the assignment table in line with an arena's roster: users
    /// recorded under it who lost their seat or gave up are released.
    /// Players evicted for inactivity keep theirs until a rematch or the
    /// arena's end. Returns who was released.
    pub async fn sync_arena(&self, snapshot: &ArenaSnapshot) -> Vec<UserId> {
        self.registry.lock().await.assignments.sync_roster(snapshot)
    }

    // =====================================================================
    // Player commands
    // =====================================================================

    /// Seats the user in the given arena. A user already seated there is
    /// reconnected instead.
    ///
    /// # Errors
    /// `AlreadyAssigned` if the user sits in another arena, `NotFound`
    /// for unknown ids, plus whatever the arena rejects the entry with.
    pub async fn join(
        &self,
        user_id: UserId,
        channel_id: &ChannelId,
        arena_id: &ArenaId,
        name: &str,
    ) -> Result<ArenaSnapshot, ArenaError> {
        let (handle, current) = {
            let registry = self.registry.lock().await;
            let handle = registry.arena_handle(channel_id, arena_id)?;
            (handle, registry.assignments.get(user_id).cloned())
        };

        if let Some(current) = current {
            if current.arena_id() != arena_id {
                return Err(ArenaError::AlreadyAssigned {
                    user: user_id,
                    arena: current.arena_id().clone(),
                });
            }
            match handle.reconnect(user_id, name).await {
                Ok(snapshot) => {
                    self.refresh(&snapshot).await;
                    return Ok(snapshot);
                }
                // Stale entry: the seat is gone, take a new one.
                Err(ArenaError::NotJoined(_)) => {
                    self.registry
                        .lock()
                        .await
                        .assignments
                        .release_from(user_id, arena_id);
                }
                Err(e) => return Err(e),
            }
        }

        let snapshot = handle.enter(user_id, name).await?;
        let recorded = {
            let mut registry = self.registry.lock().await;
            registry.arena_handle(channel_id, arena_id).and_then(|_| {
                registry
                    .assignments
                    .assign(user_id, channel_id.clone(), snapshot.clone())?;
                registry.assignments.refresh(&snapshot);
                Ok(())
            })
        };
        if let Err(e) = recorded {
            // Seated elsewhere meanwhile: give the seat back.
            if let Err(leave_err) = handle.leave(user_id).await {
                tracing::debug!(%user_id, %arena_id, error = %leave_err, "join rollback failed");
            }
            return Err(e);
        }
        Ok(snapshot)
    }

    /// The user leaves their arena: frees the seat before the start,
    /// counts as giving up afterwards. The user is released either way.
    ///
    /// # Errors
    /// `NotFound(User)` if the user has no seat.
    pub async fn leave_arena(&self, user_id: UserId) -> Result<ArenaSnapshot, ArenaError> {
        let handle = {
            let mut registry = self.registry.lock().await;
            let handle = registry.handle_for(user_id);
            // Released up front; a dangling entry whose arena is gone goes too.
            registry.assignments.release(user_id);
            handle?
        };
        let snapshot = handle.leave(user_id).await?;
        self.refresh(&snapshot).await;
        Ok(snapshot)
    }

    /// Two give-ups racing from the same user both reach the arena; the
    /// second one comes back as [`GiveUpOutcome::AlreadyGivenUp`]. Once
    /// the first has returned the user is released, so a later one fails
    /// with `NotFound(User)`.
    ///
    /// # Errors
    /// `NotFound(User)` if the user has no seat.
    pub async fn give_up(&self, user_id: UserId) -> Result<GiveUpOutcome, ArenaError> {
        let handle = self.handle_for(user_id).await?;
        let outcome = handle.give_up(user_id).await?;

        let mut registry = self.registry.lock().await;
        registry
            .assignments
            .release_from(user_id, handle.arena_id());
        if let GiveUpOutcome::GaveUp(snapshot) = &outcome {
            registry.assignments.refresh(snapshot);
        }
        Ok(outcome)
    }

    /// # Errors
    /// `NotFound(User)` if the user has no seat, plus whatever the arena
    /// rejects the request with.
    pub async fn rematch(&self, user_id: UserId) -> Result<Option<ArenaSnapshot>, ArenaError> {
        let handle = self.handle_for(user_id).await?;
        let result = handle.rematch(user_id).await?;
        if let Some(snapshot) = &result {
            self.refresh(snapshot).await;
        }
        Ok(result)
    }

    /// # Errors
    /// `NotFound(User)` if the user has no seat.
    pub async fn move_paddle(
        &self,
        user_id: UserId,
        direction: Direction,
    ) -> Result<PaddleSnapshot, ArenaError> {
        self.handle_for(user_id)
            .await?
            .move_paddle(user_id, direction)
            .await
    }

    // =====================================================================
    // Lookups
    // =====================================================================

    /// # Errors
    /// `NotFound` naming whichever id is unknown.
    pub async fn arena_handle(
        &self,
        channel_id: &ChannelId,
        arena_id: &ArenaId,
    ) -> Result<ArenaHandle, ArenaError> {
        self.registry.lock().await.arena_handle(channel_id, arena_id)
    }

    /// Handle to the arena the user is recorded in.
    ///
    /// # Errors
    /// `NotFound(User)` without a seat, `NotFound` naming the id if the
    /// arena is gone.
    pub async fn handle_for(&self, user_id: UserId) -> Result<ArenaHandle, ArenaError> {
        self.registry.lock().await.handle_for(user_id)
    }

    /// Handles to every arena of the channel; empty once it is deleted.
    pub async fn channel_handles(&self, channel_id: &ChannelId) -> Vec<ArenaHandle> {
        self.registry
            .lock()
            .await
            .channels
            .get(channel_id)
            .map(|c| c.arenas.clone())
            .unwrap_or_default()
    }

    pub async fn channel_kind(&self, channel_id: &ChannelId) -> Option<ChannelKind> {
        self.registry
            .lock()
            .await
            .channels
            .get(channel_id)
            .map(|c| c.kind)
    }

    pub async fn channel_count(&self) -> usize {
        self.registry.lock().await.channels.len()
    }

    /// In creation order.
    pub async fn channel_ids(&self) -> Vec<ChannelId> {
        self.registry.lock().await.order.clone()
    }
}

async fn shutdown_all(arenas: &[ArenaHandle]) {
    for handle in arenas {
        let _ = handle.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use pongcore_protocol::{GameStatus, Visibility};

    use super::*;
    use crate::NoopSink;

    fn manager() -> ChannelManager {
        ChannelManager::new(ManagerConfig::default(), Arc::new(NoopSink))
    }

    #[test]
    fn test_random_id_is_alphanumeric() {
        let id = random_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_id(), id);
    }

    #[tokio::test]
    async fn test_create_channel_seats_requester() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "alice", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();
        assert_eq!(seat.arena.status, GameStatus::Waiting);
        assert!(seat.arena.contains(UserId(1)));
        assert_eq!(mgr.channel_of(UserId(1)).await, Some(seat.clone()));
        assert_eq!(mgr.channel_handles(&seat.channel_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_tournament_channel_spawns_configured_arenas() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "alice", &PlayerSpecs::default(), ChannelKind::Tournament)
            .await
            .unwrap();
        assert_eq!(mgr.channel_handles(&seat.channel_id).await.len(), 4);
        assert_eq!(
            mgr.channel_kind(&seat.channel_id).await,
            Some(ChannelKind::Tournament)
        );
    }

    #[tokio::test]
    async fn test_create_channel_rejects_bad_specs() {
        let mgr = manager();
        let specs = PlayerSpecs {
            nb_players: 9,
            ..PlayerSpecs::default()
        };
        let err = mgr
            .create_channel(UserId(1), "alice", &specs, ChannelKind::Classic)
            .await
            .unwrap_err();
        assert!(matches!(err, ArenaError::Validation(_)));
        assert_eq!(mgr.channel_count().await, 0);
        assert!(mgr.channel_of(UserId(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_create_channel_racing_for_same_user_keeps_one() {
        let mgr = manager();
        let specs = PlayerSpecs::default();
        let (first, second) = tokio::join!(
            mgr.create_channel(UserId(1), "alice", &specs, ChannelKind::Classic),
            mgr.create_channel(UserId(1), "alice", &specs, ChannelKind::Classic),
        );
        assert!(first.is_ok() != second.is_ok());
        assert_eq!(mgr.channel_count().await, 1);
        assert_eq!(mgr.assignments().await.len(), 1);
    }

    #[tokio::test]
    async fn test_find_joinable_is_first_fit_and_skips_private() {
        let mgr = manager();
        let private = PlayerSpecs {
            visibility: Visibility::Private,
            ..PlayerSpecs::default()
        };
        mgr.create_channel(UserId(1), "a", &private, ChannelKind::Classic)
            .await
            .unwrap();
        let public = mgr
            .create_channel(UserId(2), "b", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();
        mgr.create_channel(UserId(3), "c", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();

        let found = mgr.find_joinable(ChannelKind::Classic, false).await.unwrap();
        assert_eq!(found.channel_id, public.channel_id);
        assert!(mgr.find_joinable(ChannelKind::Tournament, false).await.is_none());
        assert!(mgr.find_joinable(ChannelKind::Classic, true).await.is_some());
    }

    #[tokio::test]
    async fn test_join_rejects_user_seated_elsewhere() {
        let mgr = manager();
        let first = mgr
            .create_channel(UserId(1), "a", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();
        let second = mgr
            .create_channel(UserId(2), "b", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();

        let err = mgr
            .join(UserId(1), &second.channel_id, second.arena_id(), "a")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ArenaError::AlreadyAssigned {
                user: UserId(1),
                arena: first.arena_id().clone()
            }
        );
    }

    #[tokio::test]
    async fn test_join_racing_into_two_arenas_rolls_back_one_seat() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "a", &PlayerSpecs::default(), ChannelKind::Tournament)
            .await
            .unwrap();
        let handles = mgr.channel_handles(&seat.channel_id).await;
        let (left, right) = (handles[1].arena_id().clone(), handles[2].arena_id().clone());

        let (first, second) = tokio::join!(
            mgr.join(UserId(2), &seat.channel_id, &left, "b"),
            mgr.join(UserId(2), &seat.channel_id, &right, "b"),
        );
        assert!(first.is_ok() != second.is_ok());
        assert!(matches!(
            first.as_ref().err().or(second.as_ref().err()),
            Some(ArenaError::AlreadyAssigned { .. })
        ));

        // The losing arena gave the seat back.
        let mut seated = 0;
        for handle in &handles[1..3] {
            if handle.snapshot().await.unwrap().contains(UserId(2)) {
                seated += 1;
            }
        }
        assert_eq!(seated, 1);
    }

    #[tokio::test]
    async fn test_join_same_arena_reconnects() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "U-1", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();
        let snap = mgr
            .join(UserId(1), &seat.channel_id, seat.arena_id(), "alice")
            .await
            .unwrap();
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.player(UserId(1)).map(|p| p.name.as_str()), Some("alice"));
    }

    #[tokio::test]
    async fn test_join_unknown_ids() {
        let mgr = manager();
        let err = mgr
            .join(UserId(1), &ChannelId::new("nope"), &ArenaId::new("nope"), "a")
            .await
            .unwrap_err();
        assert_eq!(err, ArenaError::NotFound(Missing::Channel(ChannelId::new("nope"))));
    }

    #[tokio::test]
    async fn test_leave_arena_releases_user() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "a", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();
        let snap = mgr.leave_arena(UserId(1)).await.unwrap();
        assert!(snap.players.is_empty());
        assert!(mgr.channel_of(UserId(1)).await.is_none());
        assert_eq!(
            mgr.leave_arena(UserId(1)).await,
            Err(ArenaError::NotFound(Missing::User(UserId(1))))
        );
        // The arena stays until a lifecycle pass reaps it.
        assert_eq!(mgr.channel_handles(&seat.channel_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_give_up_racing_twice_reports_already_given_up() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "a", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();
        mgr.join(UserId(2), &seat.channel_id, seat.arena_id(), "b")
            .await
            .unwrap();

        let (first, second) = tokio::join!(mgr.give_up(UserId(1)), mgr.give_up(UserId(1)));
        assert!(matches!(first, Ok(GiveUpOutcome::GaveUp(_))));
        assert_eq!(second, Ok(GiveUpOutcome::AlreadyGivenUp));
        assert!(mgr.channel_of(UserId(1)).await.is_none());
        assert_eq!(
            mgr.give_up(UserId(1)).await,
            Err(ArenaError::NotFound(Missing::User(UserId(1))))
        );
    }

    #[tokio::test]
    async fn test_delete_last_arena_deletes_channel() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "a", &PlayerSpecs::default(), ChannelKind::Classic)
            .await
            .unwrap();
        let outcome = mgr.delete_arena(&seat.channel_id, seat.arena_id()).await;
        assert_eq!(outcome.released, vec![UserId(1)]);
        assert!(outcome.channel_deleted);
        assert_eq!(mgr.channel_count().await, 0);

        let again = mgr.delete_arena(&seat.channel_id, seat.arena_id()).await;
        assert_eq!(again, DeleteOutcome::default());
    }

    #[tokio::test]
    async fn test_delete_channel_releases_everyone() {
        let mgr = manager();
        let seat = mgr
            .create_channel(UserId(1), "a", &PlayerSpecs::default(), ChannelKind::Tournament)
            .await
            .unwrap();
        let other = mgr.channel_handles(&seat.channel_id).await[1]
            .arena_id()
            .clone();
        mgr.join(UserId(2), &seat.channel_id, &other, "b").await.unwrap();

        let mut released = mgr.delete_channel(&seat.channel_id).await;
        released.sort();
        assert_eq!(released, vec![UserId(1), UserId(2)]);
        assert!(mgr.assignments().await.is_empty());
        assert!(mgr.channel_ids().await.is_empty());
    }
}
