//! Which user sits in which arena.
//!
//! A user appears in at most one entry. Entries carry a copy of the arena
//! snapshot taken at the last write, which is what the channel allocator
//! hands back to clients. Snapshots arrive out of order once the manager
//! awaits arenas without its lock, so a write never replaces a stored
//! snapshot with an older revision.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use pongcore_protocol::{ArenaId, ArenaSnapshot, ChannelId, PlayerStatus, UserId};
use serde::{Deserialize, Serialize};

use crate::ArenaError;

/// A user's seat: the channel plus the arena as last seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAssignment {
    pub channel_id: ChannelId,
    pub arena: ArenaSnapshot,
}

impl ChannelAssignment {
    pub fn arena_id(&self) -> &ArenaId {
        &self.arena.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentTable {
    entries: HashMap<UserId, ChannelAssignment>,
}

impl AssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: UserId) -> Option<&ChannelAssignment> {
        self.entries.get(&user_id)
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.contains_key(&user_id)
    }

    /// Records (or refreshes) the user's seat.
    ///
    /// # Errors
    /// `AlreadyAssigned` if the user is recorded under a different arena.
    pub fn assign(
        &mut self,
        user_id: UserId,
        channel_id: ChannelId,
        arena: ArenaSnapshot,
    ) -> Result<&ChannelAssignment, ArenaError> {
        let assignment = ChannelAssignment { channel_id, arena };
        match self.entries.entry(user_id) {
            Entry::Occupied(mut entry) => {
                if entry.get().arena.id != assignment.arena.id {
                    return Err(ArenaError::AlreadyAssigned {
                        user: user_id,
                        arena: entry.get().arena.id.clone(),
                    });
                }
                if entry.get().arena.revision <= assignment.arena.revision {
                    entry.insert(assignment);
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                tracing::debug!(%user_id, arena_id = %assignment.arena.id, "user assigned");
                Ok(entry.insert(assignment))
            }
        }
    }

    pub fn release(&mut self, user_id: UserId) -> Option<ChannelAssignment> {
        let released = self.entries.remove(&user_id);
        if released.is_some() {
            tracing::debug!(%user_id, "user released");
        }
        released
    }

    /// Releases the user only if they are recorded under `arena_id`.
    pub fn release_from(&mut self, user_id: UserId, arena_id: &ArenaId) -> Option<ChannelAssignment> {
        match self.entries.get(&user_id) {
            Some(entry) if entry.arena.id == *arena_id => self.release(user_id),
            _ => None,
        }
    }

    /// Replaces the stored snapshot for everyone seated in that arena,
    /// unless theirs is newer.
    pub fn refresh(&mut self, snapshot: &ArenaSnapshot) {
        for entry in self.entries.values_mut() {
            if entry.arena.id == snapshot.id && entry.arena.revision <= snapshot.revision {
                entry.arena = snapshot.clone();
            }
        }
    }

    /// Brings the entries recorded under the snapshot's arena in line with
    /// its roster: users who lost their seat or gave up are released.
    /// Evicted players keep theirs. Entries written from a newer snapshot
    /// are left alone. Returns who was released.
    pub fn sync_roster(&mut self, snapshot: &ArenaSnapshot) -> Vec<UserId> {
        let stale: Vec<UserId> = self
            .users_in(&snapshot.id)
            .into_iter()
            .filter(|user| {
                let newer = self
                    .entries
                    .get(user)
                    .is_some_and(|entry| entry.arena.revision > snapshot.revision);
                !newer
                    && snapshot
                        .player(*user)
                        .is_none_or(|p| p.status == PlayerStatus::GivenUp)
            })
            .collect();
        for user in &stale {
            self.entries.remove(user);
        }
        if !stale.is_empty() {
            tracing::debug!(arena_id = %snapshot.id, released = ?stale, "roster synced");
        }
        self.refresh(snapshot);
        stale
    }

    /// Releases everyone recorded under `arena_id`; returns who.
    pub fn release_arena(&mut self, arena_id: &ArenaId) -> Vec<UserId> {
        let users = self.users_in(arena_id);
        for user in &users {
            self.entries.remove(user);
        }
        users
    }

    /// Users recorded under `arena_id`, sorted.
    pub fn users_in(&self, arena_id: &ArenaId) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.arena.id == *arena_id)
            .map(|(user, _)| *user)
            .collect();
        users.sort();
        users
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
