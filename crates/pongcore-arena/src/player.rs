//! A seated player and the AFK policy.

use std::time::Duration;

use pongcore_physics::Side;
use pongcore_protocol::{PlayerSnapshot, PlayerStatus, UserId};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: UserId,
    pub name: String,
    /// Roster slot; decides the paddle's side and lane.
    pub slot: usize,
    pub score: u32,
    pub status: PlayerStatus,
    pub rematch_requested: bool,
    last_activity: Instant,
}

impl Player {
    pub fn new(user_id: UserId, name: impl Into<String>, slot: usize) -> Self {
        Self {
            user_id,
            name: name.into(),
            slot,
            score: 0,
            status: PlayerStatus::Enabled,
            rematch_requested: false,
            last_activity: Instant::now(),
        }
    }

    pub fn side(&self) -> Side {
        Side::for_slot(self.slot)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Records activity now; restarts the AFK clock.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Zero once the timeout has passed.
    pub fn time_left_before_kick(&self, timeout: Duration) -> Duration {
        timeout.saturating_sub(self.last_activity.elapsed())
    }

    pub fn is_afk(&self, timeout: Duration) -> bool {
        self.time_left_before_kick(timeout).is_zero()
    }

    /// Fresh round: score and rematch flag cleared, enabled, clock restarted.
    pub fn reset(&mut self) {
        self.score = 0;
        self.rematch_requested = false;
        self.status = PlayerStatus::Enabled;
        self.touch();
    }

    pub fn snapshot(&self, afk_timeout: Duration) -> PlayerSnapshot {
        PlayerSnapshot {
            user_id: self.user_id,
            name: self.name.clone(),
            slot: self.slot,
            side: self.side(),
            score: self.score,
            status: self.status,
            rematch_requested: self.rematch_requested,
            time_left_before_kick: self.time_left_before_kick(afk_timeout).as_secs(),
        }
    }
}
