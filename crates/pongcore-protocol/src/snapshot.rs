//! Immutable, serializable views of an arena.

use pongcore_physics::{Position, Side, Vector};
use serde::{Deserialize, Serialize};

use crate::{ArenaId, ChannelId, GameStatus, PlayerStatus, UserId, Visibility};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub user_id: UserId,
    pub name: String,
    pub slot: usize,
    pub side: Side,
    pub score: u32,
    pub status: PlayerStatus,
    pub rematch_requested: bool,
    /// Whole seconds until AFK eviction; 0 once the timeout passed.
    pub time_left_before_kick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub position: Position,
    pub velocity: Vector,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddleSnapshot {
    pub user_id: UserId,
    pub side: Side,
    pub lane: usize,
    /// Center of the paddle rectangle.
    pub position: Position,
    pub width: f64,
    pub height: f64,
}

/// Everything a client needs to draw an arena, and everything the
/// assignment table remembers about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub id: ArenaId,
    pub channel_id: ChannelId,
    pub status: GameStatus,
    pub visibility: Visibility,
    pub min_players: usize,
    pub max_players: usize,
    /// Seats in this match. The game starts on its own once they are
    /// all taken.
    pub required_players: usize,
    /// In slot order.
    pub players: Vec<PlayerSnapshot>,
    pub ball: BallSnapshot,
    /// In slot order.
    pub paddles: Vec<PaddleSnapshot>,
    pub winner: Option<UserId>,
    /// Seconds left before a timed game ends, when a time limit is set
    /// and the game is running.
    pub time_left: Option<u64>,
    /// Grows with every snapshot the arena takes; the higher one is newer.
    #[serde(default)]
    pub revision: u64,
}

impl ArenaSnapshot {
    pub fn player(&self, user_id: UserId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.player(user_id).is_some()
    }

    pub fn active_players(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.players.iter().filter(|p| p.status.is_active())
    }

    /// Every seat of this match is taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.required_players
    }

    /// Open to matchmaking: joinable status, a free seat and public.
    pub fn accepts_strangers(&self) -> bool {
        self.status.is_joinable() && !self.is_full() && self.visibility == Visibility::Public
    }
}
