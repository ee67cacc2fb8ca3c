//! Identity and status types shared by every pongcore crate.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A user, as identified by the authentication layer in front of us.
///
/// Serialized as the bare number (`UserId(42)` ⇄ `42`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Random alphanumeric channel identifier, e.g. `"aZ3kQ9xLp0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Random alphanumeric arena identifier. Stable for the arena's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(String);

impl ArenaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArenaId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Whether matchmaking may place strangers into an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Lifecycle of one arena's game.
///
/// ```text
///            first join       roster full       win / ≤1 active / time up
/// Created ─────────────► Waiting ─────────► Started ─────────► Over
///                          │  ▲                                 │
///            everyone left │  │ rematch                         │ countdown starts
///                          ▼  └──────────── Over / Dying ◄──────┘
///                        Dead ◄────────────────── Dying
///                                countdown exhausted
/// ```
///
/// A `Created` arena nobody ever joined goes straight to `Dead` once the
/// rest of its channel has emptied.
///
/// `Started → Waiting` never happens directly; a new round always goes
/// through `Over` or `Dying` and a rematch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Created,
    Waiting,
    Started,
    Over,
    Dying,
    Dead,
}

impl GameStatus {
    /// Returns `true` if `target` is a legal next status.
    pub fn can_transition_to(self, target: Self) -> bool {
        use GameStatus::*;
        matches!(
            (self, target),
            (Created, Waiting)
                | (Created, Dead)
                | (Waiting, Started)
                | (Waiting, Dead)
                | (Started, Over)
                | (Over, Dying)
                | (Over, Waiting)
                | (Dying, Waiting)
                | (Dying, Dead)
        )
    }

    /// New players may take a seat.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Created | Self::Waiting)
    }

    /// The match has concluded; a rematch is possible.
    pub fn is_concluded(self) -> bool {
        matches!(self, Self::Over | Self::Dying)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Waiting => "waiting",
            Self::Started => "started",
            Self::Over => "over",
            Self::Dying => "dying",
            Self::Dead => "dead",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// PlayerStatus
// ---------------------------------------------------------------------------

/// `GivenUp` is terminal for the current round. `Disabled` marks a player
/// evicted for inactivity; they keep their seat and a rematch enables
/// them again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Enabled,
    Disabled,
    GivenUp,
}

impl PlayerStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Enabled)
    }
}
