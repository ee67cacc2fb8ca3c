//! Arena configuration: field and entity settings, per-match player
//! specs, and the channel manager's knobs.

use std::time::Duration;

use pongcore_physics::{PaddleLayout, PhysicsConfig, PhysicsError, Vector};
use pongcore_protocol::Visibility;
use serde::{Deserialize, Serialize};

use crate::ArenaError;

// ---------------------------------------------------------------------------
// GameSettings
// ---------------------------------------------------------------------------

/// Rules and dimensions shared by every arena a manager creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Field bounds and collision response.
    pub physics: PhysicsConfig,
    pub ball_radius: f64,
    /// Velocity of a fresh serve. The horizontal sign is flipped toward
    /// whichever side the serve goes to.
    pub serve_velocity: Vector,
    pub paddle: PaddleLayout,
    pub min_players: usize,
    pub max_players: usize,
    /// First score to reach this ends the game.
    pub winning_score: u32,
    /// Ends a running game after this long, whatever the score.
    pub time_limit: Option<Duration>,
    /// A player with no paddle movement for this long is evicted.
    pub afk_timeout: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            ball_radius: 15.0,
            serve_velocity: Vector::new(5.0, 5.0),
            paddle: PaddleLayout::default(),
            min_players: 2,
            max_players: 4,
            winning_score: 5,
            time_limit: None,
            afk_timeout: Duration::from_secs(60),
        }
    }
}

impl GameSettings {
    /// Applies a match's ball speed and paddle size presets.
    pub fn with_options(&self, options: &MatchOptions) -> Self {
        let mut settings = self.clone();
        settings.serve_velocity = self.serve_velocity.scaled(options.ball_speed.factor());
        settings.paddle.height = self.paddle.height * options.paddle_size.factor();
        settings
    }

    /// The field, ball and paddles of a full `max_players` roster fit
    /// together.
    ///
    /// # Errors
    /// See [`PhysicsConfig::validate_layout`].
    pub fn validate_layout(&self) -> Result<(), PhysicsError> {
        self.physics
            .validate_layout(self.ball_radius, &self.paddle, self.max_players)
    }

    /// # Errors
    /// `ArenaError::Validation` for player bounds that can't make a game,
    /// a zero winning score, or a layout that doesn't fit.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.min_players < 2 || self.min_players > self.max_players {
            return Err(ArenaError::Validation(format!(
                "need 2 <= min_players <= max_players, got {} and {}",
                self.min_players, self.max_players
            )));
        }
        if self.winning_score == 0 {
            return Err(ArenaError::Validation("winning_score must be positive".into()));
        }
        self.validate_layout()
            .map_err(|e| ArenaError::Validation(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Match options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallSpeed {
    Snail,
    Deer,
    #[default]
    Lion,
    Hawk,
    Jet,
}

impl BallSpeed {
    /// Multiplier applied to the serve velocity.
    pub fn factor(self) -> f64 {
        match self {
            Self::Snail => 0.5,
            Self::Deer => 0.75,
            Self::Lion => 1.0,
            Self::Hawk => 1.5,
            Self::Jet => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddleSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Jumbo,
}

impl PaddleSize {
    /// Multiplier applied to the paddle height.
    pub fn factor(self) -> f64 {
        match self {
            Self::Tiny => 0.5,
            Self::Small => 0.75,
            Self::Medium => 1.0,
            Self::Large => 1.25,
            Self::Jumbo => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Bots playing from this machine's keyboard side (local play).
    pub ai_opponents_local: usize,
    /// Bots joining over the network.
    pub ai_opponents_online: usize,
    pub ball_speed: BallSpeed,
    pub paddle_size: PaddleSize,
}

impl MatchOptions {
    pub fn bots(&self) -> usize {
        self.ai_opponents_local + self.ai_opponents_online
    }
}

// ---------------------------------------------------------------------------
// PlayerSpecs
// ---------------------------------------------------------------------------

/// What the requesting user asked for when allocating a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSpecs {
    pub nb_players: usize,
    pub visibility: Visibility,
    pub options: MatchOptions,
}

impl Default for PlayerSpecs {
    fn default() -> Self {
        Self {
            nb_players: 2,
            visibility: Visibility::Public,
            options: MatchOptions::default(),
        }
    }
}

impl PlayerSpecs {
    /// # Errors
    /// `ArenaError::Validation` when the player count falls outside the
    /// settings' bounds or the bots would take every seat.
    pub fn validate(&self, settings: &GameSettings) -> Result<(), ArenaError> {
        if self.nb_players < settings.min_players || self.nb_players > settings.max_players {
            return Err(ArenaError::Validation(format!(
                "nb_players must be between {} and {}, got {}",
                settings.min_players, settings.max_players, self.nb_players
            )));
        }
        if self.options.bots() >= self.nb_players {
            return Err(ArenaError::Validation(format!(
                "{} bots leave no seat for a human in a {}-player match",
                self.options.bots(),
                self.nb_players
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Channel kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// A single arena.
    #[default]
    Classic,
    /// A fixed set of arenas created together.
    Tournament,
}

// ---------------------------------------------------------------------------
// ArenaConfig
// ---------------------------------------------------------------------------

/// Everything one arena needs to know about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    /// Already adjusted for the match options.
    pub settings: GameSettings,
    pub required_players: usize,
    pub visibility: Visibility,
    /// Length of the game-over countdown.
    pub game_over_countdown: Duration,
    /// How much one lifecycle pass takes off the countdown.
    pub countdown_step: Duration,
}

impl ArenaConfig {
    /// # Errors
    /// Propagates [`PlayerSpecs::validate`], and [`GameSettings::validate`]
    /// on the settings adjusted for the match options.
    pub fn from_specs(config: &ManagerConfig, specs: &PlayerSpecs) -> Result<Self, ArenaError> {
        specs.validate(&config.settings)?;
        let settings = config.settings.with_options(&specs.options);
        settings.validate()?;
        Ok(Self {
            settings,
            required_players: specs.nb_players,
            visibility: specs.visibility,
            game_over_countdown: config.game_over_countdown,
            countdown_step: config.countdown_step,
        })
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        let manager = ManagerConfig::default();
        Self {
            settings: manager.settings,
            required_players: 2,
            visibility: Visibility::Public,
            game_over_countdown: manager.game_over_countdown,
            countdown_step: manager.countdown_step,
        }
    }
}

// ---------------------------------------------------------------------------
// ManagerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    pub settings: GameSettings,
    pub game_over_countdown: Duration,
    pub countdown_step: Duration,
    /// Arenas created together for a tournament channel.
    pub tournament_arenas: usize,
    /// Specs used for every tournament arena.
    pub tournament_specs: PlayerSpecs,
    /// Bounded inbox size of each arena actor.
    pub inbox_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            settings: GameSettings::default(),
            game_over_countdown: Duration::from_secs(5),
            countdown_step: Duration::from_secs(1),
            tournament_arenas: 4,
            tournament_specs: PlayerSpecs {
                visibility: Visibility::Public,
                ..PlayerSpecs::default()
            },
            inbox_size: 64,
        }
    }
}

impl ManagerConfig {
    /// # Errors
    /// `ArenaError::Validation` for an empty inbox or tournament, invalid
    /// settings, or tournament specs the settings can't host.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.inbox_size == 0 {
            return Err(ArenaError::Validation("inbox_size must be positive".into()));
        }
        if self.tournament_arenas == 0 {
            return Err(ArenaError::Validation("tournament_arenas must be positive".into()));
        }
        self.settings.validate()?;
        ArenaConfig::from_specs(self, &self.tournament_specs).map(|_| ())
    }
}
