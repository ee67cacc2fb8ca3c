//! Top-level configuration: loop intervals plus everything the channel
//! manager needs.

use std::time::Duration;

use pongcore_arena::{GameSettings, ManagerConfig, PlayerSpecs};
use pongcore_protocol::Visibility;
use serde::{Deserialize, Serialize};

use crate::PongError;

/// Configuration for a [`Monitor`](crate::Monitor).
///
/// Every field has a default, so a JSON file only needs the values it
/// changes:
///
/// ```rust
/// use std::time::Duration;
/// use pongcore::MonitorConfig;
///
/// let config = MonitorConfig::from_json(r#"{"tournament_arenas": 8}"#).unwrap();
/// assert_eq!(config.tournament_arenas, 8);
/// assert_eq!(config.monitor_interval, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Physics step interval of the tick loop.
    pub tick_interval: Duration,
    /// Interval of the lifecycle loop. One pass is also one step of the
    /// game-over countdown.
    pub monitor_interval: Duration,
    pub game_over_countdown: Duration,
    pub tournament_arenas: usize,
    pub tournament_specs: PlayerSpecs,
    /// Bounded inbox size of each arena actor.
    pub inbox_size: usize,
    pub settings: GameSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            monitor_interval: Duration::from_secs(1),
            game_over_countdown: Duration::from_secs(5),
            tournament_arenas: 4,
            tournament_specs: PlayerSpecs {
                visibility: Visibility::Public,
                ..PlayerSpecs::default()
            },
            inbox_size: 64,
            settings: GameSettings::default(),
        }
    }
}

impl MonitorConfig {
    /// Parses and validates a configuration.
    ///
    /// # Errors
    /// `PongError::Config` if the JSON is malformed or a field has the
    /// wrong shape, otherwise whatever [`MonitorConfig::validate`] reports.
    pub fn from_json(json: &str) -> Result<Self, PongError> {
        let config: Self = serde_json::from_str(json).map_err(PongError::Config)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `PongError::Physics` if the ball and paddles don't fit the field,
    /// `PongError::Arena` for any other setting the manager can't run
    /// with.
    pub fn validate(&self) -> Result<(), PongError> {
        self.settings.validate_layout()?;
        self.manager_config().validate()?;
        Ok(())
    }

    /// The channel manager's share of this configuration.
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            settings: self.settings.clone(),
            game_over_countdown: self.game_over_countdown,
            countdown_step: self.monitor_interval,
            tournament_arenas: self.tournament_arenas,
            tournament_specs: self.tournament_specs,
            inbox_size: self.inbox_size,
        }
    }
}
