//! Bot provisioning for matches that ask for AI opponents.
//!
//! pongcore doesn't run bots itself. When a channel is created with
//! `ai_opponents_local + ai_opponents_online > 0`, the monitor asks a
//! [`BotProvisioner`] for one bot per requested opponent and seats each
//! returned user in the channel's first arena. A failed request leaves
//! that seat empty; it never fails the channel.

use pongcore_protocol::{ArenaId, ChannelId, UserId};

/// Errors from the bot service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    /// The service couldn't be reached or timed out.
    #[error("bot service unreachable: {0}")]
    Unreachable(String),

    /// The service answered, but not with a bot.
    #[error("bot service returned an unexpected response: {0}")]
    BadResponse(String),
}

/// Spawns a bot for an arena and returns the bot's identity.
///
/// `Send + Sync + 'static` because the monitor holding it is shared
/// across connection tasks.
pub trait BotProvisioner: Send + Sync + 'static {
    fn spawn_bot(
        &self,
        channel_id: &ChannelId,
        arena_id: &ArenaId,
    ) -> impl std::future::Future<Output = Result<UserId, ProvisionError>> + Send;
}

/// Provisions nothing; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBots;

impl BotProvisioner for NoBots {
    async fn spawn_bot(&self, _: &ChannelId, _: &ArenaId) -> Result<UserId, ProvisionError> {
        Err(ProvisionError::Unreachable("no bot service configured".into()))
    }
}

#[cfg(feature = "http-bots")]
pub use http::HttpBotProvisioner;

#[cfg(feature = "http-bots")]
mod http {
    use std::time::Duration;

    use pongcore_protocol::{ArenaId, ChannelId, UserId};
    use serde::{Deserialize, Serialize};

    use super::{BotProvisioner, ProvisionError};

    const TIMEOUT: Duration = Duration::from_secs(3);

    #[derive(Serialize)]
    struct SpawnRequest<'a> {
        channel_id: &'a ChannelId,
        arena_id: &'a ArenaId,
    }

    #[derive(Deserialize)]
    struct SpawnResponse {
        user_id: UserId,
    }

    /// Posts `{channel_id, arena_id}` to a bot service and reads back
    /// `{user_id}`.
    #[derive(Debug, Clone)]
    pub struct HttpBotProvisioner {
        client: reqwest::Client,
        endpoint: String,
    }

    impl HttpBotProvisioner {
        /// # Errors
        /// `ProvisionError::Unreachable` if the HTTP client can't be built.
        pub fn new(endpoint: impl Into<String>) -> Result<Self, ProvisionError> {
            let client = reqwest::Client::builder()
                .timeout(TIMEOUT)
                .build()
                .map_err(|e| ProvisionError::Unreachable(e.to_string()))?;
            Ok(Self {
                client,
                endpoint: endpoint.into(),
            })
        }
    }

    impl BotProvisioner for HttpBotProvisioner {
        async fn spawn_bot(
            &self,
            channel_id: &ChannelId,
            arena_id: &ArenaId,
        ) -> Result<UserId, ProvisionError> {
            let response = self
                .client
                .post(&self.endpoint)
                .json(&SpawnRequest {
                    channel_id,
                    arena_id,
                })
                .send()
                .await
                .map_err(|e| ProvisionError::Unreachable(e.to_string()))?
                .error_for_status()
                .map_err(|e| ProvisionError::BadResponse(e.to_string()))?;
            let body: SpawnResponse = response
                .json()
                .await
                .map_err(|e| ProvisionError::BadResponse(e.to_string()))?;
            Ok(body.user_id)
        }
    }
}
