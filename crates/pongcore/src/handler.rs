//! Frame dispatch for the transport layer.
//!
//! The transport owns the connection and knows which user it belongs to.
//! For every text frame it calls [`dispatch`] and sends back the returned
//! [`ServerMessage`]. Arena output produced in the meantime arrives
//! through the sink; [`outbound`] turns it into frames.

use pongcore_arena::{GiveUpOutcome, SinkEvent};
use pongcore_protocol::{
    ClientMessage, Codec, ErrorCode, GameUpdate, JsonCodec, ServerMessage, UserId,
};

use crate::{BotProvisioner, Monitor};

/// Decodes one client frame, applies it and returns the reply.
///
/// Never fails: undecodable frames and refused commands both come back
/// as [`ServerMessage::Error`].
pub async fn dispatch<B: BotProvisioner>(
    monitor: &Monitor<B>,
    user_id: UserId,
    frame: &[u8],
) -> ServerMessage {
    let message: ClientMessage = match JsonCodec.decode(frame) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(%user_id, error = %e, "undecodable frame");
            return ServerMessage::error(ErrorCode::Malformed, e.to_string());
        }
    };
    tracing::debug!(%user_id, kind = message.kind(), "client message");

    let reply = match message {
        ClientMessage::Join {
            channel_id,
            arena_id,
            name,
        } => monitor
            .join(&channel_id, &arena_id, user_id, &name)
            .await
            .map(|snapshot| ServerMessage::update(GameUpdate::Arena(snapshot))),
        ClientMessage::Leave {} => monitor
            .leave(user_id)
            .await
            .map(|snapshot| ServerMessage::update(GameUpdate::Arena(snapshot))),
        ClientMessage::GiveUp {} => monitor.give_up(user_id).await.map(|outcome| match outcome {
            GiveUpOutcome::GaveUp(snapshot) => {
                ServerMessage::update(GameUpdate::PlayerList(snapshot.players))
            }
            // A second give-up racing the first. Later ones get not_entered.
            GiveUpOutcome::AlreadyGivenUp => {
                ServerMessage::error(ErrorCode::GivenUp, "you already gave up")
            }
        }),
        ClientMessage::Rematch {} => monitor.rematch(user_id).await.map(|result| match result {
            Some(snapshot) => ServerMessage::update(GameUpdate::Arena(snapshot)),
            None => ServerMessage::notice("Waiting for the other players to accept the rematch."),
        }),
        ClientMessage::MovePaddle { direction } => monitor
            .move_paddle(user_id, direction)
            .await
            .map(|paddle| ServerMessage::update(GameUpdate::Paddle(paddle))),
    };

    reply.unwrap_or_else(|e| {
        tracing::debug!(%user_id, error = %e, "command refused");
        ServerMessage::error(e.code(), e.to_string())
    })
}

/// The frame to broadcast for one piece of arena output.
pub fn outbound(event: &SinkEvent) -> ServerMessage {
    match event {
        SinkEvent::Update { snapshot, .. } => {
            ServerMessage::update(GameUpdate::Arena(snapshot.clone()))
        }
        SinkEvent::GameOver { notice, .. } => ServerMessage::GameOver {
            winner: notice.winner,
            message: notice.message.clone(),
            seconds: notice.seconds_remaining,
        },
    }
}
