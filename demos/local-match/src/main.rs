use std::sync::Arc;
use std::time::Duration;

use pongcore::prelude::*;
use rand::Rng;

// ---------------------------------------------------------------------------
// Simulated clients
// ---------------------------------------------------------------------------

fn frame(message: &ClientMessage) -> Result<Vec<u8>, PongError> {
    Ok(JsonCodec.encode(message)?)
}

/// Mashes the paddle keys until the user's seat is gone.
async fn play(monitor: Arc<Monitor>, user_id: UserId) -> Result<(), PongError> {
    let mut ticker = tokio::time::interval(Duration::from_millis(50));
    loop {
        ticker.tick().await;
        let direction = if rand::rng().random_bool(0.5) {
            Direction::Up
        } else {
            Direction::Down
        };
        let reply = dispatch(
            &*monitor,
            user_id,
            &frame(&ClientMessage::MovePaddle { direction })?,
        )
        .await;
        if let ServerMessage::Error { code, message } = reply {
            tracing::info!(%user_id, ?code, %message, "player stops");
            return Ok(());
        }
    }
}

// ---------------------------------------------------------------------------
// Match bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), PongError> {
    pongcore::init_tracing();

    let mut config = MonitorConfig::default();
    config.settings.winning_score = 3;

    let (sink, mut events) = ChannelSink::new();
    let monitor = Arc::new(Monitor::new(config, Arc::new(sink)));

    let alice = UserId(1);
    let bob = UserId(2);
    let seat = monitor
        .get_or_create_channel(alice, &PlayerSpecs::default())
        .await?;
    tracing::info!(channel_id = %seat.channel_id, arena_id = %seat.arena_id(), "channel allocated");

    for (user_id, name) in [(alice, "alice"), (bob, "bob")] {
        let join = ClientMessage::Join {
            channel_id: seat.channel_id.clone(),
            arena_id: seat.arena_id().clone(),
            name: name.into(),
        };
        let reply = dispatch(&*monitor, user_id, &frame(&join)?).await;
        tracing::info!(%user_id, reply = ?reply, "joined");
    }

    let players = [alice, bob].map(|user_id| tokio::spawn(play(Arc::clone(&monitor), user_id)));

    let mut updates = 0u64;
    while let Some(event) = events.recv().await {
        match &event {
            SinkEvent::Update { snapshot, .. } => {
                updates += 1;
                if updates % 60 == 0 {
                    let scores: Vec<_> = snapshot.players.iter().map(|p| (p.user_id, p.score)).collect();
                    tracing::info!(status = %snapshot.status, ?scores, "score");
                }
            }
            SinkEvent::GameOver { notice, .. } => {
                let outgoing = JsonCodec.encode(&outbound(&event))?;
                tracing::info!(frame = %String::from_utf8_lossy(&outgoing), "game over notice");
                if notice.seconds_remaining == 0 {
                    break;
                }
            }
        }
    }

    for player in players {
        if let Ok(Err(e)) = player.await {
            tracing::warn!(error = %e, "player task failed");
        }
    }
    tracing::info!(updates, "match finished");
    Ok(())
}
