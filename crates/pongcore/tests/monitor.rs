//! End-to-end tests for the monitor and its channel loops.
//!
//! Uses paused tokio time: the loops' sleeps resolve as soon as every
//! task is idle, so whole countdowns run instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pongcore::{BotProvisioner, Monitor, MonitorConfig, ProvisionError};
use pongcore_arena::{
    ArenaError, ArenaSink, ChannelKind, ChannelSink, GameOverNotice, GiveUpOutcome, MatchOptions,
    Missing, NoopSink, PlayerSpecs, SinkError, SinkEvent,
};
use pongcore_protocol::{ArenaId, ArenaSnapshot, ChannelId, Direction, GameStatus, UserId};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn monitor() -> Monitor {
    Monitor::new(MonitorConfig::default(), Arc::new(NoopSink))
}

fn game_over_seconds(rx: &mut mpsc::UnboundedReceiver<SinkEvent>) -> Vec<u64> {
    let mut seconds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SinkEvent::GameOver { notice, .. } = event {
            seconds.push(notice.seconds_remaining);
        }
    }
    seconds
}

/// Hands out bots 100, 101, ... and counts the requests.
#[derive(Default)]
struct CountingBots {
    next: AtomicU64,
}

impl BotProvisioner for CountingBots {
    async fn spawn_bot(&self, _: &ChannelId, _: &ArenaId) -> Result<UserId, ProvisionError> {
        Ok(UserId(100 + self.next.fetch_add(1, Ordering::SeqCst)))
    }
}

/// Blocks its thread on the first update of one channel.
struct StallingSink {
    stalled: std::sync::Mutex<Option<ChannelId>>,
    delay: Duration,
}

impl StallingSink {
    fn new(delay: Duration) -> Self {
        Self {
            stalled: std::sync::Mutex::new(None),
            delay,
        }
    }

    fn stall(&self, channel: &ChannelId) {
        *self.stalled.lock().unwrap() = Some(channel.clone());
    }
}

impl ArenaSink for StallingSink {
    fn on_update(&self, channel: &ChannelId, _: &ArenaSnapshot) -> Result<(), SinkError> {
        let hit = {
            let mut stalled = self.stalled.lock().unwrap();
            if stalled.as_ref() == Some(channel) {
                stalled.take()
            } else {
                None
            }
        };
        if hit.is_some() {
            std::thread::sleep(self.delay);
        }
        Ok(())
    }

    fn on_game_over(&self, _: &ChannelId, _: &ArenaId, _: &GameOverNotice) -> Result<(), SinkError> {
        Ok(())
    }
}

// =========================================================================
// Allocation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_get_or_create_channel_returns_existing_seat() {
    let monitor = monitor();
    let first = monitor
        .get_or_create_channel(UserId(1), &PlayerSpecs::default())
        .await
        .unwrap();
    assert_eq!(first.arena.status, GameStatus::Waiting);
    assert!(first.arena.contains(UserId(1)));

    let again = monitor
        .get_or_create_channel(UserId(1), &PlayerSpecs::default())
        .await
        .unwrap();
    assert_eq!(again.channel_id, first.channel_id);
    assert_eq!(again.arena_id(), first.arena_id());
    assert_eq!(monitor.manager().channel_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_create_channel_rejects_invalid_specs() {
    let monitor = monitor();
    let specs = PlayerSpecs {
        nb_players: 9,
        ..PlayerSpecs::default()
    };
    let err = monitor
        .get_or_create_channel(UserId(1), &specs)
        .await
        .unwrap_err();
    assert!(matches!(err, ArenaError::Validation(_)));
    assert_eq!(monitor.manager().channel_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_join_tournament_first_fit() {
    let monitor = monitor();
    let first = monitor.join_tournament(UserId(1)).await.unwrap();
    assert!(first.arena.contains(UserId(1)));
    assert_eq!(
        monitor.manager().channel_kind(&first.channel_id).await,
        Some(ChannelKind::Tournament)
    );

    // The open seat next to user 1 is offered, not taken.
    let offer = monitor.join_tournament(UserId(2)).await.unwrap();
    assert_eq!(offer.channel_id, first.channel_id);
    assert_eq!(offer.arena_id(), first.arena_id());
    assert!(!offer.arena.contains(UserId(2)));

    let snap = monitor
        .join(&offer.channel_id, offer.arena_id(), UserId(2), "bob")
        .await
        .unwrap();
    assert_eq!(snap.status, GameStatus::Started);
    assert_eq!(monitor.manager().channel_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_bots_fill_requested_seats() {
    let monitor = Monitor::with_bots(
        MonitorConfig::default(),
        Arc::new(NoopSink),
        CountingBots::default(),
    );
    let specs = PlayerSpecs {
        nb_players: 3,
        options: MatchOptions {
            ai_opponents_local: 1,
            ai_opponents_online: 1,
            ..MatchOptions::default()
        },
        ..PlayerSpecs::default()
    };

    let seat = monitor.get_or_create_channel(UserId(1), &specs).await.unwrap();
    assert_eq!(seat.arena.status, GameStatus::Started);
    assert!(seat.arena.contains(UserId(100)));
    assert!(seat.arena.contains(UserId(101)));
}

#[tokio::test(start_paused = true)]
async fn test_failed_bot_leaves_seat_open() {
    let monitor = monitor();
    let specs = PlayerSpecs {
        options: MatchOptions {
            ai_opponents_online: 1,
            ..MatchOptions::default()
        },
        ..PlayerSpecs::default()
    };

    let seat = monitor.get_or_create_channel(UserId(1), &specs).await.unwrap();
    assert_eq!(seat.arena.status, GameStatus::Waiting);
    assert_eq!(seat.arena.players.len(), 1);
}

// =========================================================================
// Player commands
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_seated_user_cannot_create_another_channel() {
    let monitor = monitor();
    let seat = monitor
        .get_or_create_channel(UserId(1), &PlayerSpecs::default())
        .await
        .unwrap();
    let err = monitor
        .create_channel(UserId(1), &PlayerSpecs::default(), ChannelKind::Classic)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ArenaError::AlreadyAssigned {
            user: UserId(1),
            arena: seat.arena_id().clone(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_commands_without_seat_fail() {
    let monitor = monitor();
    let err = monitor.move_paddle(UserId(7), Direction::Up).await.unwrap_err();
    assert_eq!(err, ArenaError::NotFound(Missing::User(UserId(7))));
    assert!(monitor.leave(UserId(7)).await.is_err());
    assert!(monitor.rematch(UserId(7)).await.is_err());
}

// =========================================================================
// Channel loops
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_lifecycle_reaps_dead_arena_after_countdown() {
    let (sink, mut rx) = ChannelSink::new();
    let monitor = Monitor::new(MonitorConfig::default(), Arc::new(sink));
    let seat = monitor
        .get_or_create_channel(UserId(1), &PlayerSpecs::default())
        .await
        .unwrap();
    monitor
        .join(&seat.channel_id, seat.arena_id(), UserId(2), "bob")
        .await
        .unwrap();

    let outcome = monitor.give_up(UserId(1)).await.unwrap();
    assert!(matches!(outcome, GiveUpOutcome::GaveUp(_)));

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(game_over_seconds(&mut rx), vec![5, 4, 3, 2, 1, 0]);
    assert_eq!(monitor.manager().channel_count().await, 0);
    assert!(monitor.manager().channel_of(UserId(2)).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_closes_tournament_everyone_left() {
    let monitor = monitor();
    let seat = monitor.join_tournament(UserId(1)).await.unwrap();
    assert_eq!(seat.arena.status, GameStatus::Waiting);

    monitor.leave(UserId(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(monitor.manager().channel_count().await, 0);
    assert!(monitor.manager().channel_of(UserId(1)).await.is_none());
    assert!(
        monitor
            .manager()
            .channel_handles(&seat.channel_id)
            .await
            .is_empty()
    );
}

#[tokio::test(start_paused = true)]
async fn test_tick_loop_moves_the_ball() {
    let monitor = monitor();
    let seat = monitor
        .get_or_create_channel(UserId(1), &PlayerSpecs::default())
        .await
        .unwrap();
    let started = monitor
        .join(&seat.channel_id, seat.arena_id(), UserId(2), "bob")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let handle = monitor
        .manager()
        .arena_handle(&seat.channel_id, seat.arena_id())
        .await
        .unwrap();
    let later = handle.snapshot().await.unwrap();
    assert_ne!(later.ball, started.ball);
}

#[tokio::test(start_paused = true)]
async fn test_idle_player_evicted_keeps_seat() {
    let mut config = MonitorConfig::default();
    config.settings.afk_timeout = Duration::from_secs(3);
    let monitor = monitor_with(config);
    let seat = monitor
        .get_or_create_channel(UserId(1), &PlayerSpecs::default())
        .await
        .unwrap();
    monitor
        .join(&seat.channel_id, seat.arena_id(), UserId(2), "bob")
        .await
        .unwrap();

    // Only user 1 keeps playing.
    for step in 0..8 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let direction = if step % 2 == 0 { Direction::Up } else { Direction::Down };
        let _ = monitor.move_paddle(UserId(1), direction).await;
    }

    let winner = monitor.manager().channel_of(UserId(1)).await.unwrap();
    assert_eq!(winner.arena.winner, Some(UserId(1)));

    // Still seated, but without a paddle until a rematch.
    let idle = monitor.manager().channel_of(UserId(2)).await.unwrap();
    assert_eq!(idle.arena_id(), seat.arena_id());
    let err = monitor.move_paddle(UserId(2), Direction::Up).await.unwrap_err();
    assert_eq!(err, ArenaError::NotJoined(UserId(2)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_channel_does_not_block_other_channels() {
    let sink = Arc::new(StallingSink::new(Duration::from_secs(1)));
    let monitor = Arc::new(Monitor::new(MonitorConfig::default(), sink.clone()));
    let slow = monitor
        .get_or_create_channel(UserId(1), &PlayerSpecs::default())
        .await
        .unwrap();
    let fast = monitor
        .get_or_create_channel(UserId(3), &PlayerSpecs::default())
        .await
        .unwrap();
    assert_ne!(slow.channel_id, fast.channel_id);

    sink.stall(&slow.channel_id);
    let stalled = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.move_paddle(UserId(1), Direction::Up).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let moved = tokio::time::timeout(
        Duration::from_millis(250),
        monitor.move_paddle(UserId(3), Direction::Down),
    )
    .await;
    assert!(matches!(moved, Ok(Ok(_))));

    let joined = tokio::time::timeout(
        Duration::from_millis(250),
        monitor.join(&fast.channel_id, fast.arena_id(), UserId(4), "dan"),
    )
    .await;
    let snapshot = joined.unwrap().unwrap();
    assert_eq!(snapshot.status, GameStatus::Started);

    assert!(stalled.await.unwrap().is_ok());
}

fn monitor_with(config: MonitorConfig) -> Monitor {
    Monitor::new(config, Arc::new(NoopSink))
}
