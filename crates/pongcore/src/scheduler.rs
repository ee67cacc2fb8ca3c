//! The two loops every channel runs.
//!
//! - The **tick loop** queues one physics step per arena every
//!   `tick_interval`. It never waits for the arenas.
//! - The **lifecycle loop** runs one supervise pass per arena every
//!   `monitor_interval`, brings the assignment table in line with the
//!   rosters, and reaps dead arenas through the channel manager. Once
//!   every arena left in the channel is one nobody ever joined, it closes
//!   them all, which takes the channel down with them.
//!
//! Each loop holds its own copy of the channel's arena handles. The tick
//! loop stops once every handle is closed; the lifecycle loop stops once
//! the channel is gone.

use std::sync::Arc;

use pongcore_arena::{ArenaError, ArenaHandle, ChannelManager};
use pongcore_protocol::{ChannelId, GameStatus};
use pongcore_tick::{TickConfig, TickScheduler};
use tokio::task::JoinHandle;

use crate::MonitorConfig;

/// Join handles of a channel's two loops.
#[derive(Debug)]
pub struct ChannelLoops {
    pub lifecycle: JoinHandle<()>,
    pub tick: JoinHandle<()>,
}

impl ChannelLoops {
    pub fn is_finished(&self) -> bool {
        self.lifecycle.is_finished() && self.tick.is_finished()
    }
}

/// Starts both loops for a freshly created channel.
pub fn spawn_channel_loops(
    channel_id: ChannelId,
    handles: Vec<ArenaHandle>,
    manager: Arc<ChannelManager>,
    config: &MonitorConfig,
) -> ChannelLoops {
    let tick = TickScheduler::new(TickConfig::every(config.tick_interval));
    let monitor = TickScheduler::new(TickConfig::every(config.monitor_interval));

    tracing::info!(%channel_id, arenas = handles.len(), "channel loops started");
    ChannelLoops {
        tick: tokio::spawn(run_tick_loop(channel_id.clone(), handles.clone(), tick)),
        lifecycle: tokio::spawn(run_lifecycle_loop(channel_id, handles, manager, monitor)),
    }
}

async fn run_tick_loop(
    channel_id: ChannelId,
    mut handles: Vec<ArenaHandle>,
    mut scheduler: TickScheduler,
) {
    while !handles.is_empty() {
        scheduler.wait_for_tick().await;
        handles.retain(|handle| match handle.tick() {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!(arena_id = %handle.arena_id(), "inbox full, tick dropped");
                true
            }
            Err(_) => false,
        });
        scheduler.record_tick_end();
    }
    tracing::info!(%channel_id, ticks = scheduler.tick_count(), "tick loop stopped");
}

async fn run_lifecycle_loop(
    channel_id: ChannelId,
    mut handles: Vec<ArenaHandle>,
    manager: Arc<ChannelManager>,
    mut scheduler: TickScheduler,
) {
    loop {
        scheduler.wait_for_tick().await;
        let alive = supervise_channel(&channel_id, &mut handles, &manager).await;
        scheduler.record_tick_end();
        if !alive {
            break;
        }
    }
    tracing::info!(%channel_id, "lifecycle loop stopped");
}

/// One lifecycle pass over a channel's arenas. Handles of reaped or
/// stopped arenas are dropped from `handles`. Returns `false` once the
/// channel has nothing left to supervise.
pub async fn supervise_channel(
    channel_id: &ChannelId,
    handles: &mut Vec<ArenaHandle>,
    manager: &ChannelManager,
) -> bool {
    let mut channel_deleted = false;
    // Each surviving handle with its status after the pass, if known.
    let mut remaining: Vec<(ArenaHandle, Option<GameStatus>)> = Vec::with_capacity(handles.len());

    for handle in handles.drain(..) {
        let arena_id = handle.arena_id().clone();
        let report = match handle.supervise().await {
            Ok(report) => report,
            Err(ArenaError::Unavailable(_)) => {
                tracing::debug!(%channel_id, %arena_id, "arena stopped, dropping handle");
                continue;
            }
            Err(e) => {
                tracing::warn!(%channel_id, %arena_id, error = %e, "supervise failed");
                remaining.push((handle, None));
                continue;
            }
        };

        if report.is_dead() {
            let outcome = manager.delete_arena(channel_id, &arena_id).await;
            tracing::debug!(
                %channel_id,
                %arena_id,
                released = outcome.released.len(),
                "dead arena reaped"
            );
            channel_deleted |= outcome.channel_deleted;
            continue;
        }

        if report.changed {
            match handle.snapshot().await {
                Ok(snapshot) => {
                    let released = manager.sync_arena(&snapshot).await;
                    if !released.is_empty() {
                        tracing::info!(%channel_id, %arena_id, ?released, "departed users released");
                    }
                }
                Err(e) => {
                    tracing::warn!(%channel_id, %arena_id, error = %e, "snapshot failed");
                }
            }
        }
        remaining.push((handle, report.status));
    }

    let unused = !channel_deleted
        && !remaining.is_empty()
        && remaining
            .iter()
            .all(|(_, status)| *status == Some(GameStatus::Created));
    if unused {
        tracing::info!(%channel_id, arenas = remaining.len(), "no players left, closing channel");
        let mut kept = Vec::new();
        for (handle, status) in remaining {
            match handle.close_unused().await {
                Ok(true) => {
                    let outcome = manager.delete_arena(channel_id, handle.arena_id()).await;
                    channel_deleted |= outcome.channel_deleted;
                }
                // Joined since the pass; keep supervising it.
                Ok(false) => kept.push((handle, status)),
                Err(e) => {
                    tracing::warn!(%channel_id, arena_id = %handle.arena_id(), error = %e, "close failed");
                    kept.push((handle, status));
                }
            }
        }
        remaining = kept;
    }

    *handles = remaining.into_iter().map(|(handle, _)| handle).collect();
    !channel_deleted && !handles.is_empty()
}
