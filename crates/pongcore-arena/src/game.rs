//! One arena's game: the status machine plus the ball and paddles.

use std::collections::BTreeMap;
use std::time::Duration;

use pongcore_physics::{Ball, Paddle, Side, StepEvent, Vector, step};
use pongcore_protocol::{BallSnapshot, GameStatus, UserId};
use pongcore_tick::Countdown;
use tokio::time::Instant;

use crate::{ArenaError, GameSettings};

/// The status machine with the ball and paddles it moves.
///
/// ```compile_fail
/// fn teleport(game: &mut pongcore_arena::Game) {
///     game.ball.position.x = 0.0;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Game {
    status: GameStatus,
    required_players: usize,
    pub(crate) ball: Ball,
    /// Keyed by roster slot.
    paddles: BTreeMap<usize, Paddle>,
    started_at: Option<Instant>,
    countdown: Option<Countdown>,
    winner: Option<UserId>,
}

impl Game {
    pub fn new(settings: &GameSettings, required_players: usize) -> Self {
        Self {
            status: GameStatus::Created,
            required_players,
            ball: Ball::centered(
                &settings.physics.bounds,
                settings.serve_velocity,
                settings.ball_radius,
            ),
            paddles: BTreeMap::new(),
            started_at: None,
            countdown: None,
            winner: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn required_players(&self) -> usize {
        self.required_players
    }

    pub fn winner(&self) -> Option<UserId> {
        self.winner
    }

    /// Moves to `target` if the status table allows it.
    ///
    /// # Errors
    /// `ArenaError::InvalidState` naming `operation` otherwise.
    pub fn transition(
        &mut self,
        target: GameStatus,
        operation: &'static str,
    ) -> Result<(), ArenaError> {
        if !self.status.can_transition_to(target) {
            return Err(ArenaError::InvalidState {
                operation,
                status: self.status,
            });
        }
        tracing::debug!(from = %self.status, to = %target, "game status change");
        self.status = target;
        Ok(())
    }

    // -- Paddles --

    pub fn add_paddle(&mut self, slot: usize, paddle: Paddle) {
        self.paddles.insert(slot, paddle);
    }

    pub fn remove_paddle(&mut self, slot: usize) -> Option<Paddle> {
        self.paddles.remove(&slot)
    }

    pub fn paddle(&self, slot: usize) -> Option<&Paddle> {
        self.paddles.get(&slot)
    }

    pub fn paddle_mut(&mut self, slot: usize) -> Option<&mut Paddle> {
        self.paddles.get_mut(&slot)
    }

    // -- Round lifecycle --

    /// `Waiting → Started`: records the start time and serves from center.
    pub fn start(&mut self, settings: &GameSettings) -> Result<(), ArenaError> {
        self.transition(GameStatus::Started, "start")?;
        self.started_at = Some(Instant::now());
        self.winner = None;
        self.serve(settings, Side::Right);
        Ok(())
    }

    /// `Started → Over` with the given winner.
    pub fn conclude(&mut self, winner: Option<UserId>) -> Result<(), ArenaError> {
        self.transition(GameStatus::Over, "conclude")?;
        self.winner = winner;
        Ok(())
    }

    /// `Over → Dying`: starts the game-over countdown and returns it.
    pub fn begin_countdown(&mut self, total: Duration, step: Duration) -> Result<&Countdown, ArenaError> {
        self.transition(GameStatus::Dying, "start the countdown")?;
        Ok(self.countdown.insert(Countdown::new(total, step)))
    }

    pub fn countdown_mut(&mut self) -> Option<&mut Countdown> {
        self.countdown.as_mut()
    }

    /// `Over/Dying → Waiting`: clears the finished round and recenters
    /// the ball and every remaining paddle.
    pub fn reset_round(&mut self, settings: &GameSettings) -> Result<(), ArenaError> {
        self.transition(GameStatus::Waiting, "rematch")?;
        self.started_at = None;
        self.countdown = None;
        self.winner = None;
        self.ball = Ball::centered(
            &settings.physics.bounds,
            settings.serve_velocity,
            settings.ball_radius,
        );
        for paddle in self.paddles.values_mut() {
            paddle.recenter(&settings.physics.bounds);
        }
        Ok(())
    }

    /// Resets the ball to center, heading toward `toward`.
    pub fn serve(&mut self, settings: &GameSettings, toward: Side) {
        let v = settings.serve_velocity;
        let velocity = Vector::new(v.dx.abs() * toward.toward(), v.dy);
        self.ball.reset(&settings.physics.bounds, velocity);
    }

    /// Advances the ball one step against the paddles of `active_slots`.
    pub fn step_ball(&mut self, active_slots: &[usize], settings: &GameSettings) -> StepEvent {
        let paddles: Vec<Paddle> = active_slots
            .iter()
            .filter_map(|slot| self.paddles.get(slot).copied())
            .collect();
        let outcome = step(&self.ball, &paddles, &settings.physics);
        self.ball = outcome.ball;
        outcome.event
    }

    // -- Time limit --

    pub fn time_left(&self, limit: Option<Duration>) -> Option<Duration> {
        let limit = limit?;
        let started = self.started_at?;
        Some(limit.saturating_sub(started.elapsed()))
    }

    pub fn time_is_up(&self, limit: Option<Duration>) -> bool {
        self.status == GameStatus::Started
            && self.time_left(limit).is_some_and(|left| left.is_zero())
    }

    pub fn ball_snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            position: self.ball.position,
            velocity: self.ball.velocity,
            radius: self.ball.radius,
        }
    }
}
