//! The rules of one match: roster, paddles, scoring and the game-over
//! countdown.
//!
//! [`Arena`] is plain synchronous state. It never runs on its own; the
//! actor in `actor.rs` owns it and applies one command at a time, which
//! is what keeps a tick from ever seeing a half-applied join or give-up.

use std::cell::Cell;
use std::collections::BTreeMap;

use pongcore_physics::{Direction, Paddle, PaddleLayout, StepEvent};
use pongcore_protocol::{
    ArenaId, ArenaSnapshot, ChannelId, GameStatus, PaddleSnapshot, PlayerStatus, UserId,
};
use pongcore_tick::CountdownStep;

use crate::{ArenaConfig, ArenaError, Game, Player};

/// Broadcast with every game-over countdown step.
pub const GAME_OVER_MESSAGE: &str = "Game Over! Thank you for playing.";

/// Result of [`Arena::give_up`].
#[derive(Debug, Clone, PartialEq)]
pub enum GiveUpOutcome {
    GaveUp(ArenaSnapshot),
    /// The player had already given up; nothing changed.
    AlreadyGivenUp,
}

/// One step of the game-over countdown, for [`ArenaSink::on_game_over`].
///
/// [`ArenaSink::on_game_over`]: crate::ArenaSink::on_game_over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverNotice {
    pub winner: Option<UserId>,
    pub message: String,
    pub seconds_remaining: u64,
}

/// What one lifecycle pass did to an arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperviseReport {
    /// Status after the pass.
    pub status: Option<GameStatus>,
    pub game_over: Option<GameOverNotice>,
    /// Players disabled for inactivity during this pass.
    pub evicted: Vec<UserId>,
    /// Something visible changed; a fresh snapshot should go out.
    pub changed: bool,
}

impl SuperviseReport {
    pub fn is_dead(&self) -> bool {
        self.status == Some(GameStatus::Dead)
    }
}

/// One arena's roster and game. The game is only reachable through the
/// arena's operations:
///
/// ```compile_fail
/// fn reach_in(arena: &mut pongcore_arena::Arena) {
///     let _ = arena.game_mut();
/// }
/// ```
#[derive(Debug)]
pub struct Arena {
    id: ArenaId,
    channel_id: ChannelId,
    config: ArenaConfig,
    game: Game,
    players: BTreeMap<UserId, Player>,
    /// Stamped on each snapshot.
    revision: Cell<u64>,
}

impl Arena {
    pub fn new(id: ArenaId, channel_id: ChannelId, config: ArenaConfig) -> Self {
        let game = Game::new(&config.settings, config.required_players);
        Self {
            id,
            channel_id,
            config,
            game,
            players: BTreeMap::new(),
            revision: Cell::new(0),
        }
    }

    pub fn id(&self) -> &ArenaId {
        &self.id
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    pub fn status(&self) -> GameStatus {
        self.game.status()
    }

    pub fn player(&self, user_id: UserId) -> Option<&Player> {
        self.players.get(&user_id)
    }

    pub fn active_count(&self) -> usize {
        self.players.values().filter(|p| p.is_active()).count()
    }

    #[cfg(test)]
    pub(crate) fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    // =====================================================================
    // Player commands
    // =====================================================================

    /// Seats `user_id` at the lowest free slot.
    ///
    /// # Errors
    /// `InvalidState` once the game has started, `AlreadyJoined` if the
    /// user already sits here, `Capacity` when every seat is taken.
    pub fn enter(&mut self, user_id: UserId, name: &str) -> Result<ArenaSnapshot, ArenaError> {
        let status = self.status();
        if !status.is_joinable() {
            return Err(ArenaError::InvalidState {
                operation: "join",
                status,
            });
        }
        if self.players.contains_key(&user_id) {
            return Err(ArenaError::AlreadyJoined(user_id, self.id.clone()));
        }
        if self.players.len() >= self.game.required_players() {
            return Err(ArenaError::Capacity(self.id.clone()));
        }

        let slot = self.free_slot();
        if status == GameStatus::Created {
            self.game.transition(GameStatus::Waiting, "join")?;
        }
        let paddle = Paddle::for_slot(slot, &self.layout(), &self.config.settings.physics.bounds);
        self.game.add_paddle(slot, paddle);
        self.players.insert(user_id, Player::new(user_id, name, slot));

        tracing::info!(
            arena_id = %self.id,
            %user_id,
            slot,
            players = self.players.len(),
            "player joined"
        );
        Ok(self.snapshot())
    }

    /// A seated user came back (new connection). Refreshes the name and
    /// the activity clock.
    ///
    /// # Errors
    /// `NotJoined` if the user has no seat here.
    pub fn reconnect(&mut self, user_id: UserId, name: &str) -> Result<ArenaSnapshot, ArenaError> {
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(ArenaError::NotJoined(user_id))?;
        player.name = name.to_owned();
        player.touch();
        tracing::debug!(arena_id = %self.id, %user_id, "player reconnected");
        Ok(self.snapshot())
    }

    /// Moves the user's paddle one step and restarts their AFK clock.
    ///
    /// # Errors
    /// `NotJoined` if the user has no active paddle here.
    pub fn move_paddle(
        &mut self,
        user_id: UserId,
        direction: Direction,
    ) -> Result<PaddleSnapshot, ArenaError> {
        if self.status() == GameStatus::Dead {
            return Err(ArenaError::InvalidState {
                operation: "move a paddle",
                status: GameStatus::Dead,
            });
        }
        let player = match self.players.get_mut(&user_id) {
            Some(p) if p.is_active() => p,
            _ => return Err(ArenaError::NotJoined(user_id)),
        };
        let slot = player.slot;
        let paddle = self
            .game
            .paddle_mut(slot)
            .ok_or(ArenaError::NotJoined(user_id))?;
        paddle.move_toward(direction, &self.config.settings.physics.bounds);
        let snapshot = paddle_snapshot(user_id, paddle);
        player.touch();
        Ok(snapshot)
    }

    /// Marks the user as given up. In a running game with at most one
    /// active player left, the game ends right away. Before the start
    /// the seat is simply freed.
    ///
    /// # Errors
    /// `NotJoined` if the user has no seat here.
    pub fn give_up(&mut self, user_id: UserId) -> Result<GiveUpOutcome, ArenaError> {
        let status = self.status();
        let player = self
            .players
            .get_mut(&user_id)
            .ok_or(ArenaError::NotJoined(user_id))?;
        if player.status == PlayerStatus::GivenUp {
            tracing::debug!(arena_id = %self.id, %user_id, "give up repeated, ignoring");
            return Ok(GiveUpOutcome::AlreadyGivenUp);
        }

        if status.is_joinable() {
            self.remove_seat(user_id);
            return Ok(GiveUpOutcome::GaveUp(self.snapshot()));
        }

        player.status = PlayerStatus::GivenUp;
        player.rematch_requested = false;
        tracing::info!(arena_id = %self.id, %user_id, "player gave up");

        if status == GameStatus::Started {
            self.conclude_if_over()?;
        }
        Ok(GiveUpOutcome::GaveUp(self.snapshot()))
    }

    /// The user left (or disconnected). Before the start this frees the
    /// seat; afterwards it counts as giving up.
    ///
    /// # Errors
    /// `NotJoined` if the user has no seat here.
    pub fn player_leave(&mut self, user_id: UserId) -> Result<ArenaSnapshot, ArenaError> {
        match self.give_up(user_id)? {
            GiveUpOutcome::GaveUp(snapshot) => Ok(snapshot),
            GiveUpOutcome::AlreadyGivenUp => Ok(self.snapshot()),
        }
    }

    /// Records a rematch request. Once every active player has asked (and
    /// enough players would remain), players who gave up lose their seats.
    /// Everyone else is reset, which enables players evicted for
    /// inactivity again, and the game goes back to `Waiting`. Returns the
    /// new snapshot then, `None` while requests are still missing.
    ///
    /// # Errors
    /// `NotJoined` for users without an active seat, `InvalidState`
    /// unless the game is over.
    pub fn rematch(&mut self, user_id: UserId) -> Result<Option<ArenaSnapshot>, ArenaError> {
        let status = self.status();
        let player = match self.players.get_mut(&user_id) {
            Some(p) if p.is_active() => p,
            _ => return Err(ArenaError::NotJoined(user_id)),
        };
        if !status.is_concluded() {
            return Err(ArenaError::InvalidState {
                operation: "rematch",
                status,
            });
        }
        player.rematch_requested = true;
        tracing::debug!(arena_id = %self.id, %user_id, "rematch requested");

        let everyone_asked = self
            .players
            .values()
            .filter(|p| p.is_active())
            .all(|p| p.rematch_requested);
        let staying = self
            .players
            .values()
            .filter(|p| p.status != PlayerStatus::GivenUp)
            .count();
        if !everyone_asked || staying < self.config.settings.min_players {
            return Ok(None);
        }

        self.game.reset_round(&self.config.settings)?;
        let leaving: Vec<UserId> = self
            .players
            .values()
            .filter(|p| p.status == PlayerStatus::GivenUp)
            .map(|p| p.user_id)
            .collect();
        for user in leaving {
            self.remove_seat(user);
        }
        for player in self.players.values_mut() {
            player.reset();
        }
        tracing::info!(arena_id = %self.id, players = self.players.len(), "rematch accepted");
        Ok(Some(self.snapshot()))
    }

    // =====================================================================
    // Scheduler commands
    // =====================================================================

    /// Starts the game once every seat is taken. Returns `true` if it did.
    pub fn try_start(&mut self) -> Result<bool, ArenaError> {
        if self.status() != GameStatus::Waiting
            || self.active_count() < self.game.required_players()
        {
            return Ok(false);
        }
        self.game.start(&self.config.settings)?;
        tracing::info!(arena_id = %self.id, players = self.players.len(), "game started");
        Ok(true)
    }

    /// One physics step. Returns the new snapshot while the game runs,
    /// `None` otherwise.
    pub fn tick(&mut self) -> Result<Option<ArenaSnapshot>, ArenaError> {
        if self.status() != GameStatus::Started {
            return Ok(None);
        }
        let settings = &self.config.settings;
        let active_slots: Vec<usize> = self
            .players
            .values()
            .filter(|p| p.is_active())
            .map(|p| p.slot)
            .collect();

        if let StepEvent::Score { conceded } = self.game.step_ball(&active_slots, settings) {
            for player in self.players.values_mut() {
                if player.is_active() && player.side() != conceded {
                    player.score += 1;
                }
            }
            self.game.serve(settings, conceded);
            tracing::debug!(arena_id = %self.id, %conceded, "point scored");
        }

        self.conclude_if_over()?;
        Ok(Some(self.snapshot()))
    }

    /// One lifecycle pass: starts full games, evicts idle players, ends
    /// games that ran out of players or time, and drives the game-over
    /// countdown. Safe to repeat; a dead arena just reports dead again.
    pub fn supervise(&mut self) -> Result<SuperviseReport, ArenaError> {
        let mut report = SuperviseReport::default();

        match self.status() {
            GameStatus::Created | GameStatus::Dead => {}
            GameStatus::Waiting => {
                if self.players.is_empty() {
                    self.game.transition(GameStatus::Dead, "close an empty arena")?;
                    tracing::info!(arena_id = %self.id, "arena emptied before start");
                    report.changed = true;
                } else {
                    report.changed = self.try_start()?;
                }
            }
            GameStatus::Started => {
                let timeout = self.config.settings.afk_timeout;
                for player in self.players.values_mut() {
                    if player.is_active() && player.is_afk(timeout) {
                        player.status = PlayerStatus::Disabled;
                        report.evicted.push(player.user_id);
                    }
                }
                if !report.evicted.is_empty() {
                    tracing::info!(
                        arena_id = %self.id,
                        evicted = ?report.evicted,
                        "players evicted for inactivity"
                    );
                    report.changed = true;
                }
                report.changed |= self.conclude_if_over()?;
            }
            GameStatus::Over => {
                let countdown = self.game.begin_countdown(
                    self.config.game_over_countdown,
                    self.config.countdown_step,
                )?;
                let seconds = countdown.remaining_secs();
                report.game_over = Some(self.notice(seconds));
                report.changed = true;
            }
            GameStatus::Dying => {
                let step = self
                    .game
                    .countdown_mut()
                    .map(|c| c.advance())
                    .unwrap_or(CountdownStep::Expired);
                match step {
                    CountdownStep::Running { remaining } => {
                        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                        report.game_over = Some(self.notice(secs));
                    }
                    CountdownStep::Expired => {
                        report.game_over = Some(self.notice(0));
                        self.game.transition(GameStatus::Dead, "finish the countdown")?;
                        tracing::info!(arena_id = %self.id, "arena is dead");
                        report.changed = true;
                    }
                }
            }
        }

        report.status = Some(self.status());
        Ok(report)
    }

    /// Closes an arena nobody ever joined. Returns `true` if it went from
    /// `Created` to `Dead`; any other status is left alone.
    pub fn close_unused(&mut self) -> Result<bool, ArenaError> {
        if self.status() != GameStatus::Created {
            return Ok(false);
        }
        self.game.transition(GameStatus::Dead, "close an unused arena")?;
        tracing::info!(arena_id = %self.id, "unused arena closed");
        Ok(true)
    }

    // =====================================================================
    // Views
    // =====================================================================

    pub fn snapshot(&self) -> ArenaSnapshot {
        let revision = self.revision.get() + 1;
        self.revision.set(revision);
        let settings = &self.config.settings;
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.slot);

        ArenaSnapshot {
            id: self.id.clone(),
            channel_id: self.channel_id.clone(),
            status: self.status(),
            visibility: self.config.visibility,
            min_players: settings.min_players,
            max_players: settings.max_players,
            required_players: self.game.required_players(),
            players: players
                .iter()
                .map(|p| p.snapshot(settings.afk_timeout))
                .collect(),
            ball: self.game.ball_snapshot(),
            paddles: players
                .iter()
                .filter_map(|p| {
                    self.game
                        .paddle(p.slot)
                        .map(|paddle| paddle_snapshot(p.user_id, paddle))
                })
                .collect(),
            winner: self.game.winner(),
            time_left: match self.status() {
                GameStatus::Started => self
                    .game
                    .time_left(settings.time_limit)
                    .map(|d| d.as_secs()),
                _ => None,
            },
            revision,
        }
    }

    /// Users holding a seat, in any status.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.players.keys().copied().collect()
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn layout(&self) -> PaddleLayout {
        self.config.settings.paddle
    }

    fn free_slot(&self) -> usize {
        (0..)
            .find(|slot| self.players.values().all(|p| p.slot != *slot))
            .unwrap_or(self.players.len())
    }

    fn remove_seat(&mut self, user_id: UserId) {
        if let Some(player) = self.players.remove(&user_id) {
            self.game.remove_paddle(player.slot);
            tracing::info!(
                arena_id = %self.id,
                %user_id,
                players = self.players.len(),
                "player left"
            );
        }
    }

    /// Ends a running game when at most one player is active, someone
    /// reached the winning score, or time ran out. Returns `true` if it
    /// ended.
    fn conclude_if_over(&mut self) -> Result<bool, ArenaError> {
        if self.status() != GameStatus::Started {
            return Ok(false);
        }
        let settings = &self.config.settings;
        let active: Vec<&Player> = self.players.values().filter(|p| p.is_active()).collect();
        let reached_score = self
            .players
            .values()
            .any(|p| p.score >= settings.winning_score);

        let reason = if active.len() <= 1 {
            "not enough active players"
        } else if reached_score {
            "winning score reached"
        } else if self.game.time_is_up(settings.time_limit) {
            "time limit reached"
        } else {
            return Ok(false);
        };

        let winner = match active.as_slice() {
            [last] => Some(last.user_id),
            [] => None,
            _ => self.leader(),
        };
        self.game.conclude(winner)?;
        tracing::info!(arena_id = %self.id, ?winner, reason, "game over");
        Ok(true)
    }

    /// The single highest scorer among players still in the game; `None`
    /// on a tie.
    fn leader(&self) -> Option<UserId> {
        let mut contenders = self
            .players
            .values()
            .filter(|p| p.status != PlayerStatus::GivenUp);
        let first = contenders.next()?;
        let mut best = (first.score, Some(first.user_id));
        for p in contenders {
            if p.score > best.0 {
                best = (p.score, Some(p.user_id));
            } else if p.score == best.0 {
                best.1 = None;
            }
        }
        best.1
    }

    fn notice(&self, seconds_remaining: u64) -> GameOverNotice {
        GameOverNotice {
            winner: self.game.winner(),
            message: GAME_OVER_MESSAGE.to_owned(),
            seconds_remaining,
        }
    }
}

fn paddle_snapshot(user_id: UserId, paddle: &Paddle) -> PaddleSnapshot {
    PaddleSnapshot {
        user_id,
        side: paddle.side,
        lane: paddle.lane,
        position: paddle.center(),
        width: paddle.width(),
        height: paddle.height(),
    }
}
