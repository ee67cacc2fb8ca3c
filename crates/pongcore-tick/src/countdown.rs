//! Bounded countdown used for the game-over teardown.

use std::time::Duration;

/// Result of one [`Countdown::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    Running { remaining: Duration },
    Expired,
}

/// Counts `total` down in fixed `step`s.
///
/// Advancing an expired countdown keeps returning
/// [`CountdownStep::Expired`], so a retried step can't fire the expiry
/// side effects twice unless the caller ignores that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total: Duration,
    step: Duration,
    remaining: Duration,
}

impl Countdown {
    /// A zero `step` is treated as `total` (expire on the first advance).
    pub fn new(total: Duration, step: Duration) -> Self {
        let step = if step.is_zero() { total } else { step };
        Self {
            total,
            step,
            remaining: total,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whole seconds left, rounded up, for display.
    pub fn remaining_secs(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 { secs + 1 } else { secs }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn advance(&mut self) -> CountdownStep {
        if self.is_expired() {
            return CountdownStep::Expired;
        }
        self.remaining = self.remaining.saturating_sub(self.step);
        if self.remaining.is_zero() {
            CountdownStep::Expired
        } else {
            CountdownStep::Running {
                remaining: self.remaining,
            }
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.total;
    }
}
