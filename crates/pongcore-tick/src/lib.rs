//! Fixed-interval loop scheduling for pongcore.
//!
//! Every channel runs two loops at very different cadences: the physics
//! tick (tens of milliseconds) and the lifecycle pass (about a second).
//! Both are driven by a [`TickScheduler`], configured by interval rather
//! than rate so sub-hertz loops are expressible.
//!
//! The game-over teardown uses a [`Countdown`], a bounded count of steps
//! that is safe to advance again after it expired.
//!
//! # Integration
//!
//! ```ignore
//! let mut ticks = TickScheduler::new(TickConfig::every(Duration::from_millis(16)));
//! loop {
//!     let info = ticks.wait_for_tick().await;
//!     for arena in &arenas {
//!         arena.tick().await;
//!     }
//!     ticks.record_tick_end();
//! }
//! ```

mod countdown;
mod scheduler;

pub use countdown::{Countdown, CountdownStep};
pub use scheduler::{TickConfig, TickInfo, TickPolicy, TickScheduler};
