//! Ball and paddle physics for pongcore.
//!
//! Everything in this crate is synchronous and deterministic: the same
//! ball, paddles and [`PhysicsConfig`] always produce the same
//! [`StepOutcome`]. The arena layer owns the entities and calls
//! [`step`] once per tick.
//!
//! # Key types
//!
//! - [`Position`], [`Vector`], [`Bounds`]: coordinate math (y grows downward)
//! - [`Ball`], [`Paddle`]: the two moving entities
//! - [`step`]: advance the ball by one tick and report what it hit

mod collision;
mod entities;
mod error;
mod geometry;

pub use collision::{
    Deflection, PaddleFace, PhysicsConfig, StepEvent, StepOutcome, closest_point, deflect,
    is_collision, push_out, resolve_side, step,
};
pub use entities::{Ball, Direction, Paddle, PaddleLayout, Side};
pub use error::PhysicsError;
pub use geometry::{Bounds, Position, Vector};
