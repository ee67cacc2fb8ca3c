//! The two moving things on the field: the ball and the paddles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bounds, PhysicsError, Position, Vector};

/// Which half of the field a paddle defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Even slots defend the left edge, odd slots the right edge.
    pub fn for_slot(slot: usize) -> Self {
        if slot % 2 == 0 { Self::Left } else { Self::Right }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Horizontal unit direction pointing *toward* this side's edge.
    pub fn toward(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Paddle movement request. Paddles only move vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

// ---------------------------------------------------------------------------
// Ball
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub position: Position,
    pub velocity: Vector,
    pub radius: f64,
}

impl Ball {
    pub fn new(position: Position, velocity: Vector, radius: f64) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }

    /// A ball at the center of `bounds` moving with `velocity`.
    pub fn centered(bounds: &Bounds, velocity: Vector, radius: f64) -> Self {
        Self::new(bounds.center(), velocity, radius)
    }

    /// Moves the ball, refusing positions that would put any part of it
    /// outside the field.
    pub fn set_position(
        &mut self,
        position: Position,
        bounds: &Bounds,
    ) -> Result<(), PhysicsError> {
        if !bounds.contains_circle(position, self.radius) {
            return Err(PhysicsError::OutOfBounds {
                x: position.x,
                y: position.y,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Back to the center with a fresh serve velocity.
    pub fn reset(&mut self, bounds: &Bounds, velocity: Vector) {
        self.position = bounds.center();
        self.velocity = velocity;
    }
}

// ---------------------------------------------------------------------------
// Paddle
// ---------------------------------------------------------------------------

/// Dimensions shared by every paddle of an arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleLayout {
    pub width: f64,
    pub height: f64,
    /// Gap between the field edge and the first lane, and between lanes.
    pub offset: f64,
    /// Distance covered by one move request.
    pub speed: f64,
}

impl Default for PaddleLayout {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 100.0,
            offset: 60.0,
            speed: 15.0,
        }
    }
}

/// An axis-aligned paddle rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    pub lane: usize,
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub speed: f64,
}

impl Paddle {
    pub fn new(
        side: Side,
        lane: usize,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        speed: f64,
    ) -> Self {
        Self {
            side,
            lane,
            top,
            bottom: top + height,
            left,
            right: left + width,
            speed,
        }
    }

    /// Places the paddle for roster slot `slot`, vertically centered.
    ///
    /// Lane 0 sits `offset` away from its edge; each further lane moves
    /// another `width + offset` toward the middle.
    pub fn for_slot(slot: usize, layout: &PaddleLayout, bounds: &Bounds) -> Self {
        let side = Side::for_slot(slot);
        let lane = slot / 2;
        let inset = layout.offset + lane as f64 * (layout.width + layout.offset);
        let left = match side {
            Side::Left => inset,
            Side::Right => bounds.width - inset - layout.width,
        };
        let top = (bounds.height - layout.height) / 2.0;
        Self::new(side, lane, left, top, layout.width, layout.height, layout.speed)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Shifts the paddle by its speed, stopping at the top/bottom walls.
    /// Returns the new center.
    pub fn move_toward(&mut self, direction: Direction, bounds: &Bounds) -> Position {
        let height = self.height();
        let delta = match direction {
            Direction::Up => -self.speed,
            Direction::Down => self.speed,
        };
        let top = (self.top + delta).min(bounds.height - height).max(0.0);
        self.top = top;
        self.bottom = top + height;
        self.center()
    }

    /// Re-centers the paddle vertically (used on rematch).
    pub fn recenter(&mut self, bounds: &Bounds) {
        let height = self.height();
        self.top = (bounds.height - height) / 2.0;
        self.bottom = self.top + height;
    }
}
