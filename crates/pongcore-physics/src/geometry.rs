//! Coordinate and velocity primitives.

use serde::{Deserialize, Serialize};

/// A point on the field. The origin is the top-left corner and `y` grows
/// downward, so a paddle's `top` is numerically smaller than its `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position moved by one step of `velocity`.
    pub fn translated(self, velocity: Vector) -> Self {
        Self::new(self.x + velocity.dx, self.y + velocity.dy)
    }

    pub fn distance_to(self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A velocity, in field units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Builds a vector of length `speed` at `angle` radians from the
    /// horizontal. `dir` is `1.0` for rightward travel, `-1.0` for leftward.
    pub fn from_angle(speed: f64, angle: f64, dir: f64) -> Self {
        Self::new(speed * angle.cos() * dir, speed * angle.sin())
    }

    pub fn magnitude(self) -> f64 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Rescales to the given length. A zero vector stays zero.
    pub fn with_magnitude(self, speed: f64) -> Self {
        let current = self.magnitude();
        if current == 0.0 {
            return self;
        }
        let k = speed / current;
        Self::new(self.dx * k, self.dy * k)
    }

    pub fn scaled(self, k: f64) -> Self {
        Self::new(self.dx * k, self.dy * k)
    }
}

/// The rectangular playing field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
        }
    }
}

impl Bounds {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    /// Returns `true` if a circle of `radius` centered at `position` lies
    /// entirely inside the field (touching an edge counts as inside).
    pub fn contains_circle(&self, position: Position, radius: f64) -> bool {
        position.x >= radius
            && position.x <= self.width - radius
            && position.y >= radius
            && position.y <= self.height - radius
    }

    /// Moves `position` the minimum distance needed to fit a circle of
    /// `radius` inside the field.
    pub fn clamp_circle(&self, position: Position, radius: f64) -> Position {
        Position::new(
            position.x.min(self.width - radius).max(radius),
            position.y.min(self.height - radius).max(radius),
        )
    }
}
