//! Collision detection and response.
//!
//! All functions here are pure. [`step`] is the only entry point the game
//! loop needs; the smaller pieces are public so they can be tested (and
//! reasoned about) one at a time.

use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Ball, Bounds, Paddle, PaddleLayout, PhysicsError, Position, Side, Vector};

/// How the ball leaves a paddle's striking face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Deflection {
    /// Mirror the horizontal component.
    Reflect,
    /// Outgoing angle grows with the distance between the contact point
    /// and the paddle's center, up to `max_angle` radians at the ends.
    Angle { max_angle: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub bounds: Bounds,
    pub deflection: Deflection,
    /// Speed added on every paddle hit. `0.0` keeps the speed constant.
    pub rally_speedup: f64,
}

impl PhysicsConfig {
    /// Checks that a ball of `ball_radius` and `slots` paddles fit the
    /// field: the ball can always get past a paddle on one side, and no
    /// lane reaches the center line.
    ///
    /// # Errors
    /// `PhysicsError::InvalidLayout` naming the first dimension that
    /// doesn't fit.
    pub fn validate_layout(
        &self,
        ball_radius: f64,
        paddle: &PaddleLayout,
        slots: usize,
    ) -> Result<(), PhysicsError> {
        let bounds = &self.bounds;
        let invalid = |reason: String| Err(PhysicsError::InvalidLayout(reason));

        if !(bounds.width > 0.0 && bounds.height > 0.0) {
            return invalid(format!("field {}x{} is empty", bounds.width, bounds.height));
        }
        if ball_radius.is_nan() || ball_radius <= 0.0 || 2.0 * ball_radius >= bounds.height {
            return invalid(format!(
                "ball radius {ball_radius} does not fit a field {} high",
                bounds.height
            ));
        }
        if !(paddle.width > 0.0 && paddle.height > 0.0) {
            return invalid(format!("paddle {}x{} is empty", paddle.width, paddle.height));
        }
        // A centered paddle must leave a ball-sized gap above or below it.
        if paddle.height + 4.0 * ball_radius > bounds.height {
            return invalid(format!(
                "paddle height {} leaves no room for a ball of radius {ball_radius}",
                paddle.height
            ));
        }
        if let Some(last) = slots.checked_sub(1) {
            let lane = last / 2;
            let inner_edge =
                paddle.offset + lane as f64 * (paddle.width + paddle.offset) + paddle.width;
            if inner_edge > bounds.width / 2.0 {
                return invalid(format!(
                    "lane {lane} crosses the center line of a field {} wide",
                    bounds.width
                ));
            }
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            deflection: Deflection::Angle {
                max_angle: FRAC_PI_4,
            },
            rally_speedup: 0.0,
        }
    }
}

/// The side of a paddle rectangle the ball touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddleFace {
    Top,
    Bottom,
    Left,
    Right,
}

impl PaddleFace {
    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// `true` for the left/right faces (collision along the x axis).
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// What happened during one [`step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepEvent {
    Moved,
    PaddleHit { paddle: usize, face: PaddleFace },
    WallBounce,
    /// The ball reached the edge defended by `conceded`.
    Score { conceded: Side },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub ball: Ball,
    pub event: StepEvent,
}

/// Closest point of the paddle rectangle to `center`.
pub fn closest_point(center: Position, paddle: &Paddle) -> Position {
    Position::new(
        center.x.max(paddle.left).min(paddle.right),
        center.y.max(paddle.top).min(paddle.bottom),
    )
}

/// A ball overlaps a paddle iff its center is strictly closer than
/// `radius` to the paddle rectangle.
pub fn is_collision(center: Position, radius: f64, paddle: &Paddle) -> bool {
    center.distance_to(closest_point(center, paddle)) < radius
}

/// Which face of `paddle` a ball centered at `center` hit.
///
/// The axis with the larger distance to the closest point wins; an exact
/// tie picks the horizontal axis (left/right). A center inside the
/// rectangle compares its offsets from the paddle center, normalized by
/// the half extents, with the same tie rule.
pub fn resolve_side(center: Position, paddle: &Paddle) -> PaddleFace {
    let closest = closest_point(center, paddle);
    let dx = center.x - closest.x;
    let dy = center.y - closest.y;
    if dx != 0.0 || dy != 0.0 {
        return face_from(dx, dy);
    }

    let mid = paddle.center();
    let half_w = paddle.width() / 2.0;
    let half_h = paddle.height() / 2.0;
    let nx = if half_w > 0.0 { (center.x - mid.x) / half_w } else { 0.0 };
    let ny = if half_h > 0.0 { (center.y - mid.y) / half_h } else { 0.0 };
    face_from(nx, ny)
}

fn face_from(dx: f64, dy: f64) -> PaddleFace {
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 { PaddleFace::Right } else { PaddleFace::Left }
    } else if dy > 0.0 {
        PaddleFace::Bottom
    } else {
        PaddleFace::Top
    }
}

/// Moves the ball just outside `face`, touching the paddle.
///
/// Only the collision-axis coordinate is replaced. If that spot is off the
/// field (paddle hugging a wall) the opposite face is used instead. Returns
/// the new center and the face actually used.
pub fn push_out(
    center: Position,
    radius: f64,
    paddle: &Paddle,
    face: PaddleFace,
    bounds: &Bounds,
) -> (Position, PaddleFace) {
    let base = bounds.clamp_circle(center, radius);

    let candidate = pushed(base, radius, paddle, face);
    if bounds.contains_circle(candidate, radius) {
        return (candidate, face);
    }
    let fallback = pushed(base, radius, paddle, face.opposite());
    if bounds.contains_circle(fallback, radius) {
        return (fallback, face.opposite());
    }
    // Only reachable with a paddle that fails `PhysicsConfig::validate_layout`.
    (bounds.clamp_circle(candidate, radius), face)
}

fn pushed(center: Position, radius: f64, paddle: &Paddle, face: PaddleFace) -> Position {
    match face {
        PaddleFace::Top => Position::new(center.x, paddle.top - radius),
        PaddleFace::Bottom => Position::new(center.x, paddle.bottom + radius),
        PaddleFace::Left => Position::new(paddle.left - radius, center.y),
        PaddleFace::Right => Position::new(paddle.right + radius, center.y),
    }
}

/// Velocity after bouncing off `face` at `contact`.
///
/// The collision-axis component always ends up pointing away from the
/// paddle. With [`Deflection::Angle`] the striking faces (left/right)
/// instead rebuild the vector from the contact offset.
pub fn deflect(
    velocity: Vector,
    paddle: &Paddle,
    face: PaddleFace,
    contact: Position,
    radius: f64,
    config: &PhysicsConfig,
) -> Vector {
    let speedup = config.rally_speedup.max(0.0);
    let speed = velocity.magnitude() + speedup;

    if let (Deflection::Angle { max_angle }, true) = (config.deflection, face.is_horizontal()) {
        let reach = paddle.height() / 2.0 + radius;
        let norm = if reach > 0.0 {
            ((contact.y - paddle.center().y) / reach).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let dir = if face == PaddleFace::Right { 1.0 } else { -1.0 };
        return Vector::from_angle(speed, norm * max_angle, dir);
    }

    let reflected = match face {
        PaddleFace::Top => Vector::new(velocity.dx, -velocity.dy.abs()),
        PaddleFace::Bottom => Vector::new(velocity.dx, velocity.dy.abs()),
        PaddleFace::Left => Vector::new(-velocity.dx.abs(), velocity.dy),
        PaddleFace::Right => Vector::new(velocity.dx.abs(), velocity.dy),
    };
    if speedup > 0.0 {
        reflected.with_magnitude(speed)
    } else {
        reflected
    }
}

/// Advances `ball` by one tick.
///
/// The proposed position is tested against `paddles` in order; the first
/// overlap wins. Without a paddle hit, reaching the left/right edge scores
/// against that side (no bounce) and reaching the top/bottom edge reflects
/// the vertical component.
pub fn step(ball: &Ball, paddles: &[Paddle], config: &PhysicsConfig) -> StepOutcome {
    let radius = ball.radius;
    let next = ball.position.translated(ball.velocity);

    for (index, paddle) in paddles.iter().enumerate() {
        if !is_collision(next, radius, paddle) {
            continue;
        }
        let contact = closest_point(next, paddle);
        let (position, face) = push_out(
            next,
            radius,
            paddle,
            resolve_side(next, paddle),
            &config.bounds,
        );
        let velocity = deflect(ball.velocity, paddle, face, contact, radius, config);
        trace!(paddle = index, ?face, "ball hit paddle");
        return StepOutcome {
            ball: Ball::new(position, velocity, radius),
            event: StepEvent::PaddleHit {
                paddle: index,
                face,
            },
        };
    }

    let bounds = &config.bounds;
    if next.x - radius <= 0.0 || next.x + radius >= bounds.width {
        let conceded = if next.x - radius <= 0.0 {
            Side::Left
        } else {
            Side::Right
        };
        return StepOutcome {
            ball: Ball::new(bounds.clamp_circle(next, radius), ball.velocity, radius),
            event: StepEvent::Score { conceded },
        };
    }

    if next.y - radius <= 0.0 || next.y + radius >= bounds.height {
        let dy = if next.y - radius <= 0.0 {
            ball.velocity.dy.abs()
        } else {
            -ball.velocity.dy.abs()
        };
        return StepOutcome {
            ball: Ball::new(
                bounds.clamp_circle(next, radius),
                Vector::new(ball.velocity.dx, dy),
                radius,
            ),
            event: StepEvent::WallBounce,
        };
    }

    StepOutcome {
        ball: Ball::new(next, ball.velocity, radius),
        event: StepEvent::Moved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_wall_paddle() -> Paddle {
        // x in [0, 20], y in [250, 350]
        Paddle::new(Side::Left, 0, 0.0, 250.0, 20.0, 100.0, 15.0)
    }

    fn reflect_config() -> PhysicsConfig {
        PhysicsConfig {
            deflection: Deflection::Reflect,
            ..PhysicsConfig::default()
        }
    }

    // =====================================================================
    // is_collision / closest_point
    // =====================================================================

    #[test]
    fn test_is_collision_matches_distance_formula_on_grid() {
        let paddle = left_wall_paddle();
        let radius = 15.0;
        let mut x = -30.0;
        while x <= 60.0 {
            let mut y = 200.0;
            while y <= 400.0 {
                let p = Position::new(x, y);
                let c = closest_point(p, &paddle);
                let expected = ((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt() < radius;
                assert_eq!(is_collision(p, radius, &paddle), expected, "at ({x}, {y})");
                y += 2.5;
            }
            x += 2.5;
        }
    }

    #[test]
    fn test_is_collision_boundary_is_not_a_hit() {
        let paddle = left_wall_paddle();
        // Exactly one radius from the right face.
        assert!(!is_collision(Position::new(35.0, 300.0), 15.0, &paddle));
        assert!(is_collision(Position::new(34.999, 300.0), 15.0, &paddle));
        // Interior point.
        assert!(is_collision(Position::new(10.0, 300.0), 15.0, &paddle));
    }

    // =====================================================================
    // resolve_side
    // =====================================================================

    #[test]
    fn test_resolve_side_picks_dominant_axis() {
        let paddle = left_wall_paddle();
        assert_eq!(resolve_side(Position::new(30.0, 300.0), &paddle), PaddleFace::Right);
        assert_eq!(resolve_side(Position::new(10.0, 240.0), &paddle), PaddleFace::Top);
        assert_eq!(resolve_side(Position::new(10.0, 360.0), &paddle), PaddleFace::Bottom);
    }

    #[test]
    fn test_resolve_side_tie_prefers_horizontal() {
        let paddle = left_wall_paddle();
        // Corner at (20, 250): dx = 5, dy = -5.
        let p = Position::new(25.0, 245.0);
        assert_eq!(resolve_side(p, &paddle), PaddleFace::Right);
        // Same input, same answer.
        assert_eq!(resolve_side(p, &paddle), resolve_side(p, &paddle));
    }

    #[test]
    fn test_resolve_side_inside_uses_normalized_offset() {
        let paddle = left_wall_paddle();
        // Center (10, 300); half extents (10, 50).
        assert_eq!(resolve_side(Position::new(18.0, 300.0), &paddle), PaddleFace::Right);
        assert_eq!(resolve_side(Position::new(12.0, 260.0), &paddle), PaddleFace::Top);
        // 0.8 vs 0.8: horizontal wins.
        assert_eq!(resolve_side(Position::new(18.0, 260.0), &paddle), PaddleFace::Right);
    }

    // =====================================================================
    // push_out
    // =====================================================================

    #[test]
    fn test_push_out_never_penetrates_or_leaves_field() {
        let bounds = Bounds::default();
        let radius = 15.0;
        let paddles = [
            left_wall_paddle(),
            Paddle::new(Side::Left, 0, 60.0, 0.0, 20.0, 100.0, 15.0),
            Paddle::new(Side::Right, 0, 920.0, 500.0, 20.0, 100.0, 15.0),
        ];
        for paddle in &paddles {
            let mut x = paddle.left - radius;
            while x <= paddle.right + radius {
                let mut y = paddle.top - radius;
                while y <= paddle.bottom + radius {
                    let p = Position::new(x, y);
                    if is_collision(p, radius, paddle) {
                        let face = resolve_side(p, paddle);
                        let (out, _) = push_out(p, radius, paddle, face, &bounds);
                        assert!(!is_collision(out, radius, paddle), "{p:?} -> {out:?}");
                        assert!(bounds.contains_circle(out, radius), "{p:?} -> {out:?}");
                    }
                    y += 3.0;
                }
                x += 3.0;
            }
        }
    }

    #[test]
    fn test_push_out_falls_back_to_opposite_face_near_wall() {
        let bounds = Bounds::default();
        let paddle = left_wall_paddle();
        let (out, face) =
            push_out(Position::new(5.0, 300.0), 15.0, &paddle, PaddleFace::Left, &bounds);
        assert_eq!(face, PaddleFace::Right);
        assert_eq!(out, Position::new(35.0, 300.0));
    }

    // =====================================================================
    // deflect
    // =====================================================================

    #[test]
    fn test_deflect_reflect_negates_collision_axis() {
        let paddle = left_wall_paddle();
        let cfg = reflect_config();
        let v = deflect(
            Vector::new(-5.0, 5.0),
            &paddle,
            PaddleFace::Right,
            Position::new(20.0, 300.0),
            15.0,
            &cfg,
        );
        assert_eq!(v, Vector::new(5.0, 5.0));

        let v = deflect(
            Vector::new(3.0, 4.0),
            &paddle,
            PaddleFace::Top,
            Position::new(10.0, 250.0),
            15.0,
            &cfg,
        );
        assert_eq!(v, Vector::new(3.0, -4.0));
    }

    #[test]
    fn test_deflect_angle_steeper_near_edge_and_keeps_speed() {
        let paddle = left_wall_paddle();
        let cfg = PhysicsConfig::default();
        let incoming = Vector::new(-5.0, 5.0);

        let center_hit = deflect(incoming, &paddle, PaddleFace::Right, Position::new(20.0, 300.0), 15.0, &cfg);
        let edge_hit = deflect(incoming, &paddle, PaddleFace::Right, Position::new(20.0, 345.0), 15.0, &cfg);

        assert!(center_hit.dx > 0.0 && edge_hit.dx > 0.0);
        assert!(center_hit.dy.abs() < 1e-9);
        let center_angle = (center_hit.dy / center_hit.dx).atan().abs();
        let edge_angle = (edge_hit.dy / edge_hit.dx).atan().abs();
        assert!(edge_angle > center_angle);
        assert!((edge_hit.magnitude() - incoming.magnitude()).abs() < 1e-9);
    }

    #[test]
    fn test_deflect_rally_speedup_is_opt_in() {
        let paddle = left_wall_paddle();
        let cfg = PhysicsConfig {
            rally_speedup: 1.0,
            ..reflect_config()
        };
        let v = deflect(
            Vector::new(-3.0, 4.0),
            &paddle,
            PaddleFace::Right,
            Position::new(20.0, 300.0),
            15.0,
            &cfg,
        );
        assert!((v.magnitude() - 6.0).abs() < 1e-9);
        assert!(v.dx > 0.0);
    }

    // =====================================================================
    // step
    // =====================================================================

    #[test]
    fn test_step_paddle_hit_flips_dx_and_clamps_to_face() {
        // Ball approaching the paddle at x in [0, 20], y in [250, 350].
        let ball = Ball::new(Position::new(38.0, 300.0), Vector::new(-5.0, 5.0), 15.0);
        let out = step(&ball, &[left_wall_paddle()], &PhysicsConfig::default());

        assert!(matches!(
            out.event,
            StepEvent::PaddleHit { paddle: 0, face: PaddleFace::Right }
        ));
        assert_eq!(out.ball.position.x, 35.0);
        assert!(out.ball.velocity.dx > 0.0);
    }

    #[test]
    fn test_step_from_center_moves_freely() {
        let ball = Ball::new(Position::new(500.0, 300.0), Vector::new(5.0, 5.0), 15.0);
        let out = step(&ball, &[left_wall_paddle()], &PhysicsConfig::default());
        assert_eq!(out.event, StepEvent::Moved);
        assert_eq!(out.ball.position, Position::new(505.0, 305.0));
    }

    #[test]
    fn test_step_left_edge_scores_without_bounce() {
        let ball = Ball::new(Position::new(18.0, 100.0), Vector::new(-5.0, 1.0), 15.0);
        let out = step(&ball, &[], &PhysicsConfig::default());
        assert_eq!(out.event, StepEvent::Score { conceded: Side::Left });
        assert_eq!(out.ball.velocity, ball.velocity);
    }

    #[test]
    fn test_step_right_edge_scores() {
        let ball = Ball::new(Position::new(982.0, 300.0), Vector::new(5.0, 0.0), 15.0);
        let out = step(&ball, &[], &PhysicsConfig::default());
        assert_eq!(out.event, StepEvent::Score { conceded: Side::Right });
    }

    #[test]
    fn test_step_top_wall_reflects_dy() {
        let ball = Ball::new(Position::new(500.0, 17.0), Vector::new(5.0, -5.0), 15.0);
        let out = step(&ball, &[], &PhysicsConfig::default());
        assert_eq!(out.event, StepEvent::WallBounce);
        assert_eq!(out.ball.velocity, Vector::new(5.0, 5.0));
        assert!(Bounds::default().contains_circle(out.ball.position, 15.0));
    }

    #[test]
    fn test_step_is_deterministic() {
        let paddles = [left_wall_paddle()];
        let ball = Ball::new(Position::new(37.0, 262.0), Vector::new(-6.0, 2.0), 15.0);
        let cfg = PhysicsConfig::default();
        let a = step(&ball, &paddles, &cfg);
        let b = step(&ball, &paddles, &cfg);
        assert_eq!(a, b);
    }

    // =====================================================================
    // validate_layout
    // =====================================================================

    #[test]
    fn test_validate_layout_accepts_defaults() {
        let cfg = PhysicsConfig::default();
        assert_eq!(cfg.validate_layout(15.0, &PaddleLayout::default(), 4), Ok(()));
    }

    #[test]
    fn test_validate_layout_rejects_paddle_spanning_field() {
        let paddle = PaddleLayout {
            height: 600.0,
            ..PaddleLayout::default()
        };
        let err = PhysicsConfig::default()
            .validate_layout(15.0, &paddle, 2)
            .unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidLayout(_)));
    }

    #[test]
    fn test_validate_layout_rejects_oversized_ball() {
        let cfg = PhysicsConfig::default();
        assert!(cfg.validate_layout(300.0, &PaddleLayout::default(), 2).is_err());
        assert!(cfg.validate_layout(0.0, &PaddleLayout::default(), 2).is_err());
    }

    #[test]
    fn test_validate_layout_rejects_lanes_past_center() {
        let cfg = PhysicsConfig::default();
        // Lanes sit 80 apart starting at 60: lane 5 ends at 480, lane 6 at 560.
        assert!(cfg.validate_layout(15.0, &PaddleLayout::default(), 12).is_ok());
        let err = cfg
            .validate_layout(15.0, &PaddleLayout::default(), 14)
            .unwrap_err();
        assert_eq!(
            err,
            PhysicsError::InvalidLayout(
                "lane 6 crosses the center line of a field 1000 wide".into()
            )
        );
    }
}
