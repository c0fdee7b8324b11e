//! Iterative ballistic interception.
//!
//! Finds the launch velocity for a fixed-speed projectile under gravity so
//! that it meets a predicted moving point. Each round solves the classic
//! static-target angle equation for where the target will be at the current
//! time-of-flight estimate, then relaxes the estimate toward the flight time
//! of the solved arc.
//!
//! Only the low-arc root is used (direct fire). An out-of-reach target is an
//! ordinary answer, returned as `None`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::predictor::Predictor;

/// Maximum refinement rounds.
pub const MAX_SOLVER_ITERATIONS: u32 = 5;

/// Rounds stop once the time estimate moves by less than this (seconds).
pub const CONVERGENCE_TOLERANCE: f32 = 0.01;

/// Fraction of the time correction applied per round.
pub const TIME_DAMPING: f32 = 0.5;

/// Gravity at or below this falls back to straight-line flight.
pub const GRAVITY_EPSILON: f32 = 1e-4;

/// Horizontal offsets at or below this are treated as vertical shots.
pub const HORIZONTAL_EPSILON: f32 = 1e-3;

/// A launch that hits the predicted target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiringSolution {
    /// Initial projectile velocity.
    pub fire_velocity: Vec3,
    /// Flight time of the solved arc (seconds).
    pub impact_time: f32,
    /// Elevation above the horizontal (radians).
    pub launch_angle: f32,
    /// Predicted target position the arc was solved for.
    pub aim_point: Vec3,
    /// False when the round budget ran out before the time estimate settled.
    pub converged: bool,
}

/// Solved arc toward a static point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticArc {
    /// Launch velocity.
    pub velocity: Vec3,
    /// Time of flight.
    pub flight_time: f32,
    /// Elevation (radians).
    pub angle: f32,
}

/// Low-arc launch toward a stationary point.
///
/// Returns `None` when the point is out of reach (negative discriminant or a
/// NaN angle). Without gravity, or for a point straight above or below the
/// origin, flight is a straight line at `speed`.
#[must_use]
pub fn solve_static(origin: Vec3, target: Vec3, speed: f32, gravity: f32) -> Option<StaticArc> {
    let delta = target - origin;
    let horizontal = Vec3::new(delta.x, 0.0, delta.z);
    let x = horizontal.length();
    let y = delta.y;

    if gravity <= GRAVITY_EPSILON || x <= HORIZONTAL_EPSILON {
        let dir = delta.try_normalize().unwrap_or(Vec3::Y);
        if gravity > GRAVITY_EPSILON && y > 0.0 && speed * speed < 2.0 * gravity * y {
            return None;
        }
        return Some(StaticArc {
            velocity: dir * speed,
            flight_time: delta.length() / speed,
            angle: dir.y.clamp(-1.0, 1.0).asin(),
        });
    }

    let v2 = speed * speed;
    let discriminant = v2 * v2 - gravity * (gravity * x * x + 2.0 * y * v2);
    if discriminant < 0.0 {
        return None;
    }
    let angle = ((v2 - discriminant.sqrt()) / (gravity * x)).atan();
    if angle.is_nan() {
        return None;
    }

    let (sin, cos) = angle.sin_cos();
    let heading = horizontal / x;
    Some(StaticArc {
        velocity: heading * (speed * cos) + Vec3::Y * (speed * sin),
        flight_time: x / (speed * cos),
        angle,
    })
}

/// Solves for a launch velocity that intercepts `predictor`.
///
/// Seeds the time of flight with straight-line distance over speed, then runs
/// up to [`MAX_SOLVER_ITERATIONS`] damped refinements. If the budget runs out
/// before convergence the last solution is returned with
/// `converged == false`.
#[must_use]
pub fn solve_interception(
    origin: Vec3,
    speed: f32,
    gravity: f32,
    predictor: &Predictor,
) -> Option<FiringSolution> {
    if !(speed.is_finite() && speed > 0.0) {
        return None;
    }
    let mut t = origin.distance(predictor.position(0.0)) / speed;
    let mut solution = None;

    for _ in 0..MAX_SOLVER_ITERATIONS {
        let aim_point = predictor.position(t);
        let arc = solve_static(origin, aim_point, speed, gravity)?;
        let correction = arc.flight_time - t;
        let converged = correction.abs() < CONVERGENCE_TOLERANCE;
        solution = Some(FiringSolution {
            fire_velocity: arc.velocity,
            impact_time: arc.flight_time,
            launch_angle: arc.angle,
            aim_point,
            converged,
        });
        if converged {
            break;
        }
        t += TIME_DAMPING * correction;
    }
    solution
}
