//! Rate-limited heading helpers shared by guidance, prediction and mounts.

use glam::{Quat, Vec3};

/// Forward axis of mounts and munitions in their local frame.
pub const FORWARD: Vec3 = Vec3::Z;

/// Rotates unit vector `from` toward unit vector `to` by at most
/// `max_angle` radians.
///
/// Opposite vectors rotate about an arbitrary perpendicular axis. A
/// non-positive budget returns `from` unchanged.
#[must_use]
pub fn rotate_towards(from: Vec3, to: Vec3, max_angle: f32) -> Vec3 {
    let angle = from.angle_between(to);
    if angle <= max_angle {
        return to;
    }
    if max_angle <= 0.0 {
        return from;
    }
    let (axis, _) = Quat::from_rotation_arc(from, to).to_axis_angle();
    (Quat::from_axis_angle(axis, max_angle) * from).normalize()
}

/// Angle between two directions in degrees; zero if either is degenerate.
#[must_use]
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() <= f32::EPSILON || b.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    a.angle_between(b).to_degrees()
}

/// Orientation whose forward axis points along `direction`.
///
/// A zero direction keeps `fallback`.
#[must_use]
pub fn facing(direction: Vec3, fallback: Quat) -> Quat {
    match direction.try_normalize() {
        Some(dir) => Quat::from_rotation_arc(FORWARD, dir),
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_turn_snaps_to_target() {
        let out = rotate_towards(Vec3::X, Vec3::new(1.0, 0.01, 0.0).normalize(), 0.5);
        assert!((out - Vec3::new(1.0, 0.01, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn large_turn_is_clamped() {
        let out = rotate_towards(Vec3::X, Vec3::Z, 10f32.to_radians());
        assert!((Vec3::X.angle_between(out).to_degrees() - 10.0).abs() < 1e-3);
        // Turned toward +Z, not away from it
        assert!(out.z > 0.0);
    }

    #[test]
    fn opposite_direction_still_turns_by_budget() {
        let out = rotate_towards(Vec3::X, -Vec3::X, 0.2);
        assert!((Vec3::X.angle_between(out) - 0.2).abs() < 1e-3);
        assert!((out.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_budget_keeps_heading() {
        assert_eq!(rotate_towards(Vec3::X, Vec3::Y, 0.0), Vec3::X);
    }

    #[test]
    fn facing_points_forward_axis() {
        let q = facing(Vec3::new(0.0, 0.0, -5.0), Quat::IDENTITY);
        assert!((q * FORWARD - Vec3::NEG_Z).length() < 1e-5);
        assert_eq!(facing(Vec3::ZERO, Quat::IDENTITY), Quat::IDENTITY);
    }

    #[test]
    fn degenerate_angle_is_zero() {
        assert!(angle_between_deg(Vec3::ZERO, Vec3::X).abs() < f32::EPSILON);
        assert!((angle_between_deg(Vec3::X, Vec3::Y) - 90.0).abs() < 1e-3);
    }
}
