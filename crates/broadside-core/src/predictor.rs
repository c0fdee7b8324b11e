//! Target-motion predictors.
//!
//! A predictor answers "where will this point be `t` seconds from now?".
//! Three strategies exist:
//!
//! - **Linear**: constant velocity
//! - **Quadratic**: constant acceleration
//! - **AugmentedPursuit**: replays a guided munition's own pursuit law
//!   against a prediction of *its* target
//!
//! # Bounded mutual prediction
//!
//! A defender predicting a missile that is itself predicting the defender is
//! a prediction of a prediction. The nested target of a
//! [`PursuitPredictor`] is a [`KinematicPredictor`], which cannot contain
//! another pursuit, so the forward simulation is exactly one level deep.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::GuidanceTuning;
use crate::steering::rotate_towards;
use crate::target::TargetState;

/// Offsets at or below this return the start position unchanged.
pub const MIN_PREDICTION_TIME: f32 = 0.001;

/// Hard cap on forward-simulation steps for a single pursuit prediction.
pub const MAX_PURSUIT_STEPS: u32 = 2400;

/// Closed-form predictor for a point under constant velocity or acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KinematicPredictor {
    /// `start + velocity * t`
    Linear {
        /// Position at `t = 0`.
        start: Vec3,
        /// Constant velocity.
        velocity: Vec3,
    },
    /// `start + velocity * t + 0.5 * acceleration * t^2`
    Quadratic {
        /// Position at `t = 0`.
        start: Vec3,
        /// Velocity at `t = 0`.
        velocity: Vec3,
        /// Constant acceleration.
        acceleration: Vec3,
    },
}

impl KinematicPredictor {
    /// Constant-velocity predictor.
    #[must_use]
    pub const fn linear(start: Vec3, velocity: Vec3) -> Self {
        Self::Linear { start, velocity }
    }

    /// Constant-acceleration predictor.
    #[must_use]
    pub const fn quadratic(start: Vec3, velocity: Vec3, acceleration: Vec3) -> Self {
        Self::Quadratic {
            start,
            velocity,
            acceleration,
        }
    }

    /// Predicted position `t` seconds ahead.
    #[must_use]
    pub fn position(&self, t: f32) -> Vec3 {
        match *self {
            Self::Linear { start, velocity } => start + velocity * t,
            Self::Quadratic {
                start,
                velocity,
                acceleration,
            } => start + velocity * t + 0.5 * acceleration * t * t,
        }
    }

    /// Velocity at `t = 0`.
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        match *self {
            Self::Linear { velocity, .. } | Self::Quadratic { velocity, .. } => velocity,
        }
    }

    /// Velocity `t` seconds ahead.
    #[must_use]
    pub fn velocity_at(&self, t: f32) -> Vec3 {
        match *self {
            Self::Linear { velocity, .. } => velocity,
            Self::Quadratic {
                velocity,
                acceleration,
                ..
            } => velocity + acceleration * t,
        }
    }
}

/// Forward simulation of a pursuer that leads its target.
///
/// Each step the pursuer estimates time-to-impact as range over its own
/// speed, asks the nested predictor where the target will be at that time,
/// turns toward that point by at most `turn_rate * step` degrees and moves
/// on at constant speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PursuitPredictor {
    /// Pursuer position at `t = 0`.
    pub start: Vec3,
    /// Pursuer velocity at `t = 0`; its length is the constant speed.
    pub velocity: Vec3,
    /// Prediction of the pursuer's target.
    pub target: KinematicPredictor,
    /// Pursuer turn rate in degrees per second.
    pub turn_rate: f32,
    /// Forward-simulation step in seconds.
    pub step: f32,
}

impl PursuitPredictor {
    /// Creates a pursuit predictor with the given simulation step.
    #[must_use]
    pub fn new(start: Vec3, velocity: Vec3, target: KinematicPredictor, turn_rate: f32, step: f32) -> Self {
        Self {
            start,
            velocity,
            target,
            turn_rate,
            step,
        }
    }

    /// Predicted pursuer position `t` seconds ahead.
    ///
    /// Runs `ceil(t / step)` equal sub-steps (capped at
    /// [`MAX_PURSUIT_STEPS`]) so the simulated time is exactly `t`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn position(&self, t: f32) -> Vec3 {
        let speed = self.velocity.length();
        if t <= MIN_PREDICTION_TIME || speed <= f32::EPSILON || !t.is_finite() {
            return self.start;
        }
        let step = self.step.max(MIN_PREDICTION_TIME);
        let steps = ((t / step).ceil() as u32).clamp(1, MAX_PURSUIT_STEPS);
        let h = t / steps as f32;
        let max_turn = self.turn_rate.max(0.0).to_radians() * h;

        let mut position = self.start;
        let mut heading = self.velocity / speed;
        let mut elapsed = 0.0;
        for _ in 0..steps {
            let time_to_impact = position.distance(self.target.position(elapsed)) / speed;
            let aim = self.target.position(elapsed + time_to_impact);
            if let Some(desired) = (aim - position).try_normalize() {
                heading = rotate_towards(heading, desired, max_turn);
            }
            position += heading * speed * h;
            elapsed += h;
        }
        position
    }
}

/// Any predictor a weapon or munition may aim with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Predictor {
    /// Linear or quadratic closed form.
    Kinematic(KinematicPredictor),
    /// One-level forward simulation of a guided pursuer.
    AugmentedPursuit(PursuitPredictor),
}

impl Predictor {
    /// Constant-velocity predictor.
    #[must_use]
    pub const fn linear(start: Vec3, velocity: Vec3) -> Self {
        Self::Kinematic(KinematicPredictor::linear(start, velocity))
    }

    /// Constant-acceleration predictor.
    #[must_use]
    pub const fn quadratic(start: Vec3, velocity: Vec3, acceleration: Vec3) -> Self {
        Self::Kinematic(KinematicPredictor::quadratic(start, velocity, acceleration))
    }

    /// Pursuit predictor for a munition chasing `target`.
    #[must_use]
    pub fn augmented_pursuit(
        start: Vec3,
        velocity: Vec3,
        target: KinematicPredictor,
        turn_rate: f32,
        tuning: &GuidanceTuning,
    ) -> Self {
        Self::AugmentedPursuit(PursuitPredictor::new(start, velocity, target, turn_rate, tuning.pursuit_step))
    }

    /// Picks the strategy that fits what the target reports about itself.
    ///
    /// Guided munitions get a pursuit replay, accelerating bodies a quadratic
    /// fit, everything else a linear one.
    #[must_use]
    pub fn for_target(target: &TargetState, tuning: &GuidanceTuning) -> Self {
        if let Some(pursuit) = target.pursuit {
            let chased = KinematicPredictor::linear(pursuit.target_position, pursuit.target_velocity);
            return Self::augmented_pursuit(target.position, target.velocity, chased, pursuit.turn_rate, tuning);
        }
        if target.acceleration.length_squared() > f32::EPSILON {
            Self::quadratic(target.position, target.velocity, target.acceleration)
        } else {
            Self::linear(target.position, target.velocity)
        }
    }

    /// Predicted position `t` seconds ahead.
    #[must_use]
    pub fn position(&self, t: f32) -> Vec3 {
        match self {
            Self::Kinematic(k) => k.position(t),
            Self::AugmentedPursuit(p) => p.position(t),
        }
    }

    /// Velocity at `t = 0`.
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        match self {
            Self::Kinematic(k) => k.velocity(),
            Self::AugmentedPursuit(p) => p.velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal::{Capability, EntityId, Team};

    use crate::target::PursuitInfo;

    #[test]
    fn linear_extrapolates_velocity() {
        let p = Predictor::linear(Vec3::new(1.0, 2.0, 3.0), Vec3::new(10.0, 0.0, -5.0));
        assert_eq!(p.position(0.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.position(2.0), Vec3::new(21.0, 2.0, -7.0));
        assert_eq!(p.velocity(), Vec3::new(10.0, 0.0, -5.0));
    }

    #[test]
    fn quadratic_adds_half_at_squared() {
        let p = Predictor::quadratic(Vec3::ZERO, Vec3::X, Vec3::new(0.0, -2.0, 0.0));
        let at = p.position(3.0);
        assert!((at - Vec3::new(3.0, -9.0, 0.0)).length() < 1e-5);
        let k = KinematicPredictor::quadratic(Vec3::ZERO, Vec3::X, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(k.velocity_at(3.0), Vec3::new(1.0, -6.0, 0.0));
    }

    mod pursuit_tests {
        use super::*;

        fn pursuit(target: KinematicPredictor, turn_rate: f32) -> PursuitPredictor {
            PursuitPredictor::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 300.0), target, turn_rate, 0.05)
        }

        #[test]
        fn tiny_offset_returns_start() {
            let p = pursuit(KinematicPredictor::linear(Vec3::new(0.0, 0.0, 1000.0), Vec3::ZERO), 30.0);
            assert_eq!(p.position(0.0005), Vec3::ZERO);
            assert_eq!(p.position(-1.0), Vec3::ZERO);
        }

        #[test]
        fn straight_chase_moves_at_constant_speed() {
            let p = pursuit(KinematicPredictor::linear(Vec3::new(0.0, 0.0, 5000.0), Vec3::ZERO), 30.0);
            let at = p.position(2.0);
            assert!((at - Vec3::new(0.0, 0.0, 600.0)).length() < 1e-2);
        }

        #[test]
        fn turns_toward_offset_target_within_turn_rate() {
            let target = KinematicPredictor::linear(Vec3::new(2000.0, 0.0, 0.0), Vec3::ZERO);
            let slow = pursuit(target, 10.0).position(1.0);
            let fast = pursuit(target, 90.0).position(1.0);
            // A faster-turning pursuer bends further toward +X
            assert!(fast.x > slow.x);
            assert!(slow.x > 0.0);
            // Distance travelled is still speed * t along a curve
            assert!(slow.length() <= 300.0 + 1e-2);
        }

        #[test]
        fn leads_a_crossing_target() {
            // Target crosses in +X ahead of the pursuer
            let crossing = KinematicPredictor::linear(Vec3::new(0.0, 0.0, 3000.0), Vec3::new(200.0, 0.0, 0.0));
            let at = pursuit(crossing, 45.0).position(3.0);
            assert!(at.x > 0.0, "pursuer should steer toward the lead point, got {at:?}");
        }

        #[test]
        fn step_count_is_capped() {
            let p = pursuit(KinematicPredictor::linear(Vec3::new(0.0, 0.0, 1e7), Vec3::ZERO), 30.0);
            let at = p.position(10_000.0);
            assert!(at.is_finite());
        }

        #[test]
        fn stationary_pursuer_stays_put() {
            let p = PursuitPredictor::new(
                Vec3::ONE,
                Vec3::ZERO,
                KinematicPredictor::linear(Vec3::ZERO, Vec3::X),
                30.0,
                0.05,
            );
            assert_eq!(p.position(5.0), Vec3::ONE);
        }
    }

    mod selection_tests {
        use super::*;

        fn state() -> TargetState {
            TargetState::moving(EntityId::new(1), Vec3::ZERO, Vec3::X, Team(2), Capability::SURFACE)
        }

        #[test]
        fn plain_body_gets_linear() {
            let p = Predictor::for_target(&state(), &GuidanceTuning::default());
            assert!(matches!(p, Predictor::Kinematic(KinematicPredictor::Linear { .. })));
        }

        #[test]
        fn accelerating_body_gets_quadratic() {
            let mut s = state();
            s.acceleration = Vec3::new(0.0, 0.0, 2.0);
            let p = Predictor::for_target(&s, &GuidanceTuning::default());
            assert!(matches!(p, Predictor::Kinematic(KinematicPredictor::Quadratic { .. })));
        }

        #[test]
        fn guided_munition_gets_pursuit_with_linear_nested_target() {
            let mut s = state();
            s.capability = Capability::GUIDED_MUNITION;
            s.pursuit = Some(PursuitInfo {
                target_position: Vec3::new(0.0, 0.0, 1000.0),
                target_velocity: Vec3::ZERO,
                turn_rate: 20.0,
            });
            match Predictor::for_target(&s, &GuidanceTuning::default()) {
                Predictor::AugmentedPursuit(p) => {
                    assert!(matches!(p.target, KinematicPredictor::Linear { .. }));
                    assert!((p.step - 0.05).abs() < 1e-6);
                }
                other => panic!("expected pursuit predictor, got {other:?}"),
            }
        }
    }
}
