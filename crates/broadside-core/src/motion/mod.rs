//! Projectile motion models.
//!
//! Every model is a pure state transition:
//!
//! ```text
//! (MovementState, MovementContext, dt) -> MovementState
//! ```
//!
//! No model keeps hidden state between calls; everything a projectile
//! remembers lives in its [`MovementState`]. The context is read-only and
//! never refers to the projectile being advanced.
//!
//! Guided models progress through [`FlightPhase`]s in order. A phase may be
//! skipped but never revisited.

mod ballistic;
mod guided;
mod torpedo;

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::GuidanceTuning;
use crate::error::ConfigError;
use crate::predictor::Predictor;
use crate::steering::{facing, rotate_towards, FORWARD};
use crate::target::TargetState;

/// Flight phase of a guided munition, ordered by progression.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlightPhase {
    /// Climbing vertically out of the launcher.
    #[default]
    Launch = 0,
    /// Holding altitude (or depth) while closing on the target.
    Cruise = 1,
    /// Proportional-navigation homing.
    Terminal = 2,
}

impl FlightPhase {
    /// Integer index of the phase.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// Per-weapon guidance parameters carried by each projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightParams {
    /// Constant flight speed.
    pub speed: f32,
    /// Cruise altitude, or running depth for torpedoes.
    pub cruise_height: f32,
    /// Range at which terminal homing begins.
    pub terminal_distance: f32,
    /// Altitude the launch phase must reach.
    pub launch_height: f32,
    /// Heading change limit in degrees per second.
    pub turn_rate: f32,
}

/// Kinematic state of one projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    /// Current position.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Velocity change over the last step. Diagnostic only; no model reads it.
    pub acceleration: Vec3,
    /// Body orientation; forward is [`FORWARD`].
    pub orientation: Quat,
    /// Seconds since launch.
    pub time_alive: f32,
    /// Current flight phase.
    pub phase: FlightPhase,
    /// Guidance parameters.
    pub params: FlightParams,
}

impl MovementState {
    /// State of a projectile leaving the muzzle.
    #[must_use]
    pub fn launched(position: Vec3, velocity: Vec3, params: FlightParams, phase: FlightPhase) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vec3::ZERO,
            orientation: facing(velocity, Quat::IDENTITY),
            time_alive: 0.0,
            phase,
            params,
        }
    }

    /// Unit travel direction, falling back to the orientation's forward axis
    /// when the velocity is zero.
    #[must_use]
    pub fn heading(&self) -> Vec3 {
        self.velocity
            .try_normalize()
            .unwrap_or_else(|| (self.orientation * FORWARD).normalize_or_zero())
    }
}

/// Position and velocity of the target at the start of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    /// Position.
    pub position: Vec3,
    /// Velocity.
    pub velocity: Vec3,
}

impl From<&TargetState> for TargetSnapshot {
    fn from(state: &TargetState) -> Self {
        Self {
            position: state.position,
            velocity: state.velocity,
        }
    }
}

/// Read-only inputs for one step.
#[derive(Debug, Clone, Copy)]
pub struct MovementContext<'a> {
    /// Gravity acceleration vector.
    pub gravity: Vec3,
    /// Target snapshot, if the projectile has a living target.
    pub target: Option<TargetSnapshot>,
    /// Precomputed target predictor.
    pub predictor: Option<&'a Predictor>,
    /// Guidance constants.
    pub tuning: GuidanceTuning,
}

impl<'a> MovementContext<'a> {
    /// Context with gravity only.
    #[must_use]
    pub fn unguided(gravity: Vec3) -> Self {
        Self {
            gravity,
            target: None,
            predictor: None,
            tuning: GuidanceTuning::default(),
        }
    }

    /// Adds a tracked target.
    #[must_use]
    pub fn with_target(mut self, target: TargetSnapshot, predictor: Option<&'a Predictor>) -> Self {
        self.target = Some(target);
        self.predictor = predictor;
        self
    }

    /// Replaces the guidance constants.
    #[must_use]
    pub fn with_tuning(mut self, tuning: GuidanceTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Point to steer at: the predicted position at the straight-line time of
    /// arrival, or the snapshot position without a predictor.
    fn aim_point(&self, from: Vec3, speed: f32) -> Option<Vec3> {
        let target = self.target?;
        Some(match self.predictor {
            Some(predictor) if speed > f32::EPSILON => predictor.position(from.distance(target.position) / speed),
            _ => target.position,
        })
    }
}

/// Closed set of projectile motion models.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModel {
    /// Unguided shell under gravity.
    #[default]
    Ballistic,
    /// Launch, cruise and terminal-homing missile.
    GuidedMissile,
    /// Depth-keeping homing torpedo.
    Torpedo,
}

impl MotionModel {
    /// Authored name of the model.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ballistic => "ballistic",
            Self::GuidedMissile => "guided_missile",
            Self::Torpedo => "torpedo",
        }
    }

    /// Resolves an authored name, falling back to [`MotionModel::Ballistic`]
    /// with a warning for unknown names.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(model = name, "unknown motion model, falling back to ballistic");
            Self::Ballistic
        })
    }

    /// Phase a freshly fired projectile starts in.
    #[must_use]
    pub const fn initial_phase(self) -> FlightPhase {
        match self {
            Self::Ballistic | Self::GuidedMissile => FlightPhase::Launch,
            Self::Torpedo => FlightPhase::Cruise,
        }
    }

    /// True for models that steer toward a target.
    #[must_use]
    pub const fn is_guided(self) -> bool {
        !matches!(self, Self::Ballistic)
    }

    /// Advances `state` by `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` returns the state unchanged.
    #[must_use]
    pub fn advance(self, state: &MovementState, context: &MovementContext<'_>, dt: f32) -> MovementState {
        if !(dt.is_finite() && dt > 0.0) {
            return *state;
        }
        match self {
            Self::Ballistic => ballistic::advance(state, context, dt),
            Self::GuidedMissile => guided::advance(state, context, dt),
            Self::Torpedo => torpedo::advance(state, context, dt),
        }
    }
}

impl FromStr for MotionModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ballistic" => Ok(Self::Ballistic),
            "guided_missile" | "guided" | "missile" => Ok(Self::GuidedMissile),
            "torpedo" => Ok(Self::Torpedo),
            _ => Err(ConfigError::UnknownMotionModel(s.to_string())),
        }
    }
}

impl fmt::Display for MotionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Turns toward `desired` within the step's turn budget, then flies the new
/// heading at constant speed.
fn steer(state: &MovementState, desired: Vec3, phase: FlightPhase, dt: f32) -> MovementState {
    let heading = state.heading();
    let max_turn = state.params.turn_rate.max(0.0).to_radians() * dt;
    let new_heading = match (heading.length_squared() > f32::EPSILON, desired.try_normalize()) {
        (true, Some(desired)) => rotate_towards(heading, desired, max_turn),
        (false, Some(desired)) => desired,
        (_, None) => heading,
    };
    let velocity = new_heading * state.params.speed.max(0.0);
    MovementState {
        position: state.position + velocity * dt,
        velocity,
        acceleration: (velocity - state.velocity) / dt,
        orientation: facing(velocity, state.orientation),
        time_alive: state.time_alive + dt,
        phase,
        params: state.params,
    }
}

/// Proportional-navigation lateral acceleration, capped at
/// `speed * turn_rate`.
fn proportional_navigation(
    position: Vec3,
    velocity: Vec3,
    target: TargetSnapshot,
    params: &FlightParams,
    navigation_constant: f32,
) -> Vec3 {
    let range = target.position - position;
    let range_sq = range.length_squared();
    if range_sq <= f32::EPSILON {
        return Vec3::ZERO;
    }
    let closing = target.velocity - velocity;
    let los_rate = range.cross(closing) / range_sq;
    let limit = params.speed.max(0.0) * params.turn_rate.max(0.0).to_radians();
    (navigation_constant * closing.cross(los_rate)).clamp_length_max(limit)
}

/// Direction that moves `horizontal` while changing height by `vertical`
/// within one step of length `step`.
fn blend_vertical(horizontal: Vec3, vertical: f32, step: f32) -> Vec3 {
    let vertical = vertical.clamp(-step, step);
    let run = (step * step - vertical * vertical).max(0.0).sqrt();
    let blended = horizontal * run + Vec3::Y * vertical;
    blended.try_normalize().unwrap_or(horizontal)
}

/// Horizontal component of `v`, normalized, if it has one.
fn flatten(v: Vec3) -> Option<Vec3> {
    Vec3::new(v.x, 0.0, v.z).try_normalize()
}
