//! Depth-keeping homing torpedo.
//!
//! The torpedo runs at constant speed and every heading change, vertical
//! included, is rate-limited. Homing happens in the horizontal plane. Depth
//! is held by pitching toward the running depth stored in `cruise_height`:
//! the pitch follows a braking curve that levels out as the error closes and
//! never exceeds what moves the torpedo `depth_correction` units per tick.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

use super::{flatten, proportional_navigation, FlightPhase, MovementContext, MovementState, TargetSnapshot};
use crate::steering::{facing, rotate_towards};

pub(super) fn advance(state: &MovementState, context: &MovementContext<'_>, dt: f32) -> MovementState {
    let phase = next_phase(state, context);
    let heading = state.heading();
    let current = flatten(heading)
        .or_else(|| flatten(state.orientation * Vec3::Y))
        .unwrap_or(Vec3::Z);
    let horizontal = match phase {
        FlightPhase::Terminal => terminal_heading(state, context, dt),
        _ => cruise_heading(state, context),
    }
    .unwrap_or(current);

    let speed = state.params.speed.max(0.0);
    let turn_rate = state.params.turn_rate.max(0.0).to_radians();
    let error = state.params.cruise_height - state.position.y;
    let pitch = depth_pitch(error, speed, turn_rate, context.tuning.depth_correction, dt);
    let desired = (horizontal * pitch.cos() + Vec3::Y * pitch.sin().copysign(error)).normalize_or_zero();

    let new_heading = if heading.length_squared() > f32::EPSILON {
        rotate_towards(heading, desired, turn_rate * dt)
    } else {
        desired
    };
    let velocity = new_heading * speed;
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

/// Pitch in radians toward running depth for a depth error of `error`.
///
/// Half the angle from which a full-rate pull-up still levels out at the
/// setpoint, capped so one step climbs or dives at most `correction`.
fn depth_pitch(error: f32, speed: f32, turn_rate: f32, correction: f32, dt: f32) -> f32 {
    let step = speed * dt;
    if step <= f32::EPSILON {
        return 0.0;
    }
    let max_pitch = if correction >= step {
        FRAC_PI_2
    } else {
        (correction.max(0.0) / step).asin()
    };
    (0.5 * (2.0 * turn_rate * error.abs() / speed).sqrt()).min(max_pitch)
}

fn next_phase(state: &MovementState, context: &MovementContext<'_>) -> FlightPhase {
    let close = context
        .target
        .is_some_and(|t| state.position.distance(t.position) < state.params.terminal_distance);
    match state.phase {
        FlightPhase::Launch | FlightPhase::Cruise if close => FlightPhase::Terminal,
        // Torpedoes have no climb-out
        FlightPhase::Launch => FlightPhase::Cruise,
        phase => phase,
    }
}

fn cruise_heading(state: &MovementState, context: &MovementContext<'_>) -> Option<Vec3> {
    let aim = context.aim_point(state.position, state.params.speed)?;
    flatten(aim - state.position)
}

fn terminal_heading(state: &MovementState, context: &MovementContext<'_>, dt: f32) -> Option<Vec3> {
    let target = context.target?;
    let level = |v: Vec3| Vec3::new(v.x, 0.0, v.z);
    let position = level(state.position);
    let velocity = level(state.velocity);
    let flat_target = TargetSnapshot {
        position: level(target.position),
        velocity: level(target.velocity),
    };
    let accel = proportional_navigation(
        position,
        velocity,
        flat_target,
        &state.params,
        context.tuning.navigation_constant,
    );
    flatten(velocity + accel * dt).or_else(|| flatten(flat_target.position - position))
}
