//! Three-phase guided missile.
//!
//! - **Launch**: climb straight up until the minimum launch time has passed
//!   and the launch height is reached.
//! - **Cruise**: hold cruise altitude with a small per-tick vertical
//!   correction while steering horizontally at the predicted target.
//! - **Terminal**: proportional navigation on the live target snapshot.
//!
//! Cruise is skipped when the target is already inside terminal distance at
//! the end of launch.

use glam::Vec3;

use super::{blend_vertical, flatten, proportional_navigation, steer, FlightPhase, MovementContext, MovementState};

pub(super) fn advance(state: &MovementState, context: &MovementContext<'_>, dt: f32) -> MovementState {
    let phase = next_phase(state, context);
    let desired = match phase {
        FlightPhase::Launch => Vec3::Y,
        FlightPhase::Cruise => cruise_heading(state, context, dt),
        FlightPhase::Terminal => terminal_heading(state, context, dt),
    };
    steer(state, desired, phase, dt)
}

fn within_terminal_distance(state: &MovementState, context: &MovementContext<'_>) -> bool {
    context
        .target
        .is_some_and(|t| state.position.distance(t.position) < state.params.terminal_distance)
}

fn next_phase(state: &MovementState, context: &MovementContext<'_>) -> FlightPhase {
    match state.phase {
        FlightPhase::Launch => {
            let climbed = state.time_alive >= context.tuning.launch_min_time
                && state.position.y >= state.params.launch_height;
            if !climbed {
                FlightPhase::Launch
            } else if within_terminal_distance(state, context) {
                FlightPhase::Terminal
            } else {
                FlightPhase::Cruise
            }
        }
        FlightPhase::Cruise if within_terminal_distance(state, context) => FlightPhase::Terminal,
        phase => phase,
    }
}

fn cruise_heading(state: &MovementState, context: &MovementContext<'_>, dt: f32) -> Vec3 {
    let heading = state.heading();
    let horizontal = context
        .aim_point(state.position, state.params.speed)
        .and_then(|aim| flatten(aim - state.position))
        .or_else(|| flatten(heading))
        .or_else(|| flatten(state.orientation * Vec3::Y))
        .unwrap_or(Vec3::Z);
    let correction = context.tuning.cruise_correction;
    let vertical = (state.params.cruise_height - state.position.y).clamp(-correction, correction);
    blend_vertical(horizontal, vertical, state.params.speed * dt)
}

fn terminal_heading(state: &MovementState, context: &MovementContext<'_>, dt: f32) -> Vec3 {
    let Some(target) = context.target else {
        return state.heading();
    };
    let accel = proportional_navigation(
        state.position,
        state.velocity,
        target,
        &state.params,
        context.tuning.navigation_constant,
    );
    (state.velocity + accel * dt)
        .try_normalize()
        .or_else(|| (target.position - state.position).try_normalize())
        .unwrap_or_else(|| state.heading())
}
