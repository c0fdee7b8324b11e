//! Unguided shell: explicit Euler gravity step.

use super::{MovementContext, MovementState};
use crate::steering::facing;

pub(super) fn advance(state: &MovementState, context: &MovementContext<'_>, dt: f32) -> MovementState {
    let velocity = state.velocity + context.gravity * dt;
    MovementState {
        position: state.position + state.velocity * dt,
        velocity,
        acceleration: context.gravity,
        orientation: facing(velocity, state.orientation),
        time_alive: state.time_alive + dt,
        phase: state.phase,
        params: state.params,
    }
}
