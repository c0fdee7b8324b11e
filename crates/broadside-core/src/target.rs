//! The fire-control core's view of a target.
//!
//! The world layer owns entities; the core only reads [`TargetState`]
//! snapshots through the [`TargetSource`] trait.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use shoal::{Capability, EntityId, Team};

/// What a guided munition is chasing, as reported by the munition itself.
///
/// Lets a defending weapon replay the munition's own pursuit law when
/// predicting where it will be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PursuitInfo {
    /// Position of the munition's target.
    pub target_position: Vec3,
    /// Velocity of the munition's target.
    pub target_velocity: Vec3,
    /// Munition turn rate in degrees per second.
    pub turn_rate: f32,
}

/// Read-only kinematic snapshot of a potential target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    /// Identity.
    pub id: EntityId,
    /// Current position.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Current acceleration (zero for constant-velocity bodies).
    pub acceleration: Vec3,
    /// Faction.
    pub team: Team,
    /// Classification.
    pub capability: Capability,
    /// Dead targets are never engaged.
    pub alive: bool,
    /// Present when the target is itself a guided munition.
    pub pursuit: Option<PursuitInfo>,
}

impl TargetState {
    /// Snapshot of a body moving at constant velocity.
    #[must_use]
    pub fn moving(id: EntityId, position: Vec3, velocity: Vec3, team: Team, capability: Capability) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vec3::ZERO,
            team,
            capability,
            alive: true,
            pursuit: None,
        }
    }
}

/// Lookup of target snapshots by id.
///
/// Implementations must be safe to share across the parallel weapon phase.
pub trait TargetSource: Sync {
    /// Returns the snapshot of `id`, or `None` if the entity no longer exists.
    fn target_state(&self, id: EntityId) -> Option<TargetState>;
}

impl TargetSource for BTreeMap<EntityId, TargetState> {
    fn target_state(&self, id: EntityId) -> Option<TargetState> {
        self.get(&id).copied()
    }
}
