//! Identity and classification of trackable entities.
//!
//! The index never owns simulation entities. It stores a [`Trackable`]
//! record per registered entity (identity, faction, capability and liveness)
//! next to the last position it was notified of.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a trackable entity.
///
/// Ids are ordered by their numeric value; query results are sorted by id so
/// that iteration order never depends on hash-map layout.
///
/// # Example
///
/// ```
/// use shoal::EntityId;
///
/// let a = EntityId::new(1);
/// let b = EntityId::new(2);
/// assert!(a < b);
/// assert_eq!(b.as_u64(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Faction tag. Two entities are hostile when their teams differ.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Team(pub u8);

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

bitflags! {
    /// Capability classification of a trackable entity.
    ///
    /// Weapons carry a mask of the classes they may engage; an entity is a
    /// candidate when its capability intersects that mask.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Capability: u8 {
        /// Surface vessel.
        const SURFACE = 1 << 0;
        /// Aircraft.
        const AIR = 1 << 1;
        /// Submarine or running torpedo.
        const SUBSURFACE = 1 << 2;
        /// Self-guided munition in flight (missiles).
        const GUIDED_MUNITION = 1 << 3;
        /// Unguided shell in flight.
        const BALLISTIC = 1 << 4;
    }
}

/// Index-side record of a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trackable {
    /// Entity identity.
    pub id: EntityId,
    /// Faction.
    pub team: Team,
    /// Classification for capability masks.
    pub capability: Capability,
    /// Dead entities stay registered until removed but never match queries.
    pub alive: bool,
}

impl Trackable {
    /// Creates a live trackable record.
    #[must_use]
    pub fn new(id: EntityId, team: Team, capability: Capability) -> Self {
        Self {
            id,
            team,
            capability,
            alive: true,
        }
    }
}
