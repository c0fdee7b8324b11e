//! Events emitted by fire control and the tick loop.
//!
//! Weapons never mutate the world directly. Each tick they emit
//! [`FireControlOutput`]s which the [`Simulation`](crate::simulation::Simulation)
//! applies in its fire phase. Projectile fates come back as
//! [`ProjectileOutcome`]s.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use shoal::EntityId;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a weapon mount within a simulation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeaponId(u32);

impl WeaponId {
    /// Creates a weapon id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weapon:{}", self.0)
    }
}

// =============================================================================
// Fire control
// =============================================================================

/// A single shot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    /// Firing weapon.
    pub weapon: WeaponId,
    /// Muzzle position.
    pub origin: Vec3,
    /// Launch velocity.
    pub velocity: Vec3,
    /// Target the shot was aimed at.
    pub target: EntityId,
}

/// Why a beam lock ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeamBreakReason {
    /// Target died.
    TargetDestroyed,
    /// Target no longer exists.
    TargetLost,
    /// Target left the weapon's range.
    OutOfRange,
    /// Target moves across the line of sight faster than the mount can track.
    CannotTrack,
    /// The aiming strategy found no direction to the target.
    NoSolution,
}

impl fmt::Display for BeamBreakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TargetDestroyed => "target destroyed",
            Self::TargetLost => "target lost",
            Self::OutOfRange => "out of range",
            Self::CannotTrack => "cannot track",
            Self::NoSolution => "no firing solution",
        };
        f.write_str(s)
    }
}

/// What a weapon decided this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FireControlOutput {
    /// A projectile leaves the mount.
    Fire(FireEvent),
    /// A beam locked onto a target.
    BeamStarted {
        /// Beam weapon.
        weapon: WeaponId,
        /// Locked target.
        target: EntityId,
    },
    /// Damage delivered by a held beam during this tick.
    BeamDamage {
        /// Beam weapon.
        weapon: WeaponId,
        /// Locked target.
        target: EntityId,
        /// `dps * dt`.
        amount: f32,
    },
    /// A beam lock ended.
    BeamBroken {
        /// Beam weapon.
        weapon: WeaponId,
        /// Former target.
        target: EntityId,
        /// Reason.
        reason: BeamBreakReason,
    },
}

impl FireControlOutput {
    /// Weapon that produced the output.
    #[must_use]
    pub const fn weapon(&self) -> WeaponId {
        match self {
            Self::Fire(event) => event.weapon,
            Self::BeamStarted { weapon, .. } | Self::BeamDamage { weapon, .. } | Self::BeamBroken { weapon, .. } => {
                *weapon
            }
        }
    }
}

// =============================================================================
// Projectiles
// =============================================================================

/// How a projectile's flight ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileOutcome {
    /// Collision reported by the world layer.
    Hit {
        /// Projectile entity.
        projectile: EntityId,
        /// Entity it struck.
        target: EntityId,
        /// Damage applied.
        damage: f32,
    },
    /// Unguided shell fell below the surface.
    Splashed {
        /// Projectile entity.
        projectile: EntityId,
        /// Where it entered the water.
        position: Vec3,
    },
    /// Lifetime ran out.
    Expired {
        /// Projectile entity.
        projectile: EntityId,
    },
    /// Shot down by a beam or another projectile.
    Intercepted {
        /// Projectile entity.
        projectile: EntityId,
        /// Weapon responsible.
        by: WeaponId,
    },
}

impl ProjectileOutcome {
    /// Projectile the outcome refers to.
    #[must_use]
    pub const fn projectile(&self) -> EntityId {
        match self {
            Self::Hit { projectile, .. }
            | Self::Splashed { projectile, .. }
            | Self::Expired { projectile }
            | Self::Intercepted { projectile, .. } => *projectile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_report_their_weapon() {
        let w = WeaponId::new(7);
        let fire = FireControlOutput::Fire(FireEvent {
            weapon: w,
            origin: Vec3::ZERO,
            velocity: Vec3::X,
            target: EntityId::new(1),
        });
        let broken = FireControlOutput::BeamBroken {
            weapon: w,
            target: EntityId::new(1),
            reason: BeamBreakReason::OutOfRange,
        };
        assert_eq!(fire.weapon(), w);
        assert_eq!(broken.weapon(), w);
    }

    #[test]
    fn outcomes_report_their_projectile() {
        let p = EntityId::new(100);
        assert_eq!(ProjectileOutcome::Expired { projectile: p }.projectile(), p);
        assert_eq!(
            ProjectileOutcome::Splashed {
                projectile: p,
                position: Vec3::ZERO
            }
            .projectile(),
            p
        );
    }

    #[test]
    fn break_reason_display() {
        assert_eq!(BeamBreakReason::CannotTrack.to_string(), "cannot track");
        assert_eq!(format!("{}", WeaponId::new(3)), "weapon:3");
    }
}
