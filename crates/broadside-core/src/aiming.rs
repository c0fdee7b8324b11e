//! Aiming strategies.
//!
//! A strategy turns a target and its predictor into an aim vector: the
//! launch velocity for projectile weapons, or a unit direction for beams
//! (which have no projectile speed).

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ballistics::solve_interception;
use crate::error::ConfigError;
use crate::predictor::Predictor;
use crate::profile::WeaponProfile;

/// World parameters an aim depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimEnvironment {
    /// Base gravity magnitude (before the weapon's multiplier).
    pub gravity: f32,
    /// Multiplier on authored speed and range.
    pub world_scale: f32,
}

impl Default for AimEnvironment {
    fn default() -> Self {
        Self {
            gravity: crate::config::STANDARD_GRAVITY,
            world_scale: 1.0,
        }
    }
}

/// Closed set of aiming strategies.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AimingStrategy {
    /// Iterative gravity-aware interception.
    Ballistic,
    /// Straight at the current position.
    #[default]
    Direct,
    /// Single-pass lead on the predicted position.
    Predictive,
}

impl AimingStrategy {
    /// Authored name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ballistic => "ballistic",
            Self::Direct => "direct",
            Self::Predictive => "predictive",
        }
    }

    /// Resolves a targeting-mode name, falling back to
    /// [`AimingStrategy::Direct`] with a warning.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(mode = name, "unknown aiming strategy, falling back to direct");
            Self::Direct
        })
    }

    /// Aim vector toward `target_position`.
    ///
    /// Returns `None` when the ballistic solver finds no solution, when its
    /// predicted impact lies beyond the weapon's range, or when the geometry
    /// is degenerate (target on the muzzle).
    #[must_use]
    pub fn compute_aim_vector(
        self,
        origin: Vec3,
        profile: &WeaponProfile,
        target_position: Vec3,
        predictor: &Predictor,
        env: &AimEnvironment,
    ) -> Option<Vec3> {
        let speed = profile.scaled_speed(env.world_scale);
        let magnitude = if speed > 0.0 { speed } else { 1.0 };
        match self {
            Self::Ballistic => {
                if speed <= 0.0 {
                    return Self::Direct.compute_aim_vector(origin, profile, target_position, predictor, env);
                }
                let solution = solve_interception(origin, speed, profile.gravity(env.gravity), predictor)?;
                let range = profile.scaled_range(env.world_scale);
                (origin.distance(solution.aim_point) <= range).then_some(solution.fire_velocity)
            }
            Self::Direct => (target_position - origin).try_normalize().map(|d| d * magnitude),
            Self::Predictive => {
                if speed <= 0.0 {
                    return Self::Direct.compute_aim_vector(origin, profile, target_position, predictor, env);
                }
                let lead = predictor.position(origin.distance(target_position) / speed);
                (lead - origin).try_normalize().map(|d| d * speed)
            }
        }
    }
}

impl FromStr for AimingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ballistic" => Ok(Self::Ballistic),
            "direct" => Ok(Self::Direct),
            "predictive" | "lead" => Ok(Self::Predictive),
            _ => Err(ConfigError::UnknownAimingStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for AimingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
