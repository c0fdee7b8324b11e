//! Authored weapon profiles.
//!
//! A [`WeaponProfile`] is immutable content: it describes a weapon type, not
//! an instance. Profiles are usually loaded from JSON; every field except the
//! name and the core ballistics has a default.
//!
//! # Example
//!
//! ```
//! use broadside_core::profile::{FireMode, WeaponProfile};
//!
//! let gun = WeaponProfile::from_json(r#"{
//!     "name": "deck_gun",
//!     "projectile_speed": 800.0,
//!     "range": 12000.0,
//!     "cooldown": 2.5,
//!     "targeting_mode": "ballistic"
//! }"#).unwrap();
//! assert_eq!(gun.fire_mode, FireMode::Projectile);
//! assert!(gun.can_rotate);
//! ```

use serde::{Deserialize, Serialize};
use shoal::Capability;

use crate::aiming::AimingStrategy;
use crate::error::ConfigError;
use crate::motion::{FlightParams, MotionModel};

/// How a weapon delivers damage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FireMode {
    /// Spawns a projectile per shot.
    #[default]
    Projectile,
    /// Continuous beam dealing damage per second while locked.
    Beam {
        /// Damage per second.
        dps: f32,
    },
}

/// Guidance parameters for missiles and torpedoes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidedParams {
    /// Cruise altitude, or running depth for torpedoes.
    pub cruise_height: f32,
    /// Range at which terminal homing begins.
    pub terminal_distance: f32,
    /// Altitude the launch phase must reach.
    pub launch_height: f32,
    /// Turn rate in degrees per second.
    pub turn_rate: f32,
}

impl Default for GuidedParams {
    fn default() -> Self {
        Self {
            cruise_height: 20.0,
            terminal_distance: 1000.0,
            launch_height: 30.0,
            turn_rate: 45.0,
        }
    }
}

fn default_gravity_multiplier() -> f32 {
    1.0
}

fn default_targeting_mode() -> String {
    "direct".to_string()
}

fn default_motion_model() -> String {
    MotionModel::Ballistic.name().to_string()
}

fn default_rotation_speed() -> f32 {
    90.0
}

fn default_angular_tolerance() -> f32 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_target_mask() -> Capability {
    Capability::all()
}

fn default_damage() -> f32 {
    10.0
}

/// Immutable description of a weapon type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Content name.
    pub name: String,
    /// Muzzle speed before world scaling. Unused by beams.
    #[serde(default)]
    pub projectile_speed: f32,
    /// Engagement range before world scaling.
    pub range: f32,
    /// Multiplier on simulation gravity for this weapon's projectiles.
    #[serde(default = "default_gravity_multiplier")]
    pub gravity_multiplier: f32,
    /// Mount slew rate in degrees per second.
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,
    /// Optional slew acceleration in degrees per second squared. Without it
    /// the mount slews at full rate immediately.
    #[serde(default)]
    pub rotation_acceleration: Option<f32>,
    /// Alignment tolerance in degrees.
    #[serde(default = "default_angular_tolerance")]
    pub angular_tolerance: f32,
    /// Seconds between shots.
    pub cooldown: f32,
    /// Aiming strategy name.
    #[serde(default = "default_targeting_mode")]
    pub targeting_mode: String,
    /// Projectile motion model name.
    #[serde(default = "default_motion_model")]
    pub motion_model: String,
    /// Projectile or beam.
    #[serde(default)]
    pub fire_mode: FireMode,
    /// Guidance parameters; defaults apply when a guided model has none.
    #[serde(default)]
    pub guided: Option<GuidedParams>,
    /// False for fixed mounts.
    #[serde(default = "default_true")]
    pub can_rotate: bool,
    /// Vertical launch cell; never rotates.
    #[serde(default)]
    pub vls: bool,
    /// Target classes this weapon may engage.
    #[serde(default = "default_target_mask")]
    pub target_mask: Capability,
    /// Projectile lifetime in seconds; derived from range and speed if absent.
    #[serde(default)]
    pub lifetime: Option<f32>,
    /// Damage dealt by one projectile hit.
    #[serde(default = "default_damage")]
    pub damage: f32,
}

impl WeaponProfile {
    /// Minimal projectile weapon with defaults for everything else.
    #[must_use]
    pub fn projectile(name: impl Into<String>, projectile_speed: f32, range: f32, cooldown: f32) -> Self {
        Self {
            name: name.into(),
            projectile_speed,
            range,
            gravity_multiplier: default_gravity_multiplier(),
            rotation_speed: default_rotation_speed(),
            rotation_acceleration: None,
            angular_tolerance: default_angular_tolerance(),
            cooldown,
            targeting_mode: default_targeting_mode(),
            motion_model: default_motion_model(),
            fire_mode: FireMode::Projectile,
            guided: None,
            can_rotate: true,
            vls: false,
            target_mask: default_target_mask(),
            lifetime: None,
            damage: default_damage(),
        }
    }

    /// Minimal beam weapon.
    #[must_use]
    pub fn beam(name: impl Into<String>, range: f32, dps: f32, cooldown: f32) -> Self {
        Self {
            fire_mode: FireMode::Beam { dps },
            ..Self::projectile(name, 0.0, range, cooldown)
        }
    }

    /// Parses and validates a profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or the first
    /// validation failure.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Checks numeric ranges and names.
    ///
    /// Names are checked strictly here; the runtime path resolves unknown
    /// names leniently.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.fire_mode {
            FireMode::Projectile => ConfigError::positive("projectile_speed", self.projectile_speed)?,
            FireMode::Beam { dps } => ConfigError::positive("dps", dps)?,
        }
        ConfigError::positive("range", self.range)?;
        ConfigError::non_negative("gravity_multiplier", self.gravity_multiplier)?;
        ConfigError::non_negative("rotation_speed", self.rotation_speed)?;
        if let Some(accel) = self.rotation_acceleration {
            ConfigError::positive("rotation_acceleration", accel)?;
        }
        ConfigError::positive("angular_tolerance", self.angular_tolerance)?;
        ConfigError::non_negative("cooldown", self.cooldown)?;
        if let Some(lifetime) = self.lifetime {
            ConfigError::positive("lifetime", lifetime)?;
        }
        ConfigError::non_negative("damage", self.damage)?;
        if let Some(guided) = &self.guided {
            ConfigError::non_negative("terminal_distance", guided.terminal_distance)?;
            ConfigError::non_negative("turn_rate", guided.turn_rate)?;
        }
        self.targeting_mode.parse::<AimingStrategy>()?;
        self.motion_model.parse::<MotionModel>()?;
        Ok(())
    }

    /// True if the mount can slew toward its aim.
    #[must_use]
    pub fn rotates(&self) -> bool {
        self.can_rotate && !self.vls
    }

    /// True for beam weapons.
    #[must_use]
    pub fn is_beam(&self) -> bool {
        matches!(self.fire_mode, FireMode::Beam { .. })
    }

    /// Muzzle speed in world units.
    #[must_use]
    pub fn scaled_speed(&self, world_scale: f32) -> f32 {
        self.projectile_speed * world_scale
    }

    /// Engagement range in world units.
    #[must_use]
    pub fn scaled_range(&self, world_scale: f32) -> f32 {
        self.range * world_scale
    }

    /// Gravity magnitude for this weapon's projectiles.
    #[must_use]
    pub fn gravity(&self, base: f32) -> f32 {
        base * self.gravity_multiplier
    }

    /// Seconds a projectile lives before expiring.
    #[must_use]
    pub fn projectile_lifetime(&self, world_scale: f32, factor: f32) -> f32 {
        self.lifetime.unwrap_or_else(|| {
            let speed = self.scaled_speed(world_scale);
            if speed > 0.0 {
                self.scaled_range(world_scale) / speed * factor
            } else {
                0.0
            }
        })
    }

    /// Per-projectile guidance block.
    ///
    /// Guided models without authored parameters get [`GuidedParams`]
    /// defaults and a warning.
    #[must_use]
    pub fn flight_params(&self, model: MotionModel, world_scale: f32) -> FlightParams {
        let guided = match self.guided {
            Some(guided) => guided,
            None => {
                if model.is_guided() {
                    tracing::warn!(
                        weapon = %self.name,
                        model = %model,
                        "guided model without guidance parameters, using defaults"
                    );
                }
                GuidedParams::default()
            }
        };
        FlightParams {
            speed: self.scaled_speed(world_scale),
            cruise_height: guided.cruise_height,
            terminal_distance: guided.terminal_distance * world_scale,
            launch_height: guided.launch_height,
            turn_rate: guided.turn_rate,
        }
    }
}
