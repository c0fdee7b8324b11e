//! Simulation-wide configuration.
//!
//! Every tuning heuristic lives here rather than as a literal in the code
//! that uses it. All values are serde-serializable so a deployment can ship
//! them as JSON next to its weapon profiles.

use serde::{Deserialize, Serialize};
use shoal::GridConfig;

use crate::error::ConfigError;

/// Fixed timestep (1/60 second).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Standard gravity magnitude.
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Constants shared by the guidance laws and the pursuit predictor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceTuning {
    /// Proportional-navigation constant `N`.
    pub navigation_constant: f32,
    /// Minimum time in the vertical-launch phase (seconds).
    pub launch_min_time: f32,
    /// Largest altitude correction per tick while cruising (units).
    pub cruise_correction: f32,
    /// Largest depth correction per tick for torpedoes (units).
    pub depth_correction: f32,
    /// Step of the forward simulation in the pursuit predictor (seconds).
    pub pursuit_step: f32,
}

impl Default for GuidanceTuning {
    fn default() -> Self {
        Self {
            navigation_constant: 3.0,
            launch_min_time: 0.5,
            cruise_correction: 0.5,
            depth_correction: 1.0,
            pursuit_step: 0.05,
        }
    }
}

impl GuidanceTuning {
    /// Validates all fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::positive("navigation_constant", self.navigation_constant)?;
        ConfigError::non_negative("launch_min_time", self.launch_min_time)?;
        ConfigError::non_negative("cruise_correction", self.cruise_correction)?;
        ConfigError::non_negative("depth_correction", self.depth_correction)?;
        ConfigError::positive("pursuit_step", self.pursuit_step)
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Tick length in seconds.
    pub dt: f32,
    /// Spatial grid layout.
    pub grid: GridConfig,
    /// Gravity magnitude before per-weapon multipliers.
    pub gravity: f32,
    /// Multiplier applied to authored projectile speed and weapon range.
    pub world_scale: f32,
    /// Guidance constants.
    pub guidance: GuidanceTuning,
    /// A beam gives up when target angular rate times this margin exceeds
    /// the mount's rotation speed.
    pub beam_safety_margin: f32,
    /// Cooldowns below this fire once per tick and reset the budget.
    pub min_cooldown: f32,
    /// Fresh weapons start with a budget drawn from
    /// `[0, jitter * cooldown]` to desynchronize volleys. Zero disables.
    pub initial_cooldown_jitter: f32,
    /// Default projectile lifetime as a multiple of `range / speed`.
    pub projectile_lifetime_factor: f32,
    /// Seed for the simulation RNG.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: FIXED_DT,
            grid: GridConfig::default(),
            gravity: STANDARD_GRAVITY,
            world_scale: 1.0,
            guidance: GuidanceTuning::default(),
            beam_safety_margin: 1.2,
            min_cooldown: 1e-5,
            initial_cooldown_jitter: 1.0,
            projectile_lifetime_factor: 1.5,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`SimulationConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all fields.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::positive("dt", self.dt)?;
        self.grid.validate()?;
        ConfigError::non_negative("gravity", self.gravity)?;
        ConfigError::positive("world_scale", self.world_scale)?;
        self.guidance.validate()?;
        ConfigError::positive("beam_safety_margin", self.beam_safety_margin)?;
        ConfigError::non_negative("min_cooldown", self.min_cooldown)?;
        ConfigError::non_negative("initial_cooldown_jitter", self.initial_cooldown_jitter)?;
        ConfigError::positive("projectile_lifetime_factor", self.projectile_lifetime_factor)
    }
}
