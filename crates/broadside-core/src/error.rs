//! Configuration error taxonomy.
//!
//! Only authoring-time problems are errors. Out-of-reach targets, lost
//! tracks and degenerate geometry are ordinary outcomes and are reported as
//! `Option`s or events instead.

use thiserror::Error;

use shoal::GridConfigError;

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Targeting-mode name with no matching strategy.
    #[error("unknown aiming strategy `{0}`")]
    UnknownAimingStrategy(String),
    /// Motion-model name with no matching model.
    #[error("unknown motion model `{0}`")]
    UnknownMotionModel(String),
    /// A numeric field is out of its valid range.
    #[error("invalid value for `{field}`: {value} ({expected})")]
    InvalidValue {
        /// Field name as authored.
        field: &'static str,
        /// Offending value.
        value: f32,
        /// Human-readable constraint.
        expected: &'static str,
    },
    /// Grid configuration rejected by the spatial index.
    #[error(transparent)]
    Grid(#[from] GridConfigError),
    /// Profile or config document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Checks `value > 0` and finite.
    pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidValue {
                field,
                value,
                expected: "finite and > 0",
            })
        }
    }

    /// Checks `value >= 0` and finite.
    pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::InvalidValue {
                field,
                value,
                expected: "finite and >= 0",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(ConfigError::positive("speed", 1.0).is_ok());
        assert!(ConfigError::positive("speed", 0.0).is_err());
        assert!(ConfigError::positive("speed", f32::NAN).is_err());
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert!(ConfigError::non_negative("cooldown", 0.0).is_ok());
        assert!(ConfigError::non_negative("cooldown", -0.1).is_err());
        assert!(ConfigError::non_negative("cooldown", f32::INFINITY).is_err());
    }

    #[test]
    fn messages_name_the_field() {
        let err = ConfigError::positive("rotation_speed", -2.0).unwrap_err();
        assert!(err.to_string().contains("rotation_speed"));
        let err = ConfigError::UnknownAimingStrategy("mortar".into());
        assert_eq!(err.to_string(), "unknown aiming strategy `mortar`");
    }
}
