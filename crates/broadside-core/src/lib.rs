//! # Broadside Core
//!
//! Naval fire-control core for Broadside.
//!
//! This crate decides where a weapon aims, whether its shot can connect, and
//! how the munition flies afterwards. It sits on top of [`shoal`], which
//! answers the broad-phase "who is in range" question.
//!
//! ## Layers
//!
//! - **Prediction**: [`predictor`] extrapolates targets (linear, quadratic,
//!   forward-simulated pursuit)
//! - **Solving**: [`ballistics`] finds launch velocities against gravity,
//!   [`aiming`] picks a strategy per weapon
//! - **Flight**: [`motion`] holds pure per-tick state transitions for shells,
//!   guided missiles and torpedoes
//! - **Control**: [`fire_control`] runs acquisition, slewing and fire-rate
//!   accounting per mount
//! - **Orchestration**: [`simulation`] ticks the whole engagement
//!
//! ## Usage
//!
//! ```rust
//! use broadside_core::ballistics::solve_static;
//! use glam::Vec3;
//!
//! let arc = solve_static(Vec3::ZERO, Vec3::new(1000.0, 0.0, 0.0), 100.0, 9.81).unwrap();
//! assert!(arc.angle > 0.0 && arc.angle < std::f32::consts::FRAC_PI_4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export shoal for spatial queries
pub use shoal;

pub mod aiming;
pub mod ballistics;
pub mod config;
pub mod error;
pub mod fire_control;
pub mod motion;
pub mod output;
pub mod predictor;
pub mod profile;
pub mod simulation;
pub mod steering;
pub mod target;

#[cfg(test)]
mod tests;

pub use aiming::{AimEnvironment, AimingStrategy};
pub use ballistics::{solve_interception, solve_static, FiringSolution, StaticArc};
pub use config::{GuidanceTuning, SimulationConfig};
pub use error::ConfigError;
pub use fire_control::{FireControlContext, FireControlState, WeaponController};
pub use motion::{FlightParams, FlightPhase, MotionModel, MovementContext, MovementState, TargetSnapshot};
pub use output::{BeamBreakReason, FireControlOutput, FireEvent, ProjectileOutcome, WeaponId};
pub use predictor::{KinematicPredictor, Predictor, PursuitPredictor};
pub use profile::{FireMode, GuidedParams, WeaponProfile};
pub use simulation::{Body, Projectile, Simulation, TickReport};
pub use target::{PursuitInfo, TargetSource, TargetState};
