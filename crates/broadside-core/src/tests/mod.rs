//! Crate-level scenario tests.
//!
//! - `determinism.rs`: same seed and inputs give identical tick reports
//! - `integration.rs`: reference scenarios and full engagements
//! - `helpers.rs`: scenario setup shared by both

mod helpers;

pub use helpers::*;
