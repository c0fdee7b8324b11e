//! # Shoal
//!
//! Broad-phase spatial lookup for naval fire control.
//!
//! Shoal buckets trackable entities into a uniform grid on the horizontal
//! plane. Weapons ask it "which hostile contacts of these classes lie within
//! my range?" and get back a small, deterministically ordered candidate list:
//!
//! - **Register / move / unregister** in O(1) amortized time
//! - **Range queries** whose cost depends on local density, not world size
//! - **Filtering** by faction, liveness and [`Capability`] mask
//!
//! ## Quick Start
//!
//! ```rust
//! use glam::Vec3;
//! use shoal::{Capability, EntityId, GridConfig, SpatialIndex, Team, TeamFilter, Trackable};
//!
//! let mut index = SpatialIndex::new(GridConfig::new(500.0)).unwrap();
//! let frigate = EntityId::new(1);
//! index.register(Trackable::new(frigate, Team(1), Capability::SURFACE), Vec3::ZERO);
//! index.update_position(frigate, Vec3::new(320.0, 0.0, -40.0));
//!
//! let contacts = index.query_range(
//!     Vec3::new(0.0, 10.0, 0.0),
//!     400.0,
//!     TeamFilter::Not(Team(2)),
//!     Capability::SURFACE | Capability::AIR,
//! );
//! assert_eq!(contacts, vec![frigate]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod entity;
pub mod error;
pub mod grid;

// Re-exports for convenience
pub use entity::{Capability, EntityId, Team, Trackable};
pub use error::{ConsistencyError, GridConfigError};
pub use grid::{CellKey, GridConfig, SpatialIndex, TeamFilter};
