//! Error types for grid construction and consistency checks.

use thiserror::Error;

use crate::entity::EntityId;
use crate::grid::CellKey;

/// Invalid grid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GridConfigError {
    /// Cell size must be finite and strictly positive.
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),
}

/// Disagreement between the entity map and the cell map.
///
/// The index maintains both maps itself, so any of these is a bug in the
/// index rather than in a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// The recorded cell does not match the recorded position.
    #[error("entity {id} recorded in cell {recorded:?} but its position maps elsewhere")]
    WrongCell {
        /// Offending entity.
        id: EntityId,
        /// Cell stored in the entity map.
        recorded: CellKey,
    },
    /// The entity map names a cell that does not list the entity.
    #[error("entity {id} missing from its cell {cell:?}")]
    MissingFromCell {
        /// Offending entity.
        id: EntityId,
        /// Cell named by the entity map.
        cell: CellKey,
    },
    /// A cell lists an entity that is unknown or recorded elsewhere.
    #[error("cell {cell:?} lists stray entity {id}")]
    StrayEntry {
        /// Offending entity.
        id: EntityId,
        /// Cell that lists it.
        cell: CellKey,
    },
    /// An empty cell was left behind.
    #[error("empty cell {0:?} was not dropped")]
    EmptyCell(CellKey),
    /// Entity count and bucketed count differ.
    #[error("{entries} entities registered but {bucketed} bucketed")]
    CountMismatch {
        /// Entries in the entity map.
        entries: usize,
        /// Entries across all cells.
        bucketed: usize,
    },
}
