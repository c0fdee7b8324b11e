//! Uniform horizontal grid bucketing trackable entities by cell.
//!
//! Entities are bucketed on the `x`/`z` plane with key
//! `(floor(x / cell_size), floor(z / cell_size))`. Register and move are
//! O(1) amortized; a range query visits the square block of cells that can
//! contain a match and then filters candidates by exact 3D distance.
//!
//! # Synchronization
//!
//! The index is not told about position changes on its own. Callers must
//! route every move through [`SpatialIndex::update_position`]; an entity
//! whose position changed without notification keeps answering queries from
//! its stale cell.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use shoal::{Capability, EntityId, GridConfig, SpatialIndex, Team, TeamFilter, Trackable};
//!
//! let mut index = SpatialIndex::new(GridConfig::new(2000.0)).unwrap();
//! let id = EntityId::new(7);
//! index.register(
//!     Trackable::new(id, Team(2), Capability::SURFACE),
//!     Vec3::new(1500.0, 0.0, 1500.0),
//! );
//!
//! let hits = index.query_range(Vec3::ZERO, 2200.0, TeamFilter::Is(Team(2)), Capability::all());
//! assert_eq!(hits, vec![id]);
//! ```

use std::collections::{BTreeSet, HashMap};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::{Capability, EntityId, Team, Trackable};
use crate::error::{ConsistencyError, GridConfigError};

/// Key of a grid cell on the horizontal plane.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    /// Cell column along `x`.
    pub x: i32,
    /// Cell row along `z`.
    pub z: i32,
}

impl CellKey {
    /// Creates a cell key.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// Grid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Edge length of a square cell in world units.
    pub cell_size: f32,
}

impl GridConfig {
    /// Creates a configuration with the given cell size.
    #[must_use]
    pub const fn new(cell_size: f32) -> Self {
        Self { cell_size }
    }

    /// Checks that the cell size is finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`GridConfigError::InvalidCellSize`] otherwise.
    pub fn validate(&self) -> Result<(), GridConfigError> {
        if self.cell_size.is_finite() && self.cell_size > 0.0 {
            Ok(())
        } else {
            Err(GridConfigError::InvalidCellSize(self.cell_size))
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new(2000.0)
    }
}

/// Which factions a query accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamFilter {
    /// Every faction.
    Any,
    /// Only entities of this team.
    Is(Team),
    /// Every team except this one (hostile lookup).
    Not(Team),
}

impl TeamFilter {
    /// Returns true if `team` passes the filter.
    #[must_use]
    pub fn accepts(self, team: Team) -> bool {
        match self {
            Self::Any => true,
            Self::Is(wanted) => team == wanted,
            Self::Not(excluded) => team != excluded,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    trackable: Trackable,
    position: Vec3,
    cell: CellKey,
}

/// Uniform-grid spatial index.
///
/// Two maps are kept in lockstep: entity → (record, position, cell) and
/// cell → entity set. An entity is present in exactly the cell its entry
/// names, and empty cells are dropped.
///
/// # Note on `HashMap` Usage
///
/// Hash iteration order never leaks out: per-cell sets are `BTreeSet`s and
/// every query result is sorted by [`EntityId`].
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    config: GridConfig,
    entries: HashMap<EntityId, Entry>,
    cells: HashMap<CellKey, BTreeSet<EntityId>>,
}

impl SpatialIndex {
    /// Creates an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`GridConfigError`] when the configuration is invalid.
    pub fn new(config: GridConfig) -> Result<Self, GridConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            entries: HashMap::new(),
            cells: HashMap::new(),
        })
    }

    /// Returns the grid configuration.
    #[must_use]
    pub fn config(&self) -> GridConfig {
        self.config
    }

    /// Returns the cell containing `position`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_for(&self, position: Vec3) -> CellKey {
        let size = self.config.cell_size;
        CellKey::new(
            (position.x / size).floor() as i32,
            (position.z / size).floor() as i32,
        )
    }

    /// Registers an entity at `position`.
    ///
    /// Registering an already-registered entity moves it and replaces its
    /// team, capability and liveness with the new record.
    pub fn register(&mut self, trackable: Trackable, position: Vec3) {
        let cell = self.cell_for(position);
        let id = trackable.id;
        if let Some(previous) = self.entries.insert(
            id,
            Entry {
                trackable,
                position,
                cell,
            },
        ) {
            if previous.cell == cell {
                return;
            }
            self.detach(id, previous.cell);
        }
        self.cells.entry(cell).or_default().insert(id);
    }

    /// Removes an entity. Returns the record if it was registered.
    pub fn unregister(&mut self, id: EntityId) -> Option<Trackable> {
        let entry = self.entries.remove(&id)?;
        self.detach(id, entry.cell);
        Some(entry.trackable)
    }

    /// Moves an entity.
    ///
    /// An unknown id is registered implicitly with neutral metadata
    /// (team 0, no capability). It matches no capability-filtered query until
    /// [`SpatialIndex::register`] supplies its real record.
    pub fn update_position(&mut self, id: EntityId, position: Vec3) {
        let new_cell = self.cell_for(position);
        let Some(entry) = self.entries.get_mut(&id) else {
            tracing::trace!(%id, "implicit register on position update");
            self.register(Trackable::new(id, Team::default(), Capability::empty()), position);
            return;
        };
        entry.position = position;
        let old_cell = entry.cell;
        if old_cell == new_cell {
            return;
        }
        entry.cell = new_cell;
        self.detach(id, old_cell);
        self.cells.entry(new_cell).or_default().insert(id);
    }

    /// Replaces an entity's record without moving it. Returns false for
    /// unknown ids.
    pub fn update_trackable(&mut self, trackable: Trackable) -> bool {
        match self.entries.get_mut(&trackable.id) {
            Some(entry) => {
                entry.trackable = trackable;
                true
            }
            None => false,
        }
    }

    /// Marks an entity alive or dead. Returns false for unknown ids.
    pub fn set_alive(&mut self, id: EntityId, alive: bool) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.trackable.alive = alive;
                true
            }
            None => false,
        }
    }

    /// Returns the record and last known position of an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<(Trackable, Vec3)> {
        self.entries.get(&id).map(|e| (e.trackable, e.position))
    }

    /// Returns the cell an entity is bucketed in.
    #[must_use]
    pub fn cell_of(&self, id: EntityId) -> Option<CellKey> {
        self.entries.get(&id).map(|e| e.cell)
    }

    /// Returns true if the entity is registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns every live entity within `radius` of `origin` that passes the
    /// team filter and whose capability intersects `mask`.
    ///
    /// Candidate cells are the square block `ceil(radius / cell_size)` cells
    /// around the origin's cell on each side; the rounding is upward so no
    /// entity within range can sit outside the block. Results are sorted by id.
    /// A negative or NaN radius matches nothing.
    #[must_use]
    pub fn query_range(
        &self,
        origin: Vec3,
        radius: f32,
        team: TeamFilter,
        mask: Capability,
    ) -> Vec<EntityId> {
        let mut results: Vec<EntityId> = self
            .candidates(origin, radius)
            .into_iter()
            .filter(|id| self.matches(*id, origin, radius, team, mask))
            .collect();
        results.sort_unstable();
        results
    }

    /// Returns the closest match of [`SpatialIndex::query_range`], ties broken
    /// by lowest id.
    #[must_use]
    pub fn nearest(
        &self,
        origin: Vec3,
        radius: f32,
        team: TeamFilter,
        mask: Capability,
    ) -> Option<EntityId> {
        self.query_range(origin, radius, team, mask)
            .into_iter()
            .filter_map(|id| self.entries.get(&id).map(|e| (id, origin.distance_squared(e.position))))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Verifies that both maps agree.
    ///
    /// # Errors
    ///
    /// Returns the first disagreement found.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        for (id, entry) in &self.entries {
            if entry.cell != self.cell_for(entry.position) {
                return Err(ConsistencyError::WrongCell {
                    id: *id,
                    recorded: entry.cell,
                });
            }
            let present = self.cells.get(&entry.cell).is_some_and(|set| set.contains(id));
            if !present {
                return Err(ConsistencyError::MissingFromCell {
                    id: *id,
                    cell: entry.cell,
                });
            }
        }
        let mut bucketed = 0;
        for (cell, ids) in &self.cells {
            if ids.is_empty() {
                return Err(ConsistencyError::EmptyCell(*cell));
            }
            for id in ids {
                match self.entries.get(id) {
                    Some(entry) if entry.cell == *cell => bucketed += 1,
                    _ => {
                        return Err(ConsistencyError::StrayEntry { id: *id, cell: *cell });
                    }
                }
            }
        }
        if bucketed == self.entries.len() {
            Ok(())
        } else {
            Err(ConsistencyError::CountMismatch {
                entries: self.entries.len(),
                bucketed,
            })
        }
    }

    fn detach(&mut self, id: EntityId, cell: CellKey) {
        if let Some(set) = self.cells.get_mut(&cell) {
            set.remove(&id);
            if set.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn candidates(&self, origin: Vec3, radius: f32) -> Vec<EntityId> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let center = self.cell_for(origin);
        let reach = f64::from(radius / self.config.cell_size).ceil();
        let span = 2.0 * reach + 1.0;

        // A block wider than the occupied cell count is cheaper to cover by
        // walking occupied cells and keeping those inside it.
        if !reach.is_finite() || span * span > self.cells.len() as f64 {
            return self
                .cells
                .iter()
                .filter(|(key, _)| {
                    // Saturated keys at opposite extremes differ by more than i32::MAX
                    (i64::from(key.x) - i64::from(center.x)).abs() as f64 <= reach
                        && (i64::from(key.z) - i64::from(center.z)).abs() as f64 <= reach
                })
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect();
        }

        let reach = reach as i64;
        let mut out = Vec::new();
        for dx in -reach..=reach {
            let Ok(x) = i32::try_from(i64::from(center.x) + dx) else {
                continue;
            };
            for dz in -reach..=reach {
                let Ok(z) = i32::try_from(i64::from(center.z) + dz) else {
                    continue;
                };
                if let Some(ids) = self.cells.get(&CellKey::new(x, z)) {
                    out.extend(ids.iter().copied());
                }
            }
        }
        out
    }

    fn matches(&self, id: EntityId, origin: Vec3, radius: f32, team: TeamFilter, mask: Capability) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        let t = entry.trackable;
        t.alive
            && team.accepts(t.team)
            && t.capability.intersects(mask)
            && origin.distance_squared(entry.position) <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn index(cell_size: f32) -> SpatialIndex {
        SpatialIndex::new(GridConfig::new(cell_size)).unwrap()
    }

    fn ship(id: u64, team: u8) -> Trackable {
        Trackable::new(EntityId::new(id), Team(team), Capability::SURFACE)
    }

    mod config_tests {
        use super::*;

        #[test]
        fn rejects_non_positive_cell_size() {
            assert!(SpatialIndex::new(GridConfig::new(0.0)).is_err());
            assert!(SpatialIndex::new(GridConfig::new(-5.0)).is_err());
            assert!(SpatialIndex::new(GridConfig::new(f32::NAN)).is_err());
        }

        #[test]
        fn cell_key_floors_negative_coordinates() {
            let idx = index(100.0);
            assert_eq!(idx.cell_for(Vec3::new(-1.0, 50.0, 150.0)), CellKey::new(-1, 1));
            assert_eq!(idx.cell_for(Vec3::new(99.9, 0.0, 0.0)), CellKey::new(0, 0));
        }
    }

    mod registration_tests {
        use super::*;

        #[test]
        fn register_places_entity_in_one_cell() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::new(150.0, 0.0, 250.0));
            assert_eq!(idx.cell_of(EntityId::new(1)), Some(CellKey::new(1, 2)));
            assert_eq!(idx.len(), 1);
            assert_eq!(idx.cell_count(), 1);
            idx.check_consistency().unwrap();
        }

        #[test]
        fn reregister_is_a_move() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::new(10.0, 0.0, 10.0));
            idx.register(ship(1, 3), Vec3::new(510.0, 0.0, 10.0));
            assert_eq!(idx.len(), 1);
            assert_eq!(idx.cell_count(), 1);
            assert_eq!(idx.cell_of(EntityId::new(1)), Some(CellKey::new(5, 0)));
            assert_eq!(idx.get(EntityId::new(1)).unwrap().0.team, Team(3));
            idx.check_consistency().unwrap();
        }

        #[test]
        fn update_position_moves_between_cells() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::ZERO);
            idx.update_position(EntityId::new(1), Vec3::new(-250.0, 0.0, 0.0));
            assert_eq!(idx.cell_of(EntityId::new(1)), Some(CellKey::new(-3, 0)));
            assert_eq!(idx.cell_count(), 1);
            idx.check_consistency().unwrap();
        }

        #[test]
        fn update_position_of_unknown_entity_registers_it() {
            let mut idx = index(100.0);
            idx.update_position(EntityId::new(9), Vec3::new(5.0, 0.0, 5.0));
            assert!(idx.contains(EntityId::new(9)));
            idx.check_consistency().unwrap();
        }

        #[test]
        fn implicit_register_is_invisible_until_record_supplied() {
            let mut idx = index(100.0);
            let id = EntityId::new(9);
            idx.update_position(id, Vec3::new(5.0, 0.0, 5.0));
            assert!(idx.query_range(Vec3::ZERO, 50.0, TeamFilter::Any, Capability::all()).is_empty());

            assert!(idx.update_trackable(Trackable::new(id, Team(2), Capability::AIR)));
            assert_eq!(idx.query_range(Vec3::ZERO, 50.0, TeamFilter::Any, Capability::AIR), vec![id]);
            assert!(!idx.update_trackable(Trackable::new(EntityId::new(10), Team(2), Capability::AIR)));
        }

        #[test]
        fn unregister_drops_empty_cell() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::ZERO);
            assert!(idx.unregister(EntityId::new(1)).is_some());
            assert!(idx.is_empty());
            assert_eq!(idx.cell_count(), 0);
            assert!(idx.unregister(EntityId::new(1)).is_none());
        }

        #[test]
        fn set_alive_on_unknown_returns_false() {
            let mut idx = index(100.0);
            assert!(!idx.set_alive(EntityId::new(3), false));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn extreme_coordinates_do_not_overflow_cell_distance() {
            let mut idx = index(100.0);
            let far = Vec3::new(3.0e38, 0.0, -3.0e38);
            idx.register(ship(1, 2), far);
            idx.register(ship(2, 2), Vec3::new(0.0, 0.0, 0.0));

            let from = Vec3::new(-3.0e38, 0.0, 3.0e38);
            assert!(idx.query_range(from, 1000.0, TeamFilter::Any, Capability::all()).is_empty());
            assert_eq!(
                idx.query_range(far, 1000.0, TeamFilter::Any, Capability::all()),
                vec![EntityId::new(1)]
            );
            assert_eq!(idx.query_range(from, f32::INFINITY, TeamFilter::Any, Capability::all()).len(), 2);
        }

        #[test]
        fn finds_diagonal_entity_across_cells() {
            let mut idx = index(2000.0);
            idx.register(ship(1, 2), Vec3::new(1500.0, 0.0, 1500.0));
            let near = idx.query_range(Vec3::ZERO, 2200.0, TeamFilter::Is(Team(2)), Capability::all());
            assert_eq!(near, vec![EntityId::new(1)]);
            let far = idx.query_range(Vec3::ZERO, 1000.0, TeamFilter::Is(Team(2)), Capability::all());
            assert!(far.is_empty());
        }

        #[test]
        fn filters_by_team() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::new(10.0, 0.0, 0.0));
            idx.register(ship(2, 2), Vec3::new(20.0, 0.0, 0.0));
            let hostile = idx.query_range(Vec3::ZERO, 50.0, TeamFilter::Not(Team(1)), Capability::all());
            assert_eq!(hostile, vec![EntityId::new(2)]);
            let all = idx.query_range(Vec3::ZERO, 50.0, TeamFilter::Any, Capability::all());
            assert_eq!(all, vec![EntityId::new(1), EntityId::new(2)]);
        }

        #[test]
        fn filters_by_capability_and_liveness() {
            let mut idx = index(100.0);
            idx.register(ship(1, 2), Vec3::new(10.0, 0.0, 0.0));
            idx.register(
                Trackable::new(EntityId::new(2), Team(2), Capability::GUIDED_MUNITION),
                Vec3::new(0.0, 30.0, 0.0),
            );
            let missiles =
                idx.query_range(Vec3::ZERO, 50.0, TeamFilter::Any, Capability::GUIDED_MUNITION);
            assert_eq!(missiles, vec![EntityId::new(2)]);

            idx.set_alive(EntityId::new(2), false);
            let missiles =
                idx.query_range(Vec3::ZERO, 50.0, TeamFilter::Any, Capability::GUIDED_MUNITION);
            assert!(missiles.is_empty());
        }

        #[test]
        fn distance_is_three_dimensional() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::new(0.0, 80.0, 0.0));
            assert!(idx.query_range(Vec3::ZERO, 50.0, TeamFilter::Any, Capability::all()).is_empty());
            assert_eq!(idx.query_range(Vec3::ZERO, 80.0, TeamFilter::Any, Capability::all()).len(), 1);
        }

        #[test]
        fn negative_or_nan_radius_is_empty() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::ZERO);
            assert!(idx.query_range(Vec3::ZERO, -1.0, TeamFilter::Any, Capability::all()).is_empty());
            assert!(idx.query_range(Vec3::ZERO, f32::NAN, TeamFilter::Any, Capability::all()).is_empty());
        }

        #[test]
        fn zero_radius_matches_coincident_entity() {
            let mut idx = index(100.0);
            idx.register(ship(1, 1), Vec3::new(5.0, 0.0, 5.0));
            let hits = idx.query_range(Vec3::new(5.0, 0.0, 5.0), 0.0, TeamFilter::Any, Capability::all());
            assert_eq!(hits, vec![EntityId::new(1)]);
        }

        #[test]
        fn huge_radius_covers_everything() {
            let mut idx = index(10.0);
            for i in 0..20 {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f32 * 1000.0;
                idx.register(ship(i, 1), Vec3::new(x, 0.0, -x));
            }
            let hits = idx.query_range(Vec3::ZERO, f32::INFINITY, TeamFilter::Any, Capability::all());
            assert_eq!(hits.len(), 20);
        }

        #[test]
        fn nearest_prefers_closest_then_lowest_id() {
            let mut idx = index(100.0);
            idx.register(ship(5, 2), Vec3::new(30.0, 0.0, 0.0));
            idx.register(ship(3, 2), Vec3::new(-30.0, 0.0, 0.0));
            idx.register(ship(4, 2), Vec3::new(60.0, 0.0, 0.0));
            let hit = idx.nearest(Vec3::ZERO, 100.0, TeamFilter::Not(Team(1)), Capability::all());
            assert_eq!(hit, Some(EntityId::new(3)));
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register(u64, f32, f32),
        Move(u64, f32, f32),
        Unregister(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let coord = -5000.0f32..5000.0;
        prop_oneof![
            (0u64..16, coord.clone(), coord.clone()).prop_map(|(i, x, z)| Op::Register(i, x, z)),
            (0u64..16, coord.clone(), coord).prop_map(|(i, x, z)| Op::Move(i, x, z)),
            (0u64..16).prop_map(Op::Unregister),
        ]
    }

    proptest! {
        #[test]
        fn query_never_misses_entity_in_range(
            cell_size in 1.0f32..3000.0,
            ex in -10_000.0f32..10_000.0,
            ez in -10_000.0f32..10_000.0,
            ox in -10_000.0f32..10_000.0,
            oz in -10_000.0f32..10_000.0,
            radius in 0.0f32..8000.0,
        ) {
            let mut idx = index(cell_size);
            let id = EntityId::new(1);
            idx.register(ship(1, 4), Vec3::new(ox, 0.0, oz));
            idx.update_position(id, Vec3::new(ex, 0.0, ez));

            let origin = Vec3::new(ox, 0.0, oz);
            let target = Vec3::new(ex, 0.0, ez);
            let found = idx.query_range(origin, radius, TeamFilter::Is(Team(4)), Capability::SURFACE);
            if origin.distance_squared(target) <= radius * radius {
                prop_assert_eq!(found, vec![id]);
            } else {
                prop_assert!(found.is_empty());
            }
        }

        #[test]
        fn maps_stay_consistent(ops in proptest::collection::vec(op_strategy(), 1..64)) {
            let mut idx = index(500.0);
            for op in ops {
                match op {
                    Op::Register(i, x, z) => idx.register(ship(i, 1), Vec3::new(x, 0.0, z)),
                    Op::Move(i, x, z) => idx.update_position(EntityId::new(i), Vec3::new(x, 0.0, z)),
                    Op::Unregister(i) => {
                        idx.unregister(EntityId::new(i));
                    }
                }
                prop_assert!(idx.check_consistency().is_ok());
            }
        }
    }
}
