//! Fixed-timestep engagement loop.
//!
//! The `Simulation` owns the spatial index, the bodies (ships, aircraft and
//! other platforms), the weapon mounts and the projectiles in flight, and
//! advances them through four phases per tick:
//!
//! 1. **WEAPONS**: every mount runs fire control in parallel against a frozen
//!    view of the world; outputs are collected in weapon order
//! 2. **FIRE**: shots spawn projectiles, beam damage is applied
//! 3. **PROJECTILES**: every projectile in flight advances with its motion
//!    model, reading the target snapshots from the start of the tick
//! 4. **COMMIT**: bodies integrate, then every position, liveness, spawn and
//!    removal is written to the index in one batch
//!
//! Queries made during tick N therefore always see the positions committed at
//! the end of tick N-1.
//!
//! # Determinism
//!
//! - Bodies and projectiles live in `BTreeMap`s and are visited in id order
//! - Parallel phases collect into order-preserving vectors
//! - The only randomness (initial cooldown stagger) comes from a seeded
//!   `ChaCha8Rng`
//!
//! # Example
//!
//! ```
//! use broadside_core::config::SimulationConfig;
//! use broadside_core::profile::WeaponProfile;
//! use broadside_core::simulation::Simulation;
//! use broadside_core::shoal::{Capability, Team};
//! use glam::{Quat, Vec3};
//!
//! let config = SimulationConfig { initial_cooldown_jitter: 0.0, ..SimulationConfig::default() };
//! let mut sim = Simulation::new(config).unwrap();
//! let frigate = sim.spawn_body(Team(1), Capability::SURFACE, Vec3::ZERO, Vec3::ZERO, 100.0);
//! sim.spawn_body(Team(2), Capability::SURFACE, Vec3::new(0.0, 0.0, 800.0), Vec3::ZERO, 100.0);
//!
//! let mut gun = WeaponProfile::projectile("deck_gun", 400.0, 2000.0, 1.0);
//! gun.can_rotate = false;
//! sim.add_weapon(frigate, gun, Vec3::ZERO, Quat::IDENTITY).unwrap();
//!
//! let report = sim.step();
//! assert_eq!(report.fired.len(), 1);
//! assert_eq!(sim.projectiles().count(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shoal::{Capability, EntityId, SpatialIndex, Team, Trackable};

use crate::config::SimulationConfig;
use crate::error::ConfigError;
use crate::fire_control::{FireControlContext, WeaponController};
use crate::motion::{MotionModel, MovementContext, MovementState, TargetSnapshot};
use crate::output::{FireControlOutput, FireEvent, ProjectileOutcome, WeaponId};
use crate::predictor::Predictor;
use crate::profile::WeaponProfile;
use crate::target::{PursuitInfo, TargetSource, TargetState};

// =============================================================================
// World entities
// =============================================================================

/// A platform: ship, aircraft, submarine or static installation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Identity.
    pub id: EntityId,
    /// Faction.
    pub team: Team,
    /// Classification.
    pub capability: Capability,
    /// Position committed at the end of the last tick.
    pub position: Vec3,
    /// Velocity.
    pub velocity: Vec3,
    /// Acceleration.
    pub acceleration: Vec3,
    /// Remaining health.
    pub health: f32,
    /// False once destroyed.
    pub alive: bool,
}

impl Body {
    fn target_state(&self) -> TargetState {
        TargetState {
            id: self.id,
            position: self.position,
            velocity: self.velocity,
            acceleration: self.acceleration,
            team: self.team,
            capability: self.capability,
            alive: self.alive,
            pursuit: None,
        }
    }
}

/// A munition in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Identity.
    pub id: EntityId,
    /// Weapon that fired it.
    pub weapon: WeaponId,
    /// Faction of the firing weapon.
    pub team: Team,
    /// Target it was fired at.
    pub target: Option<EntityId>,
    /// Motion model.
    pub model: MotionModel,
    /// Kinematic state.
    pub state: MovementState,
    /// Seconds before it expires.
    pub lifetime: f32,
    /// Gravity acting on it.
    pub gravity: Vec3,
    /// Damage on hit.
    pub damage: f32,
}

impl Projectile {
    /// Capability class other weapons see.
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self.model {
            MotionModel::Ballistic => Capability::BALLISTIC,
            MotionModel::GuidedMissile => Capability::GUIDED_MUNITION | Capability::AIR,
            MotionModel::Torpedo => Capability::GUIDED_MUNITION | Capability::SUBSURFACE,
        }
    }

    fn target_state(&self) -> TargetState {
        TargetState {
            id: self.id,
            position: self.state.position,
            velocity: self.state.velocity,
            acceleration: self.state.acceleration,
            team: self.team,
            capability: self.capability(),
            alive: true,
            pursuit: None,
        }
    }
}

/// Weapon controller plus its mounting offset on the owner.
#[derive(Debug, Clone)]
struct Mount {
    controller: WeaponController,
    offset: Vec3,
}

/// Read-only view over bodies and projectiles.
#[derive(Clone, Copy)]
struct WorldView<'a> {
    bodies: &'a BTreeMap<EntityId, Body>,
    projectiles: &'a BTreeMap<EntityId, Projectile>,
}

impl WorldView<'_> {
    fn base_state(&self, id: EntityId) -> Option<TargetState> {
        self.bodies
            .get(&id)
            .map(Body::target_state)
            .or_else(|| self.projectiles.get(&id).map(Projectile::target_state))
    }
}

impl TargetSource for WorldView<'_> {
    fn target_state(&self, id: EntityId) -> Option<TargetState> {
        if let Some(body) = self.bodies.get(&id) {
            return Some(body.target_state());
        }
        let projectile = self.projectiles.get(&id)?;
        let mut state = projectile.target_state();
        if projectile.model.is_guided() {
            state.pursuit = projectile
                .target
                .and_then(|t| self.base_state(t))
                .filter(|t| t.alive)
                .map(|t| PursuitInfo {
                    target_position: t.position,
                    target_velocity: t.velocity,
                    turn_rate: projectile.state.params.turn_rate,
                });
        }
        Some(state)
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick number that produced this report.
    pub tick: u64,
    /// Shots fired, in weapon order.
    pub fired: Vec<FireEvent>,
    /// Projectiles spawned by those shots, in the same order.
    pub spawned: Vec<EntityId>,
    /// Beam lock, damage and break events.
    pub beam_events: Vec<FireControlOutput>,
    /// Projectile fates decided this tick or reported since the last one.
    pub outcomes: Vec<ProjectileOutcome>,
    /// Bodies destroyed this tick.
    pub destroyed: Vec<EntityId>,
}

/// Index mutation deferred to the commit phase.
#[derive(Debug, Clone, Copy)]
enum IndexUpdate {
    Register(Trackable, Vec3),
    Move(EntityId, Vec3),
    Unregister(EntityId),
}

// =============================================================================
// Simulation
// =============================================================================

/// Deterministic fire-control simulation.
pub struct Simulation {
    config: SimulationConfig,
    index: SpatialIndex,
    bodies: BTreeMap<EntityId, Body>,
    projectiles: BTreeMap<EntityId, Projectile>,
    mounts: Vec<Mount>,
    rng: ChaCha8Rng,
    next_entity: u64,
    tick: u64,
    pending_outcomes: Vec<ProjectileOutcome>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("bodies", &self.bodies.len())
            .field("projectiles", &self.projectiles.len())
            .field("weapons", &self.mounts.len())
            .field("seed", &self.config.seed)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration field.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let index = SpatialIndex::new(config.grid)?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            index,
            bodies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            mounts: Vec::new(),
            rng,
            next_entity: 1,
            tick: 0,
            pending_outcomes: Vec::new(),
        })
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity += 1;
        id
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Adds a platform and registers it with the index immediately.
    pub fn spawn_body(
        &mut self,
        team: Team,
        capability: Capability,
        position: Vec3,
        velocity: Vec3,
        health: f32,
    ) -> EntityId {
        let id = self.allocate_id();
        self.bodies.insert(
            id,
            Body {
                id,
                team,
                capability,
                position,
                velocity,
                acceleration: Vec3::ZERO,
                health,
                alive: true,
            },
        );
        self.index.register(Trackable::new(id, team, capability), position);
        id
    }

    /// Mounts a weapon on `owner` at `offset` from its position.
    ///
    /// The weapon's fire-rate budget starts at a random value in
    /// `[0, jitter * cooldown]`. Returns `None` if `owner` is not a body.
    pub fn add_weapon(
        &mut self,
        owner: EntityId,
        profile: WeaponProfile,
        offset: Vec3,
        orientation: Quat,
    ) -> Option<WeaponId> {
        let body = self.bodies.get(&owner)?;
        #[allow(clippy::cast_possible_truncation)]
        let id = WeaponId::new(self.mounts.len() as u32);
        let stagger = self.config.initial_cooldown_jitter * profile.cooldown;
        let mut controller = WeaponController::new(id, owner, body.team, profile, body.position + offset, orientation);
        if stagger > 0.0 {
            controller.set_budget(self.rng.gen_range(0.0..=stagger));
        }
        tracing::debug!(weapon = %id, owner = %owner, profile = %controller.profile().name, "weapon mounted");
        self.mounts.push(Mount { controller, offset });
        Some(id)
    }

    /// Changes a body's velocity. Returns false if the body is unknown.
    pub fn set_body_velocity(&mut self, id: EntityId, velocity: Vec3) -> bool {
        self.bodies.get_mut(&id).map(|b| b.velocity = velocity).is_some()
    }

    /// Changes a body's acceleration. Returns false if the body is unknown.
    pub fn set_body_acceleration(&mut self, id: EntityId, acceleration: Vec3) -> bool {
        self.bodies.get_mut(&id).map(|b| b.acceleration = acceleration).is_some()
    }

    // -------------------------------------------------------------------------
    // World-layer hooks
    // -------------------------------------------------------------------------

    /// Applies damage to a body; returns true if this destroyed it.
    pub fn damage_body(&mut self, id: EntityId, amount: f32) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        if !body.alive {
            return false;
        }
        body.health -= amount;
        if body.health <= 0.0 {
            self.kill_body(id)
        } else {
            false
        }
    }

    /// Marks a body destroyed. Returns false if it was unknown or already dead.
    pub fn kill_body(&mut self, id: EntityId) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) if body.alive => {
                body.alive = false;
                body.health = body.health.min(0.0);
                self.index.set_alive(id, false);
                tracing::debug!(body = %id, tick = self.tick, "body destroyed");
                true
            }
            _ => false,
        }
    }

    /// Collision hook: `projectile` struck `target`.
    ///
    /// Removes the projectile and applies its damage. A struck projectile is
    /// destroyed outright. Returns `None` if `projectile` is not in flight.
    pub fn report_hit(&mut self, projectile: EntityId, target: EntityId) -> Option<ProjectileOutcome> {
        let shot = self.projectiles.remove(&projectile)?;
        self.index.unregister(projectile);
        let outcome = ProjectileOutcome::Hit {
            projectile,
            target,
            damage: shot.damage,
        };
        if self.bodies.contains_key(&target) {
            self.damage_body(target, shot.damage);
        } else if self.projectiles.remove(&target).is_some() {
            self.index.unregister(target);
            self.pending_outcomes.push(ProjectileOutcome::Intercepted {
                projectile: target,
                by: shot.weapon,
            });
        }
        tracing::debug!(%projectile, %target, damage = shot.damage, "hit");
        Some(outcome)
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Advances the world by one fixed step.
    pub fn step(&mut self) -> TickReport {
        let dt = self.config.dt;
        let mut report = TickReport {
            tick: self.tick,
            outcomes: std::mem::take(&mut self.pending_outcomes),
            ..TickReport::default()
        };
        let mut updates = Vec::new();

        // PHASE 1: WEAPONS
        let outputs = self.run_weapons(dt);

        // PHASE 2: FIRE
        let mut spawned = Vec::new();
        for output in outputs {
            match output {
                FireControlOutput::Fire(event) => {
                    if let Some(projectile) = self.launch(&event) {
                        report.spawned.push(projectile.id);
                        spawned.push(projectile);
                    }
                    report.fired.push(event);
                }
                FireControlOutput::BeamDamage { weapon, target, amount } => {
                    self.apply_beam(weapon, target, amount, &mut report, &mut updates);
                    report.beam_events.push(output);
                }
                FireControlOutput::BeamStarted { .. } | FireControlOutput::BeamBroken { .. } => {
                    report.beam_events.push(output);
                }
            }
        }

        // PHASE 3: PROJECTILES
        self.advance_projectiles(dt, &mut report, &mut updates);
        for projectile in spawned {
            let trackable = Trackable::new(projectile.id, projectile.team, projectile.capability());
            updates.push(IndexUpdate::Register(trackable, projectile.state.position));
            self.projectiles.insert(projectile.id, projectile);
        }

        // PHASE 4: COMMIT
        for body in self.bodies.values_mut() {
            if !body.alive {
                continue;
            }
            body.position += body.velocity * dt;
            body.velocity += body.acceleration * dt;
            updates.push(IndexUpdate::Move(body.id, body.position));
        }
        self.commit(updates);

        self.tick += 1;
        report
    }

    fn run_weapons(&mut self, dt: f32) -> Vec<FireControlOutput> {
        for mount in &mut self.mounts {
            if let Some(body) = self.bodies.get(&mount.controller.owner()) {
                mount.controller.set_position(body.position + mount.offset);
            }
        }

        let view = WorldView {
            bodies: &self.bodies,
            projectiles: &self.projectiles,
        };
        let ctx = FireControlContext::new(&self.index, &view, &self.config);
        let bodies = &self.bodies;
        let mut per_weapon: Vec<(WeaponId, Vec<FireControlOutput>)> = self
            .mounts
            .par_iter_mut()
            .filter(|m| bodies.get(&m.controller.owner()).is_some_and(|b| b.alive))
            .map(|m| (m.controller.id(), m.controller.tick(&ctx, dt)))
            .collect();
        per_weapon.sort_by_key(|(id, _)| *id);
        per_weapon.into_iter().flat_map(|(_, outputs)| outputs).collect()
    }

    fn launch(&mut self, event: &FireEvent) -> Option<Projectile> {
        let mount = self.mounts.get(event.weapon.as_u32() as usize)?;
        let controller = &mount.controller;
        let profile = controller.profile();
        let model = controller.motion();
        let team = controller.team();
        let scale = self.config.world_scale;
        let params = profile.flight_params(model, scale);
        let lifetime = profile.projectile_lifetime(scale, self.config.projectile_lifetime_factor);
        let gravity = Vec3::NEG_Y * profile.gravity(self.config.gravity);
        let damage = profile.damage;

        let projectile = Projectile {
            id: self.allocate_id(),
            weapon: event.weapon,
            team,
            target: Some(event.target),
            model,
            state: MovementState::launched(event.origin, event.velocity, params, model.initial_phase()),
            lifetime,
            gravity,
            damage,
        };
        tracing::trace!(projectile = %projectile.id, weapon = %event.weapon, target = %event.target, "launched");
        Some(projectile)
    }

    fn apply_beam(
        &mut self,
        weapon: WeaponId,
        target: EntityId,
        amount: f32,
        report: &mut TickReport,
        updates: &mut Vec<IndexUpdate>,
    ) {
        if self.bodies.contains_key(&target) {
            if self.damage_body(target, amount) {
                report.destroyed.push(target);
            }
        } else if self.projectiles.remove(&target).is_some() {
            updates.push(IndexUpdate::Unregister(target));
            report.outcomes.push(ProjectileOutcome::Intercepted { projectile: target, by: weapon });
        }
    }

    fn advance_projectiles(&mut self, dt: f32, report: &mut TickReport, updates: &mut Vec<IndexUpdate>) {
        let view = WorldView {
            bodies: &self.bodies,
            projectiles: &self.projectiles,
        };
        let tuning = self.config.guidance;
        let advanced: Vec<(EntityId, MovementState)> = self
            .projectiles
            .par_iter()
            .map(|(id, p)| {
                let base = MovementContext::unguided(p.gravity).with_tuning(tuning);
                let target = p
                    .target
                    .filter(|_| p.model.is_guided())
                    .and_then(|t| view.target_state(t))
                    .filter(|t| t.alive);
                let next = match target {
                    Some(t) => {
                        let predictor = Predictor::for_target(&t, &tuning);
                        let ctx = base.with_target(TargetSnapshot::from(&t), Some(&predictor));
                        p.model.advance(&p.state, &ctx, dt)
                    }
                    None => p.model.advance(&p.state, &base, dt),
                };
                (*id, next)
            })
            .collect();

        for (id, next) in advanced {
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                continue;
            };
            if next.phase != projectile.state.phase {
                tracing::debug!(projectile = %id, from = ?projectile.state.phase, to = ?next.phase, "phase change");
            }
            projectile.state = next;

            let outcome = if next.time_alive > projectile.lifetime {
                Some(ProjectileOutcome::Expired { projectile: id })
            } else if projectile.model == MotionModel::Ballistic && next.position.y < 0.0 {
                Some(ProjectileOutcome::Splashed {
                    projectile: id,
                    position: next.position,
                })
            } else {
                None
            };
            match outcome {
                Some(outcome) => {
                    tracing::debug!(projectile = %id, ?outcome, "projectile finished");
                    self.projectiles.remove(&id);
                    updates.push(IndexUpdate::Unregister(id));
                    report.outcomes.push(outcome);
                }
                None => updates.push(IndexUpdate::Move(id, next.position)),
            }
        }
    }

    fn commit(&mut self, updates: Vec<IndexUpdate>) {
        for update in updates {
            match update {
                IndexUpdate::Register(trackable, position) => self.index.register(trackable, position),
                IndexUpdate::Move(id, position) => {
                    if self.index.contains(id) {
                        self.index.update_position(id, position);
                    }
                }
                IndexUpdate::Unregister(id) => {
                    self.index.unregister(id);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Number of completed ticks.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time(&self) -> f32 {
        self.tick as f32 * self.config.dt
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Spatial index as of the last commit.
    #[must_use]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// A body by id.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// All bodies in id order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    /// A projectile by id.
    #[must_use]
    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// Projectiles in flight, in id order.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    /// A weapon by id.
    #[must_use]
    pub fn weapon(&self, id: WeaponId) -> Option<&WeaponController> {
        self.mounts.get(id.as_u32() as usize).map(|m| &m.controller)
    }

    /// All weapons in id order.
    pub fn weapons(&self) -> impl Iterator<Item = &WeaponController> {
        self.mounts.iter().map(|m| &m.controller)
    }

    /// Snapshot of any body or projectile, as weapons see it.
    #[must_use]
    pub fn target_state(&self, id: EntityId) -> Option<TargetState> {
        WorldView {
            bodies: &self.bodies,
            projectiles: &self.projectiles,
        }
        .target_state(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            initial_cooldown_jitter: 0.0,
            ..SimulationConfig::default()
        }
    }

    fn fixed(profile: WeaponProfile) -> WeaponProfile {
        WeaponProfile {
            can_rotate: false,
            ..profile
        }
    }

    mod setup_tests {
        use super::*;

        #[test]
        fn invalid_config_is_rejected() {
            let config = SimulationConfig {
                dt: 0.0,
                ..SimulationConfig::default()
            };
            assert!(Simulation::new(config).is_err());
        }

        #[test]
        fn spawned_bodies_are_indexed() {
            let mut sim = Simulation::new(quiet_config()).unwrap();
            let id = sim.spawn_body(Team(1), Capability::SURFACE, Vec3::new(10.0, 0.0, 10.0), Vec3::ZERO, 50.0);
            assert!(sim.index().contains(id));
            assert_eq!(sim.body(id).unwrap().health, 50.0);
        }

        #[test]
        fn weapon_needs_an_owner() {
            let mut sim = Simulation::new(quiet_config()).unwrap();
            let gun = WeaponProfile::projectile("gun", 100.0, 1000.0, 1.0);
            assert!(sim.add_weapon(EntityId::new(99), gun, Vec3::ZERO, Quat::IDENTITY).is_none());
        }

        #[test]
        fn initial_budget_is_staggered_within_cooldown() {
            let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
            let ship = sim.spawn_body(Team(1), Capability::SURFACE, Vec3::ZERO, Vec3::ZERO, 50.0);
            for _ in 0..8 {
                let gun = WeaponProfile::projectile("gun", 100.0, 1000.0, 2.0);
                sim.add_weapon(ship, gun, Vec3::ZERO, Quat::IDENTITY).unwrap();
            }
            let budgets: Vec<f32> = sim.weapons().map(WeaponController::budget).collect();
            assert!(budgets.iter().all(|b| (0.0..=2.0).contains(b)));
            assert!(budgets.windows(2).any(|w| w[0] != w[1]));
        }

        #[test]
        fn projectiles_and_bodies_share_one_id_sequence() {
            let mut sim = Simulation::new(quiet_config()).unwrap();
            let ship = sim.spawn_body(Team(1), Capability::SURFACE, Vec3::ZERO, Vec3::ZERO, 100.0);
            sim.spawn_body(Team(2), Capability::SURFACE, Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO, 100.0);
            let mut cannon = fixed(WeaponProfile::projectile("autocannon", 1000.0, 1000.0, 0.01));
            cannon.target_mask = Capability::SURFACE;
            sim.add_weapon(ship, cannon, Vec3::ZERO, Quat::IDENTITY).unwrap();

            let first = sim.step().spawned;
            assert!(first.len() > 1);
            let late = sim.spawn_body(Team(2), Capability::SURFACE, Vec3::new(0.0, 0.0, 900.0), Vec3::ZERO, 100.0);
            let second = sim.step().spawned;

            let ids: Vec<EntityId> = first.iter().copied().chain([late]).chain(second).collect();
            assert!(ids.windows(2).all(|w| w[0] < w[1]), "{ids:?}");
            assert!(ids.iter().all(|id| sim.body(*id).is_some() != sim.projectile(*id).is_some()));
        }
    }

    mod hook_tests {
        use super::*;

        #[test]
        fn damage_destroys_at_zero_health() {
            let mut sim = Simulation::new(quiet_config()).unwrap();
            let id = sim.spawn_body(Team(1), Capability::SURFACE, Vec3::ZERO, Vec3::ZERO, 20.0);
            assert!(!sim.damage_body(id, 15.0));
            assert!(sim.damage_body(id, 15.0));
            assert!(!sim.body(id).unwrap().alive);
            assert!(!sim.index().get(id).unwrap().0.alive);
            assert!(!sim.kill_body(id));
        }

        #[test]
        fn report_hit_removes_projectile_and_damages_target() {
            let mut sim = Simulation::new(quiet_config()).unwrap();
            let ship = sim.spawn_body(Team(1), Capability::SURFACE, Vec3::ZERO, Vec3::ZERO, 100.0);
            let enemy = sim.spawn_body(Team(2), Capability::SURFACE, Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO, 100.0);
            sim.add_weapon(ship, fixed(WeaponProfile::projectile("gun", 400.0, 1000.0, 5.0)), Vec3::ZERO, Quat::IDENTITY);
            let report = sim.step();
            let shell = report.spawned[0];
            assert!(sim.index().contains(shell));

            let outcome = sim.report_hit(shell, enemy).unwrap();
            assert!(matches!(outcome, ProjectileOutcome::Hit { damage, .. } if (damage - 10.0).abs() < 1e-6));
            assert!(sim.projectile(shell).is_none());
            assert!(!sim.index().contains(shell));
            assert!((sim.body(enemy).unwrap().health - 90.0).abs() < 1e-5);
            assert!(sim.report_hit(shell, enemy).is_none());
        }

        #[test]
        fn projectile_snapshot_reports_pursuit() {
            let mut sim = Simulation::new(quiet_config()).unwrap();
            let ship = sim.spawn_body(Team(1), Capability::SURFACE, Vec3::ZERO, Vec3::ZERO, 100.0);
            let enemy = sim.spawn_body(Team(2), Capability::SURFACE, Vec3::new(0.0, 0.0, 5000.0), Vec3::X * 10.0, 100.0);
            let mut ssm = WeaponProfile::projectile("ssm", 250.0, 10_000.0, 30.0);
            ssm.vls = true;
            ssm.motion_model = "guided_missile".into();
            sim.add_weapon(ship, ssm, Vec3::ZERO, Quat::IDENTITY);
            let missile = sim.step().spawned[0];
            let state = sim.target_state(missile).unwrap();
            assert!(state.capability.contains(Capability::GUIDED_MUNITION));
            let pursuit = state.pursuit.unwrap();
            assert_eq!(pursuit.target_position, sim.body(enemy).unwrap().position);
        }
    }
}
