//! The per-weapon fire-control loop.
//!
//! A [`WeaponController`] is one weapon mount. Each tick it:
//!
//! 1. re-validates its held target, or searches for the nearest hostile
//!    contact inside its range;
//! 2. builds a predictor for the target and computes an aim vector with its
//!    [`AimingStrategy`];
//! 3. slews toward the aim (rotating mounts only);
//! 4. fires when aligned, under a fire-rate budget.
//!
//! # Fire-rate budget
//!
//! The budget is charged by `dt` every tick. While the weapon is firing it
//! shoots as long as the budget is in debt, paying one cooldown interval per
//! shot, so short cooldowns fire several shots in a single tick without
//! drifting from the authored rate. A weapon that is not firing clamps the
//! budget at zero, so idle time never banks a burst.
//!
//! # Beams
//!
//! Beam weapons lock onto their target on the first aligned tick with a
//! ready budget and then deal `dps * dt` every tick until the lock breaks.
//! Breaking a lock charges one cooldown interval before the next lock.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use shoal::{EntityId, SpatialIndex, Team, TeamFilter};

use crate::aiming::{AimEnvironment, AimingStrategy};
use crate::config::SimulationConfig;
use crate::motion::MotionModel;
use crate::output::{BeamBreakReason, FireControlOutput, FireEvent, WeaponId};
use crate::predictor::Predictor;
use crate::profile::{FireMode, WeaponProfile};
use crate::steering::{angle_between_deg, facing, rotate_towards, FORWARD};
use crate::target::{TargetSource, TargetState};

/// Budget values above `-BUDGET_EPSILON` count as paid off.
pub const BUDGET_EPSILON: f32 = 1e-6;

/// Fire-control state machine.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireControlState {
    /// No target held.
    #[default]
    Searching,
    /// Target held, not yet aligned or no firing solution.
    Aiming,
    /// Aligned and firing.
    Firing,
}

/// Read-only world view for one weapon tick.
#[derive(Clone, Copy)]
pub struct FireControlContext<'a> {
    /// Committed positions from the previous tick.
    pub index: &'a SpatialIndex,
    /// Target snapshots.
    pub targets: &'a dyn TargetSource,
    /// Simulation configuration.
    pub config: &'a SimulationConfig,
}

impl<'a> FireControlContext<'a> {
    /// Bundles the borrowed world view.
    #[must_use]
    pub fn new(index: &'a SpatialIndex, targets: &'a dyn TargetSource, config: &'a SimulationConfig) -> Self {
        Self { index, targets, config }
    }

    fn environment(&self) -> AimEnvironment {
        AimEnvironment {
            gravity: self.config.gravity,
            world_scale: self.config.world_scale,
        }
    }
}

/// A single weapon mount and its fire-control state.
#[derive(Debug, Clone)]
pub struct WeaponController {
    id: WeaponId,
    owner: EntityId,
    team: Team,
    profile: WeaponProfile,
    strategy: AimingStrategy,
    motion: MotionModel,
    position: Vec3,
    orientation: Quat,
    angular_speed: f32,
    state: FireControlState,
    target: Option<EntityId>,
    aim: Option<Vec3>,
    budget: f32,
    beam_lock: Option<EntityId>,
}

impl WeaponController {
    /// Creates a mount facing `orientation`.
    ///
    /// Targeting-mode and motion-model names are resolved here, once; unknown
    /// names fall back to direct aiming and ballistic motion.
    #[must_use]
    pub fn new(
        id: WeaponId,
        owner: EntityId,
        team: Team,
        profile: WeaponProfile,
        position: Vec3,
        orientation: Quat,
    ) -> Self {
        let strategy = AimingStrategy::resolve(&profile.targeting_mode);
        let motion = MotionModel::resolve(&profile.motion_model);
        Self {
            id,
            owner,
            team,
            profile,
            strategy,
            motion,
            position,
            orientation,
            angular_speed: 0.0,
            state: FireControlState::Searching,
            target: None,
            aim: None,
            budget: 0.0,
            beam_lock: None,
        }
    }

    /// Weapon id.
    #[must_use]
    pub fn id(&self) -> WeaponId {
        self.id
    }

    /// Owning platform.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Faction.
    #[must_use]
    pub fn team(&self) -> Team {
        self.team
    }

    /// Authored profile.
    #[must_use]
    pub fn profile(&self) -> &WeaponProfile {
        &self.profile
    }

    /// Resolved aiming strategy.
    #[must_use]
    pub fn strategy(&self) -> AimingStrategy {
        self.strategy
    }

    /// Resolved projectile motion model.
    #[must_use]
    pub fn motion(&self) -> MotionModel {
        self.motion
    }

    /// Muzzle position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Moves the mount along with its platform.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Mount orientation.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> FireControlState {
        self.state
    }

    /// Held target.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Last computed aim vector.
    #[must_use]
    pub fn aim(&self) -> Option<Vec3> {
        self.aim
    }

    /// Fire-rate budget in seconds. Positive means cooling down.
    #[must_use]
    pub fn budget(&self) -> f32 {
        self.budget
    }

    /// Overrides the fire-rate budget, e.g. to stagger initial volleys.
    pub fn set_budget(&mut self, budget: f32) {
        self.budget = budget;
    }

    /// Target of the active beam lock.
    #[must_use]
    pub fn beam_target(&self) -> Option<EntityId> {
        self.beam_lock
    }

    /// Nearest live hostile contact inside range that matches the capability
    /// mask.
    #[must_use]
    pub fn find_target(&self, index: &SpatialIndex, world_scale: f32) -> Option<EntityId> {
        index.nearest(
            self.position,
            self.profile.scaled_range(world_scale),
            TeamFilter::Not(self.team),
            self.profile.target_mask,
        )
    }

    /// Aim vector toward `target` with a predictor fitted to it.
    #[must_use]
    pub fn compute_aim(&self, target: &TargetState, ctx: &FireControlContext<'_>) -> Option<Vec3> {
        let predictor = Predictor::for_target(target, &ctx.config.guidance);
        self.strategy
            .compute_aim_vector(self.position, &self.profile, target.position, &predictor, &ctx.environment())
    }

    /// True when the mount's forward axis is within tolerance of `aim`.
    ///
    /// Mounts that cannot rotate are always aligned.
    #[must_use]
    pub fn is_aligned(&self, aim: Vec3) -> bool {
        if !self.profile.rotates() {
            return true;
        }
        angle_between_deg(self.orientation * FORWARD, aim) < self.profile.angular_tolerance
    }

    /// Runs one fire-control tick.
    pub fn tick(&mut self, ctx: &FireControlContext<'_>, dt: f32) -> Vec<FireControlOutput> {
        let mut outputs = Vec::new();
        self.budget -= dt;

        let Some(target) = self.acquire(ctx, &mut outputs) else {
            self.idle();
            return outputs;
        };

        self.aim = self.compute_aim(&target, ctx);
        let Some(aim) = self.aim else {
            if self.beam_lock.is_some() {
                self.break_beam(target.id, BeamBreakReason::NoSolution, &mut outputs);
            }
            self.state = FireControlState::Aiming;
            self.idle_budget();
            return outputs;
        };

        if self.profile.rotates() {
            self.slew(aim, dt);
        }

        match self.profile.fire_mode {
            FireMode::Projectile => self.fire_projectiles(&target, aim, ctx, &mut outputs),
            FireMode::Beam { dps } => {
                let margin = ctx.config.beam_safety_margin;
                self.hold_beam(&target, aim, dps, margin, dt, &mut outputs);
            }
        }
        outputs
    }

    /// Re-validates the held target or searches for a new one.
    fn acquire(&mut self, ctx: &FireControlContext<'_>, outputs: &mut Vec<FireControlOutput>) -> Option<TargetState> {
        let range = self.profile.scaled_range(ctx.config.world_scale);
        if let Some(held) = self.target {
            match ctx.targets.target_state(held) {
                Some(state) if state.alive && self.position.distance(state.position) <= range => {
                    return Some(state);
                }
                found => {
                    let reason = match found {
                        None => BeamBreakReason::TargetLost,
                        Some(state) if !state.alive => BeamBreakReason::TargetDestroyed,
                        Some(_) => BeamBreakReason::OutOfRange,
                    };
                    tracing::debug!(weapon = %self.id, target = %held, %reason, "target dropped");
                    self.release(reason, outputs);
                }
            }
        }

        let candidate = self.find_target(ctx.index, ctx.config.world_scale)?;
        let state = ctx
            .targets
            .target_state(candidate)
            .filter(|s| s.alive && self.position.distance(s.position) <= range)?;
        tracing::debug!(weapon = %self.id, target = %candidate, "target acquired");
        self.target = Some(candidate);
        self.state = FireControlState::Aiming;
        Some(state)
    }

    fn release(&mut self, reason: BeamBreakReason, outputs: &mut Vec<FireControlOutput>) {
        if let (Some(target), true) = (self.target, self.beam_lock.is_some()) {
            self.break_beam(target, reason, outputs);
        }
        self.target = None;
        self.aim = None;
        self.angular_speed = 0.0;
        self.state = FireControlState::Searching;
    }

    fn idle(&mut self) {
        self.state = FireControlState::Searching;
        self.aim = None;
        self.angular_speed = 0.0;
        self.idle_budget();
    }

    fn idle_budget(&mut self) {
        self.budget = self.budget.max(0.0);
    }

    fn slew(&mut self, aim: Vec3, dt: f32) {
        let Some(desired) = aim.try_normalize() else {
            return;
        };
        let rate = match self.profile.rotation_acceleration {
            Some(accel) => {
                self.angular_speed = (self.angular_speed + accel * dt).min(self.profile.rotation_speed);
                self.angular_speed
            }
            None => self.profile.rotation_speed,
        };
        let forward = (self.orientation * FORWARD).normalize_or_zero();
        let turned = rotate_towards(forward, desired, rate.to_radians() * dt);
        self.orientation = facing(turned, self.orientation);
    }

    fn fire_projectiles(
        &mut self,
        target: &TargetState,
        aim: Vec3,
        ctx: &FireControlContext<'_>,
        outputs: &mut Vec<FireControlOutput>,
    ) {
        if !self.is_aligned(aim) {
            self.state = FireControlState::Aiming;
            self.idle_budget();
            return;
        }
        self.state = FireControlState::Firing;

        let velocity = if self.profile.vls {
            Vec3::Y * self.profile.scaled_speed(ctx.config.world_scale)
        } else {
            aim
        };
        let event = FireEvent {
            weapon: self.id,
            origin: self.position,
            velocity,
            target: target.id,
        };

        let interval = self.profile.cooldown;
        if interval < ctx.config.min_cooldown {
            outputs.push(FireControlOutput::Fire(event));
            self.budget = 0.0;
        } else {
            while self.budget < -BUDGET_EPSILON {
                outputs.push(FireControlOutput::Fire(event));
                self.budget += interval;
            }
        }
        tracing::trace!(weapon = %self.id, target = %target.id, budget = self.budget, "fire");
    }

    fn hold_beam(
        &mut self,
        target: &TargetState,
        aim: Vec3,
        dps: f32,
        margin: f32,
        dt: f32,
        outputs: &mut Vec<FireControlOutput>,
    ) {
        self.idle_budget();

        if self.beam_lock.is_some() {
            if self.profile.rotates() && self.angular_rate(target) * margin > self.profile.rotation_speed {
                self.break_beam(target.id, BeamBreakReason::CannotTrack, outputs);
                self.state = FireControlState::Aiming;
                return;
            }
        } else {
            if !self.is_aligned(aim) || self.budget > BUDGET_EPSILON {
                self.state = FireControlState::Aiming;
                return;
            }
            tracing::debug!(weapon = %self.id, target = %target.id, "beam lock");
            self.beam_lock = Some(target.id);
            outputs.push(FireControlOutput::BeamStarted {
                weapon: self.id,
                target: target.id,
            });
        }

        self.state = FireControlState::Firing;
        outputs.push(FireControlOutput::BeamDamage {
            weapon: self.id,
            target: target.id,
            amount: dps * dt,
        });
    }

    /// Line-of-sight angular rate in degrees per second.
    fn angular_rate(&self, target: &TargetState) -> f32 {
        let los = target.position - self.position;
        let range_sq = los.length_squared();
        if range_sq <= f32::EPSILON {
            return 0.0;
        }
        (los.cross(target.velocity).length() / range_sq).to_degrees()
    }

    fn break_beam(&mut self, target: EntityId, reason: BeamBreakReason, outputs: &mut Vec<FireControlOutput>) {
        tracing::debug!(weapon = %self.id, %target, %reason, "beam lock broken");
        self.beam_lock = None;
        self.budget = self.budget.max(0.0) + self.profile.cooldown;
        outputs.push(FireControlOutput::BeamBroken {
            weapon: self.id,
            target,
            reason,
        });
    }
}
