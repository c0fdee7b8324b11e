//! Scenario setup utilities.

use glam::{Quat, Vec3};
use shoal::{Capability, EntityId, Team};

use crate::config::SimulationConfig;
use crate::output::{ProjectileOutcome, WeaponId};
use crate::profile::{GuidedParams, WeaponProfile};
use crate::simulation::{Simulation, TickReport};

/// Friendly faction.
pub const BLUE: Team = Team(1);
/// Hostile faction.
pub const RED: Team = Team(2);

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Default configuration without cooldown stagger.
pub fn quiet_config() -> SimulationConfig {
    SimulationConfig {
        initial_cooldown_jitter: 0.0,
        ..SimulationConfig::default()
    }
}

/// Simulation with [`quiet_config`].
pub fn quiet_simulation() -> Simulation {
    Simulation::new(quiet_config()).unwrap()
}

/// Surface ship with 100 health.
pub fn spawn_ship(sim: &mut Simulation, team: Team, position: Vec3, velocity: Vec3) -> EntityId {
    sim.spawn_body(team, Capability::SURFACE, position, velocity, 100.0)
}

/// Mounts `profile` at the owner's origin facing +Z.
pub fn mount(sim: &mut Simulation, owner: EntityId, profile: WeaponProfile) -> WeaponId {
    sim.add_weapon(owner, profile, Vec3::ZERO, Quat::IDENTITY).unwrap()
}

/// Turret firing gravity-aware shells.
pub fn naval_gun(speed: f32, range: f32, cooldown: f32) -> WeaponProfile {
    WeaponProfile {
        targeting_mode: "ballistic".into(),
        target_mask: Capability::SURFACE,
        ..WeaponProfile::projectile("naval_gun", speed, range, cooldown)
    }
}

/// Vertical-launch anti-ship missile with default guidance parameters.
pub fn anti_ship_missile() -> WeaponProfile {
    WeaponProfile {
        motion_model: "guided_missile".into(),
        vls: true,
        guided: Some(GuidedParams::default()),
        target_mask: Capability::SURFACE,
        ..WeaponProfile::projectile("ssm", 250.0, 6000.0, 60.0)
    }
}

/// Tube-launched homing torpedo running at 10 m depth.
pub fn torpedo() -> WeaponProfile {
    WeaponProfile {
        motion_model: "torpedo".into(),
        guided: Some(GuidedParams {
            cruise_height: -10.0,
            terminal_distance: 300.0,
            launch_height: 0.0,
            turn_rate: 20.0,
        }),
        target_mask: Capability::SURFACE,
        can_rotate: false,
        ..WeaponProfile::projectile("torpedo", 25.0, 2000.0, 120.0)
    }
}

/// Runs `ticks` steps and returns every report.
pub fn run(sim: &mut Simulation, ticks: usize) -> Vec<TickReport> {
    (0..ticks).map(|_| sim.step()).collect()
}

/// Collision stand-in for the world layer: reports a hit for every projectile
/// within `radius` of a body other than its own faction's.
pub fn resolve_proximity_hits(sim: &mut Simulation, radius: f32) -> Vec<ProjectileOutcome> {
    let contacts: Vec<(EntityId, EntityId)> = sim
        .projectiles()
        .flat_map(|p| {
            sim.bodies()
                .filter(move |b| b.alive && b.team != p.team && b.position.distance(p.state.position) < radius)
                .map(move |b| (p.id, b.id))
        })
        .collect();
    contacts
        .into_iter()
        .filter_map(|(projectile, target)| sim.report_hit(projectile, target))
        .collect()
}
