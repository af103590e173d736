//! Test helper functions for setting up simulations and actors.

use glam::Vec2;

use crate::controller::HostCommand;
use crate::entity::components::{CelestialKind, ControlFlags, DamageKind, TurretSpec};
use crate::entity::{EntityBlueprint, EntityId};
use crate::output::Event;
use crate::simulation::Simulation;

// =============================================================================
// Actor Factory Functions
// =============================================================================

/// Spawns a ship of size 15 facing +x.
pub fn spawn_ship(sim: &mut Simulation, position: Vec2) -> EntityId {
    sim.spawn(EntityBlueprint::ship(position, 0.0, 15.0)).unwrap()
}

/// Spawns a stationary asteroid.
pub fn spawn_rock(sim: &mut Simulation, position: Vec2, size: f32) -> EntityId {
    sim.spawn(EntityBlueprint::celestial(
        CelestialKind::Asteroid,
        position,
        size,
    ))
    .unwrap()
}

/// Spawns a stationary asteroid with a custom hull.
pub fn spawn_fragile_rock(sim: &mut Simulation, position: Vec2, size: f32, hull: f32) -> EntityId {
    sim.spawn(
        EntityBlueprint::celestial(CelestialKind::Asteroid, position, size).with_hull(hull),
    )
    .unwrap()
}

/// A perfectly accurate single-shot gun mounted on the ship's center.
pub fn test_gun(recoil_ms: f32) -> TurretSpec {
    TurretSpec {
        name: "Test Gun".to_string(),
        recoil_ms,
        projectiles_per_burst: 1,
        burst_delay_ms: 0.0,
        range: 500.0,
        accuracy: 100.0,
        mount_offset: Vec2::ZERO,
        projectile_speed: 6.0,
        damage: 5.0,
        damage_kind: DamageKind::Kinetic,
    }
}

/// Mounts a turret on a ship.
pub fn arm(sim: &mut Simulation, ship: EntityId, spec: TurretSpec) -> EntityId {
    sim.spawn(EntityBlueprint::turret(ship, spec)).unwrap()
}

// =============================================================================
// State Access Functions
// =============================================================================

/// Replaces a ship's held intent.
pub fn hold(sim: &mut Simulation, ship: EntityId, controls: ControlFlags) {
    sim.apply(&HostCommand::SetControls { ship, controls }).unwrap();
}

/// Position of an actor, panicking if it is gone.
pub fn position_of(sim: &Simulation, id: EntityId) -> Vec2 {
    sim.arena().get(id).unwrap().position()
}

/// Steps `n` ticks and returns every notification raised on the way.
pub fn run_collecting(sim: &mut Simulation, n: u64) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..n {
        sim.step();
        events.extend(sim.drain_events());
    }
    events
}

/// Number of shots a turret fired in `events`.
pub fn shots_from(events: &[Event], turret: EntityId) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::WeaponFired { turret: t, .. } if *t == turret))
        .count()
}

/// Destroyer credited for an actor in `events`, if it was destroyed.
pub fn destroyer_of(events: &[Event], actor: EntityId) -> Option<Option<EntityId>> {
    events.iter().find_map(|event| match event {
        Event::ActorDestroyed { actor: a, destroyer } if *a == actor => Some(*destroyer),
        _ => None,
    })
}
