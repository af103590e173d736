//! Determinism verification tests.
//!
//! The same seed and the same host inputs must produce the same world,
//! tick for tick, regardless of how rayon schedules the plugins.

use glam::Vec2;

use crate::controller::PlayerController;
use crate::entity::components::ControlFlags;
use crate::entity::EntityTag;
use crate::output::Event;
use crate::scenario::Scenario;
use crate::simulation::Simulation;

use super::helpers::{arm, hold, spawn_ship, test_gun};

/// Runs the default system with a scripted pilot and returns the final hash
/// plus every notification.
fn scripted_run(seed: u64, ticks: u64) -> (u64, Vec<Event>) {
    let mut sim = Simulation::new(seed);
    let scenario = Scenario::default_system(&mut sim).unwrap();
    let mut pilot = PlayerController::new(scenario.ship);
    let mut events = Vec::new();

    pilot.press(ControlFlags::THRUST | ControlFlags::FIRE);
    for tick in 0..ticks {
        match tick {
            40 => pilot.press(ControlFlags::ROTATE_LEFT),
            60 => {
                pilot.release(ControlFlags::ROTATE_LEFT);
                pilot.cycle_weapon();
            }
            120 => pilot.press(ControlFlags::BRAKE),
            _ => {}
        }
        events.extend(pilot.tick(&mut sim).unwrap());
    }
    (sim.arena().state_hash(), events)
}

#[test]
fn same_seed_same_world() {
    let (hash1, events1) = scripted_run(42, 200);
    let (hash2, events2) = scripted_run(42, 200);

    assert_eq!(hash1, hash2);
    assert_eq!(events1, events2);
    assert!(!events1.is_empty());
}

#[test]
fn different_seed_different_world() {
    let (hash1, _) = scripted_run(1, 20);
    let (hash2, _) = scripted_run(2, 20);
    assert_ne!(hash1, hash2);
}

#[test]
fn hash_is_stable_without_input() {
    let mut sim1 = Simulation::new(9);
    let mut sim2 = Simulation::new(9);
    Scenario::default_system(&mut sim1).unwrap();
    Scenario::default_system(&mut sim2).unwrap();

    for _ in 0..50 {
        sim1.step();
        sim2.step();
        assert_eq!(sim1.arena().state_hash(), sim2.arena().state_hash());
    }
}

/// Headings of all live projectiles, in ID order.
fn spread_headings(seed: u64) -> Vec<f32> {
    let mut sim = Simulation::new(seed);
    let ship = spawn_ship(&mut sim, Vec2::ZERO);
    let mut spec = test_gun(50.0);
    spec.accuracy = 50.0;
    arm(&mut sim, ship, spec);

    hold(&mut sim, ship, ControlFlags::FIRE);
    sim.step_n(20);

    sim.arena()
        .entities_sorted()
        .filter(|entity| entity.tag() == EntityTag::Projectile)
        .map(|entity| entity.transform.rotation)
        .collect()
}

#[test]
fn spread_is_reproducible() {
    let first = spread_headings(7);
    assert!(first.len() > 1);
    assert_eq!(first, spread_headings(7));
}

#[test]
fn spread_depends_on_seed() {
    assert_ne!(spread_headings(7), spread_headings(8));
}

#[test]
fn spread_stays_within_accuracy_cone() {
    let max = sim_max_spread() * 0.5;
    for heading in spread_headings(3) {
        assert!(heading.abs() <= max + 1e-6);
    }
}

fn sim_max_spread() -> f32 {
    Simulation::new(0).config().projectile.max_spread
}
