//! Default star system setup and debug population helpers.
//!
//! All randomness comes from a `ChaCha8Rng` seeded with the simulation's
//! master seed, so the same seed builds the same system.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::entity::components::{CelestialKind, DamageKind, TurretSpec};
use crate::entity::{EntityBlueprint, EntityId};
use crate::error::SimError;
use crate::simulation::Simulation;

/// Number of asteroid outlines a host is expected to provide.
pub const ASTEROID_SHAPE_COUNT: u32 = 50;

const SUN_SIZE: f32 = 50.0;
const SHIP_SIZE: f32 = 15.0;
const SHIP_START: Vec2 = Vec2::new(100.0, 0.0);
const DEFAULT_ASTEROIDS: usize = 100;

/// Picks a random element.
///
/// # Errors
///
/// [`SimError::EmptySelection`] naming `what` if `items` is empty.
pub fn pick<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    items: &'a [T],
    what: &'static str,
) -> Result<&'a T, SimError> {
    items.choose(rng).ok_or(SimError::EmptySelection(what))
}

/// The two hardpoints the player ship starts with.
#[must_use]
pub fn standard_turrets() -> [TurretSpec; 2] {
    [
        TurretSpec {
            name: "Mass Driver".to_string(),
            recoil_ms: 250.0,
            projectiles_per_burst: 1,
            burst_delay_ms: 0.0,
            range: 1000.0,
            accuracy: 95.0,
            mount_offset: Vec2::new(8.0, -6.0),
            projectile_speed: 6.0,
            damage: 5.0,
            damage_kind: DamageKind::Kinetic,
        },
        TurretSpec {
            name: "Flak Battery".to_string(),
            recoil_ms: 1000.0,
            projectiles_per_burst: 3,
            burst_delay_ms: 100.0,
            range: 600.0,
            accuracy: 80.0,
            mount_offset: Vec2::new(8.0, 6.0),
            projectile_speed: 5.0,
            damage: 2.0,
            damage_kind: DamageKind::Kinetic,
        },
    ]
}

/// Handles to the actors of a populated system.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Central star
    pub sun: EntityId,
    /// Player ship
    pub ship: EntityId,
    /// Player ship hardpoints, in mount order
    pub turrets: Vec<EntityId>,
    /// Asteroids spawned through this scenario, oldest first
    pub asteroids: Vec<EntityId>,
    shapes: Vec<u32>,
    rng: ChaCha8Rng,
}

impl Scenario {
    /// Builds the default system: a sun, an asteroid belt and an armed
    /// player ship.
    ///
    /// # Errors
    ///
    /// Propagates spawn errors.
    pub fn default_system(sim: &mut Simulation) -> Result<Self, SimError> {
        Self::build(sim, (0..ASTEROID_SHAPE_COUNT).collect())
    }

    /// Builds the default system with a custom shape catalog.
    ///
    /// # Errors
    ///
    /// [`SimError::EmptySelection`] if `shapes` is empty; spawn errors otherwise.
    pub fn with_shapes(sim: &mut Simulation, shapes: Vec<u32>) -> Result<Self, SimError> {
        Self::build(sim, shapes)
    }

    fn build(sim: &mut Simulation, shapes: Vec<u32>) -> Result<Self, SimError> {
        if shapes.is_empty() {
            return Err(SimError::EmptySelection("asteroid shape"));
        }
        let sun = sim.spawn(
            EntityBlueprint::celestial(CelestialKind::Sun, Vec2::ZERO, SUN_SIZE).named("Sun"),
        )?;
        let ship = sim.spawn(EntityBlueprint::ship(SHIP_START, 0.0, SHIP_SIZE))?;

        let mut scenario = Self {
            sun,
            ship,
            turrets: Vec::new(),
            asteroids: Vec::new(),
            shapes,
            rng: ChaCha8Rng::seed_from_u64(sim.seed()),
        };

        for spec in standard_turrets() {
            let turret = sim.spawn(EntityBlueprint::turret(ship, spec))?;
            scenario.turrets.push(turret);
        }
        scenario.spawn_debug_asteroids(sim, sun, 1.0, DEFAULT_ASTEROIDS)?;

        info!(
            actors = sim.arena().entity_count(),
            sectors = sim.arena().sectors().sector_count(),
            "default system ready"
        );
        Ok(scenario)
    }

    /// Spawns one asteroid orbiting `parent`.
    ///
    /// Size is 10 to 40, orbit radius 200 to 700 scaled by `range_multiplier`,
    /// angular speed 0.0005 to 0.0015 rad per tick.
    ///
    /// # Errors
    ///
    /// Propagates spawn errors, such as a missing `parent`.
    pub fn spawn_asteroid(
        &mut self,
        sim: &mut Simulation,
        parent: EntityId,
        range_multiplier: f32,
    ) -> Result<EntityId, SimError> {
        let shape = *pick(&mut self.rng, &self.shapes, "asteroid shape")?;
        let size = self.rng.gen_range(10.0..40.0);
        let radius = self.rng.gen_range(200.0..700.0) * range_multiplier;
        let angle = self.rng.gen_range(0.0..TAU);
        let angular_speed = self.rng.gen_range(0.5..1.5) / 1000.0;

        let id = sim.spawn(
            EntityBlueprint::celestial(CelestialKind::Asteroid, Vec2::ZERO, size)
                .with_orbit(parent, radius, angle, angular_speed)
                .with_shape(shape),
        )?;
        self.asteroids.push(id);
        Ok(id)
    }

    /// Spawns `count` asteroids orbiting `parent`.
    ///
    /// # Errors
    ///
    /// Stops at the first spawn error; earlier asteroids stay.
    pub fn spawn_debug_asteroids(
        &mut self,
        sim: &mut Simulation,
        parent: EntityId,
        range_multiplier: f32,
        count: usize,
    ) -> Result<Vec<EntityId>, SimError> {
        (0..count)
            .map(|_| self.spawn_asteroid(sim, parent, range_multiplier))
            .collect()
    }

    /// Destroys up to `count` asteroids, most recently spawned first.
    ///
    /// Asteroids already gone are forgotten without counting.
    ///
    /// # Returns
    ///
    /// How many asteroids were destroyed.
    pub fn reduce_debug_asteroids(&mut self, sim: &mut Simulation, count: usize) -> usize {
        self.asteroids.retain(|id| sim.arena().get(*id).is_some());

        let mut removed = 0;
        while removed < count {
            let Some(id) = self.asteroids.pop() else {
                break;
            };
            if sim.destroy(id, None) {
                removed += 1;
            }
        }
        removed
    }
}
