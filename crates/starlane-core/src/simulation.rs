//! The tick loop.
//!
//! A [`Simulation`] owns two arenas. Plugins read the frozen `current` arena
//! from rayon workers; resolvers then write a fresh copy of it into `next`,
//! marked actors are reaped, and the two swap. Plugin outputs are sorted by
//! entity, plugin name and sequence before any resolver sees them, and every
//! random draw is seeded from a trace id hashed out of the master seed, so
//! thread scheduling never leaks into the world.
//!
//! # Example
//!
//! ```
//! use starlane_core::simulation::Simulation;
//! use starlane_core::entity::EntityBlueprint;
//! use glam::Vec2;
//!
//! let mut sim = Simulation::new(42);
//!
//! let ship = sim.spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0)).unwrap();
//!
//! for _ in 0..10 {
//!     sim.step();
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! assert!(sim.arena().get(ship).is_some());
//! ```

use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::trace;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::controller::HostCommand;
use crate::entity::components::{AutopilotTarget, ShipComponents};
use crate::entity::{EntityBlueprint, EntityId, EntityInner, EntityTag};
use crate::error::SimError;
use crate::output::{Event, OutputEnvelope, PluginInstanceId, TraceId};
use crate::plugin::{PluginContext, PluginRegistry};
use crate::resolver::{
    CombatResolver, EventResolver, PhysicsResolver, Resolver, SensorResolver, WeaponResolver,
};
use crate::snapshot::ActorSnapshot;
use crate::world_view::WorldView;

// =============================================================================
// Simulation
// =============================================================================

/// A running world plus the machinery that advances it.
pub struct Simulation {
    /// World as of the start of the tick
    current: Arena,
    /// Scratch buffer the resolvers write into
    next: Arena,
    plugins: PluginRegistry,
    /// Run in order: physics, weapons, combat, sensors
    resolvers: Vec<Box<dyn Resolver>>,
    /// Notifications waiting for the host
    journal: EventResolver,
    config: SimConfig,
    master_seed: u64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("current", &self.current)
            .field("plugins", &self.plugins)
            .field("resolvers", &format!("[{} resolvers]", self.resolvers.len()))
            .field("pending_events", &self.journal.event_count())
            .field("master_seed", &self.master_seed)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Empty world at tick 0 with default tuning.
    ///
    /// ```
    /// use starlane_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new(12345);
    /// assert_eq!(sim.tick(), 0);
    /// assert_eq!(sim.seed(), 12345);
    /// ```
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::build(SimConfig::default(), seed)
    }

    /// Empty world at tick 0 with custom tuning.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if the configuration fails validation.
    pub fn with_config(config: SimConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self::build(config, seed))
    }

    fn build(config: SimConfig, seed: u64) -> Self {
        let arena = Arena::with_sectors(config.sectors.clone());
        let scan_interval = config.ticks_for_ms(config.sensor.scan_interval_ms);
        Self {
            next: arena.clone(),
            current: arena,
            plugins: PluginRegistry::default_bundles(&config),
            resolvers: vec![
                Box::new(PhysicsResolver::new()),
                Box::new(WeaponResolver::new(
                    config.tick_ms,
                    config.projectile.hit_check_interval_ticks,
                )),
                Box::new(CombatResolver::new()),
                Box::new(SensorResolver::new(scan_interval)),
            ],
            journal: EventResolver::new(),
            config,
            master_seed: seed,
        }
    }

    /// Advances the world by one tick.
    ///
    /// Plugins run against `current`; `next` is reset to a copy of it and each
    /// resolver applies the outputs it handles. Event outputs go to the
    /// journal, followed by the notifications of every actor reaped this tick.
    /// The arenas then swap and the clock moves on by `tick_ms`.
    pub fn step(&mut self) {
        let tick = self.current.current_tick();

        let outputs = self.execute_plugins_parallel(tick);

        self.next.clone_from(&self.current);
        for resolver in &self.resolvers {
            let relevant: Vec<_> = outputs
                .iter()
                .filter(|o| resolver.handles().contains(&o.kind()))
                .collect();
            resolver.resolve(&relevant, &self.current, &mut self.next);
        }
        let events: Vec<_> = outputs
            .iter()
            .filter(|o| self.journal.handles().contains(&o.kind()))
            .collect();
        self.journal.resolve(&events, &self.current, &mut self.next);

        let reaped = self.next.reap();
        let destroyed = reaped.len();
        self.journal.record(reaped);

        std::mem::swap(&mut self.current, &mut self.next);
        self.current.advance_tick(self.config.tick_ms);

        trace!(
            tick,
            outputs = outputs.len(),
            destroyed,
            actors = self.current.entity_count(),
            "tick complete"
        );
    }

    /// Executes `n` ticks.
    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Every plugin instance's outputs, in (entity, plugin id, sequence) order.
    fn execute_plugins_parallel(&self, tick: u64) -> Vec<OutputEnvelope> {
        let plugin_instances: Vec<_> = self
            .current
            .entities_sorted()
            .flat_map(|entity| {
                self.plugins
                    .plugins_for(entity.tag())
                    .iter()
                    .enumerate()
                    .map(move |(idx, plugin)| (entity.id(), idx, Arc::clone(plugin)))
            })
            .collect();

        let mut all_outputs: Vec<OutputEnvelope> = plugin_instances
            .par_iter()
            .flat_map(|(entity_id, plugin_idx, plugin)| {
                let decl = plugin.declaration();
                let view = WorldView::for_plugin(&self.current, decl, tick);
                let trace_id =
                    self.generate_trace_id(tick, entity_id.as_u64(), *plugin_idx as u64);

                let ctx = PluginContext {
                    entity_id: *entity_id,
                    tick,
                    trace_id,
                };

                let outputs = plugin.run(&ctx, &view);

                // Plugins emit a handful of outputs per tick; u32 sequence is ample
                #[allow(clippy::cast_possible_truncation)]
                outputs
                    .into_iter()
                    .enumerate()
                    .map(|(seq, output)| {
                        OutputEnvelope::new(
                            output,
                            PluginInstanceId::new(*entity_id, decl.id.clone()),
                            trace_id,
                            tick,
                            seq as u32,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        all_outputs.sort_by(|a, b| {
            a.source()
                .entity_id()
                .cmp(&b.source().entity_id())
                .then_with(|| a.source().plugin_id().as_str().cmp(b.source().plugin_id().as_str()))
                .then_with(|| a.sequence().cmp(&b.sequence()))
        });

        all_outputs
    }

    /// Hash of the master seed with the instance coordinates.
    fn generate_trace_id(&self, tick: u64, entity: u64, plugin: u64) -> TraceId {
        let mut hasher = DefaultHasher::new();
        self.master_seed.hash(&mut hasher);
        tick.hash(&mut hasher);
        entity.hash(&mut hasher);
        plugin.hash(&mut hasher);
        TraceId::new(hasher.finish())
    }

    // =========================================================================
    // World setup
    // =========================================================================

    /// Spawns an actor into the current world.
    ///
    /// Ships get the configured sensor ranges.
    ///
    /// # Errors
    ///
    /// Propagates [`Arena::spawn`] errors; nothing is spawned on error.
    pub fn spawn(&mut self, mut blueprint: EntityBlueprint) -> Result<EntityId, SimError> {
        if let EntityInner::Ship(ship) = &mut blueprint.inner {
            ship.sensor.radar_range = self.config.sensor.radar_range;
            ship.sensor.visual_range = self.config.sensor.visual_range;
        }
        self.current.spawn(blueprint)
    }

    /// Destroys an actor immediately.
    ///
    /// The actor is removed at once and its notifications are journaled.
    /// Destroying an actor that is gone or already destroyed is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if this call destroyed the actor.
    pub fn destroy(&mut self, id: EntityId, destroyer: Option<EntityId>) -> bool {
        let marked = self.current.destroy(id, destroyer);
        if marked {
            let events = self.current.reap();
            self.journal.record(events);
        }
        marked
    }

    /// Applies a host command to the current world.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownEntity`] if a referenced actor does not exist
    /// - [`SimError::WrongKind`] if a ship command targets a non-ship
    ///
    /// The world is unchanged on error.
    pub fn apply(&mut self, command: &HostCommand) -> Result<(), SimError> {
        match *command {
            HostCommand::SetControls { ship, controls } => {
                self.ship_mut(ship)?.helm.controls = controls;
            }
            HostCommand::SetAutopilot { ship, target } => {
                if let AutopilotTarget::Actor(actor) = target {
                    if self.current.get(actor).is_none() {
                        return Err(SimError::UnknownEntity(actor));
                    }
                }
                self.ship_mut(ship)?.helm.autopilot = Some(target);
            }
            HostCommand::DisengageAutopilot { ship } => {
                self.ship_mut(ship)?.helm.autopilot = None;
            }
            HostCommand::CycleWeapon { ship } => {
                self.ship_mut(ship)?.hardpoints.cycle();
            }
            HostCommand::Select { actor } => self.current.select(actor)?,
            HostCommand::ClearSelection => self.current.clear_selection(),
        }
        Ok(())
    }

    fn ship_mut(&mut self, id: EntityId) -> Result<&mut ShipComponents, SimError> {
        self.current
            .require_mut(id, EntityTag::Ship)?
            .as_ship_mut()
            .ok_or(SimError::UnknownEntity(id))
    }

    // =========================================================================
    // Host access
    // =========================================================================

    /// Drains every notification produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.journal.take_events()
    }

    /// Number of notifications waiting to be drained.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.journal.event_count()
    }

    /// Display snapshots of every actor, in ID order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ActorSnapshot> {
        self.current
            .entities_sorted()
            .map(|entity| ActorSnapshot::capture(&self.current, entity))
            .collect()
    }

    /// Display snapshot of one actor.
    #[must_use]
    pub fn snapshot(&self, id: EntityId) -> Option<ActorSnapshot> {
        self.current
            .get(id)
            .map(|entity| ActorSnapshot::capture(&self.current, entity))
    }

    /// World as of the last completed tick.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.current
    }

    /// Direct access to the world between ticks.
    ///
    /// Use this for setup between steps. Prefer [`Simulation::spawn`] for
    /// ships so they pick up the configured sensor ranges.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.current
    }

    /// Ticks completed so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.current.current_tick()
    }

    /// Simulated milliseconds since the start.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.current.elapsed_ms()
    }

    /// Master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.master_seed
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Plugin bundles, for registering custom behavior.
    #[must_use]
    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    /// Adds a custom resolver, run after the built-in ones.
    pub fn add_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Built-in plus custom resolvers.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::ControlFlags;
    use crate::entity::CelestialKind;
    use crate::output::{Command, Output, OutputKind, PluginId};
    use crate::plugin::{ComponentKind, Plugin, PluginDeclaration};
    use glam::Vec2;

    // Pushes every ship along +x
    struct VelocityPlugin {
        declaration: PluginDeclaration,
        velocity: Vec2,
    }

    impl VelocityPlugin {
        fn new(velocity: Vec2) -> Self {
            Self {
                declaration: PluginDeclaration {
                    id: PluginId::new("velocity_test"),
                    required_tags: vec![EntityTag::Ship],
                    reads: vec![ComponentKind::Transform],
                    emits: vec![OutputKind::Command],
                },
                velocity,
            }
        }
    }

    impl Plugin for VelocityPlugin {
        fn declaration(&self) -> &PluginDeclaration {
            &self.declaration
        }

        fn run(&self, ctx: &PluginContext, _view: &WorldView) -> Vec<Output> {
            vec![Output::Command(Command::SetVelocity {
                target: ctx.entity_id,
                velocity: self.velocity,
            })]
        }
    }

    fn ship(sim: &mut Simulation, position: Vec2) -> EntityId {
        sim.spawn(EntityBlueprint::ship(position, 0.0, 15.0)).unwrap()
    }

    mod creation_tests {
        use super::*;

        #[test]
        fn new_creates_simulation() {
            let sim = Simulation::new(42);
            assert_eq!(sim.tick(), 0);
            assert_eq!(sim.seed(), 42);
            assert!(sim.arena().is_empty());
            assert_eq!(sim.resolver_count(), 4);
        }

        #[test]
        fn invalid_config_is_rejected() {
            let mut config = SimConfig::default();
            config.tick_ms = 0.0;
            assert!(matches!(
                Simulation::with_config(config, 1),
                Err(SimError::InvalidConfig(_))
            ));
        }

        #[test]
        fn spawn_applies_sensor_tuning() {
            let mut config = SimConfig::default();
            config.sensor.radar_range = 123.0;
            let mut sim = Simulation::with_config(config, 1).unwrap();
            let id = ship(&mut sim, Vec2::ZERO);

            let sensor = &sim.arena().get(id).unwrap().as_ship().unwrap().sensor;
            assert_eq!(sensor.radar_range, 123.0);
        }

        #[test]
        fn trace_ids_vary_with_seed() {
            let sim1 = Simulation::new(1);
            let sim2 = Simulation::new(2);
            assert_ne!(
                sim1.generate_trace_id(0, 0, 0),
                sim2.generate_trace_id(0, 0, 0)
            );
        }

        #[test]
        fn debug_shows_resolver_count() {
            let sim = Simulation::new(1);
            assert!(format!("{sim:?}").contains("[4 resolvers]"));
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn step_advances_tick_and_clock() {
            let mut sim = Simulation::new(42);
            sim.step();
            sim.step_n(2);
            assert_eq!(sim.tick(), 3);
            assert!((sim.elapsed_ms() - 50.0).abs() < 1e-3);
        }

        #[test]
        fn custom_plugin_output_is_resolved() {
            let mut sim = Simulation::new(42);
            let id = ship(&mut sim, Vec2::ZERO);
            sim.plugins_mut().clear();
            sim.plugins_mut()
                .register(EntityTag::Ship, Arc::new(VelocityPlugin::new(Vec2::new(1.0, 0.0))));

            sim.step_n(3);

            assert_eq!(sim.arena().get(id).unwrap().position(), Vec2::new(3.0, 0.0));
        }

        #[test]
        fn thrust_moves_ship() {
            let mut sim = Simulation::new(42);
            let id = ship(&mut sim, Vec2::ZERO);
            sim.apply(&HostCommand::SetControls {
                ship: id,
                controls: ControlFlags::THRUST,
            })
            .unwrap();

            sim.step_n(5);

            let entity = sim.arena().get(id).unwrap();
            assert!(entity.position().x > 0.0);
            assert!((entity.speed() - 0.5).abs() < 1e-4);
        }
    }

    mod command_tests {
        use super::*;

        #[test]
        fn ship_commands_reject_non_ships() {
            let mut sim = Simulation::new(1);
            let sun = sim
                .spawn(EntityBlueprint::celestial(CelestialKind::Sun, Vec2::ZERO, 50.0))
                .unwrap();

            let result = sim.apply(&HostCommand::CycleWeapon { ship: sun });
            assert!(matches!(result, Err(SimError::WrongKind { .. })));
        }

        #[test]
        fn autopilot_to_missing_actor_is_rejected() {
            let mut sim = Simulation::new(1);
            let id = ship(&mut sim, Vec2::ZERO);

            let result = sim.apply(&HostCommand::SetAutopilot {
                ship: id,
                target: AutopilotTarget::Actor(EntityId::new(999)),
            });
            assert!(matches!(result, Err(SimError::UnknownEntity(_))));
            assert!(sim.arena().get(id).unwrap().as_ship().unwrap().helm.autopilot.is_none());
        }

        #[test]
        fn select_is_exclusive() {
            let mut sim = Simulation::new(1);
            let a = ship(&mut sim, Vec2::ZERO);
            let b = ship(&mut sim, Vec2::new(50.0, 0.0));

            sim.apply(&HostCommand::Select { actor: a }).unwrap();
            sim.apply(&HostCommand::Select { actor: b }).unwrap();
            assert_eq!(sim.arena().selected(), Some(b));

            sim.apply(&HostCommand::ClearSelection).unwrap();
            assert_eq!(sim.arena().selected(), None);
        }
    }

    mod destroy_tests {
        use super::*;

        #[test]
        fn destroy_twice_notifies_once() {
            let mut sim = Simulation::new(1);
            let id = ship(&mut sim, Vec2::ZERO);

            assert!(sim.destroy(id, None));
            assert!(!sim.destroy(id, None));

            let events = sim.drain_events();
            assert_eq!(
                events,
                vec![Event::ActorDestroyed {
                    actor: id,
                    destroyer: None,
                }]
            );
            assert!(sim.arena().get(id).is_none());
        }

        #[test]
        fn drain_empties_journal() {
            let mut sim = Simulation::new(1);
            let id = ship(&mut sim, Vec2::ZERO);
            sim.destroy(id, None);

            assert_eq!(sim.pending_event_count(), 1);
            sim.drain_events();
            assert_eq!(sim.pending_event_count(), 0);
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn snapshots_cover_every_actor() {
            let mut sim = Simulation::new(1);
            let a = ship(&mut sim, Vec2::ZERO);
            let b = ship(&mut sim, Vec2::new(10.0, 0.0));

            let ids: Vec<EntityId> = sim.snapshots().iter().map(|s| s.id).collect();
            assert_eq!(ids, vec![a, b]);
            assert_eq!(sim.snapshot(b).unwrap().position, Vec2::new(10.0, 0.0));
            assert!(sim.snapshot(EntityId::new(99)).is_none());
        }
    }
}
