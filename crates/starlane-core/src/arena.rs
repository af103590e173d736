//! Arena module: the actor registry.
//!
//! The Arena is the container for all actors in a world. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Sector membership through a [`quadrant::SectorManager`]
//! - Entity lifecycle management (spawn, destroy, reap, despawn)
//! - The simulation clock (tick counter and elapsed milliseconds)
//!
//! # Sector Synchronization
//!
//! Sector membership is NOT automatically synchronized when positions change.
//! After moving an entity through `get_mut()`, call [`Arena::relocate`] to
//! move it to the right sector. Spawning and despawning update membership
//! automatically.
//!
//! ```
//! # use starlane_core::arena::Arena;
//! # use starlane_core::entity::EntityBlueprint;
//! # use glam::Vec2;
//! # let mut arena = Arena::new();
//! # let ship = arena.spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0)).unwrap();
//! if let Some(entity) = arena.get_mut(ship) {
//!     entity.transform.position = Vec2::new(3000.0, 0.0);
//! }
//! arena.relocate(ship).unwrap();
//! assert_eq!(arena.sector_name_of(ship), Some("Sector [1025, -1025]"));
//! ```
//!
//! # Destruction
//!
//! [`Arena::destroy`] only marks an actor. Marked actors stay in the world
//! until [`Arena::reap`] removes them, which happens once per tick after all
//! resolvers have run.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use glam::Vec2;
use quadrant::{Sector, SectorConfig, SectorManager};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity::components::{ContactBand, StatusFlags};
use crate::entity::{Entity, EntityBlueprint, EntityId, EntityInner, EntityTag};
use crate::error::SimError;
use crate::output::Event;

/// Actor registry for one world.
///
/// # Determinism
///
/// Entity IDs are assigned monotonically and never reused. Storage is a
/// `BTreeMap`, so iterating always visits entities in ID order.
///
/// # Example
///
/// ```
/// use starlane_core::arena::Arena;
/// use starlane_core::entity::EntityBlueprint;
/// use starlane_core::entity::components::CelestialKind;
/// use glam::Vec2;
///
/// let mut arena = Arena::new();
/// let sun = arena.spawn(EntityBlueprint::celestial(CelestialKind::Sun, Vec2::ZERO, 50.0)).unwrap();
/// let ship = arena.spawn(EntityBlueprint::ship(Vec2::new(100.0, 0.0), 0.0, 15.0)).unwrap();
///
/// let ids: Vec<_> = arena.entity_ids_sorted().collect();
/// assert_eq!(ids, vec![sun, ship]);
/// assert_eq!(arena.query_radius(Vec2::ZERO, 60.0), vec![sun]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Next ID to hand out.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Sector membership of every live actor.
    sectors: SectorManager<EntityId>,
    /// Actors marked for destruction and who destroyed them.
    pending: BTreeMap<EntityId, Option<EntityId>>,
    /// Current simulation tick.
    tick: u64,
    /// Simulated time in milliseconds.
    elapsed_ms: f64,
}

impl Arena {
    /// Creates an empty arena with the default sector grid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sectors(SectorConfig::default())
    }

    /// Creates an empty arena with a custom sector grid.
    #[must_use]
    pub fn with_sectors(config: SectorConfig) -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            sectors: SectorManager::new(config),
            pending: BTreeMap::new(),
            tick: 0,
            elapsed_ms: 0.0,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns an actor and places it in its sector.
    ///
    /// Orbiting bodies are placed on their orbit around the parent and linked
    /// into the parent's children. Turrets are placed on their mount point and
    /// attached to the owner's hardpoints.
    ///
    /// # Arguments
    ///
    /// * `blueprint` - Spawn description
    ///
    /// # Returns
    ///
    /// The ID assigned to the new actor.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownEntity`] if the orbit parent or turret owner does not exist
    /// - [`SimError::WrongKind`] if a turret owner is not a ship
    /// - [`SimError::Sector`] if the position is not finite
    ///
    /// Nothing is changed on error and no ID is consumed.
    pub fn spawn(&mut self, mut blueprint: EntityBlueprint) -> Result<EntityId, SimError> {
        let id = EntityId::new(self.next_id);

        let mut orbit_parent = None;
        let mut turret_owner = None;
        match &blueprint.inner {
            EntityInner::Celestial(celestial) => {
                if let Some(orbit) = &celestial.orbit {
                    let parent = self
                        .entities
                        .get(&orbit.parent)
                        .ok_or(SimError::UnknownEntity(orbit.parent))?;
                    blueprint.transform.position = parent.position() + orbit.offset();
                    orbit_parent = Some(orbit.parent);
                }
            }
            EntityInner::Turret(turret) => {
                let owner = self.require(turret.owner, EntityTag::Ship)?;
                blueprint.transform = owner.transform.mounted(turret.spec.mount_offset);
                turret_owner = Some(turret.owner);
            }
            EntityInner::Ship(_) | EntityInner::Projectile(_) => {}
        }

        let sector = self.sectors.add_actor(id, blueprint.transform.position)?;
        self.next_id += 1;

        let entity = Entity::from_blueprint(id, blueprint);
        debug!(
            entity = %id,
            name = entity.name(),
            tag = %entity.tag(),
            %sector,
            "spawned actor"
        );
        self.entities.insert(id, entity);

        if let Some(parent) = orbit_parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children_mut().push(id);
        }
        if let Some(ship) = turret_owner
            .and_then(|o| self.entities.get_mut(&o))
            .and_then(Entity::as_ship_mut)
        {
            ship.hardpoints.attach(id);
        }

        Ok(id)
    }

    /// Removes an actor immediately, without notifications or cascades.
    ///
    /// Simulation code destroys actors through [`Arena::destroy`] instead.
    ///
    /// # Returns
    ///
    /// The removed entity, if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.sectors.destroy_actor(id);
        self.pending.remove(&id);
        let entity = self.entities.remove(&id);
        if entity.is_some() {
            debug!(entity = %id, "despawned actor");
        }
        entity
    }

    /// Marks an actor for destruction.
    ///
    /// The mark is terminal and idempotent: the first call returns `true`,
    /// later calls (and calls for unknown actors) return `false` and change
    /// nothing. The actor is removed by the next [`Arena::reap`].
    pub fn destroy(&mut self, id: EntityId, destroyer: Option<EntityId>) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if entity.is_destroyed() {
            return false;
        }
        entity.status.insert(StatusFlags::DESTROYED);
        self.pending.insert(id, destroyer);
        info!(actor = %id, name = entity.name(), ?destroyer, "actor destroyed");
        true
    }

    /// Returns `true` if the actor is marked and waiting to be reaped.
    #[must_use]
    pub fn is_pending_destruction(&self, id: EntityId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of actors waiting to be reaped.
    #[must_use]
    pub fn pending_destruction_count(&self) -> usize {
        self.pending.len()
    }

    /// Removes every actor marked for destruction.
    ///
    /// - Turrets of a destroyed ship are destroyed with it
    /// - Destroyed actors leave every surviving ship's contact sets, emitting
    ///   `ContactRemoved`, and every projectile's carried contacts
    /// - Destroyed bodies are unlinked from their orbit parent, destroyed
    ///   turrets from their owner's hardpoints
    /// - Exactly one `ActorDestroyed` is emitted per actor
    ///
    /// # Returns
    ///
    /// The notifications, in entity ID order.
    pub fn reap(&mut self) -> Vec<Event> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let cascades: Vec<(EntityId, Option<EntityId>)> = self
            .pending
            .iter()
            .filter_map(|(id, destroyer)| {
                let ship = self.entities.get(id)?.as_ship()?;
                Some(ship.hardpoints.mounts.iter().map(move |turret| (*turret, *destroyer)))
            })
            .flatten()
            .collect();
        for (turret, destroyer) in cascades {
            self.destroy(turret, destroyer);
        }

        let pending = std::mem::take(&mut self.pending);
        let doomed: BTreeSet<EntityId> = pending.keys().copied().collect();
        let mut events = Vec::new();

        for entity in self.entities.values_mut() {
            let owner = entity.id();
            if doomed.contains(&owner) {
                continue;
            }
            match entity.inner_mut() {
                EntityInner::Ship(ship) => {
                    for band in ContactBand::ALL {
                        let contacts = ship.sensor.contacts_mut(band);
                        for contact in &doomed {
                            if contacts.remove(contact) {
                                events.push(Event::ContactRemoved {
                                    ship: owner,
                                    contact: *contact,
                                    band,
                                });
                            }
                        }
                    }
                }
                EntityInner::Projectile(projectile) => {
                    projectile.contacts.retain(|c| !doomed.contains(c));
                }
                EntityInner::Celestial(_) | EntityInner::Turret(_) => {}
            }
        }

        for (id, destroyer) in pending {
            let Some(entity) = self.despawn(id) else {
                continue;
            };
            self.unlink(&entity);
            events.push(Event::ActorDestroyed {
                actor: id,
                destroyer,
            });
        }

        events
    }

    fn unlink(&mut self, entity: &Entity) {
        let id = entity.id();
        if let Some(orbit) = entity.as_celestial().and_then(|c| c.orbit) {
            if let Some(parent) = self.entities.get_mut(&orbit.parent) {
                parent.children_mut().retain(|child| *child != id);
            }
        }
        if let Some(turret) = entity.as_turret() {
            if let Some(ship) = self
                .entities
                .get_mut(&turret.owner)
                .and_then(Entity::as_ship_mut)
            {
                ship.hardpoints.detach(id);
            }
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns the entity if it exists and carries `tag`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownEntity`] or [`SimError::WrongKind`].
    pub fn require(&self, id: EntityId, tag: EntityTag) -> Result<&Entity, SimError> {
        let entity = self.get(id).ok_or(SimError::UnknownEntity(id))?;
        if entity.tag() == tag {
            Ok(entity)
        } else {
            Err(SimError::WrongKind {
                id,
                expected: tag,
                actual: entity.tag(),
            })
        }
    }

    /// Mutable variant of [`Arena::require`].
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownEntity`] or [`SimError::WrongKind`].
    pub fn require_mut(&mut self, id: EntityId, tag: EntityTag) -> Result<&mut Entity, SimError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SimError::UnknownEntity(id))?;
        if entity.tag() == tag {
            Ok(entity)
        } else {
            Err(SimError::WrongKind {
                id,
                expected: tag,
                actual: entity.tag(),
            })
        }
    }

    /// Returns an iterator over entity IDs in sorted order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in ID order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns an iterator over mutable entities in ID order.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Returns the number of entities in the arena.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // =========================================================================
    // Sectors
    // =========================================================================

    /// Returns the sector index.
    #[must_use]
    pub fn sectors(&self) -> &SectorManager<EntityId> {
        &self.sectors
    }

    /// Returns the sector index mutably, for subdivision and hover state.
    #[must_use]
    pub fn sectors_mut(&mut self) -> &mut SectorManager<EntityId> {
        &mut self.sectors
    }

    /// Moves an actor into the sector containing its current position.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownEntity`] for unknown actors, [`SimError::Sector`] for
    /// non-finite positions (membership is left unchanged).
    pub fn relocate(&mut self, id: EntityId) -> Result<(), SimError> {
        let position = self
            .entities
            .get(&id)
            .ok_or(SimError::UnknownEntity(id))?
            .position();
        self.sectors.add_actor(id, position)?;
        Ok(())
    }

    /// Name of the sector an actor is in.
    #[must_use]
    pub fn sector_name_of(&self, id: EntityId) -> Option<&str> {
        let sector = self.sectors.sector_of(id)?;
        self.sectors.sector(sector).map(Sector::name)
    }

    /// Actors within `radius` of `center`, inclusive, sorted by ID.
    ///
    /// Only sectors whose bounds intersect the circle are visited.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let mut found: Vec<EntityId> = self
            .sectors
            .leaves()
            .filter(|sector| sector.bounds().intersects_circle(center, radius))
            .flat_map(Sector::actors)
            .copied()
            .filter(|id| {
                self.entities
                    .get(id)
                    .is_some_and(|e| e.position().distance_squared(center) <= radius_sq)
            })
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Makes `id` the only selected actor.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownEntity`] if the actor does not exist. The previous
    /// selection is kept in that case.
    pub fn select(&mut self, id: EntityId) -> Result<(), SimError> {
        if !self.entities.contains_key(&id) {
            return Err(SimError::UnknownEntity(id));
        }
        for entity in self.entities.values_mut() {
            entity.status.set(StatusFlags::SELECTED, entity.id() == id);
        }
        Ok(())
    }

    /// Clears the selection flag everywhere.
    pub fn clear_selection(&mut self) {
        for entity in self.entities.values_mut() {
            entity.status.remove(StatusFlags::SELECTED);
        }
    }

    /// The selected actor, if any.
    #[must_use]
    pub fn selected(&self) -> Option<EntityId> {
        self.entities
            .values()
            .find(|e| e.is_selected())
            .map(Entity::id)
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Returns the current simulation tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time in milliseconds.
    #[must_use]
    pub const fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Advances the tick counter and the clock by one tick of `tick_ms`.
    pub fn advance_tick(&mut self, tick_ms: f32) {
        self.tick += 1;
        self.elapsed_ms += f64::from(tick_ms);
    }

    /// Deterministic hash of entity state and sector membership.
    ///
    /// Two arenas that went through the same operations hash identically.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.next_id.hash(&mut hasher);
        for entity in self.entities.values() {
            entity.id().hash(&mut hasher);
            entity.tag().hash(&mut hasher);
            entity.transform.position.x.to_bits().hash(&mut hasher);
            entity.transform.position.y.to_bits().hash(&mut hasher);
            entity.transform.rotation.to_bits().hash(&mut hasher);
            entity.hull.health.to_bits().hash(&mut hasher);
            entity.status.bits().hash(&mut hasher);
        }
        quadrant::hash_sectors(&self.sectors).hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
