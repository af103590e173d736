//! Entity module for the Entity-Plugin-Resolver architecture.
//!
//! This module provides the flat actor record shared by every variant:
//! - [`EntityId`]: Unique identifier for entities
//! - [`EntityTag`]: Type classification for plugin bundle selection
//! - [`EntityInner`]: Type-safe storage for variant-specific components
//! - [`Entity`]: The complete actor record
//! - [`EntityBlueprint`]: Spawn description consumed by the arena
//!
//! # Architecture
//!
//! Every actor carries the same shared state (transform, size, hull, status
//! flags, orbit children). Behavior differs only through the tag, which
//! selects the plugins that run on the entity, and the inner components
//! those plugins read.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use starlane_core::entity::{EntityBlueprint, EntityTag};
//! use starlane_core::entity::components::CelestialKind;
//!
//! let blueprint = EntityBlueprint::celestial(CelestialKind::Sun, Vec2::ZERO, 50.0);
//! assert_eq!(blueprint.tag(), EntityTag::Celestial);
//! assert_eq!(blueprint.hull.max, 50.0);
//! ```

pub mod components;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::{
    CelestialComponents, CelestialKind, ContactBand, ControlFlags, DamageKind, Hull, Orbit,
    ProjectileComponents, ShipComponents, StatusFlags, Transform, TurretComponents, TurretSpec,
};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Entity IDs are assigned by
/// the arena in spawn order, never reused, and ordered by their numeric value,
/// which fixes iteration order across the simulation.
///
/// # Example
///
/// ```
/// use starlane_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    ///
    /// # Arguments
    ///
    /// * `id` - The raw identifier value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Entity type tag for plugin bundle selection.
///
/// - `Celestial`: Suns, planets, moons, asteroids and stations
/// - `Ship`: Player or AI controlled vessels
/// - `Turret`: Weapon hardpoints mounted on a ship
/// - `Projectile`: Shots in flight
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Natural or static body, optionally orbiting a parent
    Celestial,
    /// Controllable vessel with helm, sensors and hardpoints
    Ship,
    /// Weapon mount repositioned relative to its owner every tick
    Turret,
    /// Shot travelling in a straight line until it hits or expires
    Projectile,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celestial => write!(f, "Celestial"),
            Self::Ship => write!(f, "Ship"),
            Self::Turret => write!(f, "Turret"),
            Self::Projectile => write!(f, "Projectile"),
        }
    }
}

/// Type-safe storage for variant-specific components.
///
/// The variant always matches the entity's [`EntityTag`]; the tag is derived
/// from the variant when the entity is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Celestial components (kind, orbit, shape)
    Celestial(CelestialComponents),
    /// Ship components (helm, sensors, hardpoints)
    Ship(ShipComponents),
    /// Turret components (spec, firing state, cooldown)
    Turret(TurretComponents),
    /// Projectile components (flight, range, carried contacts)
    Projectile(ProjectileComponents),
}

impl EntityInner {
    /// Returns the corresponding `EntityTag` for this inner storage.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Celestial(_) => EntityTag::Celestial,
            Self::Ship(_) => EntityTag::Ship,
            Self::Turret(_) => EntityTag::Turret,
            Self::Projectile(_) => EntityTag::Projectile,
        }
    }

    /// Returns the kind label used in names and snapshots.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Celestial(components) => components.kind.label(),
            Self::Ship(_) => "Ship",
            Self::Turret(_) => "Turret",
            Self::Projectile(_) => "Projectile",
        }
    }

    /// Returns a reference to the celestial components, if this is a celestial body.
    #[must_use]
    pub const fn as_celestial(&self) -> Option<&CelestialComponents> {
        match self {
            Self::Celestial(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the celestial components, if this is a celestial body.
    #[must_use]
    pub fn as_celestial_mut(&mut self) -> Option<&mut CelestialComponents> {
        match self {
            Self::Celestial(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the ship components, if this is a ship.
    #[must_use]
    pub const fn as_ship(&self) -> Option<&ShipComponents> {
        match self {
            Self::Ship(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the ship components, if this is a ship.
    #[must_use]
    pub fn as_ship_mut(&mut self) -> Option<&mut ShipComponents> {
        match self {
            Self::Ship(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the turret components, if this is a turret.
    #[must_use]
    pub const fn as_turret(&self) -> Option<&TurretComponents> {
        match self {
            Self::Turret(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the turret components, if this is a turret.
    #[must_use]
    pub fn as_turret_mut(&mut self) -> Option<&mut TurretComponents> {
        match self {
            Self::Turret(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the projectile components, if this is a projectile.
    #[must_use]
    pub const fn as_projectile(&self) -> Option<&ProjectileComponents> {
        match self {
            Self::Projectile(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the projectile components, if this is a projectile.
    #[must_use]
    pub fn as_projectile_mut(&mut self) -> Option<&mut ProjectileComponents> {
        match self {
            Self::Projectile(components) => Some(components),
            _ => None,
        }
    }
}

/// A complete actor in the simulation.
///
/// # Invariants
///
/// - The `EntityId` is unique within an arena
/// - The `EntityTag` matches the `EntityInner` variant
/// - Once `StatusFlags::DESTROYED` is set it is never cleared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    name: String,
    /// Position and heading
    pub transform: Transform,
    /// Radius used for hit tests and display
    pub size: f32,
    /// Structural health
    pub hull: Hull,
    /// Lifecycle and selection flags
    pub status: StatusFlags,
    children: Vec<EntityId>,
    inner: EntityInner,
}

impl Entity {
    /// Builds an entity from a blueprint under the given id.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier assigned by the arena
    /// * `blueprint` - Spawn description
    #[must_use]
    pub fn from_blueprint(id: EntityId, blueprint: EntityBlueprint) -> Self {
        let name = blueprint
            .name
            .unwrap_or_else(|| format!("{}-{}", blueprint.inner.kind_label(), id));
        Self {
            id,
            tag: blueprint.inner.tag(),
            name,
            transform: blueprint.transform,
            size: blueprint.size,
            hull: blueprint.hull,
            status: StatusFlags::empty(),
            children: Vec::new(),
            inner: blueprint.inner,
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's type tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind label (`"Asteroid"`, `"Ship"`, ...).
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        self.inner.kind_label()
    }

    /// Returns the entity's position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Bodies orbiting this one.
    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<EntityId> {
        &mut self.children
    }

    /// Returns a reference to the entity's inner component storage.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns a mutable reference to the entity's inner component storage.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Returns `true` once the entity has been marked for destruction.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.status.contains(StatusFlags::DESTROYED)
    }

    /// Returns `true` if the host has selected this entity.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.status.contains(StatusFlags::SELECTED)
    }

    /// Returns `true` if this entity is a celestial body.
    #[must_use]
    pub const fn is_celestial(&self) -> bool {
        matches!(self.tag, EntityTag::Celestial)
    }

    /// Returns `true` if this entity is a ship.
    #[must_use]
    pub const fn is_ship(&self) -> bool {
        matches!(self.tag, EntityTag::Ship)
    }

    /// Returns `true` if this entity is a turret.
    #[must_use]
    pub const fn is_turret(&self) -> bool {
        matches!(self.tag, EntityTag::Turret)
    }

    /// Returns `true` if this entity is a projectile.
    #[must_use]
    pub const fn is_projectile(&self) -> bool {
        matches!(self.tag, EntityTag::Projectile)
    }

    /// Returns the celestial components if this is a celestial body.
    #[must_use]
    pub const fn as_celestial(&self) -> Option<&CelestialComponents> {
        self.inner.as_celestial()
    }

    /// Returns the ship components if this is a ship.
    #[must_use]
    pub const fn as_ship(&self) -> Option<&ShipComponents> {
        self.inner.as_ship()
    }

    /// Returns mutable ship components if this is a ship.
    #[must_use]
    pub fn as_ship_mut(&mut self) -> Option<&mut ShipComponents> {
        self.inner.as_ship_mut()
    }

    /// Returns the turret components if this is a turret.
    #[must_use]
    pub const fn as_turret(&self) -> Option<&TurretComponents> {
        self.inner.as_turret()
    }

    /// Returns mutable turret components if this is a turret.
    #[must_use]
    pub fn as_turret_mut(&mut self) -> Option<&mut TurretComponents> {
        self.inner.as_turret_mut()
    }

    /// Returns the projectile components if this is a projectile.
    #[must_use]
    pub const fn as_projectile(&self) -> Option<&ProjectileComponents> {
        self.inner.as_projectile()
    }

    /// Returns mutable projectile components if this is a projectile.
    #[must_use]
    pub fn as_projectile_mut(&mut self) -> Option<&mut ProjectileComponents> {
        self.inner.as_projectile_mut()
    }

    /// Velocity per tick. Zero for bodies without their own velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        match &self.inner {
            EntityInner::Ship(ship) => ship.helm.velocity,
            EntityInner::Projectile(projectile) => projectile.velocity,
            EntityInner::Celestial(_) | EntityInner::Turret(_) => Vec2::ZERO,
        }
    }

    /// Speed per tick.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity().length()
    }
}

/// Description of an entity to spawn.
///
/// Built with one of the variant constructors and refined with the `with_*`
/// methods, then handed to [`Arena::spawn`](crate::arena::Arena::spawn).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBlueprint {
    /// Explicit name; defaults to `"<Kind>-<id>"`
    pub name: Option<String>,
    /// Initial transform. Orbiting bodies and turrets are repositioned on spawn.
    pub transform: Transform,
    /// Radius
    pub size: f32,
    /// Initial hull
    pub hull: Hull,
    /// Variant components
    pub inner: EntityInner,
}

impl EntityBlueprint {
    /// A celestial body whose hull equals its size.
    #[must_use]
    pub fn celestial(kind: CelestialKind, position: Vec2, size: f32) -> Self {
        Self {
            name: None,
            transform: Transform::new(position, 0.0),
            size,
            hull: Hull::new(size),
            inner: EntityInner::Celestial(CelestialComponents::new(kind)),
        }
    }

    /// A ship with a full 100-point hull and default sensors.
    #[must_use]
    pub fn ship(position: Vec2, rotation: f32, size: f32) -> Self {
        Self {
            name: None,
            transform: Transform::new(position, rotation),
            size,
            hull: Hull::default(),
            inner: EntityInner::Ship(ShipComponents::default()),
        }
    }

    /// A turret for `owner`, named after its spec.
    #[must_use]
    pub fn turret(owner: EntityId, spec: TurretSpec) -> Self {
        Self {
            name: Some(spec.name.clone()),
            transform: Transform::default(),
            size: 1.0,
            hull: Hull::new(1.0),
            inner: EntityInner::Turret(TurretComponents::new(owner, spec)),
        }
    }

    /// A projectile launched from `components.origin` along `rotation`.
    #[must_use]
    pub fn projectile(rotation: f32, components: ProjectileComponents) -> Self {
        Self {
            name: None,
            transform: Transform::new(components.origin, rotation),
            size: 1.0,
            hull: Hull::new(1.0),
            inner: EntityInner::Projectile(components),
        }
    }

    /// Puts a celestial body on a circular orbit around `parent`.
    ///
    /// Has no effect on other variants.
    #[must_use]
    pub fn with_orbit(mut self, parent: EntityId, radius: f32, angle: f32, angular_speed: f32) -> Self {
        if let EntityInner::Celestial(celestial) = &mut self.inner {
            celestial.orbit = Some(Orbit {
                parent,
                radius,
                angle: f64::from(angle),
                angular_speed,
            });
        }
        self
    }

    /// Attaches a host shape id to a celestial body.
    #[must_use]
    pub fn with_shape(mut self, shape_id: u32) -> Self {
        if let EntityInner::Celestial(celestial) = &mut self.inner {
            celestial.shape_id = Some(shape_id);
        }
        self
    }

    /// Overrides the default name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the hull.
    #[must_use]
    pub fn with_hull(mut self, max: f32) -> Self {
        self.hull = Hull::new(max);
        self
    }

    /// Tag the spawned entity will carry.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.inner.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entity_id_tests {
        use super::*;

        #[test]
        fn ordering_follows_value() {
            let mut ids = vec![EntityId::new(5), EntityId::new(1), EntityId::new(3)];
            ids.sort();
            assert_eq!(ids, vec![EntityId::new(1), EntityId::new(3), EntityId::new(5)]);
        }

        #[test]
        fn debug_and_display() {
            let id = EntityId::new(42);
            assert_eq!(format!("{id:?}"), "EntityId(42)");
            assert_eq!(format!("{id}"), "42");
        }

        #[test]
        fn u64_conversions() {
            let id: EntityId = 7u64.into();
            let raw: u64 = id.into();
            assert_eq!(raw, 7);
        }
    }

    mod entity_tag_tests {
        use super::*;

        #[test]
        fn display() {
            assert_eq!(EntityTag::Celestial.to_string(), "Celestial");
            assert_eq!(EntityTag::Ship.to_string(), "Ship");
            assert_eq!(EntityTag::Turret.to_string(), "Turret");
            assert_eq!(EntityTag::Projectile.to_string(), "Projectile");
        }
    }

    mod entity_tests {
        use super::*;

        #[test]
        fn default_name_uses_kind_and_id() {
            let blueprint =
                EntityBlueprint::celestial(CelestialKind::Asteroid, Vec2::new(1.0, 2.0), 20.0);
            let entity = Entity::from_blueprint(EntityId::new(9), blueprint);
            assert_eq!(entity.name(), "Asteroid-9");
            assert_eq!(entity.kind_label(), "Asteroid");
            assert_eq!(entity.tag(), EntityTag::Celestial);
            assert_eq!(entity.position(), Vec2::new(1.0, 2.0));
            assert_eq!(entity.hull.max, 20.0);
        }

        #[test]
        fn explicit_name_wins() {
            let blueprint = EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0).named("Player");
            let entity = Entity::from_blueprint(EntityId::new(1), blueprint);
            assert_eq!(entity.name(), "Player");
            assert!(entity.is_ship());
            assert_eq!(entity.hull.health, 100.0);
        }

        #[test]
        fn turret_takes_spec_name() {
            let spec = TurretSpec {
                name: "Autocannon".to_string(),
                recoil_ms: 250.0,
                projectiles_per_burst: 1,
                burst_delay_ms: 0.0,
                range: 1000.0,
                accuracy: 90.0,
                mount_offset: Vec2::ZERO,
                projectile_speed: 8.0,
                damage: 5.0,
                damage_kind: DamageKind::Kinetic,
            };
            let entity =
                Entity::from_blueprint(EntityId::new(2), EntityBlueprint::turret(EntityId::new(1), spec));
            assert_eq!(entity.name(), "Autocannon");
            assert!(entity.is_turret());
            assert_eq!(entity.as_turret().map(|t| t.owner), Some(EntityId::new(1)));
        }

        #[test]
        fn fresh_entities_are_alive_and_unselected() {
            let entity =
                Entity::from_blueprint(EntityId::new(1), EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0));
            assert!(!entity.is_destroyed());
            assert!(!entity.is_selected());
            assert!(entity.children().is_empty());
            assert_eq!(entity.speed(), 0.0);
        }

        #[test]
        fn accessors_match_variant() {
            let entity = Entity::from_blueprint(
                EntityId::new(1),
                EntityBlueprint::celestial(CelestialKind::Sun, Vec2::ZERO, 50.0),
            );
            assert!(entity.as_celestial().is_some());
            assert!(entity.as_ship().is_none());
            assert!(entity.as_turret().is_none());
            assert!(entity.as_projectile().is_none());
        }
    }

    mod blueprint_tests {
        use super::*;

        #[test]
        fn orbit_only_applies_to_celestials() {
            let parent = EntityId::new(0);
            let moon = EntityBlueprint::celestial(CelestialKind::Moon, Vec2::ZERO, 5.0)
                .with_orbit(parent, 100.0, 0.0, 0.01)
                .with_shape(3);
            let celestial = moon.inner.as_celestial().cloned();
            assert_eq!(celestial.as_ref().and_then(|c| c.orbit).map(|o| o.radius), Some(100.0));
            assert_eq!(celestial.and_then(|c| c.shape_id), Some(3));

            let ship = EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0).with_orbit(parent, 1.0, 0.0, 0.1);
            assert_eq!(ship.tag(), EntityTag::Ship);
        }

        #[test]
        fn hull_override() {
            let body = EntityBlueprint::celestial(CelestialKind::Station, Vec2::ZERO, 30.0).with_hull(500.0);
            assert_eq!(body.hull.health, 500.0);
        }
    }
}
