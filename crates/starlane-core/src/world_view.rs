//! Read-only window onto the arena, limited to what a plugin declared.
//!
//! Asking for an undeclared component is a bug in the plugin: debug builds
//! panic on it, release builds answer `None`.
//!
//! # Example
//!
//! ```
//! use starlane_core::arena::Arena;
//! use starlane_core::entity::{EntityBlueprint, EntityTag};
//! use starlane_core::plugin::{PluginDeclaration, PluginId, ComponentKind};
//! use starlane_core::output::OutputKind;
//! use starlane_core::world_view::WorldView;
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let ship = arena.spawn(EntityBlueprint::ship(Vec2::new(100.0, 200.0), 0.5, 15.0)).unwrap();
//!
//! let decl = PluginDeclaration {
//!     id: PluginId::new("test"),
//!     required_tags: vec![EntityTag::Ship],
//!     reads: vec![ComponentKind::Transform],
//!     emits: vec![OutputKind::Command],
//! };
//!
//! let view = WorldView::for_plugin(&arena, &decl, arena.current_tick());
//! let transform = view.get_transform(ship).unwrap();
//! assert_eq!(transform.position, Vec2::new(100.0, 200.0));
//! ```

use glam::Vec2;

use crate::arena::Arena;
use crate::entity::components::{
    Hardpoints, HelmState, ProjectileComponents, SensorState, Transform, TurretComponents,
};
use crate::entity::{Entity, EntityId, EntityTag};
use crate::plugin::{ComponentKind, PluginDeclaration};

// =============================================================================
// WorldView
// =============================================================================

/// Borrowed view of one arena for one plugin.
///
/// Whole-entity lookups, tag queries and radius queries are open to every
/// plugin; per-component getters check the declaration.
#[derive(Debug)]
pub struct WorldView<'a> {
    arena: &'a Arena,
    tick: u64,
    allowed_components: &'a [ComponentKind],
}

impl<'a> WorldView<'a> {
    /// View limited to `decl.reads`.
    #[must_use]
    pub fn for_plugin(arena: &'a Arena, decl: &'a PluginDeclaration, tick: u64) -> Self {
        Self {
            arena,
            tick,
            allowed_components: &decl.reads,
        }
    }

    /// Unrestricted view.
    ///
    /// Used by tests and host-side code such as snapshot building.
    #[must_use]
    pub fn full_access(arena: &'a Arena, tick: u64) -> Self {
        static ALL_COMPONENTS: &[ComponentKind] = &[
            ComponentKind::Transform,
            ComponentKind::Helm,
            ComponentKind::Sensor,
            ComponentKind::Hardpoints,
            ComponentKind::Turret,
            ComponentKind::Projectile,
        ];

        Self {
            arena,
            tick,
            allowed_components: ALL_COMPONENTS,
        }
    }

    /// Tick the plugins are computing.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns a reference to an entity by ID. Always allowed.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&'a Entity> {
        self.arena.get(id)
    }

    /// Returns an entity's transform. Requires `ComponentKind::Transform`.
    #[must_use]
    pub fn get_transform(&self, id: EntityId) -> Option<&'a Transform> {
        self.check_access(ComponentKind::Transform)?;
        self.arena.get(id).map(|entity| &entity.transform)
    }

    /// Returns a ship's helm state. Requires `ComponentKind::Helm`.
    ///
    /// `None` for entities that are not ships.
    #[must_use]
    pub fn get_helm(&self, id: EntityId) -> Option<&'a HelmState> {
        self.check_access(ComponentKind::Helm)?;
        self.arena.get(id)?.as_ship().map(|ship| &ship.helm)
    }

    /// Returns a ship's sensor state. Requires `ComponentKind::Sensor`.
    #[must_use]
    pub fn get_sensor(&self, id: EntityId) -> Option<&'a SensorState> {
        self.check_access(ComponentKind::Sensor)?;
        self.arena.get(id)?.as_ship().map(|ship| &ship.sensor)
    }

    /// Returns a ship's hardpoints. Requires `ComponentKind::Hardpoints`.
    #[must_use]
    pub fn get_hardpoints(&self, id: EntityId) -> Option<&'a Hardpoints> {
        self.check_access(ComponentKind::Hardpoints)?;
        self.arena.get(id)?.as_ship().map(|ship| &ship.hardpoints)
    }

    /// Returns turret components. Requires `ComponentKind::Turret`.
    #[must_use]
    pub fn get_turret(&self, id: EntityId) -> Option<&'a TurretComponents> {
        self.check_access(ComponentKind::Turret)?;
        self.arena.get(id)?.as_turret()
    }

    /// Returns projectile components. Requires `ComponentKind::Projectile`.
    #[must_use]
    pub fn get_projectile(&self, id: EntityId) -> Option<&'a ProjectileComponents> {
        self.check_access(ComponentKind::Projectile)?;
        self.arena.get(id)?.as_projectile()
    }

    /// Actors whose position is within `radius` of `center` (inclusive), in id order.
    #[must_use]
    pub fn query_in_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.arena.query_radius(center, radius)
    }

    /// Queries for entities with a specific tag, in ID order.
    pub fn query_by_tag(&self, tag: EntityTag) -> impl Iterator<Item = EntityId> + 'a {
        self.arena
            .entities_sorted()
            .filter(move |e| e.tag() == tag)
            .map(Entity::id)
    }

    /// `Some(())` when `kind` was declared.
    #[allow(clippy::unnecessary_wraps)]
    fn check_access(&self, kind: ComponentKind) -> Option<()> {
        if self.allowed_components.contains(&kind) {
            Some(())
        } else {
            #[cfg(debug_assertions)]
            panic!(
                "WorldView access denied: plugin tried to access {:?} but only declared: {:?}",
                kind, self.allowed_components
            );

            #[cfg(not(debug_assertions))]
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::{CelestialKind, DamageKind, TurretSpec};
    use crate::entity::EntityBlueprint;
    use crate::output::{OutputKind, PluginId};

    struct Fixture {
        arena: Arena,
        sun: EntityId,
        moon: EntityId,
        ship: EntityId,
        turret: EntityId,
    }

    fn fixture() -> Fixture {
        let mut arena = Arena::new();
        let sun = arena
            .spawn(EntityBlueprint::celestial(CelestialKind::Sun, Vec2::ZERO, 50.0))
            .unwrap();
        let moon = arena
            .spawn(
                EntityBlueprint::celestial(CelestialKind::Moon, Vec2::ZERO, 5.0)
                    .with_orbit(sun, 300.0, 0.0, 0.01),
            )
            .unwrap();
        let ship = arena
            .spawn(EntityBlueprint::ship(Vec2::new(100.0, 0.0), 0.0, 15.0))
            .unwrap();
        let spec = TurretSpec {
            name: "Test Gun".to_string(),
            recoil_ms: 250.0,
            projectiles_per_burst: 1,
            burst_delay_ms: 0.0,
            range: 1000.0,
            accuracy: 100.0,
            mount_offset: Vec2::ZERO,
            projectile_speed: 10.0,
            damage: 5.0,
            damage_kind: DamageKind::Kinetic,
        };
        let turret = arena.spawn(EntityBlueprint::turret(ship, spec)).unwrap();
        Fixture {
            arena,
            sun,
            moon,
            ship,
            turret,
        }
    }

    fn make_declaration(reads: Vec<ComponentKind>) -> PluginDeclaration {
        PluginDeclaration {
            id: PluginId::new("test"),
            required_tags: vec![EntityTag::Ship],
            reads,
            emits: vec![OutputKind::Command],
        }
    }

    mod access_tests {
        use super::*;

        #[test]
        fn get_entity_always_allowed() {
            let f = fixture();
            let decl = make_declaration(vec![]);
            let view = WorldView::for_plugin(&f.arena, &decl, 0);
            assert!(view.get_entity(f.ship).is_some());
            assert!(view.get_entity(EntityId::new(999)).is_none());
        }

        #[test]
        fn declared_components_are_readable() {
            let f = fixture();
            let decl = make_declaration(vec![
                ComponentKind::Transform,
                ComponentKind::Helm,
                ComponentKind::Sensor,
                ComponentKind::Hardpoints,
            ]);
            let view = WorldView::for_plugin(&f.arena, &decl, 0);
            assert_eq!(view.get_transform(f.ship).map(|t| t.position), Some(Vec2::new(100.0, 0.0)));
            assert!(view.get_helm(f.ship).is_some());
            assert!(view.get_sensor(f.ship).is_some());
            assert_eq!(
                view.get_hardpoints(f.ship).and_then(Hardpoints::selected_mount),
                Some(f.turret)
            );
        }

        #[test]
        fn variant_components_are_none_for_other_tags() {
            let f = fixture();
            let view = WorldView::full_access(&f.arena, 0);
            assert!(view.get_helm(f.sun).is_none());
            assert!(view.get_turret(f.ship).is_none());
            assert!(view.get_projectile(f.turret).is_none());
            assert!(view.get_turret(f.turret).is_some());
            assert!(view.get_helm(f.ship).is_some());
        }

        #[test]
        #[should_panic(expected = "access denied")]
        #[cfg(debug_assertions)]
        fn undeclared_transform_panics_debug() {
            let f = fixture();
            let decl = make_declaration(vec![]);
            let view = WorldView::for_plugin(&f.arena, &decl, 0);
            let _ = view.get_transform(f.ship);
        }

        #[test]
        #[should_panic(expected = "access denied")]
        #[cfg(debug_assertions)]
        fn undeclared_sensor_panics_debug() {
            let f = fixture();
            let decl = make_declaration(vec![ComponentKind::Transform]);
            let view = WorldView::for_plugin(&f.arena, &decl, 0);
            let _ = view.get_sensor(f.ship);
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn query_in_radius_is_sorted_and_inclusive() {
            let f = fixture();
            let view = WorldView::full_access(&f.arena, 0);
            let near = view.query_in_radius(Vec2::ZERO, 100.0);
            assert_eq!(near, vec![f.sun, f.ship, f.turret]);
            assert!(view.query_in_radius(Vec2::new(5000.0, 5000.0), 10.0).is_empty());
        }

        #[test]
        fn query_by_tag() {
            let f = fixture();
            let view = WorldView::full_access(&f.arena, 7);
            let celestials: Vec<_> = view.query_by_tag(EntityTag::Celestial).collect();
            assert_eq!(celestials, vec![f.sun, f.moon]);
            assert_eq!(view.query_by_tag(EntityTag::Projectile).count(), 0);
            assert_eq!(view.tick(), 7);
        }

        #[test]
        fn debug_format() {
            let f = fixture();
            let decl = make_declaration(vec![ComponentKind::Transform]);
            let view = WorldView::for_plugin(&f.arena, &decl, 42);
            let debug = format!("{view:?}");
            assert!(debug.contains("WorldView"));
            assert!(debug.contains("42"));
        }
    }
}
