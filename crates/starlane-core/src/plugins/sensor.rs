//! Sensor plugin for contact tracking.
//!
//! On each scheduled scan a ship queries the sector index out to its widest
//! band and diffs the actors it finds against its radar and visual contact
//! sets. Projectiles and the ship's own turrets never become contacts.
//!
//! # Supported Entity Types
//!
//! - Ships
//!
//! # Outputs
//!
//! - `ContactAdded` for each actor entering a band
//! - `ContactRemoved` for each actor leaving a band

use std::collections::BTreeSet;

use crate::entity::components::ContactBand;
use crate::entity::{EntityId, EntityTag};
use crate::output::{Event, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::world_view::WorldView;

/// Plugin that scans for contacts.
pub struct SensorPlugin {
    declaration: PluginDeclaration,
}

impl SensorPlugin {
    /// Creates a new `SensorPlugin`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::from_static("sensor"),
                required_tags: vec![EntityTag::Ship],
                reads: vec![
                    ComponentKind::Transform,
                    ComponentKind::Sensor,
                    ComponentKind::Hardpoints,
                ],
                emits: vec![OutputKind::Event],
            },
        }
    }
}

impl Default for SensorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SensorPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let id = ctx.entity_id;
        let (Some(transform), Some(sensor)) = (view.get_transform(id), view.get_sensor(id)) else {
            return Vec::new();
        };
        if ctx.tick < sensor.next_scan_tick {
            return Vec::new();
        }

        let own_mounts = view
            .get_hardpoints(id)
            .map_or(&[][..], |hardpoints| hardpoints.mounts.as_slice());

        let position = transform.position;
        let candidates: Vec<(EntityId, f32)> = view
            .query_in_radius(position, sensor.max_range())
            .into_iter()
            .filter(|&other| other != id && !own_mounts.contains(&other))
            .filter_map(|other| view.get_entity(other))
            .filter(|entity| !entity.is_destroyed() && !entity.is_projectile())
            .map(|entity| (entity.id(), entity.position().distance(position)))
            .collect();

        let mut outputs = Vec::new();
        for band in ContactBand::ALL {
            let range = sensor.range(band);
            let visible: BTreeSet<EntityId> = candidates
                .iter()
                .filter(|(_, distance)| *distance <= range)
                .map(|(other, _)| *other)
                .collect();
            let known = sensor.contacts(band);

            for &contact in visible.difference(known) {
                outputs.push(Output::Event(Event::ContactAdded {
                    ship: id,
                    contact,
                    band,
                }));
            }
            for &contact in known.difference(&visible) {
                outputs.push(Output::Event(Event::ContactRemoved {
                    ship: id,
                    contact,
                    band,
                }));
            }
        }
        outputs
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::entity::components::{DamageKind, TurretSpec};
    use crate::entity::{CelestialKind, EntityBlueprint};
    use crate::output::TraceId;
    use glam::Vec2;

    fn asteroid(arena: &mut Arena, x: f32) -> EntityId {
        arena
            .spawn(EntityBlueprint::celestial(
                CelestialKind::Asteroid,
                Vec2::new(x, 0.0),
                10.0,
            ))
            .unwrap()
    }

    fn run_at(arena: &Arena, id: EntityId, tick: u64) -> Vec<Output> {
        let plugin = SensorPlugin::new();
        let view = WorldView::for_plugin(arena, plugin.declaration(), tick);
        let ctx = PluginContext {
            entity_id: id,
            tick,
            trace_id: TraceId::new(0),
        };
        plugin.run(&ctx, &view)
    }

    fn gun() -> TurretSpec {
        TurretSpec {
            name: "Test Gun".to_string(),
            recoil_ms: 250.0,
            projectiles_per_burst: 1,
            burst_delay_ms: 0.0,
            range: 1000.0,
            accuracy: 100.0,
            mount_offset: Vec2::new(5.0, 0.0),
            projectile_speed: 10.0,
            damage: 5.0,
            damage_kind: DamageKind::Kinetic,
        }
    }

    fn added(outputs: &[Output], band: ContactBand) -> Vec<EntityId> {
        outputs
            .iter()
            .filter_map(|output| match output {
                Output::Event(Event::ContactAdded {
                    contact, band: b, ..
                }) if *b == band => Some(*contact),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_creates_plugin() {
        let plugin = SensorPlugin::new();
        assert_eq!(plugin.declaration().id.as_str(), "sensor");
    }

    #[test]
    fn default_creates_plugin() {
        let plugin = SensorPlugin::default();
        assert_eq!(plugin.declaration().id.as_str(), "sensor");
    }

    #[test]
    fn declaration_reads_transform_sensor_and_hardpoints() {
        let plugin = SensorPlugin::new();
        let decl = plugin.declaration();
        assert!(decl.reads.contains(&ComponentKind::Transform));
        assert!(decl.reads.contains(&ComponentKind::Sensor));
        assert!(decl.reads.contains(&ComponentKind::Hardpoints));
    }

    #[test]
    fn declaration_emits_events() {
        let plugin = SensorPlugin::new();
        assert_eq!(plugin.declaration().emits, vec![OutputKind::Event]);
    }

    mod scan_tests {
        use super::*;

        #[test]
        fn bands_split_by_range() {
            let mut arena = Arena::new();
            let ship = arena
                .spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0))
                .unwrap();
            let close = asteroid(&mut arena, 200.0);
            let mid = asteroid(&mut arena, 400.0);
            let _distant = asteroid(&mut arena, 600.0);

            let outputs = run_at(&arena, ship, 0);
            assert_eq!(added(&outputs, ContactBand::Radar), vec![close]);
            assert_eq!(added(&outputs, ContactBand::Visual), vec![close, mid]);
        }

        #[test]
        fn known_contacts_are_not_re_added() {
            let mut arena = Arena::new();
            let ship = arena
                .spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0))
                .unwrap();
            let close = asteroid(&mut arena, 200.0);
            let sensor = &mut arena.get_mut(ship).unwrap().as_ship_mut().unwrap().sensor;
            sensor.radar_contacts.insert(close);
            sensor.visual_contacts.insert(close);

            assert!(run_at(&arena, ship, 0).is_empty());
        }

        #[test]
        fn departed_contacts_are_removed() {
            let mut arena = Arena::new();
            let ship = arena
                .spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0))
                .unwrap();
            let gone = EntityId::new(77);
            arena
                .get_mut(ship)
                .unwrap()
                .as_ship_mut()
                .unwrap()
                .sensor
                .radar_contacts
                .insert(gone);

            assert_eq!(
                run_at(&arena, ship, 0),
                vec![Output::Event(Event::ContactRemoved {
                    ship,
                    contact: gone,
                    band: ContactBand::Radar,
                })]
            );
        }

        #[test]
        fn own_turrets_are_ignored() {
            let mut arena = Arena::new();
            let ship = arena
                .spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0))
                .unwrap();
            arena.spawn(EntityBlueprint::turret(ship, gun())).unwrap();

            assert!(run_at(&arena, ship, 0).is_empty());
        }

        #[test]
        fn foreign_turrets_are_contacts() {
            let mut arena = Arena::new();
            let ship = arena
                .spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0))
                .unwrap();
            let other = arena
                .spawn(EntityBlueprint::ship(Vec2::new(100.0, 0.0), 0.0, 15.0))
                .unwrap();
            arena.spawn(EntityBlueprint::turret(ship, gun())).unwrap();
            let foreign = arena.spawn(EntityBlueprint::turret(other, gun())).unwrap();

            let outputs = run_at(&arena, ship, 0);
            assert_eq!(added(&outputs, ContactBand::Radar), vec![other, foreign]);
        }

        #[test]
        fn scan_waits_for_schedule() {
            let mut arena = Arena::new();
            let ship = arena
                .spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0))
                .unwrap();
            asteroid(&mut arena, 100.0);
            arena
                .get_mut(ship)
                .unwrap()
                .as_ship_mut()
                .unwrap()
                .sensor
                .next_scan_tick = 15;

            assert!(run_at(&arena, ship, 14).is_empty());
            assert_eq!(run_at(&arena, ship, 15).len(), 2);
        }
    }

    #[test]
    fn plugin_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SensorPlugin>();
    }

    #[test]
    fn run_with_nonexistent_entity() {
        let arena = Arena::new();
        assert!(run_at(&arena, EntityId::new(999), 0).is_empty());
    }
}
