//! Read-only actor views for the host.
//!
//! Snapshots copy out what a renderer or overview panel polls each frame.
//! They never borrow the arena, so a host can keep them across ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::components::{Hull, TurretComponents};
use crate::entity::{Entity, EntityId, EntityTag};

/// Weapon panel readout for one turret.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurretReadout {
    /// Recoil countdown as a fraction of the last cycle, 0 when ready
    pub remaining_recoil_fraction: f32,
    /// Countdown still holds part of a burst on top of the recoil
    pub overheated: bool,
    /// Turret is trying to fire
    pub firing: bool,
    /// Turret is the owner's selected hardpoint
    pub selected: bool,
}

impl TurretReadout {
    fn capture(arena: &Arena, id: EntityId, turret: &TurretComponents) -> Self {
        let selected = arena
            .get(turret.owner)
            .and_then(Entity::as_ship)
            .and_then(|ship| ship.hardpoints.selected_mount())
            == Some(id);
        Self {
            remaining_recoil_fraction: turret.cooldown.remaining_recoil_fraction(),
            overheated: turret.cooldown.is_overheated(&turret.spec),
            firing: turret.firing,
            selected,
        }
    }
}

/// Everything the host displays about one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Actor ID
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Variant tag
    pub tag: EntityTag,
    /// Kind label, e.g. "Asteroid" or "Ship"
    pub kind: String,
    /// World position
    pub position: Vec2,
    /// Heading in radians
    pub rotation: f32,
    /// Radius
    pub size: f32,
    /// Velocity per tick
    pub velocity: Vec2,
    /// Hull state
    pub hull: Hull,
    /// Selected by the host
    pub selected: bool,
    /// Name of the sector holding the actor
    pub sector: Option<String>,
    /// Shape catalog entry for asteroids
    pub shape_id: Option<u32>,
    /// Turret state, for turrets only
    pub turret: Option<TurretReadout>,
}

impl ActorSnapshot {
    /// Captures an actor's current display state.
    #[must_use]
    pub fn capture(arena: &Arena, entity: &Entity) -> Self {
        let id = entity.id();
        Self {
            id,
            name: entity.name().to_string(),
            tag: entity.tag(),
            kind: entity.kind_label().to_string(),
            position: entity.position(),
            rotation: entity.transform.rotation,
            size: entity.size,
            velocity: entity.velocity(),
            hull: entity.hull,
            selected: entity.is_selected(),
            sector: arena.sector_name_of(id).map(str::to_string),
            shape_id: entity.as_celestial().and_then(|celestial| celestial.shape_id),
            turret: entity
                .as_turret()
                .map(|turret| TurretReadout::capture(arena, id, turret)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::{DamageKind, TurretSpec};
    use crate::entity::{CelestialKind, EntityBlueprint};

    fn spec(shots: u32) -> TurretSpec {
        TurretSpec {
            name: "Test Gun".to_string(),
            recoil_ms: 200.0,
            projectiles_per_burst: shots,
            burst_delay_ms: 100.0,
            range: 500.0,
            accuracy: 100.0,
            mount_offset: Vec2::ZERO,
            projectile_speed: 10.0,
            damage: 5.0,
            damage_kind: DamageKind::Kinetic,
        }
    }

    #[test]
    fn asteroid_snapshot_carries_shape_and_sector() {
        let mut arena = Arena::new();
        let rock = arena
            .spawn(
                EntityBlueprint::celestial(CelestialKind::Asteroid, Vec2::new(10.0, 20.0), 12.0)
                    .with_shape(3),
            )
            .unwrap();

        let snapshot = ActorSnapshot::capture(&arena, arena.get(rock).unwrap());
        assert_eq!(snapshot.kind, "Asteroid");
        assert_eq!(snapshot.shape_id, Some(3));
        assert_eq!(snapshot.position, Vec2::new(10.0, 20.0));
        assert_eq!(snapshot.sector.as_deref(), arena.sector_name_of(rock));
        assert!(snapshot.sector.is_some());
        assert!(snapshot.turret.is_none());
    }

    #[test]
    fn turret_readout_tracks_selection_and_recoil() {
        let mut arena = Arena::new();
        let ship = arena
            .spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0))
            .unwrap();
        let first = arena.spawn(EntityBlueprint::turret(ship, spec(3))).unwrap();
        let second = arena.spawn(EntityBlueprint::turret(ship, spec(1))).unwrap();

        let turret = arena.get_mut(first).unwrap().as_turret_mut().unwrap();
        let burst = turret.spec.clone();
        turret.cooldown.begin_burst(&burst);

        let readout = ActorSnapshot::capture(&arena, arena.get(first).unwrap())
            .turret
            .unwrap();
        assert!(readout.selected);
        assert!(readout.overheated);
        assert_eq!(readout.remaining_recoil_fraction, 1.0);

        let other = ActorSnapshot::capture(&arena, arena.get(second).unwrap())
            .turret
            .unwrap();
        assert!(!other.selected);
        assert_eq!(other.remaining_recoil_fraction, 0.0);
    }
}
