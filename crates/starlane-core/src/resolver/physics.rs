//! Physics resolver for helm commands and motion.
//!
//! The `PhysicsResolver` handles:
//! - `SetHeading`, `SetVelocity` and `DisengageAutopilot` commands
//! - Integration: `position += velocity` once per tick for ships and projectiles
//! - Orbits: bodies advance around their parents, parents first
//! - Turret mounts: turrets follow their owner's transform
//! - Projectile expiry once the kill distance is covered
//! - Sector membership for every actor that moved

use glam::Vec2;
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::entity::components::Transform;
use crate::entity::{Entity, EntityId, EntityInner};
use crate::output::{Command, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver for helm commands and per-tick motion.
///
/// # Processing Order
///
/// 1. Apply heading, velocity and autopilot commands in output order
/// 2. Integrate ships and projectiles
/// 3. Advance orbits, parents before children
/// 4. Re-seat turrets on their owners
/// 5. Mark spent projectiles for destruction
/// 6. Move actors into the sector holding their new position
///
/// # Example
///
/// ```
/// use starlane_core::resolver::PhysicsResolver;
/// use starlane_core::resolver::Resolver;
/// use starlane_core::output::OutputKind;
///
/// let resolver = PhysicsResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Command));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PhysicsResolver;

impl PhysicsResolver {
    /// Creates a new physics resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn apply_command(next: &mut Arena, command: &Command) {
        match command {
            Command::SetHeading { target, heading } => {
                if let Some(entity) = next.get_mut(*target) {
                    entity.transform.rotation = *heading;
                }
            }
            Command::SetVelocity { target, velocity } => {
                match next.get_mut(*target).map(Entity::inner_mut) {
                    Some(EntityInner::Ship(ship)) => ship.helm.velocity = *velocity,
                    Some(EntityInner::Projectile(projectile)) => {
                        projectile.velocity = *velocity;
                        projectile.speed = velocity.length();
                    }
                    _ => {}
                }
            }
            Command::DisengageAutopilot { target } => {
                if let Some(ship) = next.get_mut(*target).and_then(Entity::as_ship_mut) {
                    if ship.helm.autopilot.take().is_some() {
                        debug!(ship = %target, "autopilot disengaged");
                    }
                }
            }
            // Weapon commands belong to the weapon resolver
            Command::SetFiring { .. }
            | Command::SpawnProjectile { .. }
            | Command::RetainContacts { .. } => {}
        }
    }

    fn integrate(next: &mut Arena) {
        for entity in next.entities_sorted_mut() {
            let velocity = entity.velocity();
            if velocity != Vec2::ZERO {
                entity.transform.position += velocity;
            }
        }
    }

    /// Orbit nesting depth, used to move parents before their children.
    fn orbit_depth(arena: &Arena, id: EntityId) -> usize {
        let mut depth = 0;
        let mut cursor = id;
        while let Some(orbit) = arena
            .get(cursor)
            .and_then(Entity::as_celestial)
            .and_then(|celestial| celestial.orbit)
        {
            depth += 1;
            cursor = orbit.parent;
            if depth > arena.entity_count() {
                break;
            }
        }
        depth
    }

    fn advance_orbits(next: &mut Arena) {
        let mut orbiters: Vec<(usize, EntityId)> = next
            .entities_sorted()
            .filter(|entity| entity.as_celestial().is_some_and(|c| c.orbit.is_some()))
            .map(|entity| (Self::orbit_depth(next, entity.id()), entity.id()))
            .collect();
        orbiters.sort_unstable();

        for (_, id) in orbiters {
            let Some(parent) = next
                .get(id)
                .and_then(Entity::as_celestial)
                .and_then(|celestial| celestial.orbit)
                .map(|orbit| orbit.parent)
            else {
                continue;
            };
            let Some(anchor) = next.get(parent).map(Entity::position) else {
                debug!(body = %id, %parent, "orbit parent missing, holding position");
                continue;
            };
            let Some(entity) = next.get_mut(id) else {
                continue;
            };
            let Some(orbit) = entity
                .inner_mut()
                .as_celestial_mut()
                .and_then(|celestial| celestial.orbit.as_mut())
            else {
                continue;
            };
            orbit.advance();
            let offset = orbit.offset();
            entity.transform.position = anchor + offset;
        }
    }

    fn remount_turrets(next: &mut Arena) {
        let mounts: Vec<(EntityId, Transform)> = next
            .entities_sorted()
            .filter_map(|entity| {
                let turret = entity.as_turret()?;
                let owner = next.get(turret.owner)?;
                Some((entity.id(), owner.transform.mounted(turret.spec.mount_offset)))
            })
            .collect();
        for (id, transform) in mounts {
            if let Some(entity) = next.get_mut(id) {
                entity.transform = transform;
            }
        }
    }

    fn expire_projectiles(next: &mut Arena) {
        let spent: Vec<EntityId> = next
            .entities_sorted()
            .filter(|entity| {
                entity
                    .as_projectile()
                    .is_some_and(|projectile| projectile.is_spent(entity.position()))
            })
            .map(Entity::id)
            .collect();
        for id in spent {
            next.destroy(id, None);
        }
    }

    fn sync_sectors(current: &Arena, next: &mut Arena) {
        let moved: Vec<EntityId> = next
            .entities_sorted()
            .filter(|entity| {
                current
                    .get(entity.id())
                    .map_or(true, |before| before.position() != entity.position())
            })
            .map(Entity::id)
            .collect();
        for id in moved {
            if let Err(err) = next.relocate(id) {
                warn!(entity = %id, %err, "failed to relocate actor");
            }
        }
    }
}

impl Resolver for PhysicsResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], current: &Arena, next: &mut Arena) {
        for envelope in outputs {
            if let Some(command) = envelope.output().as_command() {
                Self::apply_command(next, command);
            }
        }

        Self::integrate(next);
        Self::advance_orbits(next);
        Self::remount_turrets(next);
        Self::expire_projectiles(next);
        Self::sync_sectors(current, next);
    }
}
