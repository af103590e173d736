//! Weapon resolver for turret fire and projectile bookkeeping.
//!
//! The `WeaponResolver` handles:
//! - `SetFiring` commands: record a turret's firing state
//! - `SpawnProjectile` commands: launch a projectile and restart the turret's timers
//! - `RetainContacts` commands: narrow a projectile's candidate contacts
//!
//! After the commands it runs every turret's timers down by one tick and
//! reschedules projectile hit checks that were due this tick.

use std::collections::BTreeSet;

use glam::Vec2;
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::constants::{HIT_CHECK_INTERVAL_TICKS, TICK_MS};
use crate::entity::components::ProjectileComponents;
use crate::entity::{Entity, EntityBlueprint, EntityId};
use crate::output::{Command, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver for turret and projectile commands.
///
/// Launch parameters are read from `current`, the state the turret plugin
/// saw when it decided to fire.
///
/// # Example
///
/// ```
/// use starlane_core::resolver::WeaponResolver;
/// use starlane_core::resolver::Resolver;
/// use starlane_core::output::OutputKind;
///
/// let resolver = WeaponResolver::default();
/// assert_eq!(resolver.handles(), &[OutputKind::Command]);
/// ```
#[derive(Debug, Clone)]
pub struct WeaponResolver {
    tick_ms: f32,
    hit_check_interval: u64,
}

impl WeaponResolver {
    /// Creates a weapon resolver.
    ///
    /// # Arguments
    ///
    /// * `tick_ms` - Simulated milliseconds per tick, for turret timers
    /// * `hit_check_interval` - Ticks between projectile hit checks
    #[must_use]
    pub fn new(tick_ms: f32, hit_check_interval: u64) -> Self {
        Self {
            tick_ms,
            hit_check_interval: hit_check_interval.max(1),
        }
    }

    fn launch(
        &self,
        current: &Arena,
        next: &mut Arena,
        turret_id: EntityId,
        heading: f32,
        new_burst: bool,
    ) {
        let Some(mount) = current.get(turret_id) else {
            return;
        };
        let Some(turret) = mount.as_turret() else {
            return;
        };
        let Some(owner) = current.get(turret.owner) else {
            return;
        };
        let Some(ship) = owner.as_ship() else {
            return;
        };

        let spec = &turret.spec;
        let origin = mount.position();
        let speed = spec.projectile_speed + owner.speed();
        let own: BTreeSet<EntityId> = ship
            .hardpoints
            .mounts
            .iter()
            .copied()
            .chain(std::iter::once(owner.id()))
            .collect();
        let contacts: Vec<EntityId> = ship
            .sensor
            .radar_contacts
            .iter()
            .copied()
            .filter(|contact| !own.contains(contact))
            .filter(|contact| {
                current
                    .get(*contact)
                    .is_some_and(|target| target.position().distance(origin) <= spec.range)
            })
            .collect();

        let components = ProjectileComponents {
            velocity: Vec2::from_angle(heading) * speed,
            speed,
            origin,
            kill_distance: spec.range,
            damage: spec.damage,
            damage_kind: spec.damage_kind,
            owner: owner.id(),
            turret: turret_id,
            contacts,
            next_hit_check_tick: current.current_tick() + self.hit_check_interval,
        };
        match next.spawn(EntityBlueprint::projectile(heading, components)) {
            Ok(projectile) => {
                debug!(turret = %turret_id, %projectile, new_burst, "projectile launched");
            }
            Err(err) => {
                warn!(turret = %turret_id, %err, "failed to launch projectile");
                return;
            }
        }

        if let Some(state) = next.get_mut(turret_id).and_then(Entity::as_turret_mut) {
            if new_burst {
                state.cooldown.begin_burst(spec);
            } else {
                state.cooldown.burst_shot(spec);
            }
        }
    }

    fn advance_timers(&self, tick: u64, next: &mut Arena) {
        for entity in next.entities_sorted_mut() {
            if let Some(turret) = entity.as_turret_mut() {
                turret.cooldown.advance(self.tick_ms);
            } else if let Some(projectile) = entity.as_projectile_mut() {
                if projectile.next_hit_check_tick <= tick {
                    projectile.next_hit_check_tick = tick + self.hit_check_interval;
                }
            }
        }
    }
}

impl Default for WeaponResolver {
    fn default() -> Self {
        Self::new(TICK_MS, HIT_CHECK_INTERVAL_TICKS)
    }
}

impl Resolver for WeaponResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Command]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], current: &Arena, next: &mut Arena) {
        for envelope in outputs {
            let Some(command) = envelope.output().as_command() else {
                continue;
            };
            match command {
                Command::SetFiring { turret, firing } => {
                    if let Some(state) = next.get_mut(*turret).and_then(Entity::as_turret_mut) {
                        state.firing = *firing;
                    }
                }
                Command::SpawnProjectile {
                    turret,
                    heading,
                    new_burst,
                } => self.launch(current, next, *turret, *heading, *new_burst),
                Command::RetainContacts {
                    projectile,
                    contacts,
                } => {
                    if let Some(state) = next
                        .get_mut(*projectile)
                        .and_then(Entity::as_projectile_mut)
                    {
                        state.contacts.clone_from(contacts);
                    }
                }
                // Helm commands belong to the physics resolver
                Command::SetHeading { .. }
                | Command::SetVelocity { .. }
                | Command::DisengageAutopilot { .. } => {}
            }
        }

        self.advance_timers(current.current_tick(), next);
    }
}
