//! Projectile plugin for hit detection.
//!
//! Projectiles carry the candidate contacts their owner's radar held at launch.
//! Every hit check narrows that list to contacts still inside the remaining
//! range, then tests the survivors for impact.
//!
//! # Supported Entity Types
//!
//! - Projectiles
//!
//! # Outputs
//!
//! - `RetainContacts` when the candidate list shrinks
//! - `ApplyDamage` on the first contact hit
//! - `Destroy` for the projectile itself after a hit

use crate::constants::HIT_RADIUS;
use crate::entity::EntityTag;
use crate::output::{Command, Modifier, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::world_view::WorldView;

/// Plugin that checks projectiles against their candidate contacts.
pub struct ProjectilePlugin {
    declaration: PluginDeclaration,
    hit_radius: f32,
}

impl ProjectilePlugin {
    /// Creates a new `ProjectilePlugin`.
    ///
    /// A hit registers within `hit_radius + target.size`. The target's size
    /// is included on purpose, so large asteroids are struck at their edge
    /// rather than only at their centre point.
    ///
    /// # Arguments
    ///
    /// * `hit_radius` - Impact distance added to each target's size
    #[must_use]
    pub fn new(hit_radius: f32) -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::from_static("projectile"),
                required_tags: vec![EntityTag::Projectile],
                reads: vec![ComponentKind::Transform, ComponentKind::Projectile],
                emits: vec![OutputKind::Command, OutputKind::Modifier],
            },
            hit_radius,
        }
    }
}

impl Default for ProjectilePlugin {
    fn default() -> Self {
        Self::new(HIT_RADIUS)
    }
}

impl Plugin for ProjectilePlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let id = ctx.entity_id;
        let (Some(transform), Some(projectile)) =
            (view.get_transform(id), view.get_projectile(id))
        else {
            return Vec::new();
        };
        if ctx.tick < projectile.next_hit_check_tick {
            return Vec::new();
        }

        let position = transform.position;
        let remaining = projectile.remaining_range(position);
        let mut retained = Vec::with_capacity(projectile.contacts.len());
        let mut hit = None;

        for &contact in &projectile.contacts {
            let Some(target) = view.get_entity(contact) else {
                continue;
            };
            if target.is_destroyed() || target.is_projectile() || target.is_turret() {
                continue;
            }
            let distance = target.position().distance(position);
            if distance > remaining {
                continue;
            }
            retained.push(contact);
            if hit.is_none() && distance < self.hit_radius + target.size {
                hit = Some(contact);
            }
        }

        let mut outputs = Vec::new();
        if retained != projectile.contacts {
            outputs.push(Output::Command(Command::RetainContacts {
                projectile: id,
                contacts: retained,
            }));
        }
        if let Some(target) = hit {
            outputs.push(Output::Modifier(Modifier::ApplyDamage {
                target,
                amount: projectile.damage,
                kind: projectile.damage_kind,
                source: projectile.owner,
            }));
            outputs.push(Output::Modifier(Modifier::Destroy {
                target: id,
                source: Some(target),
            }));
        }
        outputs
    }
}

// =============================================================================
// Tests
// =============================================================================
