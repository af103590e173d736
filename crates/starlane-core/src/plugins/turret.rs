//! Turret plugin for fire control.
//!
//! A turret fires when its owner holds the fire control, it is the owner's
//! selected hardpoint and its recoil has run out. Follow-up shots of a burst
//! fire on their own schedule once the burst has started.
//!
//! # Supported Entity Types
//!
//! - Turrets
//!
//! # Outputs
//!
//! - `SetFiring` when the firing state changes
//! - `SpawnProjectile` per shot, with accuracy spread applied
//! - `WeaponFired` event per shot

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::MAX_SPREAD;
use crate::entity::components::ControlFlags;
use crate::entity::EntityTag;
use crate::output::{Command, Event, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::world_view::WorldView;

/// Plugin that decides when turrets fire.
///
/// Shot spread is drawn from a `ChaCha8Rng` seeded with the plugin
/// instance's trace ID, so replays fire identical patterns.
pub struct TurretPlugin {
    declaration: PluginDeclaration,
    max_spread: f32,
}

impl TurretPlugin {
    /// Creates a new `TurretPlugin`.
    ///
    /// # Arguments
    ///
    /// * `max_spread` - Largest shot deviation in radians, reached at 0% accuracy
    #[must_use]
    pub fn new(max_spread: f32) -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::from_static("turret"),
                required_tags: vec![EntityTag::Turret],
                reads: vec![
                    ComponentKind::Transform,
                    ComponentKind::Turret,
                    ComponentKind::Helm,
                    ComponentKind::Hardpoints,
                ],
                emits: vec![OutputKind::Command, OutputKind::Event],
            },
            max_spread,
        }
    }
}

impl Default for TurretPlugin {
    fn default() -> Self {
        Self::new(MAX_SPREAD)
    }
}

impl Plugin for TurretPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let id = ctx.entity_id;
        let (Some(transform), Some(turret)) = (view.get_transform(id), view.get_turret(id)) else {
            return Vec::new();
        };

        let owner = turret.owner;
        let trigger_held = view
            .get_helm(owner)
            .is_some_and(|helm| helm.controls.contains(ControlFlags::FIRE));
        let selected = view
            .get_hardpoints(owner)
            .and_then(|hardpoints| hardpoints.selected_mount())
            == Some(id);
        let firing = trigger_held && selected;

        let mut outputs = Vec::new();
        if firing != turret.firing {
            outputs.push(Output::Command(Command::SetFiring { turret: id, firing }));
        }

        let new_burst = firing && turret.cooldown.can_fire();
        if new_burst || turret.cooldown.burst_shot_due() {
            let spread = turret.spec.spread(self.max_spread);
            let deviation = if spread > 0.0 {
                let mut rng = ChaCha8Rng::seed_from_u64(ctx.trace_id.as_u64());
                rng.gen_range(-spread..=spread)
            } else {
                0.0
            };
            outputs.push(Output::Command(Command::SpawnProjectile {
                turret: id,
                heading: transform.rotation + deviation,
                new_burst,
            }));
            outputs.push(Output::Event(Event::WeaponFired { turret: id, owner }));
        }

        outputs
    }
}

// =============================================================================
// Tests
// =============================================================================
