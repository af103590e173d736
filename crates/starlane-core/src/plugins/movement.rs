//! Movement plugin for ship flight.
//!
//! The `MovementPlugin` turns a ship's helm state into heading and velocity
//! proposals. Manual flight follows the host's control flags; an engaged
//! autopilot overrides steering and thrust until the ship arrives.
//!
//! # Supported Entity Types
//!
//! - Ships
//!
//! # Outputs
//!
//! - `SetHeading` when the heading changes
//! - `SetVelocity` when the velocity changes
//! - `DisengageAutopilot` on arrival or when the followed actor is gone

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::config::{AutopilotTuning, ShipTuning};
use crate::entity::components::{AutopilotTarget, ControlFlags};
use crate::entity::{Entity, EntityTag};
use crate::output::{Command, Output, OutputKind, PluginId};
use crate::plugin::{ComponentKind, Plugin, PluginContext, PluginDeclaration};
use crate::world_view::WorldView;

/// Plugin that flies ships.
///
/// # Example
///
/// ```
/// use starlane_core::plugins::MovementPlugin;
/// use starlane_core::plugin::Plugin;
///
/// let plugin = MovementPlugin::default();
/// assert_eq!(plugin.declaration().id.as_str(), "movement");
/// ```
pub struct MovementPlugin {
    declaration: PluginDeclaration,
    ship: ShipTuning,
    autopilot: AutopilotTuning,
}

impl MovementPlugin {
    /// Creates a new `MovementPlugin` with the given flight tuning.
    #[must_use]
    pub fn new(ship: ShipTuning, autopilot: AutopilotTuning) -> Self {
        Self {
            declaration: PluginDeclaration {
                id: PluginId::from_static("movement"),
                required_tags: vec![EntityTag::Ship],
                reads: vec![ComponentKind::Transform, ComponentKind::Helm],
                emits: vec![OutputKind::Command],
            },
            ship,
            autopilot,
        }
    }
}

impl Default for MovementPlugin {
    fn default() -> Self {
        Self::new(ShipTuning::default(), AutopilotTuning::default())
    }
}

impl Plugin for MovementPlugin {
    fn declaration(&self) -> &PluginDeclaration {
        &self.declaration
    }

    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output> {
        let id = ctx.entity_id;
        let (Some(transform), Some(helm)) = (view.get_transform(id), view.get_helm(id)) else {
            return Vec::new();
        };

        let controls = helm.controls;
        let mut heading = transform.rotation;
        let mut velocity = helm.velocity;
        let mut thrust = controls.contains(ControlFlags::THRUST);
        let mut disengage = false;

        if let Some(target) = helm.autopilot {
            thrust = false;
            match destination(view, target) {
                Some(point) => {
                    let offset = point - transform.position;
                    let distance = offset.length();
                    if distance <= self.autopilot.arrival_radius {
                        disengage = true;
                    } else {
                        let desired = offset.y.atan2(offset.x);
                        heading = turn_toward(heading, desired, self.autopilot.heading_step);
                        if distance <= self.autopilot.decelerate_radius {
                            velocity *= self.autopilot.damping;
                        } else {
                            thrust = angle_between(heading, desired).abs()
                                < self.autopilot.alignment_threshold;
                        }
                    }
                }
                None => disengage = true,
            }
        } else {
            if controls.contains(ControlFlags::ROTATE_LEFT) {
                heading -= self.ship.rotation_step;
            }
            if controls.contains(ControlFlags::ROTATE_RIGHT) {
                heading += self.ship.rotation_step;
            }
        }
        heading = heading.rem_euclid(TAU);

        let braking = controls.contains(ControlFlags::BRAKE);
        if thrust && !braking {
            velocity += Vec2::from_angle(heading) * self.ship.thrust;
        }
        if braking {
            velocity *= 1.0 - self.ship.thrust * self.ship.brake_factor;
            velocity = snap_to_zero(velocity, self.ship.velocity_snap);
        }
        velocity = velocity.clamp_length_max(self.ship.max_speed);

        let mut outputs = Vec::new();
        if heading != transform.rotation {
            outputs.push(Output::Command(Command::SetHeading { target: id, heading }));
        }
        if velocity != helm.velocity {
            outputs.push(Output::Command(Command::SetVelocity {
                target: id,
                velocity,
            }));
        }
        if disengage {
            outputs.push(Output::Command(Command::DisengageAutopilot { target: id }));
        }
        outputs
    }
}

/// Position the autopilot steers toward, `None` when the followed actor is gone.
fn destination(view: &WorldView, target: AutopilotTarget) -> Option<Vec2> {
    match target {
        AutopilotTarget::Point(point) => Some(point),
        AutopilotTarget::Actor(actor) => view
            .get_entity(actor)
            .filter(|entity| !entity.is_destroyed())
            .map(Entity::position),
    }
}

/// Signed smallest rotation from `from` to `to`, in `[-PI, PI)`.
fn angle_between(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

/// Rotates `current` toward `desired` by at most `step`.
fn turn_toward(current: f32, desired: f32, step: f32) -> f32 {
    let delta = angle_between(current, desired);
    if delta.abs() <= step {
        desired
    } else {
        current + step * delta.signum()
    }
}

fn snap_to_zero(velocity: Vec2, threshold: f32) -> Vec2 {
    let snap = |v: f32| if v.abs() < threshold { 0.0 } else { v };
    Vec2::new(snap(velocity.x), snap(velocity.y))
}

// =============================================================================
// Tests
// =============================================================================
