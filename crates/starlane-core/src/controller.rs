//! Host-facing command surface.
//!
//! The host never mutates actors directly. It sends [`HostCommand`]s, which
//! the simulation applies between ticks, and drains notifications afterwards.
//! [`PlayerController`] bundles that round trip for a single player ship:
//! it tracks held intent flags, queues commands, and drives one tick per
//! frame.

use serde::{Deserialize, Serialize};

use crate::entity::components::{AutopilotTarget, ControlFlags};
use crate::entity::EntityId;
use crate::error::SimError;
use crate::output::Event;
use crate::simulation::Simulation;

/// A command from the host, applied between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Replace a ship's movement and fire intent
    SetControls {
        /// Ship to steer
        ship: EntityId,
        /// Held intent flags
        controls: ControlFlags,
    },
    /// Engage the autopilot
    SetAutopilot {
        /// Ship to steer
        ship: EntityId,
        /// Actor or coordinates to fly to
        target: AutopilotTarget,
    },
    /// Hand control back to the pilot
    DisengageAutopilot {
        /// Ship to steer
        ship: EntityId,
    },
    /// Advance the ship's selected hardpoint
    CycleWeapon {
        /// Ship whose hardpoints cycle
        ship: EntityId,
    },
    /// Make an actor the single selected actor
    Select {
        /// Actor to select
        actor: EntityId,
    },
    /// Deselect everything
    ClearSelection,
}

/// Drives a player ship from held intent flags.
///
/// # Example
///
/// ```
/// use starlane_core::controller::PlayerController;
/// use starlane_core::entity::components::ControlFlags;
/// use starlane_core::entity::EntityBlueprint;
/// use starlane_core::simulation::Simulation;
/// use glam::Vec2;
///
/// let mut sim = Simulation::new(1);
/// let ship = sim.spawn(EntityBlueprint::ship(Vec2::ZERO, 0.0, 15.0)).unwrap();
///
/// let mut controller = PlayerController::new(ship);
/// controller.press(ControlFlags::THRUST);
/// controller.tick(&mut sim).unwrap();
///
/// assert!(sim.arena().get(ship).unwrap().speed() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PlayerController {
    ship: EntityId,
    controls: ControlFlags,
    queue: Vec<HostCommand>,
}

impl PlayerController {
    /// Creates a controller for `ship` with no intent held.
    #[must_use]
    pub fn new(ship: EntityId) -> Self {
        Self {
            ship,
            controls: ControlFlags::empty(),
            queue: Vec::new(),
        }
    }

    /// The controlled ship.
    #[must_use]
    pub const fn ship(&self) -> EntityId {
        self.ship
    }

    /// Currently held intent flags.
    #[must_use]
    pub const fn controls(&self) -> ControlFlags {
        self.controls
    }

    /// Holds `flags` in addition to what is already held.
    pub fn press(&mut self, flags: ControlFlags) {
        if !self.controls.contains(flags) {
            self.controls.insert(flags);
            self.push_controls();
        }
    }

    /// Lets go of `flags`.
    pub fn release(&mut self, flags: ControlFlags) {
        if self.controls.intersects(flags) {
            self.controls.remove(flags);
            self.push_controls();
        }
    }

    fn push_controls(&mut self) {
        self.queue.push(HostCommand::SetControls {
            ship: self.ship,
            controls: self.controls,
        });
    }

    /// Queues an autopilot engagement.
    pub fn set_autopilot(&mut self, target: AutopilotTarget) {
        self.queue.push(HostCommand::SetAutopilot {
            ship: self.ship,
            target,
        });
    }

    /// Queues an autopilot disengagement.
    pub fn disengage_autopilot(&mut self) {
        self.queue
            .push(HostCommand::DisengageAutopilot { ship: self.ship });
    }

    /// Queues a weapon cycle.
    pub fn cycle_weapon(&mut self) {
        self.queue.push(HostCommand::CycleWeapon { ship: self.ship });
    }

    /// Queues a selection.
    pub fn select(&mut self, actor: EntityId) {
        self.queue.push(HostCommand::Select { actor });
    }

    /// Queues a selection clear.
    pub fn clear_selection(&mut self) {
        self.queue.push(HostCommand::ClearSelection);
    }

    /// Commands waiting for the next tick.
    #[must_use]
    pub fn pending(&self) -> &[HostCommand] {
        &self.queue
    }

    /// Applies queued commands, steps once, and returns the tick's notifications.
    ///
    /// # Errors
    ///
    /// Returns the first command error. Commands before it stay applied,
    /// the rest are dropped and the simulation does not step.
    pub fn tick(&mut self, sim: &mut Simulation) -> Result<Vec<Event>, SimError> {
        for command in self.queue.drain(..) {
            sim.apply(&command)?;
        }
        sim.step();
        Ok(sim.drain_events())
    }
}
