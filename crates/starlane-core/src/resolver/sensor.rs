//! Sensor resolver for contact sets.
//!
//! Applies `ContactAdded` and `ContactRemoved` events to the owning ship's
//! band sets, then pushes every due scan forward by the scan interval.

use crate::arena::Arena;
use crate::entity::Entity;
use crate::output::{Event, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver that keeps ship contact sets in step with sensor scans.
#[derive(Debug, Clone)]
pub struct SensorResolver {
    scan_interval: u64,
}

impl SensorResolver {
    /// Creates a sensor resolver rescanning every `scan_interval` ticks.
    #[must_use]
    pub fn new(scan_interval: u64) -> Self {
        Self {
            scan_interval: scan_interval.max(1),
        }
    }

    /// Ticks between scans.
    #[must_use]
    pub fn scan_interval(&self) -> u64 {
        self.scan_interval
    }
}

impl Default for SensorResolver {
    fn default() -> Self {
        // 250 ms at 60 Hz
        Self::new(15)
    }
}

impl Resolver for SensorResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Event]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], current: &Arena, next: &mut Arena) {
        for envelope in outputs {
            match envelope.output().as_event() {
                Some(Event::ContactAdded {
                    ship,
                    contact,
                    band,
                }) => {
                    if let Some(state) = next.get_mut(*ship).and_then(Entity::as_ship_mut) {
                        state.sensor.contacts_mut(*band).insert(*contact);
                    }
                }
                Some(Event::ContactRemoved {
                    ship,
                    contact,
                    band,
                }) => {
                    if let Some(state) = next.get_mut(*ship).and_then(Entity::as_ship_mut) {
                        state.sensor.contacts_mut(*band).remove(contact);
                    }
                }
                _ => {}
            }
        }

        let tick = current.current_tick();
        for entity in next.entities_sorted_mut() {
            if let Some(ship) = entity.as_ship_mut() {
                if ship.sensor.next_scan_tick <= tick {
                    ship.sensor.next_scan_tick = tick + self.scan_interval;
                }
            }
        }
    }
}
