//! Event resolver for host notifications.
//!
//! The `EventResolver` journals event outputs for the host. It does not
//! mutate simulation state. The simulation also records the destruction
//! notifications produced when marked actors are reaped, so a drained
//! journal holds every notification of the tick in a single stream.

use std::sync::{Mutex, MutexGuard};

use crate::arena::Arena;
use crate::output::{Event, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver that records events until the host drains them.
///
/// # Thread Safety
///
/// The journal is protected by a `Mutex` to satisfy the `Send + Sync`
/// requirements of the `Resolver` trait. A poisoned lock is recovered.
///
/// # Example
///
/// ```
/// use starlane_core::resolver::EventResolver;
/// use starlane_core::resolver::Resolver;
/// use starlane_core::output::OutputKind;
///
/// let resolver = EventResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Event));
///
/// // After resolve(), drain the events
/// let events = resolver.take_events();
/// assert!(events.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct EventResolver {
    journal: Mutex<Vec<Event>>,
}

impl EventResolver {
    /// Creates a new event resolver with an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            journal: Mutex::new(Vec::new()),
        }
    }

    fn journal(&self) -> MutexGuard<'_, Vec<Event>> {
        self.journal
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Appends events produced outside plugin output, such as reaping.
    pub fn record(&self, events: impl IntoIterator<Item = Event>) {
        self.journal().extend(events);
    }

    /// Drains and returns all recorded events, oldest first.
    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.journal())
    }

    /// Returns the number of events currently in the journal.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.journal().len()
    }

    /// Returns true if the journal is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.journal().is_empty()
    }

    /// Clears all events without returning them.
    pub fn clear(&self) {
        self.journal().clear();
    }
}

impl Resolver for EventResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Event]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], _current: &Arena, _next: &mut Arena) {
        let mut journal = self.journal();
        journal.extend(
            outputs
                .iter()
                .filter_map(|envelope| envelope.output().as_event())
                .cloned(),
        );
    }
}
