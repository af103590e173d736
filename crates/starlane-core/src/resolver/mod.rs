//! Resolvers turn the tick's outputs into the next arena.
//!
//! The simulation hands each resolver only the envelopes whose kind it lists
//! in [`Resolver::handles`], in envelope order, and runs the resolvers in a
//! fixed sequence:
//!
//! 1. [`PhysicsResolver`]: helm commands, integration, orbits, sector relocation
//! 2. [`WeaponResolver`]: firing flags, launches, turret countdowns, hit-check schedule
//! 3. [`CombatResolver`]: damage and destruction marks
//! 4. [`SensorResolver`]: contact set changes and scan schedule
//!
//! [`EventResolver`] is kept apart as the host's notification journal.
//!
//! Resolvers only mark actors as destroyed. Marked actors are reaped after the
//! last resolver, so nothing disappears from under a later one.

mod combat;
mod event;
mod physics;
mod sensor;
mod weapon;

pub use combat::CombatResolver;
pub use event::EventResolver;
pub use physics::PhysicsResolver;
pub use sensor::SensorResolver;
pub use weapon::WeaponResolver;

use crate::arena::Arena;
use crate::output::{OutputEnvelope, OutputKind};

/// One stage of the resolution pass.
///
/// `current` is exactly what the plugins saw. `next` starts as a copy of it
/// and already holds whatever earlier stages wrote. Read pre-tick facts from
/// `current`, write to `next`, and walk entities in id order so that two
/// runs with the same outputs agree. When several outputs touch the same
/// field the resolver owns the merge rule (damage sums, headings take the
/// last write).
///
/// ```
/// use starlane_core::resolver::Resolver;
/// use starlane_core::output::{OutputKind, OutputEnvelope};
/// use starlane_core::arena::Arena;
///
/// struct Noop;
///
/// impl Resolver for Noop {
///     fn handles(&self) -> &[OutputKind] {
///         &[OutputKind::Modifier]
///     }
///
///     fn resolve(&self, _outputs: &[&OutputEnvelope], _current: &Arena, _next: &mut Arena) {}
/// }
///
/// assert_eq!(Noop.handles(), &[OutputKind::Modifier]);
/// ```
pub trait Resolver: Send + Sync {
    /// Output kinds routed to this resolver.
    fn handles(&self) -> &[OutputKind];

    /// Applies `outputs` to `next`.
    fn resolve(&self, outputs: &[&OutputEnvelope], current: &Arena, next: &mut Arena);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_stages_box_as_trait_objects() {
        let stages: Vec<Box<dyn Resolver>> = vec![
            Box::new(PhysicsResolver::new()),
            Box::new(WeaponResolver::default()),
            Box::new(CombatResolver::new()),
            Box::new(SensorResolver::default()),
        ];
        assert!(stages.iter().all(|stage| !stage.handles().is_empty()));
    }
}
