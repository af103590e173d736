//! Combat resolver for damage and destruction.
//!
//! The `CombatResolver` handles:
//! - `ApplyDamage` modifiers: kinetic damage reduces hull health
//! - `Destroy` modifiers: mark an actor for destruction
//!
//! # Destruction Handling
//!
//! When a hull is depleted the actor is marked destroyed, crediting the
//! damage source. The actor is not removed here; the simulation reaps all
//! marked actors once every resolver has run.

use tracing::debug;

use crate::arena::Arena;
use crate::entity::components::DamageKind;
use crate::entity::EntityId;
use crate::output::{Modifier, OutputEnvelope, OutputKind};

use super::Resolver;

/// Resolver for combat modifiers.
///
/// Modifiers are processed in output order. Damage to the same hull
/// accumulates; destruction is idempotent, so only the first lethal hit
/// is credited.
///
/// # Example
///
/// ```
/// use starlane_core::resolver::CombatResolver;
/// use starlane_core::resolver::Resolver;
/// use starlane_core::output::OutputKind;
///
/// let resolver = CombatResolver::new();
/// assert!(resolver.handles().contains(&OutputKind::Modifier));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Creates a new combat resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Applies damage to an actor, destroying it when the hull is depleted.
    fn apply_damage(
        next: &mut Arena,
        target: EntityId,
        amount: f32,
        kind: DamageKind,
        source: EntityId,
    ) {
        match kind {
            DamageKind::Kinetic => {
                let Some(entity) = next.get_mut(target) else {
                    return;
                };
                if entity.is_destroyed() {
                    return;
                }
                let depleted = entity.hull.apply_damage(amount);
                debug!(
                    %target,
                    %source,
                    amount,
                    health = entity.hull.health,
                    "hull damaged"
                );
                if depleted {
                    next.destroy(target, Some(source));
                }
            }
            DamageKind::Energy => {
                debug!(%target, %source, amount, "energy damage has no hull effect");
            }
        }
    }
}

impl Resolver for CombatResolver {
    fn handles(&self) -> &[OutputKind] {
        &[OutputKind::Modifier]
    }

    fn resolve(&self, outputs: &[&OutputEnvelope], _current: &Arena, next: &mut Arena) {
        for envelope in outputs {
            if let Some(modifier) = envelope.output().as_modifier() {
                match modifier {
                    Modifier::ApplyDamage {
                        target,
                        amount,
                        kind,
                        source,
                    } => Self::apply_damage(next, *target, *amount, *kind, *source),
                    Modifier::Destroy { target, source } => {
                        next.destroy(*target, *source);
                    }
                }
            }
        }
    }
}
