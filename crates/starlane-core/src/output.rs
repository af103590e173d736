//! What plugins emit, and the envelope that orders it.
//!
//! Plugins never mutate the world. They emit outputs, which are proposals
//! collected during the plugin phase and applied by resolvers:
//! - [`Command`]: Direct state change requests (`SetVelocity`, `SpawnProjectile`, ...)
//! - [`Modifier`]: Hull and lifecycle changes (`ApplyDamage`, `Destroy`)
//! - [`Event`]: Notifications for the host (`ContactAdded`, `ActorDestroyed`, ...)
//!
//! All outputs are wrapped in [`OutputEnvelope`], which records the emitting
//! plugin instance and ordering metadata so resolution is deterministic.
//!
//! # Example
//!
//! ```
//! use starlane_core::output::{
//!     Output, Command, OutputEnvelope, PluginInstanceId, PluginId, TraceId,
//! };
//! use starlane_core::entity::EntityId;
//! use glam::Vec2;
//!
//! let command = Command::SetVelocity {
//!     target: EntityId::new(1),
//!     velocity: Vec2::new(1.0, 0.0),
//! };
//!
//! let envelope = OutputEnvelope::new(
//!     Output::Command(command),
//!     PluginInstanceId::new(EntityId::new(1), PluginId::new("movement")),
//!     TraceId::new(42),
//!     100, // tick
//!     0,   // sequence
//! );
//!
//! assert!(matches!(envelope.output(), Output::Command(_)));
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::entity::components::{ContactBand, DamageKind};
use crate::entity::EntityId;

// =============================================================================
// Plugin Identification Types
// =============================================================================

/// Unique identifier for a plugin type.
///
/// Built-in plugins use [`PluginId::from_static`], which needs no allocation
/// and works in `const` contexts.
///
/// # Example
///
/// ```
/// use starlane_core::output::PluginId;
///
/// const MOVEMENT: PluginId = PluginId::from_static("movement");
/// assert_eq!(MOVEMENT, PluginId::new("movement"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginId(Cow<'static, str>);

impl PluginId {
    /// Owned id, for plugins named at runtime.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(Cow::Owned(id.to_string()))
    }

    /// Creates a `PluginId` from a static string without allocating.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PluginId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PluginId {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

/// One plugin running on one entity.
///
/// Ship 42's sensor plugin is a distinct instance from ship 43's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginInstanceId {
    entity_id: EntityId,
    plugin_id: PluginId,
}

impl PluginInstanceId {
    /// Pairs a plugin with the entity it ran on.
    #[must_use]
    pub fn new(entity_id: EntityId, plugin_id: PluginId) -> Self {
        Self {
            entity_id,
            plugin_id,
        }
    }

    /// Entity the plugin ran on.
    #[must_use]
    pub const fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Which plugin ran.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }
}

impl fmt::Display for PluginInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.plugin_id, self.entity_id)
    }
}

// =============================================================================
// Tracing Types
// =============================================================================

/// Per plugin-instance, per-tick identifier.
///
/// Derived from the master seed, so it doubles as the seed for any randomness
/// a plugin needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(u64);

impl TraceId {
    /// Creates a new trace ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw hash, also used as an RNG seed.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace:{}", self.0)
    }
}

impl From<u64> for TraceId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<TraceId> for u64 {
    fn from(id: TraceId) -> Self {
        id.0
    }
}

// =============================================================================
// Output Categories
// =============================================================================

/// Requests to set helm, weapon or contact state.
///
/// Resolvers drop commands whose target no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Set the heading of a ship.
    SetHeading {
        /// Ship to turn
        target: EntityId,
        /// New heading in radians, in [0, 2π)
        heading: f32,
    },
    /// Set the velocity of a ship.
    SetVelocity {
        /// Ship to modify
        target: EntityId,
        /// New velocity per tick
        velocity: Vec2,
    },
    /// Clear a ship's autopilot target.
    DisengageAutopilot {
        /// Ship whose autopilot stops
        target: EntityId,
    },
    /// Set whether a turret is trying to fire.
    SetFiring {
        /// Turret to update
        turret: EntityId,
        /// New firing state
        firing: bool,
    },
    /// Launch one projectile from a turret.
    SpawnProjectile {
        /// Turret firing the shot
        turret: EntityId,
        /// Launch heading including spread
        heading: f32,
        /// `true` for the first shot of a burst, `false` for a follow-up
        new_burst: bool,
    },
    /// Replace a projectile's carried contact list.
    RetainContacts {
        /// Projectile to update
        projectile: EntityId,
        /// Contacts still within remaining range
        contacts: Vec<EntityId>,
    },
}

impl Command {
    /// Returns the entity this command changes.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        match self {
            Self::SetHeading { target, .. }
            | Self::SetVelocity { target, .. }
            | Self::DisengageAutopilot { target } => *target,
            Self::SetFiring { turret, .. } | Self::SpawnProjectile { turret, .. } => *turret,
            Self::RetainContacts { projectile, .. } => *projectile,
        }
    }
}

/// Modifier outputs change hull and lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// Apply projectile damage to an entity.
    ApplyDamage {
        /// Entity to damage
        target: EntityId,
        /// Damage amount (positive value)
        amount: f32,
        /// Damage kind; only kinetic damage reduces hulls
        kind: DamageKind,
        /// Ship credited with the damage
        source: EntityId,
    },
    /// Mark an entity for destruction.
    Destroy {
        /// Entity to destroy
        target: EntityId,
        /// Entity responsible, if any
        source: Option<EntityId>,
    },
}

impl Modifier {
    /// Actor whose hull or lifecycle changes.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        match self {
            Self::ApplyDamage { target, .. } | Self::Destroy { target, .. } => *target,
        }
    }
}

/// Event outputs notify the host of things that happened.
///
/// Each logical transition is reported at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// An actor entered one of a ship's contact bands.
    ContactAdded {
        /// Ship whose contact set changed
        ship: EntityId,
        /// Actor that entered range
        contact: EntityId,
        /// Band that changed
        band: ContactBand,
    },
    /// An actor left one of a ship's contact bands or was destroyed.
    ContactRemoved {
        /// Ship whose contact set changed
        ship: EntityId,
        /// Actor that left range
        contact: EntityId,
        /// Band that changed
        band: ContactBand,
    },
    /// A turret launched a projectile.
    WeaponFired {
        /// Turret that fired
        turret: EntityId,
        /// Ship carrying the turret
        owner: EntityId,
    },
    /// An actor was destroyed and removed from the world.
    ActorDestroyed {
        /// Actor that was destroyed
        actor: EntityId,
        /// Actor responsible, if known
        destroyer: Option<EntityId>,
    },
}

impl Event {
    /// Actor the notification is about, the ship for contact changes.
    #[must_use]
    pub const fn primary_entity(&self) -> EntityId {
        match self {
            Self::ContactAdded { ship, .. } | Self::ContactRemoved { ship, .. } => *ship,
            Self::WeaponFired { turret, .. } => *turret,
            Self::ActorDestroyed { actor, .. } => *actor,
        }
    }

    /// Returns `true` for contact set changes.
    #[must_use]
    pub const fn is_contact_change(&self) -> bool {
        matches!(self, Self::ContactAdded { .. } | Self::ContactRemoved { .. })
    }
}

// =============================================================================
// Top-Level Output Enum
// =============================================================================

/// Output kind for resolver routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Command outputs (state change requests)
    Command,
    /// Modifier outputs (hull and lifecycle changes)
    Modifier,
    /// Event outputs (notifications)
    Event,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "Command"),
            Self::Modifier => write!(f, "Modifier"),
            Self::Event => write!(f, "Event"),
        }
    }
}

/// A plugin output - a proposal for state change or a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// A command output (state change request)
    Command(Command),
    /// A modifier output (hull or lifecycle change)
    Modifier(Modifier),
    /// An event output (notification)
    Event(Event),
}

impl Output {
    /// Returns the kind of this output for routing.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        match self {
            Self::Command(_) => OutputKind::Command,
            Self::Modifier(_) => OutputKind::Modifier,
            Self::Event(_) => OutputKind::Event,
        }
    }

    /// Returns the command, if this is a command output.
    #[must_use]
    pub const fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the modifier, if this is a modifier output.
    #[must_use]
    pub const fn as_modifier(&self) -> Option<&Modifier> {
        match self {
            Self::Modifier(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the event, if this is an event output.
    #[must_use]
    pub const fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Command> for Output {
    fn from(c: Command) -> Self {
        Self::Command(c)
    }
}

impl From<Modifier> for Output {
    fn from(m: Modifier) -> Self {
        Self::Modifier(m)
    }
}

impl From<Event> for Output {
    fn from(e: Event) -> Self {
        Self::Event(e)
    }
}

// =============================================================================
// Output Envelope
// =============================================================================

/// Wrapper for outputs with ordering metadata.
///
/// - `source`: Which plugin instance emitted this output
/// - `trace_id`: Per-instance identifier for the tick
/// - `tick`: When this output was emitted
/// - `sequence`: Ordering within the same tick and source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    output: Output,
    source: PluginInstanceId,
    trace_id: TraceId,
    tick: u64,
    sequence: u32,
}

impl OutputEnvelope {
    /// Creates a new output envelope.
    ///
    /// # Arguments
    ///
    /// * `output` - The output to wrap
    /// * `source` - The plugin instance that emitted this output
    /// * `trace_id` - Trace ID of the emitting instance
    /// * `tick` - Current simulation tick
    /// * `sequence` - Sequence number within this tick for ordering
    #[must_use]
    pub fn new(
        output: Output,
        source: PluginInstanceId,
        trace_id: TraceId,
        tick: u64,
        sequence: u32,
    ) -> Self {
        Self {
            output,
            source,
            trace_id,
            tick,
            sequence,
        }
    }

    /// The output itself.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Unwraps the output.
    #[must_use]
    pub fn into_output(self) -> Output {
        self.output
    }

    /// Returns the source plugin instance.
    #[must_use]
    pub fn source(&self) -> &PluginInstanceId {
        &self.source
    }

    /// Returns the trace ID.
    #[must_use]
    pub const fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Tick the output was produced in.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Position within the emitting instance's outputs.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Routing kind of the output.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        self.output.kind()
    }
}
