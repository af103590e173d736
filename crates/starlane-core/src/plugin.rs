//! Per-tag behavior table.
//!
//! Each [`EntityTag`] owns a bundle of plugins. Every tick the simulation runs
//! the bundle for each live entity with that tag against a frozen
//! [`WorldView`]; the plugin answers with [`Output`]s and the resolvers decide
//! what actually changes. A plugin never sees more than the components it
//! lists in its [`PluginDeclaration`], and since nothing it touches is
//! mutable the bundles for all entities run concurrently.
//!
//! ```
//! use starlane_core::plugin::{
//!     Plugin, PluginContext, PluginDeclaration, PluginId, PluginRegistry,
//!     ComponentKind,
//! };
//! use starlane_core::world_view::WorldView;
//! use starlane_core::output::{Output, OutputKind};
//! use starlane_core::entity::EntityTag;
//! use std::sync::Arc;
//!
//! struct Beacon(PluginDeclaration);
//!
//! impl Plugin for Beacon {
//!     fn declaration(&self) -> &PluginDeclaration {
//!         &self.0
//!     }
//!
//!     fn run(&self, _ctx: &PluginContext, _view: &WorldView) -> Vec<Output> {
//!         Vec::new()
//!     }
//! }
//!
//! let mut registry = PluginRegistry::new();
//! registry.register(
//!     EntityTag::Celestial,
//!     Arc::new(Beacon(PluginDeclaration {
//!         id: PluginId::new("beacon"),
//!         required_tags: vec![EntityTag::Celestial],
//!         reads: vec![ComponentKind::Transform],
//!         emits: vec![OutputKind::Event],
//!     })),
//! );
//!
//! assert_eq!(registry.plugins_for(EntityTag::Celestial).len(), 1);
//! assert!(registry.plugins_for(EntityTag::Ship).is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::entity::{EntityId, EntityTag};
use crate::output::{Output, OutputKind, TraceId};
use crate::world_view::WorldView;

pub use crate::output::PluginId;

// =============================================================================
// Component Kind
// =============================================================================

/// Component groups a plugin can ask the [`WorldView`] for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Position and heading
    Transform,
    /// Ship velocity, controls and autopilot
    Helm,
    /// Contact sets and scan schedule
    Sensor,
    /// Mounted turrets and selection
    Hardpoints,
    /// Turret spec, firing state and cooldown
    Turret,
    /// Projectile flight and carried contacts
    Projectile,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => write!(f, "Transform"),
            Self::Helm => write!(f, "Helm"),
            Self::Sensor => write!(f, "Sensor"),
            Self::Hardpoints => write!(f, "Hardpoints"),
            Self::Turret => write!(f, "Turret"),
            Self::Projectile => write!(f, "Projectile"),
        }
    }
}

// =============================================================================
// Plugin Declaration
// =============================================================================

/// What a plugin runs on, what it reads and what it may emit.
#[derive(Debug, Clone)]
pub struct PluginDeclaration {
    /// Stable name, also the tie-break key when outputs are ordered
    pub id: PluginId,
    /// Tags whose bundles may hold this plugin
    pub required_tags: Vec<EntityTag>,
    /// Components exposed through the view
    pub reads: Vec<ComponentKind>,
    /// Output kinds the plugin may produce
    pub emits: Vec<OutputKind>,
}

impl PluginDeclaration {
    /// Whether `tag` is in `required_tags`.
    #[must_use]
    pub fn supports_tag(&self, tag: EntityTag) -> bool {
        self.required_tags.contains(&tag)
    }

    /// Whether the view exposes `kind` to this plugin.
    #[must_use]
    pub fn reads_component(&self, kind: ComponentKind) -> bool {
        self.reads.contains(&kind)
    }

    /// Whether outputs of `kind` are allowed.
    #[must_use]
    pub fn emits_output(&self, kind: OutputKind) -> bool {
        self.emits.contains(&kind)
    }
}

// =============================================================================
// Plugin Context
// =============================================================================

/// The entity a plugin instance is running for, and when.
#[derive(Debug, Clone, Copy)]
pub struct PluginContext {
    /// Entity being processed
    pub entity_id: EntityId,
    /// Tick being computed
    pub tick: u64,
    /// Per-instance trace ID, also the seed for plugin randomness.
    pub trace_id: TraceId,
}

// =============================================================================
// Plugin Trait
// =============================================================================

/// Behavior run on every entity of a tag, once per tick.
///
/// Implementations are called from rayon workers against the frozen arena.
/// A run must be a pure function of `ctx` and `view`: any randomness comes
/// from an RNG seeded with `ctx.trace_id`, and every effect leaves as an
/// [`Output`] of a kind listed in the declaration.
pub trait Plugin: Send + Sync {
    /// Static description used for scoping the view.
    fn declaration(&self) -> &PluginDeclaration;

    /// Proposals for the entity `ctx.entity_id` this tick.
    fn run(&self, ctx: &PluginContext, view: &WorldView) -> Vec<Output>;
}

// =============================================================================
// Plugin Registry
// =============================================================================

/// Plugin bundles keyed by entity tag.
#[derive(Default)]
pub struct PluginRegistry {
    bundles: HashMap<EntityTag, Vec<Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Appends `plugin` to the bundle for `tag`. The registration index
    /// feeds the trace id, so order matters for reproducibility.
    pub fn register(&mut self, tag: EntityTag, plugin: Arc<dyn Plugin>) {
        self.bundles.entry(tag).or_default().push(plugin);
    }

    /// Bundle for `tag`, empty if nothing was registered.
    #[must_use]
    pub fn plugins_for(&self, tag: EntityTag) -> &[Arc<dyn Plugin>] {
        self.bundles.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Registrations summed over all tags. A plugin shared by two tags counts twice.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.bundles.values().map(Vec::len).sum()
    }

    /// True when no bundle holds a plugin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.values().all(Vec::is_empty)
    }

    /// Drops every bundle.
    pub fn clear(&mut self) {
        self.bundles.clear();
    }

    /// Bundles in arbitrary tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityTag, &Vec<Arc<dyn Plugin>>)> {
        self.bundles.iter()
    }

    /// The stock behavior table: movement and sensors on ships, fire control
    /// on turrets, hit checks on projectiles. Celestials get nothing here
    /// because orbits are advanced by the physics resolver.
    ///
    /// ```
    /// use starlane_core::plugin::PluginRegistry;
    /// use starlane_core::entity::EntityTag;
    /// use starlane_core::SimConfig;
    ///
    /// let registry = PluginRegistry::default_bundles(&SimConfig::default());
    ///
    /// assert_eq!(registry.plugins_for(EntityTag::Ship).len(), 2);
    /// assert_eq!(registry.plugins_for(EntityTag::Turret).len(), 1);
    /// assert_eq!(registry.plugins_for(EntityTag::Projectile).len(), 1);
    /// assert!(registry.plugins_for(EntityTag::Celestial).is_empty());
    /// ```
    #[must_use]
    pub fn default_bundles(config: &SimConfig) -> Self {
        use crate::plugins::{MovementPlugin, ProjectilePlugin, SensorPlugin, TurretPlugin};

        let mut registry = Self::new();

        registry.register(
            EntityTag::Ship,
            Arc::new(MovementPlugin::new(config.ship.clone(), config.autopilot.clone())),
        );
        registry.register(EntityTag::Ship, Arc::new(SensorPlugin::new()));
        registry.register(
            EntityTag::Turret,
            Arc::new(TurretPlugin::new(config.projectile.max_spread)),
        );
        registry.register(
            EntityTag::Projectile,
            Arc::new(ProjectilePlugin::new(config.projectile.hit_radius)),
        );

        registry
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("bundle_count", &self.bundles.len())
            .field("registration_count", &self.registration_count())
            .finish()
    }
}
