//! Individual sectors: a rectangle plus the set of actors inside it.

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Index of a sector inside its manager.
///
/// Ids are handed out in creation order and never reused, since sectors
/// are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorId(u32);

impl SectorId {
    /// Create an id from its raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the sector in the manager's creation order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sector:{}", self.0)
    }
}

/// Presentation attributes a host may draw. The simulation never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorDisplay {
    /// RGB border colour
    pub border_color: [u8; 3],
    /// Whether the pointer is over this sector
    pub hovered: bool,
}

impl SectorDisplay {
    /// Colour derived from the sector corner so that rebuilt worlds look the same.
    #[must_use]
    pub fn for_corner(corner: Vec2) -> Self {
        let seed = (u64::from(corner.x.to_bits()) << 32) | u64::from(corner.y.to_bits());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self {
            border_color: [rng.gen(), rng.gen(), rng.gen()],
            hovered: false,
        }
    }
}

/// A rectangular cell of the plane.
///
/// Only leaves (sectors without children) hold actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize",
    deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct Sector<K> {
    id: SectorId,
    bounds: Bounds,
    name: String,
    parent: Option<SectorId>,
    children: Vec<SectorId>,
    actors: BTreeSet<K>,
    display: SectorDisplay,
}

impl<K: Ord> Sector<K> {
    pub(crate) fn new(id: SectorId, bounds: Bounds, parent: Option<SectorId>) -> Self {
        Self {
            id,
            name: format!("Sector [{}, {}]", bounds.x(), bounds.y()),
            bounds,
            parent,
            children: Vec::new(),
            actors: BTreeSet::new(),
            display: SectorDisplay::for_corner(bounds.min),
        }
    }

    /// This sector's id.
    #[must_use]
    pub fn id(&self) -> SectorId {
        self.id
    }

    /// Rectangle covered by the sector.
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Human readable name, `Sector [x, y]` after the top-left corner.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sector this one was split from, if any.
    #[must_use]
    pub fn parent(&self) -> Option<SectorId> {
        self.parent
    }

    /// Child quadrants. Empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[SectorId] {
        &self.children
    }

    /// Whether the sector holds actors directly.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether a point belongs to this sector for placement purposes.
    #[must_use]
    pub fn accepts(&self, point: Vec2) -> bool {
        self.is_leaf() && self.bounds.contains(point)
    }

    /// Actors in this sector, in key order.
    pub fn actors(&self) -> impl Iterator<Item = &K> + '_ {
        self.actors.iter()
    }

    /// Number of actors in this sector.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Whether the actor is a member of this sector.
    #[must_use]
    pub fn contains_actor(&self, key: &K) -> bool {
        self.actors.contains(key)
    }

    /// Display attributes.
    #[must_use]
    pub fn display(&self) -> &SectorDisplay {
        &self.display
    }

    /// Mutable display attributes, for hover tracking.
    pub fn display_mut(&mut self) -> &mut SectorDisplay {
        &mut self.display
    }

    pub(crate) fn insert(&mut self, key: K) -> bool {
        self.actors.insert(key)
    }

    pub(crate) fn remove(&mut self, key: &K) -> bool {
        self.actors.remove(key)
    }

    pub(crate) fn split_into(&mut self, children: Vec<SectorId>) -> BTreeSet<K> {
        self.children = children;
        std::mem::take(&mut self.actors)
    }
}
