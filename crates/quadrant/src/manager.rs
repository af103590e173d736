//! Sector manager: owns every sector and the actor-to-sector map.
//!
//! The manager starts with one root sector of `cell_size` centred on the
//! origin. When an actor is placed outside every existing leaf, a new cell of
//! the same size is created on the grid anchored at the root's top-left
//! corner. Sectors are never merged or removed.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::SectorError;
use crate::sector::{Sector, SectorId};
use crate::Bounds;

/// Edge length of the root sector and of every grid cell created later.
pub const DEFAULT_CELL_SIZE: f32 = 2050.0;

/// Subdivision never produces children smaller than this.
pub const DEFAULT_MIN_SUBDIVIDE_SIZE: f32 = 250.0;

/// Configuration for a [`SectorManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    /// Edge length of grid cells
    pub cell_size: f32,
    /// Split a leaf once it holds more actors than this. `None` disables automatic splitting.
    pub max_actors_per_sector: Option<usize>,
    /// Smallest child edge length a split may produce
    pub min_subdivide_size: f32,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            max_actors_per_sector: None,
            min_subdivide_size: DEFAULT_MIN_SUBDIVIDE_SIZE,
        }
    }
}

/// Where an actor currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Leaf sector holding the actor
    pub sector: SectorId,
    /// Position the actor was placed at
    pub position: Vec2,
}

/// All sectors of a world plus the back-reference from actor to sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize",
    deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct SectorManager<K> {
    config: SectorConfig,
    sectors: Vec<Sector<K>>,
    locations: BTreeMap<K, Placement>,
}

impl<K: Ord + Copy + fmt::Debug> SectorManager<K> {
    /// Create a manager holding a single root sector.
    #[must_use]
    pub fn new(config: SectorConfig) -> Self {
        let mut manager = Self {
            config,
            sectors: Vec::new(),
            locations: BTreeMap::new(),
        };
        manager.initialize();
        manager
    }

    /// Reset to a single empty root sector centred on the origin.
    pub fn initialize(&mut self) {
        self.sectors.clear();
        self.locations.clear();
        let size = self.config.cell_size;
        let root = self.push_sector(Bounds::new(size, size), None);
        debug!(%root, size, "initialized sector grid");
    }

    /// The manager's configuration.
    #[must_use]
    pub fn config(&self) -> &SectorConfig {
        &self.config
    }

    /// Top-left corner of the root sector. Grid cells are aligned to it.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        let half = self.config.cell_size / 2.0;
        self.sectors
            .first()
            .map_or(Vec2::new(-half, -half), |root| root.bounds().min)
    }

    /// Place or move an actor.
    ///
    /// The actor is first removed from its current sector, then inserted into
    /// the first leaf (in creation order) containing `position`. If no leaf
    /// contains it, a grid cell is created for it.
    ///
    /// # Errors
    ///
    /// Returns [`SectorError::NonFinitePosition`] for NaN or infinite
    /// coordinates. Membership is left unchanged in that case.
    pub fn add_actor(&mut self, key: K, position: Vec2) -> Result<SectorId, SectorError> {
        if !position.is_finite() {
            return Err(SectorError::NonFinitePosition {
                x: position.x,
                y: position.y,
            });
        }

        let target = match self.find_leaf(position) {
            Some(id) => id,
            None => self.create_cell(position)?,
        };

        let previous = self.detach(key);
        self.sectors[target.index()].insert(key);
        self.locations.insert(
            key,
            Placement {
                sector: target,
                position,
            },
        );
        if previous != Some(target) {
            trace!(?key, from = ?previous, to = %target, "actor changed sector");
        }

        if let Some(cap) = self.config.max_actors_per_sector {
            if self.sectors[target.index()].actor_count() > cap {
                match self.subdivide(target) {
                    Ok(_) | Err(SectorError::TooSmall { .. }) => {}
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(self.sector_of(key).unwrap_or(target))
    }

    /// Remove an actor from its sector. Returns the sector it was in.
    pub fn destroy_actor(&mut self, key: K) -> Option<SectorId> {
        let sector = self.detach(key);
        if let Some(sector) = sector {
            trace!(?key, %sector, "actor removed from sector");
        }
        sector
    }

    /// Sector currently holding the actor.
    #[must_use]
    pub fn sector_of(&self, key: K) -> Option<SectorId> {
        self.locations.get(&key).map(|placement| placement.sector)
    }

    /// Full placement record for an actor.
    #[must_use]
    pub fn placement(&self, key: K) -> Option<&Placement> {
        self.locations.get(&key)
    }

    /// Whether the actor is placed anywhere.
    #[must_use]
    pub fn contains_actor(&self, key: K) -> bool {
        self.locations.contains_key(&key)
    }

    /// Number of placed actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.locations.len()
    }

    /// Actors in a sector, in key order. Empty for unknown sectors.
    #[must_use]
    pub fn actors_in(&self, id: SectorId) -> Vec<K> {
        self.sector(id)
            .map(|sector| sector.actors().copied().collect())
            .unwrap_or_default()
    }

    /// Look up a sector.
    #[must_use]
    pub fn sector(&self, id: SectorId) -> Option<&Sector<K>> {
        self.sectors.get(id.index())
    }

    /// Look up a sector mutably (display attributes only).
    pub fn sector_mut(&mut self, id: SectorId) -> Option<&mut Sector<K>> {
        self.sectors.get_mut(id.index())
    }

    /// All sectors in creation order.
    pub fn sectors(&self) -> impl Iterator<Item = &Sector<K>> + '_ {
        self.sectors.iter()
    }

    /// Leaf sectors in creation order.
    pub fn leaves(&self) -> impl Iterator<Item = &Sector<K>> + '_ {
        self.sectors.iter().filter(|sector| sector.is_leaf())
    }

    /// Total number of sectors, leaves and split parents alike.
    #[must_use]
    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Number of leaf sectors.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// First leaf in creation order containing the point.
    #[must_use]
    pub fn find_leaf(&self, position: Vec2) -> Option<SectorId> {
        self.sectors
            .iter()
            .find(|sector| sector.accepts(position))
            .map(Sector::id)
    }

    /// Sector with exactly these bounds, if one exists.
    #[must_use]
    pub fn exists_at(&self, bounds: &Bounds) -> Option<SectorId> {
        self.sectors
            .iter()
            .find(|sector| sector.bounds() == bounds)
            .map(Sector::id)
    }

    /// Other leaves that overlap or touch the given leaf.
    ///
    /// # Errors
    ///
    /// Fails if the sector does not exist or is not a leaf.
    pub fn neighbors(&self, id: SectorId) -> Result<Vec<SectorId>, SectorError> {
        let sector = self.sector(id).ok_or(SectorError::UnknownSector(id))?;
        if !sector.is_leaf() {
            return Err(SectorError::NotALeaf(id));
        }
        let bounds = *sector.bounds();
        Ok(self
            .leaves()
            .filter(|other| other.id() != id && other.bounds().touches(&bounds))
            .map(Sector::id)
            .collect())
    }

    /// Number of neighbouring leaves.
    ///
    /// # Errors
    ///
    /// Same as [`neighbors`](Self::neighbors).
    pub fn neighbor_count(&self, id: SectorId) -> Result<usize, SectorError> {
        self.neighbors(id).map(|neighbors| neighbors.len())
    }

    /// Split a leaf into four quadrant children and move its actors into them.
    ///
    /// # Errors
    ///
    /// Fails if the sector does not exist, is already split, or its children
    /// would be smaller than `min_subdivide_size`.
    pub fn subdivide(&mut self, id: SectorId) -> Result<[SectorId; 4], SectorError> {
        let sector = self.sector(id).ok_or(SectorError::UnknownSector(id))?;
        if !sector.is_leaf() {
            return Err(SectorError::NotALeaf(id));
        }
        let bounds = *sector.bounds();
        let child_size = bounds.width() / 2.0;
        if child_size < self.config.min_subdivide_size {
            return Err(SectorError::TooSmall {
                id,
                child_size,
                minimum: self.config.min_subdivide_size,
            });
        }

        let children = [0, 1, 2, 3].map(|quadrant| self.push_sector(bounds.child_bounds(quadrant), Some(id)));
        let moved = self.sectors[id.index()].split_into(children.to_vec());
        let moved_count = moved.len();

        for key in moved {
            let position = self
                .locations
                .get(&key)
                .map_or(bounds.center(), |placement| placement.position);
            let child = children[bounds.quadrant_index(position)];
            self.sectors[child.index()].insert(key);
            if let Some(placement) = self.locations.get_mut(&key) {
                placement.sector = child;
            }
        }

        debug!(%id, child_size, moved = moved_count, "subdivided sector");
        Ok(children)
    }

    fn create_cell(&mut self, position: Vec2) -> Result<SectorId, SectorError> {
        let size = self.config.cell_size;
        let origin = self.origin();
        let x = snap_to_grid(position.x, origin.x, size);
        let y = snap_to_grid(position.y, origin.y, size);
        let bounds = Bounds::from_rect(x, y, size, size);

        if let Some(existing) = self.exists_at(&bounds) {
            return self.descend(existing, position);
        }

        let id = self.push_sector(bounds, None);
        debug!(%id, name = self.sectors[id.index()].name(), "created sector");
        Ok(id)
    }

    fn descend(&self, from: SectorId, position: Vec2) -> Result<SectorId, SectorError> {
        let mut current = from;
        loop {
            let sector = self
                .sector(current)
                .ok_or(SectorError::UnknownSector(current))?;
            if sector.is_leaf() {
                return Ok(current);
            }
            let next = sector
                .children()
                .iter()
                .copied()
                .find(|child| self.sectors[child.index()].bounds().contains(position));
            match next {
                Some(child) => current = child,
                None => return Err(SectorError::NotALeaf(current)),
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_sector(&mut self, bounds: Bounds, parent: Option<SectorId>) -> SectorId {
        let id = SectorId::new(self.sectors.len() as u32);
        self.sectors.push(Sector::new(id, bounds, parent));
        id
    }

    fn detach(&mut self, key: K) -> Option<SectorId> {
        let placement = self.locations.remove(&key)?;
        if let Some(sector) = self.sectors.get_mut(placement.sector.index()) {
            sector.remove(&key);
        }
        Some(placement.sector)
    }
}

/// Lower edge of the grid cell containing `value`.
fn snap_to_grid(value: f32, origin: f32, size: f32) -> f32 {
    let edge = origin + ((value - origin) / size).floor() * size;
    // Division can round across a cell edge.
    if value < edge {
        edge - size
    } else if value > edge + size {
        edge + size
    } else {
        edge
    }
}

impl<K: Ord + Copy + fmt::Debug> Default for SectorManager<K> {
    fn default() -> Self {
        Self::new(SectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SectorManager<u32> {
        SectorManager::new(SectorConfig::default())
    }

    /// Each placed actor is in exactly one leaf, and that leaf is its recorded sector.
    fn assert_membership_consistent(manager: &SectorManager<u32>) {
        for (key, placement) in &manager.locations {
            let holders: Vec<_> = manager
                .sectors()
                .filter(|sector| sector.contains_actor(key))
                .map(Sector::id)
                .collect();
            assert_eq!(holders, vec![placement.sector], "actor {key}");
            assert!(manager.sector(placement.sector).unwrap().is_leaf());
        }
        let total: usize = manager.sectors().map(Sector::actor_count).sum();
        assert_eq!(total, manager.actor_count());
    }

    mod initialize_tests {
        use super::*;

        #[test]
        fn starts_with_root_cell() {
            let manager = manager();
            assert_eq!(manager.sector_count(), 1);
            let root = manager.sector(SectorId::new(0)).unwrap();
            assert_eq!(*root.bounds(), Bounds::from_rect(-1025.0, -1025.0, 2050.0, 2050.0));
            assert_eq!(manager.origin(), Vec2::new(-1025.0, -1025.0));
        }

        #[test]
        fn initialize_resets_world() {
            let mut manager = manager();
            manager.add_actor(1, Vec2::new(5000.0, 0.0)).unwrap();
            assert_eq!(manager.sector_count(), 2);

            manager.initialize();
            assert_eq!(manager.sector_count(), 1);
            assert_eq!(manager.actor_count(), 0);
            assert_eq!(manager.sector_of(1), None);
        }
    }

    mod add_actor_tests {
        use super::*;

        #[test]
        fn inside_root() {
            let mut manager = manager();
            let id = manager.add_actor(1, Vec2::new(100.0, 0.0)).unwrap();
            assert_eq!(id, SectorId::new(0));
            assert!(manager.sector(id).unwrap().contains_actor(&1));
            assert_eq!(manager.sector_count(), 1);
        }

        #[test]
        fn edge_is_inclusive() {
            let mut manager = manager();
            let id = manager.add_actor(1, Vec2::new(1025.0, -1025.0)).unwrap();
            assert_eq!(id, SectorId::new(0));
            assert_eq!(manager.sector_count(), 1);
        }

        #[test]
        fn outside_creates_grid_cell() {
            let mut manager = manager();
            let id = manager.add_actor(1, Vec2::new(3000.0, 100.0)).unwrap();
            let sector = manager.sector(id).unwrap();
            assert_eq!(*sector.bounds(), Bounds::from_rect(1025.0, -1025.0, 2050.0, 2050.0));
            assert_eq!(sector.name(), "Sector [1025, -1025]");
        }

        #[test]
        fn negative_positions_floor_toward_negative_infinity() {
            let mut manager = manager();
            let id = manager.add_actor(1, Vec2::new(-1500.0, -3000.0)).unwrap();
            let bounds = *manager.sector(id).unwrap().bounds();
            assert_eq!(bounds, Bounds::from_rect(-3075.0, -5125.0, 2050.0, 2050.0));
            assert!(bounds.contains(Vec2::new(-1500.0, -3000.0)));
        }

        #[test]
        fn existing_cell_is_reused() {
            let mut manager = manager();
            let a = manager.add_actor(1, Vec2::new(3000.0, 0.0)).unwrap();
            let b = manager.add_actor(2, Vec2::new(3500.0, 500.0)).unwrap();
            assert_eq!(a, b);
            assert_eq!(manager.sector_count(), 2);
        }

        #[test]
        fn relocation_moves_membership() {
            let mut manager = manager();
            let a = manager.add_actor(1, Vec2::new(0.0, 0.0)).unwrap();
            let b = manager.add_actor(1, Vec2::new(0.0, 4000.0)).unwrap();

            assert_ne!(a, b);
            assert!(!manager.sector(a).unwrap().contains_actor(&1));
            assert!(manager.sector(b).unwrap().contains_actor(&1));
            assert_eq!(manager.sector_of(1), Some(b));
            assert_membership_consistent(&manager);
        }

        #[test]
        fn readding_in_place_keeps_single_membership() {
            let mut manager = manager();
            manager.add_actor(1, Vec2::new(10.0, 10.0)).unwrap();
            manager.add_actor(1, Vec2::new(11.0, 10.0)).unwrap();
            assert_eq!(manager.actor_count(), 1);
            assert_eq!(manager.sector(SectorId::new(0)).unwrap().actor_count(), 1);
        }

        #[test]
        fn non_finite_position_is_rejected() {
            let mut manager = manager();
            manager.add_actor(1, Vec2::new(10.0, 10.0)).unwrap();

            let err = manager.add_actor(1, Vec2::new(f32::NAN, 0.0)).unwrap_err();
            assert!(matches!(err, SectorError::NonFinitePosition { .. }));
            assert_eq!(manager.sector_of(1), Some(SectorId::new(0)));

            let err = manager
                .add_actor(2, Vec2::new(f32::INFINITY, 0.0))
                .unwrap_err();
            assert!(matches!(err, SectorError::NonFinitePosition { .. }));
            assert!(!manager.contains_actor(2));
            assert_eq!(manager.sector_count(), 1);
        }
    }

    mod destroy_actor_tests {
        use super::*;

        #[test]
        fn removes_membership_without_creating_cells() {
            let mut manager = manager();
            let id = manager.add_actor(1, Vec2::new(5000.0, 0.0)).unwrap();
            let count = manager.sector_count();

            assert_eq!(manager.destroy_actor(1), Some(id));
            assert!(!manager.sector(id).unwrap().contains_actor(&1));
            assert_eq!(manager.sector_count(), count);
        }

        #[test]
        fn actors_in_lists_members() {
            let mut manager = manager();
            manager.add_actor(3, Vec2::new(1.0, 1.0)).unwrap();
            manager.add_actor(1, Vec2::new(2.0, 2.0)).unwrap();
            assert_eq!(manager.actors_in(SectorId::new(0)), vec![1, 3]);
            assert!(manager.actors_in(SectorId::new(5)).is_empty());
        }

        #[test]
        fn unknown_actor_is_noop() {
            let mut manager = manager();
            assert_eq!(manager.destroy_actor(99), None);
        }
    }

    mod neighbor_tests {
        use super::*;

        #[test]
        fn grid_cells_touch_root() {
            let mut manager = manager();
            let east = manager.add_actor(1, Vec2::new(2000.0, 0.0)).unwrap();
            let far = manager.add_actor(2, Vec2::new(9000.0, 0.0)).unwrap();
            let root = SectorId::new(0);

            assert_eq!(manager.neighbors(root).unwrap(), vec![east]);
            assert_eq!(manager.neighbor_count(east).unwrap(), 1);
            assert_eq!(manager.neighbor_count(far).unwrap(), 0);
        }

        #[test]
        fn unknown_sector_errors() {
            let manager = manager();
            let err = manager.neighbors(SectorId::new(7)).unwrap_err();
            assert_eq!(err, SectorError::UnknownSector(SectorId::new(7)));
        }
    }

    mod subdivide_tests {
        use super::*;

        #[test]
        fn moves_actors_into_quadrants() {
            let mut manager = manager();
            manager.add_actor(1, Vec2::new(-100.0, -100.0)).unwrap();
            manager.add_actor(2, Vec2::new(100.0, 100.0)).unwrap();

            let children = manager.subdivide(SectorId::new(0)).unwrap();
            assert_eq!(manager.sector_of(1), Some(children[0]));
            assert_eq!(manager.sector_of(2), Some(children[3]));
            assert!(!manager.sector(SectorId::new(0)).unwrap().is_leaf());
            assert_eq!(manager.leaf_count(), 4);
            assert_membership_consistent(&manager);
        }

        #[test]
        fn split_parent_no_longer_accepts_actors() {
            let mut manager = manager();
            let children = manager.subdivide(SectorId::new(0)).unwrap();
            let id = manager.add_actor(1, Vec2::new(10.0, -10.0)).unwrap();
            assert_eq!(id, children[1]);
            assert_eq!(manager.sector(id).unwrap().parent(), Some(SectorId::new(0)));
        }

        #[test]
        fn refuses_to_split_twice() {
            let mut manager = manager();
            manager.subdivide(SectorId::new(0)).unwrap();
            let err = manager.subdivide(SectorId::new(0)).unwrap_err();
            assert_eq!(err, SectorError::NotALeaf(SectorId::new(0)));
        }

        #[test]
        fn refuses_below_minimum_size() {
            let mut manager = SectorManager::<u32>::new(SectorConfig {
                cell_size: 400.0,
                ..SectorConfig::default()
            });
            let err = manager.subdivide(SectorId::new(0)).unwrap_err();
            assert!(matches!(err, SectorError::TooSmall { child_size, .. } if child_size == 200.0));
        }

        #[test]
        fn automatic_split_when_crowded() {
            let mut manager = SectorManager::<u32>::new(SectorConfig {
                max_actors_per_sector: Some(2),
                ..SectorConfig::default()
            });
            manager.add_actor(1, Vec2::new(-500.0, -500.0)).unwrap();
            manager.add_actor(2, Vec2::new(500.0, -500.0)).unwrap();
            assert_eq!(manager.sector_count(), 1);

            let id = manager.add_actor(3, Vec2::new(500.0, 500.0)).unwrap();
            assert_eq!(manager.leaf_count(), 4);
            assert_ne!(id, SectorId::new(0));
            assert_membership_consistent(&manager);
        }

        #[test]
        fn grid_lookup_descends_into_split_cell() {
            let mut manager = manager();
            let cell = manager.add_actor(1, Vec2::new(3000.0, 0.0)).unwrap();
            manager.destroy_actor(1);
            manager.subdivide(cell).unwrap();

            let id = manager.add_actor(2, Vec2::new(3000.0, 0.0)).unwrap();
            assert_eq!(manager.sector(id).unwrap().parent(), Some(cell));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn membership_stays_unique(
                moves in prop::collection::vec((0u32..8, -9000.0f32..9000.0, -9000.0f32..9000.0), 1..60)
            ) {
                let mut manager = manager();
                for (key, x, y) in moves {
                    let id = manager.add_actor(key, Vec2::new(x, y)).unwrap();
                    prop_assert_eq!(manager.sector_of(key), Some(id));
                    prop_assert!(manager.sector(id).unwrap().bounds().contains(Vec2::new(x, y)));
                }
                assert_membership_consistent(&manager);
            }
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let mut manager = manager();
        manager.add_actor(1, Vec2::new(3000.0, 0.0)).unwrap();
        manager.add_actor(2, Vec2::new(0.0, 0.0)).unwrap();

        let json = serde_json::to_string(&manager).unwrap();
        let back: SectorManager<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sector_of(1), manager.sector_of(1));
        assert_eq!(back.sector_count(), 2);
    }
}
