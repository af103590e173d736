//! # Quadrant
//!
//! Sector bookkeeping for actors moving across an unbounded 2D plane.
//!
//! The plane is covered by axis-aligned sectors. A manager starts with a single
//! root sector centred on the origin and lazily adds grid-aligned sectors as
//! actors wander outside every known one. Each actor lives in exactly one leaf
//! sector at a time:
//!
//! - **Lazy growth**: Cells are only created where something actually goes
//! - **Stable membership**: Relocation removes before it inserts, so an actor is never in two cells
//! - **Optional subdivision**: Crowded leaves can be split into four quadrants
//!
//! ## Quick Start
//!
//! ```
//! use glam::Vec2;
//! use quadrant::{SectorConfig, SectorManager};
//!
//! let mut sectors: SectorManager<u32> = SectorManager::new(SectorConfig::default());
//!
//! // Inside the root cell
//! let root = sectors.add_actor(7, Vec2::new(100.0, 0.0)).unwrap();
//! assert_eq!(sectors.sector(root).unwrap().name(), "Sector [-1025, -1025]");
//!
//! // Far away: a new cell is created on the grid
//! let far = sectors.add_actor(7, Vec2::new(3000.0, 0.0)).unwrap();
//! assert_ne!(root, far);
//! assert_eq!(sectors.sector_of(7), Some(far));
//! assert!(!sectors.sector(root).unwrap().contains_actor(&7));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod hash;
pub mod manager;
pub mod sector;

// Re-exports for convenience
pub use error::SectorError;
pub use hash::hash_sectors;
pub use manager::{Placement, SectorConfig, SectorManager};
pub use sector::{Sector, SectorDisplay, SectorId};

use glam::Vec2;

/// Axis-aligned rectangle with inclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Bounds {
    /// Create bounds from dimensions (centered at origin).
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(-width / 2.0, -height / 2.0),
            max: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Create bounds from a corner and a size.
    #[must_use]
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Create bounds from min/max corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Left edge.
    #[must_use]
    pub fn x(&self) -> f32 {
        self.min.x
    }

    /// Top edge.
    #[must_use]
    pub fn y(&self) -> f32 {
        self.min.y
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Get the center of the bounds.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the bounds.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Check if a point is inside the bounds. Points on an edge count as inside.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Check if two bounds overlap or share an edge or corner.
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Check if this bounds intersects a circle.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        center.distance_squared(closest) <= radius * radius
    }

    /// Get the quadrant index for a point (0-3).
    ///
    /// Bit 0 is set right of the center, bit 1 below it.
    #[must_use]
    pub fn quadrant_index(&self, point: Vec2) -> usize {
        let center = self.center();
        let mut index = 0;
        if point.x >= center.x {
            index |= 1;
        }
        if point.y >= center.y {
            index |= 2;
        }
        index
    }

    /// Get the bounds of a child quadrant.
    #[must_use]
    pub fn child_bounds(&self, quadrant: usize) -> Self {
        let center = self.center();
        let min = Vec2::new(
            if quadrant & 1 == 0 { self.min.x } else { center.x },
            if quadrant & 2 == 0 { self.min.y } else { center.y },
        );
        let max = Vec2::new(
            if quadrant & 1 == 0 { center.x } else { self.max.x },
            if quadrant & 2 == 0 { center.y } else { self.max.y },
        );
        Self { min, max }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(manager::DEFAULT_CELL_SIZE, manager::DEFAULT_CELL_SIZE)
    }
}
