//! State hashing for determinism checks.
//!
//! Two managers that received the same placements in the same order hash
//! identically. Coordinates are hashed as bit patterns.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::manager::SectorManager;
use crate::Bounds;

/// Compute a deterministic hash of every sector and every actor placement.
#[must_use]
pub fn hash_sectors<K: Ord + Copy + Hash + fmt::Debug>(manager: &SectorManager<K>) -> u64 {
    let mut hasher = DefaultHasher::new();

    manager.sector_count().hash(&mut hasher);
    for sector in manager.sectors() {
        sector.id().hash(&mut hasher);
        hash_bounds(sector.bounds(), &mut hasher);
        sector.parent().hash(&mut hasher);
        sector.children().hash(&mut hasher);

        // Actors iterate in key order
        sector.actor_count().hash(&mut hasher);
        for actor in sector.actors() {
            actor.hash(&mut hasher);
            if let Some(placement) = manager.placement(*actor) {
                placement.position.x.to_bits().hash(&mut hasher);
                placement.position.y.to_bits().hash(&mut hasher);
            }
        }
    }

    hasher.finish()
}

fn hash_bounds<H: Hasher>(bounds: &Bounds, hasher: &mut H) {
    bounds.min.x.to_bits().hash(hasher);
    bounds.min.y.to_bits().hash(hasher);
    bounds.max.x.to_bits().hash(hasher);
    bounds.max.y.to_bits().hash(hasher);
}
