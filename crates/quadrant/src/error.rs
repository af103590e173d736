//! Errors raised by sector bookkeeping.

use crate::sector::SectorId;

/// Failure of a sector operation.
///
/// Every variant leaves the manager unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SectorError {
    /// The position has a NaN or infinite coordinate.
    #[error("position ({x}, {y}) is not finite")]
    NonFinitePosition {
        /// Horizontal coordinate
        x: f32,
        /// Vertical coordinate
        y: f32,
    },
    /// No sector with this id exists.
    #[error("unknown {0}")]
    UnknownSector(SectorId),
    /// The sector has been subdivided and no longer holds actors directly.
    #[error("{0} is subdivided and cannot hold actors")]
    NotALeaf(SectorId),
    /// Splitting the sector would produce children below the minimum size.
    #[error("{id} is too small to subdivide (child size {child_size} < {minimum})")]
    TooSmall {
        /// Sector that was asked to split
        id: SectorId,
        /// Edge length the children would have
        child_size: f32,
        /// Configured minimum edge length
        minimum: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_sector() {
        let err = SectorError::NotALeaf(SectorId::new(3));
        assert_eq!(err.to_string(), "sector:3 is subdivided and cannot hold actors");

        let err = SectorError::NonFinitePosition {
            x: f32::NAN,
            y: 1.0,
        };
        assert!(err.to_string().contains("not finite"));
    }
}
