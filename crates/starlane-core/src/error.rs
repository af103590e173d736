//! Error types for the simulation core.

use quadrant::SectorError;

use crate::entity::{EntityId, EntityTag};

/// Failure of a simulation operation.
///
/// Errors abort the operation that raised them and leave the world unchanged.
/// Destroying an actor twice is not an error.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A random pick was requested from an empty collection.
    #[error("cannot pick a random {0} from an empty selection")]
    EmptySelection(&'static str),
    /// No live entity has this id.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    /// The entity exists but is of a different kind.
    #[error("entity {id} is a {actual}, expected a {expected}")]
    WrongKind {
        /// Entity that was looked up
        id: EntityId,
        /// Kind the operation needs
        expected: EntityTag,
        /// Kind the entity has
        actual: EntityTag,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// The sector index rejected an operation.
    #[error(transparent)]
    Sector(#[from] SectorError),
}
