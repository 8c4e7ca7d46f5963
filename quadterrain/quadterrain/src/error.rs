//! Error types for the quadterrain crate.

use quadterrain_heightmap::HeightmapError;
use thiserror::Error;

use crate::coordinate::TileCoordinate;

/// Result type for quadterrain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quadterrain operations.
///
/// Missing data (absent neighbours, heightmaps or samples) is never an error;
/// those cases are reported as `None`.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration option was rejected.
    #[error("invalid configuration `{field}`: {reason}")]
    InvalidConfig {
        /// The offending option.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// No live tile exists at the coordinate.
    #[error("no live tile at {0}")]
    UnknownTile(TileCoordinate),
    /// Elevation data could not be decoded.
    #[error(transparent)]
    Heightmap(#[from] HeightmapError),
}

impl Error {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
