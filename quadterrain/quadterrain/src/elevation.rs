//! Elevation data delivered to tiles.

use quadterrain_heightmap::{Heightmap, HeightmapData, Pitch};

use crate::coordinate::TileCoordinate;
use crate::error::Result;

/// Elevation for one tile, as delivered by a data source.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationData {
    /// The decoded buffer and its mapping onto the tile.
    pub heightmap: Heightmap,
    /// Whether this is the tile's definitive data rather than a preview.
    pub is_final: bool,
}

impl ElevationData {
    /// Wrap a heightmap.
    #[must_use]
    pub fn new(heightmap: Heightmap, is_final: bool) -> Self {
        Self {
            heightmap,
            is_final,
        }
    }

    /// Wrap an encoded buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Heightmap`] if the buffer does not match the
    /// dimensions or its encoding parameters are invalid.
    pub fn from_buffer(
        data: HeightmapData,
        width: u32,
        height: u32,
        pitch: Pitch,
        is_final: bool,
    ) -> Result<Self> {
        Ok(Self::new(Heightmap::new(data, width, height, pitch)?, is_final))
    }
}

/// An elevation picked from the terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    /// Elevation in world units.
    pub elevation: f64,
    /// Ground distance per heightmap pixel of the tile that supplied it.
    pub resolution: f64,
    /// The tile that supplied it.
    pub coordinate: TileCoordinate,
}
