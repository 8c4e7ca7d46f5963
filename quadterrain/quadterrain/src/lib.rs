//! Level-of-detail selection and seam stitching for tiled heightmap terrains.
//!
//! A terrain is split into a grid of root tiles, each the root of a quadtree.
//! Every frame, [`Terrain::update`] walks the trees, culls tiles against the
//! camera frustum, and subdivides or merges tiles based on their screen-space
//! error. Elevation arrives per tile through [`Terrain::set_elevation`] and
//! flows down to descendants that have none of their own yet. Border vertices
//! of adjacent tiles are stitched so that tiles at different levels meet
//! without cracks.
//!
//! # Design principles
//!
//! - **Single-threaded and frame-driven**: Nothing runs in the background;
//!   structural changes decided in one frame apply at the start of the next
//! - **Weak lookups**: The coordinate index never keeps a tile alive
//! - **Missing data is not an error**: Absent neighbours, heightmaps and
//!   samples are reported as `None`
//!
//! # Example
//!
//! ```ignore
//! use quadterrain::{Terrain, TerrainConfig, View};
//!
//! let mut terrain = Terrain::new(TerrainConfig::default())?;
//!
//! // Once per rendered frame.
//! let report = terrain.update(&view);
//! for coordinate in &report.displayed {
//!     let seams = terrain.seams(*coordinate);
//!     // Draw the tile, displacing border vertices by `seams`.
//! }
//! ```

mod arena;
mod config;
mod coordinate;
mod elevation;
mod error;
mod extent;
mod index;
mod stitching;
mod subdivision;
mod terrain;
mod tile;
mod view;
mod volume;

#[cfg(test)]
mod test_support;

pub use arena::{TileArena, TileId};
pub use config::{MAX_SEGMENTS_PER_TILE, TerrainConfig};
pub use coordinate::{
    Direction, MAX_ROOT_TILES, MAX_TILE_LEVEL, Quadrant, RootGrid, TileCoordinate,
};
pub use elevation::{ElevationData, ElevationSample};
pub use error::{Error, Result};
pub use extent::Extent;
pub use index::TileIndex;
pub use stitching::{Neighbour, NeighbourDescriptor, SeamResolver, SeamVertex, Seams};
pub use subdivision::{Decision, ScreenSpaceError, SubdivisionController};
pub use terrain::{FrameReport, Terrain};
pub use tile::{ElevationState, TileNode, TileState};
pub use view::{Frustum, Projection, View};
pub use volume::{Aabb, VolumeTracker};

// Re-export heightmap types for convenience.
pub use quadterrain_heightmap::{Encoding, Heightmap, HeightmapData, MinMax, Pitch, UvRect};
