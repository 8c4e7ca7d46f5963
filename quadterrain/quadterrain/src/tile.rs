//! Tile nodes.

use quadterrain_heightmap::Heightmap;

use crate::arena::TileId;
use crate::coordinate::TileCoordinate;
use crate::extent::Extent;
use crate::volume::Aabb;

/// Whether a tile is drawn itself or through its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// A leaf; the tile is displayed when visible.
    Collapsed,
    /// The tile has four children and is not displayed itself.
    Subdivided,
}

/// Where a tile's elevation comes from.
///
/// The order is meaningful: a state never downgrades to a lower one through
/// ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElevationState {
    /// No elevation; the tile is flat.
    None,
    /// Borrowed from an ancestor, through a narrower pitch.
    Inherited,
    /// A coarse preview of the tile's own data.
    Preview,
    /// The tile's own data at full resolution.
    Final,
}

impl ElevationState {
    /// Whether the tile holds data of its own, as opposed to none or an
    /// ancestor's.
    #[must_use]
    pub fn is_own(self) -> bool {
        matches!(self, Self::Preview | Self::Final)
    }
}

/// A node of the tile quadtree.
#[derive(Debug)]
pub struct TileNode {
    pub(crate) coordinate: TileCoordinate,
    pub(crate) parent: Option<TileId>,
    pub(crate) children: Option<[TileId; 4]>,
    pub(crate) extent: Extent,
    pub(crate) heightmap: Option<Heightmap>,
    pub(crate) elevation: ElevationState,
    pub(crate) volume: Aabb,
    pub(crate) visible: bool,
}

impl TileNode {
    pub(crate) fn new(coordinate: TileCoordinate, extent: Extent, volume: Aabb) -> Self {
        Self {
            coordinate,
            parent: None,
            children: None,
            extent,
            heightmap: None,
            elevation: ElevationState::None,
            volume,
            visible: false,
        }
    }

    /// The tile's address.
    #[must_use]
    pub fn coordinate(&self) -> TileCoordinate {
        self.coordinate
    }

    /// The parent node, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<TileId> {
        self.parent
    }

    /// The four children in quadrant order, when subdivided.
    #[must_use]
    pub fn children(&self) -> Option<[TileId; 4]> {
        self.children
    }

    /// Whether the tile is a leaf.
    #[must_use]
    pub fn state(&self) -> TileState {
        if self.children.is_some() {
            TileState::Subdivided
        } else {
            TileState::Collapsed
        }
    }

    /// Planar rectangle covered by the tile.
    #[must_use]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// The CPU copy of the tile's elevation, own or inherited.
    #[must_use]
    pub fn heightmap(&self) -> Option<&Heightmap> {
        self.heightmap.as_ref()
    }

    /// Where the tile's elevation comes from.
    #[must_use]
    pub fn elevation_state(&self) -> ElevationState {
        self.elevation
    }

    /// Local bounding volume, relative to the terrain origin.
    #[must_use]
    pub fn volume(&self) -> Aabb {
        self.volume
    }

    /// Whether the tile was displayed during the last frame.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Geometric error of the tile's mesh: the ground distance spanned by one
    /// grid segment along the longer side.
    #[must_use]
    pub fn geometric_error(&self, segments_per_tile: u32) -> f64 {
        self.extent.width().max(self.extent.height()) / f64::from(segments_per_tile)
    }
}
