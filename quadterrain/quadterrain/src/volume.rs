//! Tile bounding volumes.
//!
//! A tile's volume spans its planar extent horizontally and its elevation
//! range vertically (z is up). Volumes are stored relative to the terrain
//! origin and translated on demand.

use glam::{DVec2, DVec3};
use quadterrain_heightmap::MinMax;
use tracing::trace;

use crate::config::TerrainConfig;
use crate::extent::Extent;
use crate::tile::TileNode;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lowest corner.
    pub min: DVec3,
    /// Highest corner.
    pub max: DVec3,
}

impl Aabb {
    /// Create a box from its corners.
    #[must_use]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Midpoint.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the size along each axis.
    #[must_use]
    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    /// The same box moved by `offset`.
    #[must_use]
    pub fn translate(&self, offset: DVec3) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    /// Whether `other` lies entirely within this box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    fn from_extent(extent: Extent, range: MinMax) -> Self {
        Self::new(
            extent.min.extend(range.min),
            extent.max.extend(range.max),
        )
    }

    fn vertical_range(&self) -> MinMax {
        MinMax {
            min: self.min.z,
            max: self.max.z,
        }
    }

    fn planar(&self) -> (DVec2, DVec2) {
        (self.min.truncate(), self.max.truncate())
    }
}

/// Keeps tile volumes in step with their elevation data.
#[derive(Debug, Clone, Copy)]
pub struct VolumeTracker {
    origin: DVec3,
    elevation_enabled: bool,
    flat_elevation: f64,
}

impl VolumeTracker {
    /// Create a tracker for a terrain configuration.
    #[must_use]
    pub fn new(config: &TerrainConfig) -> Self {
        Self {
            origin: config.origin,
            elevation_enabled: config.elevation_enabled,
            flat_elevation: config.flat_elevation,
        }
    }

    /// The volume a new tile starts with.
    ///
    /// Without elevation data the tile is flat at the configured elevation.
    #[must_use]
    pub fn initial_volume(&self, extent: Extent, range: Option<MinMax>) -> Aabb {
        let range = match range {
            Some(range) if self.elevation_enabled => range,
            _ => MinMax::splat(self.flat_elevation),
        };
        Aabb::from_extent(extent, range)
    }

    /// Replace a tile's vertical range.
    ///
    /// Non-finite bounds leave the volume unchanged; reversed bounds are
    /// swapped. When elevation is disabled the tile stays flat.
    pub fn update_from_min_max(&self, node: &mut TileNode, min: f64, max: f64) {
        if !(min.is_finite() && max.is_finite()) {
            trace!(tile = %node.coordinate, min, max, "ignoring non-finite elevation range");
            return;
        }

        let range = if self.elevation_enabled {
            MinMax {
                min: min.min(max),
                max: min.max(max),
            }
        } else {
            MinMax::splat(self.flat_elevation)
        };
        let (planar_min, planar_max) = node.volume.planar();
        node.volume = Aabb::new(planar_min.extend(range.min), planar_max.extend(range.max));
    }

    /// The tile's vertical range, as last set.
    #[must_use]
    pub fn vertical_range(&self, node: &TileNode) -> MinMax {
        node.volume.vertical_range()
    }

    /// The tile's volume in world coordinates.
    #[must_use]
    pub fn world_bounding_volume(&self, node: &TileNode) -> Aabb {
        node.volume.translate(self.origin)
    }
}
