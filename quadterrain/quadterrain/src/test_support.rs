//! Shared fixtures for unit tests.

use glam::{DVec2, DVec3};
use quadterrain_heightmap::{Encoding, Heightmap, Pitch};

use crate::coordinate::TileCoordinate;
use crate::elevation::ElevationData;
use crate::extent::Extent;
use crate::tile::TileNode;
use crate::view::{Projection, View};
use crate::volume::Aabb;

/// A collapsed, flat node covering `[0, 100]²`.
pub fn flat_node(coordinate: TileCoordinate) -> TileNode {
    let extent = Extent::new(DVec2::ZERO, DVec2::splat(100.0));
    let volume = Aabb::new(extent.min.extend(0.0), extent.max.extend(0.0));
    TileNode::new(coordinate, extent, volume)
}

/// A 4×4 heightmap holding one value everywhere.
pub fn constant_elevation(value: f64, is_final: bool) -> ElevationData {
    let heightmap =
        Heightmap::from_elevations(4, 4, &[Some(value); 16], Encoding::ValueAlpha, Pitch::IDENTITY)
            .unwrap();
    ElevationData::new(heightmap, is_final)
}

/// A 90° perspective projection.
pub fn perspective() -> Projection {
    Projection::Perspective {
        fov_y: std::f64::consts::FRAC_PI_2,
        aspect: 1.0,
        near: 1.0,
        far: 10_000.0,
    }
}

/// A camera looking straight down from `position`, with a 1000 px viewport.
pub fn overhead_view(position: DVec3) -> View {
    let target = DVec3::new(position.x, position.y, 0.0);
    View::look_at(position, target, DVec3::Y, perspective(), 1000.0)
}
