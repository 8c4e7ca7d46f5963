//! Screen-space error and subdivide/merge decisions.

use glam::DVec3;

use crate::arena::{TileArena, TileId};
use crate::config::TerrainConfig;
use crate::tile::TileState;
use crate::view::View;

/// Screen-space error metric for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ScreenSpaceError {
    /// Camera position in world space.
    pub camera_position: DVec3,
    /// Pixels per world unit at distance 1.
    pub pre_sse: f64,
    /// Subtracted from every error.
    pub half_pixel_size: f64,
}

impl ScreenSpaceError {
    /// Create the metric for a view.
    #[must_use]
    pub fn new(view: &View, half_pixel_size: f64) -> Self {
        Self {
            camera_position: view.position,
            pre_sse: view.pre_sse(),
            half_pixel_size,
        }
    }

    /// Projected error, in pixels, of a tile with the given geometric error
    /// whose volume is centered at `center`.
    ///
    /// A zero geometric error is infinitely large on screen, so such a tile
    /// always refines up to the deepest level.
    ///
    /// Returns `None` when no meaningful error exists: the distance is zero
    /// or not finite, or the metric itself is not finite.
    #[must_use]
    pub fn compute(&self, geometric_error: f64, center: DVec3) -> Option<f64> {
        let distance = self.camera_position.distance(center);
        if !(distance.is_finite() && distance > 0.0) {
            return None;
        }
        if geometric_error == 0.0 {
            return Some(f64::INFINITY);
        }

        let error = self.pre_sse * geometric_error / distance - self.half_pixel_size;
        error.is_finite().then_some(error)
    }
}

/// What to do with a tile after evaluating its error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Leave the tile as it is.
    Keep,
    /// Replace the tile by its four children.
    Subdivide,
    /// Dispose of the tile's descendants.
    Merge,
}

/// Applies the subdivision rules of a terrain configuration.
#[derive(Debug, Clone, Copy)]
pub struct SubdivisionController {
    threshold: f64,
    max_level: u32,
    ancestor_depth: u32,
    requires_elevation: bool,
}

impl SubdivisionController {
    /// Create a controller for a terrain configuration.
    #[must_use]
    pub fn new(config: &TerrainConfig) -> Self {
        Self {
            threshold: config.subdivision_threshold,
            max_level: config.max_level(),
            ancestor_depth: config.subdivision_ancestor_depth,
            requires_elevation: config.elevation_enabled,
        }
    }

    /// The error threshold, in pixels.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Decide the fate of a tile.
    ///
    /// A collapsed tile subdivides when its error exceeds the threshold, it is
    /// not at the deepest level, and [`SubdivisionController::can_subdivide`]
    /// allows it. A subdivided tile merges once its error falls back to the
    /// threshold or below. A missing error never changes anything.
    #[must_use]
    pub fn decide(&self, tiles: &TileArena, id: TileId, error: Option<f64>) -> Decision {
        let (Some(node), Some(error)) = (tiles.get(id), error) else {
            return Decision::Keep;
        };

        match node.state() {
            TileState::Collapsed => {
                if error > self.threshold
                    && node.coordinate.level < self.max_level
                    && self.can_subdivide(tiles, id)
                {
                    Decision::Subdivide
                } else {
                    Decision::Keep
                }
            }
            TileState::Subdivided => {
                if error <= self.threshold {
                    Decision::Merge
                } else {
                    Decision::Keep
                }
            }
        }
    }

    /// Whether the tile has elevation good enough to refine.
    ///
    /// Subdividing a tile whose elevation is still missing would produce
    /// children that are just as flat, so the tile or one of its nearest
    /// ancestors must already hold its own data. Without an elevation source,
    /// subdivision is always allowed.
    #[must_use]
    pub fn can_subdivide(&self, tiles: &TileArena, id: TileId) -> bool {
        if !self.requires_elevation {
            return true;
        }

        let mut current = tiles.get(id);
        for _ in 0..=self.ancestor_depth {
            let Some(node) = current else {
                break;
            };
            if node.elevation.is_own() {
                return true;
            }
            current = node.parent.and_then(|parent| tiles.get(parent));
        }
        false
    }
}
