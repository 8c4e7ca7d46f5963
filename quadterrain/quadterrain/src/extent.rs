//! Planar rectangles covered by the terrain and its tiles.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::coordinate::{Quadrant, RootGrid, TileCoordinate};

/// An axis-aligned rectangle on the terrain's horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// South-west corner.
    pub min: DVec2,
    /// North-east corner.
    pub max: DVec2,
}

impl Extent {
    /// Create an extent from its corners.
    #[must_use]
    pub const fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Whether the corners are finite and the extent has a positive area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmplt(self.max).all()
    }

    /// Size along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Size along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Size along both axes.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    /// Midpoint.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether a point lies inside, borders included.
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Normalized position of a point, `(0, 0)` at the south-west corner.
    #[must_use]
    pub fn uv_of(&self, point: DVec2) -> DVec2 {
        (point - self.min) / self.size()
    }

    /// The four quarters, in [`Quadrant::ALL`] order.
    #[must_use]
    pub fn split(&self) -> [Self; 4] {
        let center = self.center();
        Quadrant::ALL.map(|quadrant| match quadrant {
            Quadrant::NorthWest => Self::new(
                DVec2::new(self.min.x, center.y),
                DVec2::new(center.x, self.max.y),
            ),
            Quadrant::NorthEast => Self::new(center, self.max),
            Quadrant::SouthWest => Self::new(self.min, center),
            Quadrant::SouthEast => Self::new(
                DVec2::new(center.x, self.min.y),
                DVec2::new(self.max.x, center.y),
            ),
        })
    }

    /// The extent of a tile when this extent is covered by `grid`.
    #[must_use]
    pub fn tile(&self, coordinate: TileCoordinate, grid: RootGrid) -> Self {
        // Tile counts are far below 2^53.
        #[allow(clippy::cast_precision_loss)]
        let cells = DVec2::new(
            grid.columns_at(coordinate.level) as f64,
            grid.rows_at(coordinate.level) as f64,
        );
        let step = self.size() / cells;
        let min = self.min + DVec2::new(f64::from(coordinate.x), f64::from(coordinate.y)) * step;
        Self::new(min, min + step)
    }
}
