//! Offset/scale transforms between normalized surface coordinates.

use glam::DVec2;

/// A 2D affine transform mapping one normalized `[0, 1]²` surface into
/// another: `uv' = offset + uv * scale`.
///
/// Heightmaps use it to locate a tile's surface inside their buffer, and
/// neighbour descriptors use it to map a tile's surface into its neighbour's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pitch {
    /// Translation applied after scaling.
    pub offset: DVec2,
    /// Per-axis scale.
    pub scale: DVec2,
}

impl Default for Pitch {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pitch {
    /// The transform that leaves coordinates unchanged.
    pub const IDENTITY: Self = Self {
        offset: DVec2::ZERO,
        scale: DVec2::ONE,
    };

    /// Create a transform from its offset and scale.
    #[must_use]
    pub fn new(offset: DVec2, scale: DVec2) -> Self {
        Self { offset, scale }
    }

    /// Map a point.
    #[must_use]
    pub fn apply(self, uv: DVec2) -> DVec2 {
        self.offset + uv * self.scale
    }

    /// Map an axis-aligned rectangle.
    #[must_use]
    pub fn apply_rect(self, rect: UvRect) -> UvRect {
        UvRect::from_corners(self.apply(rect.min), self.apply(rect.max))
    }

    /// The transform equivalent to applying `self` first and `outer` second.
    #[must_use]
    pub fn then(self, outer: Self) -> Self {
        Self {
            offset: outer.offset + self.offset * outer.scale,
            scale: self.scale * outer.scale,
        }
    }
}

/// An axis-aligned rectangle in normalized surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    /// Lower-left corner.
    pub min: DVec2,
    /// Upper-right corner.
    pub max: DVec2,
}

impl UvRect {
    /// The whole unit square.
    pub const FULL: Self = Self {
        min: DVec2::ZERO,
        max: DVec2::ONE,
    };

    /// Build a rectangle from two opposite corners in any order.
    #[must_use]
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}
