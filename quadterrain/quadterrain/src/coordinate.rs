//! Tile addressing: coordinates, quadrants, compass directions and the root
//! grid.
//!
//! Tiles are addressed by `(level, x, y)`. At level 0 the terrain is covered
//! by a grid of `columns × rows` root tiles; each level doubles the grid along
//! both axes. `x` grows east and `y` grows north.

use std::fmt;

use glam::{DVec2, IVec2};
use quadterrain_heightmap::Pitch;

/// Highest level the quadtree may reach.
pub const MAX_TILE_LEVEL: u32 = 24;

/// Largest number of root tiles along one axis.
pub const MAX_ROOT_TILES: u32 = 256;

/// Address of a tile in the quadtree.
///
/// Coordinates order by level first, then `x`, then `y`. Anything that walks
/// tiles in a deterministic order relies on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoordinate {
    /// Depth in the quadtree; roots are at level 0.
    pub level: u32,
    /// Column, counted from the west edge.
    pub x: u32,
    /// Row, counted from the south edge.
    pub y: u32,
}

impl TileCoordinate {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    /// The coordinate one level up, or `None` for a root tile.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        (self.level > 0).then(|| Self::new(self.level - 1, self.x >> 1, self.y >> 1))
    }

    /// The coordinate of this tile's ancestor at `level`.
    ///
    /// Returns `self` when `level` equals the tile's level, and `None` when
    /// `level` is deeper.
    #[must_use]
    pub fn ancestor(self, level: u32) -> Option<Self> {
        let shift = self.level.checked_sub(level)?;
        Some(Self::new(level, self.x >> shift, self.y >> shift))
    }

    /// Whether `other` is this tile or one of its descendants.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        other.ancestor(self.level) == Some(self)
    }

    /// The child covering one quadrant of this tile.
    #[must_use]
    pub fn child(self, quadrant: Quadrant) -> Self {
        let (dx, dy) = quadrant.offset();
        Self::new(self.level + 1, self.x * 2 + dx, self.y * 2 + dy)
    }

    /// All four children, in [`Quadrant::ALL`] order.
    #[must_use]
    pub fn children(self) -> [Self; 4] {
        Quadrant::ALL.map(|quadrant| self.child(quadrant))
    }

    /// Which quadrant of its parent this tile covers, or `None` for a root.
    #[must_use]
    pub fn quadrant(self) -> Option<Quadrant> {
        (self.level > 0).then(|| Quadrant::from_parity(self.x & 1, self.y & 1))
    }

    /// The same-level tile adjacent in `direction`, or `None` if it falls
    /// outside the grid.
    #[must_use]
    pub fn neighbour(self, direction: Direction, grid: RootGrid) -> Option<Self> {
        let offset = direction.offset();
        let x = self.x.checked_add_signed(offset.x)?;
        let y = self.y.checked_add_signed(offset.y)?;
        let candidate = Self::new(self.level, x, y);
        grid.contains(candidate).then_some(candidate)
    }

    /// The transform mapping this tile's surface coordinates into `other`'s.
    ///
    /// For a coarser tile `other` at `k` levels above, this is a scale of
    /// `1 / 2^k` and an offset locating this tile inside the coarser cell. The
    /// tiles need not be related.
    #[must_use]
    pub fn pitch_into(self, other: Self) -> Pitch {
        // Level differences are bounded by MAX_TILE_LEVEL.
        #[allow(clippy::cast_possible_wrap)]
        let scale = 2f64.powi(other.level as i32 - self.level as i32);
        let origin = DVec2::new(f64::from(self.x), f64::from(self.y)) * scale;
        let offset = origin - DVec2::new(f64::from(other.x), f64::from(other.y));
        Pitch::new(offset, DVec2::splat(scale))
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}

/// One quarter of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Upper-left.
    NorthWest,
    /// Upper-right.
    NorthEast,
    /// Lower-left.
    SouthWest,
    /// Lower-right.
    SouthEast,
}

impl Quadrant {
    /// All quadrants, in child order.
    pub const ALL: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Position in [`Quadrant::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column and row offset of the child within its parent's 2×2 block.
    #[must_use]
    pub fn offset(self) -> (u32, u32) {
        match self {
            Self::NorthWest => (0, 1),
            Self::NorthEast => (1, 1),
            Self::SouthWest => (0, 0),
            Self::SouthEast => (1, 0),
        }
    }

    fn from_parity(dx: u32, dy: u32) -> Self {
        match (dx, dy) {
            (0, 1) => Self::NorthWest,
            (1, 1) => Self::NorthEast,
            (0, _) => Self::SouthWest,
            _ => Self::SouthEast,
        }
    }

    /// The transform mapping the child's surface into its parent's.
    #[must_use]
    pub fn pitch(self) -> Pitch {
        let (dx, dy) = self.offset();
        Pitch::new(
            DVec2::new(f64::from(dx), f64::from(dy)) * 0.5,
            DVec2::splat(0.5),
        )
    }
}

/// The eight compass directions around a tile, in clockwise order starting
/// north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Towards +y.
    North,
    /// Towards +x, +y.
    NorthEast,
    /// Towards +x.
    East,
    /// Towards +x, -y.
    SouthEast,
    /// Towards -y.
    South,
    /// Towards -x, -y.
    SouthWest,
    /// Towards -x.
    West,
    /// Towards -x, +y.
    NorthWest,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Position in [`Direction::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit step in tile coordinates.
    #[must_use]
    pub fn offset(self) -> IVec2 {
        match self {
            Self::North => IVec2::new(0, 1),
            Self::NorthEast => IVec2::new(1, 1),
            Self::East => IVec2::new(1, 0),
            Self::SouthEast => IVec2::new(1, -1),
            Self::South => IVec2::new(0, -1),
            Self::SouthWest => IVec2::new(-1, -1),
            Self::West => IVec2::new(-1, 0),
            Self::NorthWest => IVec2::new(-1, 1),
        }
    }

    /// Whether this is a diagonal direction.
    #[must_use]
    pub fn is_corner(self) -> bool {
        self.index() % 2 == 1
    }

    /// The next direction clockwise.
    #[must_use]
    pub fn clockwise(self) -> Self {
        Self::ALL[(self.index() + 1) % 8]
    }

    /// The next direction counter-clockwise.
    #[must_use]
    pub fn counter_clockwise(self) -> Self {
        Self::ALL[(self.index() + 7) % 8]
    }

    /// The direction pointing the other way.
    #[must_use]
    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 4) % 8]
    }
}

/// Dimensions of the level-0 tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootGrid {
    /// Root tiles along x.
    pub columns: u32,
    /// Root tiles along y.
    pub rows: u32,
}

impl RootGrid {
    /// Create a grid.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of tile columns at `level`.
    #[must_use]
    pub fn columns_at(self, level: u32) -> u64 {
        u64::from(self.columns) << level
    }

    /// Number of tile rows at `level`.
    #[must_use]
    pub fn rows_at(self, level: u32) -> u64 {
        u64::from(self.rows) << level
    }

    /// Whether a coordinate lies inside the grid at its level.
    #[must_use]
    pub fn contains(self, coordinate: TileCoordinate) -> bool {
        coordinate.level <= MAX_TILE_LEVEL
            && u64::from(coordinate.x) < self.columns_at(coordinate.level)
            && u64::from(coordinate.y) < self.rows_at(coordinate.level)
    }

    /// Level-0 coordinates, row by row from the south.
    pub fn roots(self) -> impl Iterator<Item = TileCoordinate> {
        (0..self.rows).flat_map(move |y| (0..self.columns).map(move |x| TileCoordinate::new(0, x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_children_and_parent() {
        let tile = TileCoordinate::new(2, 3, 1);
        let children = tile.children();
        assert_eq!(children[0], TileCoordinate::new(3, 6, 3));
        assert_eq!(children[1], TileCoordinate::new(3, 7, 3));
        assert_eq!(children[2], TileCoordinate::new(3, 6, 2));
        assert_eq!(children[3], TileCoordinate::new(3, 7, 2));

        for (child, quadrant) in children.iter().zip(Quadrant::ALL) {
            assert_eq!(child.parent(), Some(tile));
            assert_eq!(child.quadrant(), Some(quadrant));
        }
        assert_eq!(TileCoordinate::new(0, 0, 0).parent(), None);
    }

    #[test]
    fn test_ancestor() {
        let tile = TileCoordinate::new(4, 13, 6);
        assert_eq!(tile.ancestor(4), Some(tile));
        assert_eq!(tile.ancestor(2), Some(TileCoordinate::new(2, 3, 1)));
        assert_eq!(tile.ancestor(0), Some(TileCoordinate::new(0, 0, 0)));
        assert_eq!(tile.ancestor(5), None);
        assert!(TileCoordinate::new(2, 3, 1).contains(tile));
        assert!(!TileCoordinate::new(2, 2, 1).contains(tile));
    }

    #[test]
    fn test_neighbour_respects_grid() {
        let grid = RootGrid::new(2, 1);
        let tile = TileCoordinate::new(1, 0, 0);

        assert_eq!(tile.neighbour(Direction::West, grid), None);
        assert_eq!(tile.neighbour(Direction::South, grid), None);
        assert_eq!(
            tile.neighbour(Direction::NorthEast, grid),
            Some(TileCoordinate::new(1, 1, 1))
        );

        // Level 1 of a 2×1 grid is 4 columns by 2 rows.
        let corner = TileCoordinate::new(1, 3, 1);
        assert_eq!(corner.neighbour(Direction::East, grid), None);
        assert_eq!(corner.neighbour(Direction::North, grid), None);
        assert_eq!(
            corner.neighbour(Direction::SouthWest, grid),
            Some(TileCoordinate::new(1, 2, 0))
        );
    }

    #[test]
    fn test_direction_rotation() {
        assert_eq!(Direction::North.clockwise(), Direction::NorthEast);
        assert_eq!(Direction::North.counter_clockwise(), Direction::NorthWest);
        assert_eq!(Direction::SouthWest.opposite(), Direction::NorthEast);
        assert!(Direction::SouthEast.is_corner());
        assert!(!Direction::West.is_corner());

        for direction in Direction::ALL {
            assert_eq!(direction.opposite().offset(), -direction.offset());
        }
    }

    #[test]
    fn test_pitch_into_coarser_neighbour() {
        // Tile 2/5/3 sits in the upper-right quarter of 1/2/1.
        let pitch = TileCoordinate::new(2, 5, 3).pitch_into(TileCoordinate::new(1, 2, 1));
        assert_eq!(pitch.scale, DVec2::splat(0.5));
        assert_eq!(pitch.offset, DVec2::new(0.5, 0.5));

        // A coarser west neighbour: the shared edge maps to u = 1.
        let pitch = TileCoordinate::new(2, 4, 2).pitch_into(TileCoordinate::new(1, 1, 1));
        assert_eq!(pitch.apply(DVec2::new(0.0, 0.0)), DVec2::new(1.0, 0.0));
        assert_eq!(pitch.apply(DVec2::new(0.0, 1.0)), DVec2::new(1.0, 0.5));
    }

    #[test]
    fn test_quadrant_pitch_matches_pitch_into() {
        let parent = TileCoordinate::new(3, 2, 5);
        for quadrant in Quadrant::ALL {
            let child = parent.child(quadrant);
            assert_eq!(child.pitch_into(parent), quadrant.pitch());
        }
    }

    #[test]
    fn test_root_grid() {
        let grid = RootGrid::new(3, 2);
        let roots: Vec<_> = grid.roots().collect();
        assert_eq!(roots.len(), 6);
        assert_eq!(roots[0], TileCoordinate::new(0, 0, 0));
        assert_eq!(roots[5], TileCoordinate::new(0, 2, 1));
        assert_eq!(grid.columns_at(2), 12);
        assert_eq!(grid.rows_at(2), 8);
        assert!(!grid.contains(TileCoordinate::new(0, 3, 0)));
    }

    proptest! {
        #[test]
        fn prop_neighbours_are_symmetric(
            columns in 1u32..4,
            rows in 1u32..4,
            level in 0u32..6,
            x in any::<u32>(),
            y in any::<u32>(),
        ) {
            let grid = RootGrid::new(columns, rows);
            let tile = TileCoordinate::new(
                level,
                u32::try_from(u64::from(x) % grid.columns_at(level)).unwrap(),
                u32::try_from(u64::from(y) % grid.rows_at(level)).unwrap(),
            );

            for direction in Direction::ALL {
                if let Some(neighbour) = tile.neighbour(direction, grid) {
                    prop_assert_eq!(neighbour.neighbour(direction.opposite(), grid), Some(tile));
                }
            }
        }

        #[test]
        fn prop_children_round_trip(level in 0u32..20, x in 0u32..1000, y in 0u32..1000) {
            let tile = TileCoordinate::new(level, x, y);
            for (child, quadrant) in tile.children().into_iter().zip(Quadrant::ALL) {
                prop_assert_eq!(child.parent(), Some(tile));
                prop_assert_eq!(child.quadrant(), Some(quadrant));
                prop_assert!(tile.contains(child));
            }
        }
    }
}
