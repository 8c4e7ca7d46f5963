//! Coordinate lookup for live tiles.
//!
//! The index maps coordinates to [`TileId`]s without owning the nodes. When
//! a tile is disposed its entry is left in place; lookups check liveness
//! against the arena and treat stale entries as absent, and
//! [`TileIndex::purge_stale`] drops them in bulk once per frame.

use std::collections::HashMap;

use tracing::trace;

use crate::arena::{TileArena, TileId};
use crate::coordinate::{Direction, RootGrid, TileCoordinate};
use crate::tile::TileNode;

/// Weak map from tile coordinates to live tiles.
#[derive(Debug, Default)]
pub struct TileIndex {
    entries: HashMap<TileCoordinate, TileId>,
}

impl TileIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tile, replacing any previous entry for its coordinate.
    pub fn insert(&mut self, coordinate: TileCoordinate, id: TileId) {
        self.entries.insert(coordinate, id);
    }

    /// The live tile at `coordinate`, if any.
    #[must_use]
    pub fn lookup(&self, coordinate: TileCoordinate, tiles: &TileArena) -> Option<TileId> {
        let id = *self.entries.get(&coordinate)?;
        let node = tiles.get(id)?;
        debug_assert_eq!(
            node.coordinate(),
            coordinate,
            "index entry points at a tile with another coordinate"
        );
        Some(id)
    }

    /// The deepest live tile at or above `coordinate` that satisfies
    /// `predicate`.
    ///
    /// Walks from `coordinate` towards the root and returns the first live
    /// match, or `None` once the root has been checked.
    #[must_use]
    pub fn find_nearest_ancestor_or_self(
        &self,
        coordinate: TileCoordinate,
        tiles: &TileArena,
        predicate: impl Fn(&TileNode) -> bool,
    ) -> Option<TileId> {
        let mut current = Some(coordinate);
        while let Some(coordinate) = current {
            if let Some(id) = self.lookup(coordinate, tiles) {
                if tiles.get(id).is_some_and(&predicate) {
                    return Some(id);
                }
            }
            current = coordinate.parent();
        }
        None
    }

    /// For each of the eight directions, the nearest live tile covering the
    /// same-level neighbour cell, or `None` outside the grid.
    #[must_use]
    pub fn neighbours(
        &self,
        coordinate: TileCoordinate,
        grid: RootGrid,
        tiles: &TileArena,
        predicate: impl Fn(&TileNode) -> bool,
    ) -> [Option<TileId>; 8] {
        Direction::ALL.map(|direction| {
            coordinate
                .neighbour(direction, grid)
                .and_then(|cell| self.find_nearest_ancestor_or_self(cell, tiles, &predicate))
        })
    }

    /// Drop entries whose tile has been disposed. Returns how many were
    /// removed.
    pub fn purge_stale(&mut self, tiles: &TileArena) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, id| tiles.contains(*id));
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!(removed, "purged stale index entries");
        }
        removed
    }

    /// Number of entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::flat_node;

    fn insert(tiles: &mut TileArena, index: &mut TileIndex, coordinate: TileCoordinate) -> TileId {
        let id = tiles.insert(flat_node(coordinate));
        index.insert(coordinate, id);
        id
    }

    #[test]
    fn test_lookup_skips_disposed_tiles() {
        let mut tiles = TileArena::new();
        let mut index = TileIndex::new();
        let coordinate = TileCoordinate::new(1, 1, 0);
        let id = insert(&mut tiles, &mut index, coordinate);

        assert_eq!(index.lookup(coordinate, &tiles), Some(id));

        tiles.remove(id);
        assert_eq!(index.lookup(coordinate, &tiles), None);
        assert_eq!(index.len(), 1);

        assert_eq!(index.purge_stale(&tiles), 1);
        assert!(index.is_empty());
        assert_eq!(index.purge_stale(&tiles), 0);
    }

    #[test]
    fn test_find_nearest_ancestor_or_self() {
        let mut tiles = TileArena::new();
        let mut index = TileIndex::new();
        let root = insert(&mut tiles, &mut index, TileCoordinate::new(0, 0, 0));
        let child = insert(&mut tiles, &mut index, TileCoordinate::new(1, 1, 1));

        // Level 3 tile under 1/1/1 that does not exist yet.
        let deep = TileCoordinate::new(3, 5, 6);
        assert_eq!(index.find_nearest_ancestor_or_self(deep, &tiles, |_| true), Some(child));

        // Under 1/0/0, which does not exist: falls back to the root.
        let other = TileCoordinate::new(3, 1, 1);
        assert_eq!(index.find_nearest_ancestor_or_self(other, &tiles, |_| true), Some(root));

        // The predicate can skip tiles.
        let skip_child = |node: &TileNode| node.coordinate().level == 0;
        assert_eq!(index.find_nearest_ancestor_or_self(deep, &tiles, skip_child), Some(root));

        assert_eq!(index.find_nearest_ancestor_or_self(deep, &tiles, |_| false), None);
    }

    #[test]
    fn test_neighbours_of_grid_corner() {
        let mut tiles = TileArena::new();
        let mut index = TileIndex::new();
        let grid = RootGrid::new(1, 1);
        let root = insert(&mut tiles, &mut index, TileCoordinate::new(0, 0, 0));
        for child in TileCoordinate::new(0, 0, 0).children() {
            insert(&mut tiles, &mut index, child);
        }
        let sw = TileCoordinate::new(1, 0, 0);
        let east = index.lookup(TileCoordinate::new(1, 1, 0), &tiles);
        let north = index.lookup(TileCoordinate::new(1, 0, 1), &tiles);
        let north_east = index.lookup(TileCoordinate::new(1, 1, 1), &tiles);

        let neighbours = index.neighbours(sw, grid, &tiles, |_| true);
        assert_eq!(neighbours[Direction::North.index()], north);
        assert_eq!(neighbours[Direction::NorthEast.index()], north_east);
        assert_eq!(neighbours[Direction::East.index()], east);
        for direction in [
            Direction::SouthEast,
            Direction::South,
            Direction::SouthWest,
            Direction::West,
            Direction::NorthWest,
        ] {
            assert_eq!(neighbours[direction.index()], None);
        }

        // Without the east child the lookup falls back to the root.
        tiles.remove(east.unwrap());
        let neighbours = index.neighbours(sw, grid, &tiles, |_| true);
        assert_eq!(neighbours[Direction::East.index()], Some(root));
    }
}
