//! Seam stitching between adjacent tiles.
//!
//! Each tile's surface is a `(S + 1) × (S + 1)` vertex grid, where `S` is the
//! number of segments per tile. Border vertices are adjusted so that they
//! line up with their neighbours:
//!
//! - **Lateral**: along an edge shared with a coarser neighbour, a vertex is
//!   moved back onto the nearest vertex of the coarser grid. Corners never
//!   move.
//! - **Vertical**: a vertex takes the elevation of a coarser neighbour, or
//!   the average of its own and a same-level neighbour's. Corners weigh up to
//!   three neighbours.
//!
//! Samples are sorted before averaging, so two tiles sharing a vertex compute
//! bit-identical elevations whatever order they are stitched in.

use glam::DVec2;
use quadterrain_heightmap::{Heightmap, Pitch};

use crate::coordinate::{Direction, TileCoordinate};

/// How a tile maps onto the tile found in one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighbourDescriptor {
    /// The neighbour's address.
    pub coordinate: TileCoordinate,
    /// Neighbour level minus tile level; never positive.
    pub diff_level: i32,
    /// Maps the tile's surface coordinates into the neighbour's.
    pub pitch: Pitch,
}

impl NeighbourDescriptor {
    /// Describe `neighbour` as seen from `tile`.
    #[must_use]
    pub fn new(tile: TileCoordinate, neighbour: TileCoordinate) -> Self {
        // Levels are bounded by MAX_TILE_LEVEL.
        #[allow(clippy::cast_possible_wrap)]
        let diff_level = neighbour.level as i32 - tile.level as i32;
        Self {
            coordinate: neighbour,
            diff_level,
            pitch: tile.pitch_into(neighbour),
        }
    }

    /// How many levels coarser the neighbour is.
    #[must_use]
    pub fn levels_coarser(&self) -> u32 {
        self.diff_level.unsigned_abs()
    }
}

/// A neighbour along with the elevation it can contribute.
#[derive(Debug, Clone, Copy)]
pub struct Neighbour<'a> {
    /// Where the neighbour is.
    pub descriptor: NeighbourDescriptor,
    /// Its CPU heightmap, if retained.
    pub heightmap: Option<&'a Heightmap>,
}

impl Neighbour<'_> {
    fn sample(&self, uv: DVec2) -> Option<f64> {
        self.heightmap
            .and_then(|heightmap| heightmap.sample(self.descriptor.pitch.apply(uv), false))
    }
}

/// The adjustment computed for one border vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeamVertex {
    /// Grid column, from the west edge.
    pub column: u32,
    /// Grid row, from the south edge.
    pub row: u32,
    /// Displacement of the vertex in surface coordinates.
    pub lateral_offset: DVec2,
    /// Stitched elevation, or `None` when no elevation is known.
    pub elevation: Option<f64>,
}

impl SeamVertex {
    /// The vertex position in surface coordinates, after displacement.
    #[must_use]
    pub fn uv(&self, segments_per_tile: u32) -> DVec2 {
        grid_uv(self.column, self.row, segments_per_tile) + self.lateral_offset
    }
}

/// Stitching results for one tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Seams {
    /// Neighbour found in each direction, indexed by [`Direction::index`].
    pub neighbours: [Option<NeighbourDescriptor>; 8],
    /// Border vertices, row by row from the south.
    pub vertices: Vec<SeamVertex>,
}

impl Seams {
    /// The neighbour found in `direction`.
    #[must_use]
    pub fn neighbour(&self, direction: Direction) -> Option<&NeighbourDescriptor> {
        self.neighbours[direction.index()].as_ref()
    }

    /// The adjustment for the vertex at `(column, row)`, if it is a border
    /// vertex.
    #[must_use]
    pub fn vertex(&self, column: u32, row: u32) -> Option<&SeamVertex> {
        self.vertices
            .binary_search_by_key(&(row, column), |vertex| (vertex.row, vertex.column))
            .ok()
            .map(|index| &self.vertices[index])
    }
}

/// Computes border vertex adjustments.
#[derive(Debug, Clone, Copy)]
pub struct SeamResolver {
    segments: u32,
    enabled: bool,
}

impl SeamResolver {
    /// Create a resolver for tiles of `segments` segments per edge.
    ///
    /// When `enabled` is false only the neighbour descriptors are produced.
    #[must_use]
    pub fn new(segments: u32, enabled: bool) -> Self {
        Self { segments, enabled }
    }

    /// Stitch a tile against its neighbours.
    ///
    /// # Arguments
    ///
    /// * `tile` - The tile being stitched.
    /// * `own` - The tile's heightmap, own or inherited.
    /// * `neighbours` - Neighbour in each direction, indexed by
    ///   [`Direction::index`].
    #[must_use]
    pub fn resolve(
        &self,
        tile: TileCoordinate,
        own: Option<&Heightmap>,
        neighbours: &[Option<Neighbour<'_>>; 8],
    ) -> Seams {
        let descriptors = neighbours.map(|neighbour| neighbour.map(|n| n.descriptor));
        if !self.enabled {
            return Seams {
                neighbours: descriptors,
                vertices: Vec::new(),
            };
        }

        let vertices = border_vertices(self.segments)
            .map(|(column, row)| {
                let direction = border_direction(column, row, self.segments);
                let lateral_offset = if direction.is_corner() {
                    DVec2::ZERO
                } else {
                    self.lateral_offset(tile, column, row, direction, neighbours)
                };

                let uv = grid_uv(column, row, self.segments) + lateral_offset;
                let own = own.and_then(|heightmap| heightmap.sample(uv, false));
                let elevation = if direction.is_corner() {
                    corner_elevation(uv, own, direction, neighbours)
                } else {
                    edge_elevation(uv, own, neighbours[direction.index()].as_ref())
                };

                SeamVertex {
                    column,
                    row,
                    lateral_offset,
                    elevation,
                }
            })
            .collect();

        Seams {
            neighbours: descriptors,
            vertices,
        }
    }

    /// Offset moving an edge vertex back onto the coarser neighbour's grid.
    fn lateral_offset(
        &self,
        tile: TileCoordinate,
        column: u32,
        row: u32,
        direction: Direction,
        neighbours: &[Option<Neighbour<'_>>; 8],
    ) -> DVec2 {
        let Some(neighbour) = &neighbours[direction.index()] else {
            return DVec2::ZERO;
        };
        if neighbour.descriptor.diff_level >= 0 {
            return DVec2::ZERO;
        }

        let horizontal = matches!(direction, Direction::North | Direction::South);
        let (along, tile_position) = if horizontal {
            (column, tile.x)
        } else {
            (row, tile.y)
        };

        // Distances in fine vertex steps from the start of the coarse edge.
        let coarse_step = 1u64 << neighbour.descriptor.levels_coarser();
        let tile_start = u64::from(tile_position) % coarse_step * u64::from(self.segments);
        let past_coarse_vertex = (tile_start + u64::from(along)) % coarse_step;
        let shift = past_coarse_vertex.min(u64::from(along));

        // Bounded by the segment count.
        #[allow(clippy::cast_precision_loss)]
        let shift = -(shift as f64) / f64::from(self.segments);
        if horizontal {
            DVec2::new(shift, 0.0)
        } else {
            DVec2::new(0.0, shift)
        }
    }
}

fn grid_uv(column: u32, row: u32, segments: u32) -> DVec2 {
    DVec2::new(f64::from(column), f64::from(row)) / f64::from(segments)
}

/// Border vertices of a `segments`-segment grid, row by row from the south.
fn border_vertices(segments: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..=segments).flat_map(move |row| {
        let step = if row == 0 || row == segments {
            1
        } else {
            segments as usize
        };
        (0..=segments)
            .step_by(step)
            .map(move |column| (column, row))
    })
}

/// The compass direction a border vertex faces.
fn border_direction(column: u32, row: u32, segments: u32) -> Direction {
    let north = row == segments;
    let south = row == 0;
    let east = column == segments;
    match (north, south, east) {
        (true, _, true) => Direction::NorthEast,
        (true, _, false) if column == 0 => Direction::NorthWest,
        (true, _, false) => Direction::North,
        (_, true, true) => Direction::SouthEast,
        (_, true, false) if column == 0 => Direction::SouthWest,
        (_, true, false) => Direction::South,
        (false, false, true) => Direction::East,
        (false, false, false) => Direction::West,
    }
}

fn edge_elevation(uv: DVec2, own: Option<f64>, neighbour: Option<&Neighbour<'_>>) -> Option<f64> {
    let Some(neighbour) = neighbour else {
        return own;
    };
    let theirs = neighbour.sample(uv);
    if neighbour.descriptor.diff_level < 0 {
        theirs.or(own)
    } else {
        average(own.into_iter().chain(theirs))
    }
}

fn corner_elevation(
    uv: DVec2,
    own: Option<f64>,
    direction: Direction,
    neighbours: &[Option<Neighbour<'_>>; 8],
) -> Option<f64> {
    let candidates: Vec<&Neighbour<'_>> = [
        direction.counter_clockwise(),
        direction,
        direction.clockwise(),
    ]
    .iter()
    .filter_map(|direction| neighbours[direction.index()].as_ref())
    .collect();

    let Some(shallowest) = candidates
        .iter()
        .map(|neighbour| neighbour.descriptor.diff_level)
        .min()
    else {
        return own;
    };

    let samples = candidates
        .iter()
        .filter(|neighbour| neighbour.descriptor.diff_level == shallowest)
        .filter_map(|neighbour| neighbour.sample(uv));

    if shallowest < 0 {
        average(samples).or(own)
    } else {
        average(own.into_iter().chain(samples))
    }
}

/// Order-independent mean.
fn average(samples: impl Iterator<Item = f64>) -> Option<f64> {
    let mut samples: Vec<f64> = samples.collect();
    if samples.is_empty() {
        return None;
    }
    samples.sort_by(f64::total_cmp);

    // At most four samples.
    #[allow(clippy::cast_precision_loss)]
    let count = samples.len() as f64;
    Some(samples.iter().sum::<f64>() / count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadterrain_heightmap::Encoding;

    fn constant(value: f64) -> Heightmap {
        Heightmap::from_elevations(2, 2, &[Some(value); 4], Encoding::ValueAlpha, Pitch::IDENTITY)
            .unwrap()
    }

    fn neighbour<'a>(
        tile: TileCoordinate,
        other: TileCoordinate,
        heightmap: Option<&'a Heightmap>,
    ) -> Option<Neighbour<'a>> {
        Some(Neighbour {
            descriptor: NeighbourDescriptor::new(tile, other),
            heightmap,
        })
    }

    #[test]
    fn test_border_vertices() {
        let vertices: Vec<_> = border_vertices(2).collect();
        assert_eq!(
            vertices,
            vec![
                (0, 0),
                (1, 0),
                (2, 0),
                (0, 1),
                (2, 1),
                (0, 2),
                (1, 2),
                (2, 2)
            ]
        );
        assert_eq!(border_direction(0, 0, 2), Direction::SouthWest);
        assert_eq!(border_direction(1, 0, 2), Direction::South);
        assert_eq!(border_direction(2, 1, 2), Direction::East);
        assert_eq!(border_direction(0, 2, 2), Direction::NorthWest);
        assert_eq!(border_direction(2, 2, 2), Direction::NorthEast);
    }

    #[test]
    fn test_descriptor() {
        let tile = TileCoordinate::new(3, 4, 2);
        let descriptor = NeighbourDescriptor::new(tile, TileCoordinate::new(1, 0, 0));
        assert_eq!(descriptor.diff_level, -2);
        assert_eq!(descriptor.levels_coarser(), 2);
        assert_eq!(descriptor.pitch.scale, DVec2::splat(0.25));
    }

    #[test]
    fn test_lateral_snap_against_coarser_neighbour() {
        let resolver = SeamResolver::new(4, true);
        // 2/1/1 is the right half of its parent; its north neighbour cell
        // 2/1/2 is covered by 1/0/1.
        let tile = TileCoordinate::new(2, 1, 1);
        let mut neighbours = [None; 8];
        neighbours[Direction::North.index()] =
            neighbour(tile, TileCoordinate::new(1, 0, 1), None);

        let seams = resolver.resolve(tile, None, &neighbours);
        let offsets: Vec<f64> = (1..4)
            .map(|column| seams.vertex(column, 4).unwrap().lateral_offset.x)
            .collect();
        assert_eq!(offsets, vec![-0.25, 0.0, -0.25]);

        // Every snapped vertex lands on an even fine step, which is a vertex
        // of the coarser grid.
        for column in 0..=4 {
            let uv = seams.vertex(column, 4).unwrap().uv(4);
            let coarse = (uv.x * 4.0 + 4.0) / 2.0;
            assert_eq!(coarse.fract(), 0.0);
        }

        // Corners and the other edges do not move.
        assert_eq!(seams.vertex(0, 4).unwrap().lateral_offset, DVec2::ZERO);
        assert_eq!(seams.vertex(4, 2).unwrap().lateral_offset, DVec2::ZERO);
    }

    #[test]
    fn test_lateral_snap_two_levels_coarser() {
        let resolver = SeamResolver::new(2, true);
        // 0/1/0 lies two levels up, east of 2/3/2.
        let tile = TileCoordinate::new(2, 3, 2);
        let mut neighbours = [None; 8];
        neighbours[Direction::East.index()] =
            neighbour(tile, TileCoordinate::new(0, 1, 0), None);

        let seams = resolver.resolve(tile, None, &neighbours);
        // y = 2 is the third quarter of the coarse edge: fine steps 4..=6,
        // coarse vertices every 4 steps.
        assert_eq!(seams.vertex(2, 1).unwrap().lateral_offset, DVec2::new(0.0, -0.5));
    }

    #[test]
    fn test_same_level_edges_average() {
        let resolver = SeamResolver::new(4, true);
        let west = TileCoordinate::new(1, 0, 0);
        let east = TileCoordinate::new(1, 1, 0);
        let west_map = constant(10.0);
        let east_map = constant(20.0);

        let mut from_west = [None; 8];
        from_west[Direction::East.index()] = neighbour(west, east, Some(&east_map));
        let mut from_east = [None; 8];
        from_east[Direction::West.index()] = neighbour(east, west, Some(&west_map));

        let west_seams = resolver.resolve(west, Some(&west_map), &from_west);
        let east_seams = resolver.resolve(east, Some(&east_map), &from_east);

        for row in 1..4 {
            let a = west_seams.vertex(4, row).unwrap();
            let b = east_seams.vertex(0, row).unwrap();
            assert_eq!(a.elevation, Some(15.0));
            assert_eq!(a.elevation, b.elevation);
            assert_eq!(a.lateral_offset, DVec2::ZERO);
        }

        // Edges without a neighbour keep their own samples.
        assert_eq!(west_seams.vertex(0, 2).unwrap().elevation, Some(10.0));
    }

    #[test]
    fn test_coarser_neighbour_wins() {
        let resolver = SeamResolver::new(4, true);
        let tile = TileCoordinate::new(2, 1, 1);
        let coarse_map = constant(50.0);
        let own_map = constant(10.0);
        let mut neighbours = [None; 8];
        neighbours[Direction::North.index()] =
            neighbour(tile, TileCoordinate::new(1, 0, 1), Some(&coarse_map));

        let seams = resolver.resolve(tile, Some(&own_map), &neighbours);
        assert_eq!(seams.vertex(2, 4).unwrap().elevation, Some(50.0));

        // Without the coarse heightmap the own sample is used.
        neighbours[Direction::North.index()] =
            neighbour(tile, TileCoordinate::new(1, 0, 1), None);
        let seams = resolver.resolve(tile, Some(&own_map), &neighbours);
        assert_eq!(seams.vertex(2, 4).unwrap().elevation, Some(10.0));
    }

    #[test]
    fn test_corner_shallowest_candidates_win() {
        let resolver = SeamResolver::new(2, true);
        let tile = TileCoordinate::new(2, 1, 1);
        let own_map = constant(0.0);
        let same_map = constant(100.0);
        let coarse_a = constant(30.0);
        let coarse_b = constant(50.0);

        // North-east corner: east is same level, north and north-east are
        // one level up.
        let mut neighbours = [None; 8];
        neighbours[Direction::East.index()] =
            neighbour(tile, TileCoordinate::new(2, 2, 1), Some(&same_map));
        neighbours[Direction::North.index()] =
            neighbour(tile, TileCoordinate::new(1, 0, 1), Some(&coarse_a));
        neighbours[Direction::NorthEast.index()] =
            neighbour(tile, TileCoordinate::new(1, 1, 1), Some(&coarse_b));

        let seams = resolver.resolve(tile, Some(&own_map), &neighbours);
        assert_eq!(seams.vertex(2, 2).unwrap().elevation, Some(40.0));
    }

    #[test]
    fn test_corner_only_coarsest_level_counts() {
        let resolver = SeamResolver::new(2, true);
        let tile = TileCoordinate::new(3, 3, 3);
        let own_map = constant(0.0);
        let north_map = constant(10.0);
        let north_east_map = constant(30.0);
        let east_map = constant(70.0);

        // North is one level up; north-east and east are two levels up.
        let mut neighbours = [None; 8];
        neighbours[Direction::North.index()] =
            neighbour(tile, TileCoordinate::new(2, 1, 2), Some(&north_map));
        neighbours[Direction::NorthEast.index()] =
            neighbour(tile, TileCoordinate::new(1, 1, 1), Some(&north_east_map));
        neighbours[Direction::East.index()] =
            neighbour(tile, TileCoordinate::new(1, 1, 0), Some(&east_map));

        let seams = resolver.resolve(tile, Some(&own_map), &neighbours);
        assert_eq!(seams.vertex(2, 2).unwrap().elevation, Some(50.0));

        // Without data at the coarsest level, the own sample is kept.
        neighbours[Direction::NorthEast.index()] =
            neighbour(tile, TileCoordinate::new(1, 1, 1), None);
        neighbours[Direction::East.index()] = neighbour(tile, TileCoordinate::new(1, 1, 0), None);
        let seams = resolver.resolve(tile, Some(&own_map), &neighbours);
        assert_eq!(seams.vertex(2, 2).unwrap().elevation, Some(0.0));
    }

    #[test]
    fn test_corner_same_level_includes_own() {
        let resolver = SeamResolver::new(2, true);
        let tile = TileCoordinate::new(1, 0, 0);
        let maps = [constant(1.0), constant(2.0), constant(3.0), constant(6.0)];

        let mut neighbours = [None; 8];
        neighbours[Direction::North.index()] =
            neighbour(tile, TileCoordinate::new(1, 0, 1), Some(&maps[1]));
        neighbours[Direction::NorthEast.index()] =
            neighbour(tile, TileCoordinate::new(1, 1, 1), Some(&maps[2]));
        neighbours[Direction::East.index()] =
            neighbour(tile, TileCoordinate::new(1, 1, 0), Some(&maps[3]));

        let seams = resolver.resolve(tile, Some(&maps[0]), &neighbours);
        assert_eq!(seams.vertex(2, 2).unwrap().elevation, Some(3.0));

        // No candidates at all: the own sample.
        assert_eq!(seams.vertex(0, 0).unwrap().elevation, Some(1.0));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = SeamResolver::new(8, true);
        let tile = TileCoordinate::new(2, 1, 1);
        let own_map = constant(0.1);
        let other = constant(0.7);
        let mut neighbours = [None; 8];
        for direction in Direction::ALL {
            if let Some(cell) = tile.neighbour(direction, crate::coordinate::RootGrid::new(1, 1)) {
                neighbours[direction.index()] = neighbour(tile, cell, Some(&other));
            }
        }

        let first = resolver.resolve(tile, Some(&own_map), &neighbours);
        let second = resolver.resolve(tile, Some(&own_map), &neighbours);
        assert_eq!(first, second);
        assert_eq!(first.vertices.len(), 32);
    }

    #[test]
    fn test_disabled_keeps_descriptors_only() {
        let resolver = SeamResolver::new(4, false);
        let tile = TileCoordinate::new(1, 0, 0);
        let mut neighbours = [None; 8];
        neighbours[Direction::East.index()] = neighbour(tile, TileCoordinate::new(1, 1, 0), None);

        let seams = resolver.resolve(tile, None, &neighbours);
        assert!(seams.vertices.is_empty());
        assert_eq!(
            seams.neighbour(Direction::East).map(|n| n.coordinate),
            Some(TileCoordinate::new(1, 1, 0))
        );
        assert!(seams.neighbour(Direction::West).is_none());
    }
}
