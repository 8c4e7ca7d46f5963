//! The terrain: a forest of tile quadtrees driven one frame at a time.
//!
//! Each call to [`Terrain::update`] runs these steps:
//!
//! 1. Drop stale index entries.
//! 2. Apply the subdivisions and merges decided during the previous frame.
//! 3. Traverse the trees top-down, culling, displaying and deciding which
//!    tiles to subdivide or merge. The traversal is read-only; decisions are
//!    collected and applied at the start of the next frame.
//! 4. Recompute seams of tiles whose surroundings changed.

use std::collections::BTreeMap;

use glam::DVec2;
use quadterrain_heightmap::Heightmap;

use crate::arena::{SideTable, TileArena, TileId};
use crate::config::TerrainConfig;
use crate::coordinate::{Quadrant, RootGrid, TileCoordinate};
use crate::elevation::{ElevationData, ElevationSample};
use crate::error::{Error, Result};
use crate::index::TileIndex;
use crate::stitching::{Neighbour, NeighbourDescriptor, SeamResolver, Seams};
use crate::subdivision::{Decision, ScreenSpaceError, SubdivisionController};
use crate::tile::{ElevationState, TileNode};
use crate::view::{Frustum, View};
use crate::volume::{Aabb, VolumeTracker};

/// What happened during one call to [`Terrain::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Tiles displayed this frame, in traversal order.
    pub displayed: Vec<TileCoordinate>,
    /// Tiles subdivided at the start of this frame.
    pub subdivided: usize,
    /// Tiles merged at the start of this frame.
    pub merged: usize,
    /// Tiles whose seams were recomputed.
    pub restitched: usize,
    /// Structural changes decided this frame, applied on the next one.
    pub pending: usize,
    /// Stale index entries dropped.
    pub purged: usize,
}

impl FrameReport {
    /// Whether the frame changed nothing and decided nothing.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.subdivided == 0 && self.merged == 0 && self.pending == 0
    }
}

/// Stitching state attached to a tile.
#[derive(Debug, Default)]
struct TileLinks {
    /// Last computed seams; `None` until stitched or while subdivided.
    seams: Option<Seams>,
    /// Tiles that looked this tile up as a neighbour.
    dependents: Vec<TileId>,
}

/// Output of the read-only traversal.
struct Traversal {
    displayed: Vec<TileId>,
    decisions: Vec<(TileId, Decision)>,
}

/// A tiled terrain with level-of-detail selection and seam stitching.
#[derive(Debug)]
pub struct Terrain {
    config: TerrainConfig,
    grid: RootGrid,
    tiles: TileArena,
    index: TileIndex,
    links: SideTable<TileLinks>,
    roots: Vec<TileId>,
    volumes: VolumeTracker,
    controller: SubdivisionController,
    resolver: SeamResolver,
    pending: Vec<(TileId, Decision)>,
    dirty: BTreeMap<TileCoordinate, TileId>,
    frame: u64,
}

impl Terrain {
    /// Create a terrain with one collapsed tile per root grid cell.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is rejected.
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;

        let grid = config.root_grid();
        let mut terrain = Self {
            grid,
            tiles: TileArena::new(),
            index: TileIndex::new(),
            links: SideTable::default(),
            roots: Vec::new(),
            volumes: VolumeTracker::new(&config),
            controller: SubdivisionController::new(&config),
            resolver: SeamResolver::new(config.segments_per_tile, config.enable_stitching),
            pending: Vec::new(),
            dirty: BTreeMap::new(),
            frame: 0,
            config,
        };

        for coordinate in grid.roots() {
            let extent = terrain.config.extent.tile(coordinate, grid);
            let volume = terrain.volumes.initial_volume(extent, None);
            let id = terrain.tiles.insert(TileNode::new(coordinate, extent, volume));
            terrain.index.insert(coordinate, id);
            terrain.roots.push(id);
            terrain.mark_dirty(id);
        }

        tracing::info!(
            columns = grid.columns,
            rows = grid.rows,
            segments = terrain.config.segments_per_tile,
            "created terrain"
        );
        Ok(terrain)
    }

    /// The configuration the terrain was created with.
    #[must_use]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Every live tile.
    #[must_use]
    pub fn tiles(&self) -> &TileArena {
        &self.tiles
    }

    /// The coordinate index.
    #[must_use]
    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    /// The volume tracker.
    #[must_use]
    pub fn volumes(&self) -> &VolumeTracker {
        &self.volumes
    }

    /// Number of frames run so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Structural changes waiting for the next frame.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.pending.len()
    }

    /// The live tile at `coordinate`.
    #[must_use]
    pub fn tile(&self, coordinate: TileCoordinate) -> Option<&TileNode> {
        self.index
            .lookup(coordinate, &self.tiles)
            .and_then(|id| self.tiles.get(id))
    }

    /// Coordinates of every collapsed tile, in coordinate order.
    #[must_use]
    pub fn leaves(&self) -> Vec<TileCoordinate> {
        let mut leaves: Vec<_> = self
            .tiles
            .iter()
            .filter(|(_, node)| node.children.is_none())
            .map(|(_, node)| node.coordinate)
            .collect();
        leaves.sort_unstable();
        leaves
    }

    /// World-space bounding volume of a tile.
    #[must_use]
    pub fn world_bounding_volume(&self, coordinate: TileCoordinate) -> Option<Aabb> {
        self.tile(coordinate)
            .map(|node| self.volumes.world_bounding_volume(node))
    }

    /// The last computed seams of a collapsed tile.
    #[must_use]
    pub fn seams(&self, coordinate: TileCoordinate) -> Option<&Seams> {
        let id = self.index.lookup(coordinate, &self.tiles)?;
        self.links.get(id)?.seams.as_ref()
    }

    /// The neighbour descriptors of a collapsed tile, indexed by
    /// [`crate::Direction::index`].
    #[must_use]
    pub fn neighbours(&self, coordinate: TileCoordinate) -> Option<[Option<NeighbourDescriptor>; 8]> {
        self.seams(coordinate).map(|seams| seams.neighbours)
    }

    /// Run one frame.
    pub fn update(&mut self, view: &View) -> FrameReport {
        self.frame += 1;
        let purged = self.index.purge_stale(&self.tiles);
        let (subdivided, merged) = self.apply_pending();

        let traversal = self.traverse(view);
        for node in self.tiles.iter_mut() {
            node.visible = false;
        }
        let mut displayed = Vec::with_capacity(traversal.displayed.len());
        for id in traversal.displayed {
            if let Some(node) = self.tiles.get_mut(id) {
                node.visible = true;
                displayed.push(node.coordinate);
            }
        }
        self.pending = traversal.decisions;

        let restitched = self.restitch();

        let report = FrameReport {
            frame: self.frame,
            displayed,
            subdivided,
            merged,
            restitched,
            pending: self.pending.len(),
            purged,
        };
        tracing::debug!(
            frame = report.frame,
            tiles = self.tiles.len(),
            displayed = report.displayed.len(),
            subdivided,
            merged,
            restitched,
            pending = report.pending,
            "terrain frame"
        );
        report
    }

    /// Deliver elevation data for a tile.
    ///
    /// Final data always replaces what the tile had; a preview never replaces
    /// final data. Descendants that are still borrowing elevation from this
    /// tile inherit the new data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTile`] if no live tile exists at `coordinate`.
    pub fn set_elevation(&mut self, coordinate: TileCoordinate, data: ElevationData) -> Result<()> {
        let Some(id) = self.index.lookup(coordinate, &self.tiles) else {
            tracing::debug!(tile = %coordinate, "elevation for unknown tile");
            return Err(Error::UnknownTile(coordinate));
        };
        let state = if data.is_final {
            ElevationState::Final
        } else {
            ElevationState::Preview
        };

        let keep_heightmap = self.config.enable_cpu_heightmap;
        let heightmap = data.heightmap;
        let range = heightmap.min_max();

        let Some(node) = self.tiles.get_mut(id) else {
            return Err(Error::UnknownTile(coordinate));
        };
        if node.elevation == ElevationState::Final && state == ElevationState::Preview {
            tracing::debug!(tile = %coordinate, "ignoring preview for tile with final elevation");
            return Ok(());
        }

        if let Some(range) = range {
            self.volumes.update_from_min_max(node, range.min, range.max);
        }
        node.elevation = state;
        node.heightmap = keep_heightmap.then(|| heightmap.clone());
        let children = node.children;

        self.mark_dirty(id);
        self.invalidate_dependents(id);
        if let Some(children) = children {
            self.propagate_inherited(children, &heightmap);
        }

        tracing::debug!(
            tile = %coordinate,
            state = ?state,
            min = range.map(|range| range.min),
            max = range.map(|range| range.max),
            "elevation updated"
        );
        Ok(())
    }

    /// Pick the elevation at a world-space planar position.
    ///
    /// Among the tiles covering the position, the one with the finest
    /// heightmap resolution wins; on a tie the shallower tile is kept.
    #[must_use]
    pub fn sample(&self, point: DVec2) -> Option<ElevationSample> {
        let local = point - self.config.origin.truncate();
        let covering = |id: &TileId| {
            self.tiles
                .get(*id)
                .is_some_and(|node| node.extent.contains(local))
        };

        let mut best: Option<ElevationSample> = None;
        let mut current = self.roots.iter().copied().find(covering);
        while let Some(node) = current.and_then(|id| self.tiles.get(id)) {
            if let Some(heightmap) = &node.heightmap {
                let uv = node.extent.uv_of(local);
                if let Some(elevation) = heightmap.sample(uv, false) {
                    let resolution = heightmap.resolution(node.extent.width());
                    if best.is_none_or(|best| resolution < best.resolution) {
                        best = Some(ElevationSample {
                            elevation: elevation + self.config.origin.z,
                            resolution,
                            coordinate: node.coordinate,
                        });
                    }
                }
            }
            current = node
                .children
                .and_then(|children| children.into_iter().find(covering));
        }
        best
    }

    /// Subdivide a collapsed tile immediately, bypassing the error metric.
    ///
    /// Returns whether anything changed; tiles at the deepest level are left
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTile`] if no live tile exists at `coordinate`.
    pub fn subdivide(&mut self, coordinate: TileCoordinate) -> Result<bool> {
        let id = self
            .index
            .lookup(coordinate, &self.tiles)
            .ok_or(Error::UnknownTile(coordinate))?;
        Ok(self.subdivide_tile(id))
    }

    /// Merge a subdivided tile immediately, disposing of its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTile`] if no live tile exists at `coordinate`.
    pub fn merge(&mut self, coordinate: TileCoordinate) -> Result<bool> {
        let id = self
            .index
            .lookup(coordinate, &self.tiles)
            .ok_or(Error::UnknownTile(coordinate))?;
        Ok(self.merge_tile(id))
    }

    /// Recompute the seams of every tile whose surroundings changed since
    /// they were last stitched. Returns how many tiles were stitched.
    ///
    /// Tiles are processed in coordinate order.
    pub fn restitch(&mut self) -> usize {
        let dirty = std::mem::take(&mut self.dirty);
        let mut restitched = 0;

        for (coordinate, id) in dirty {
            let Some(node) = self.tiles.get(id) else {
                continue;
            };
            if node.children.is_some() {
                self.links.entry(id).seams = None;
                continue;
            }

            let found = self
                .index
                .neighbours(coordinate, self.grid, &self.tiles, |_| true);
            let neighbours = found.map(|found| {
                let neighbour = self.tiles.get(found?)?;
                // A subdivided same-level neighbour is stitched from its
                // children's side.
                if neighbour.children.is_some() {
                    return None;
                }
                Some(Neighbour {
                    descriptor: NeighbourDescriptor::new(coordinate, neighbour.coordinate),
                    heightmap: neighbour.heightmap.as_ref(),
                })
            });
            let seams = self
                .resolver
                .resolve(coordinate, node.heightmap.as_ref(), &neighbours);

            for neighbour in found.into_iter().flatten() {
                let dependents = &mut self.links.entry(neighbour).dependents;
                if !dependents.contains(&id) {
                    dependents.retain(|dependent| self.tiles.contains(*dependent));
                    dependents.push(id);
                }
            }
            self.links.entry(id).seams = Some(seams);

            tracing::trace!(tile = %coordinate, "restitched tile");
            restitched += 1;
        }
        restitched
    }

    fn traverse(&self, view: &View) -> Traversal {
        let metric = ScreenSpaceError::new(view, self.config.half_pixel_size);
        let frustum = view.frustum();
        let mut displayed = Vec::new();
        let mut decisions = Vec::new();

        // Depth-first, parents before children, children in quadrant order.
        let mut stack: Vec<TileId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.tiles.get(id) else {
                continue;
            };
            let world = self.volumes.world_bounding_volume(node);

            if !frustum.as_ref().is_none_or(|frustum| frustum.intersects_aabb(&world)) {
                if node.children.is_some() {
                    decisions.push((id, Decision::Merge));
                }
                continue;
            }

            let error = metric.compute(
                node.geometric_error(self.config.segments_per_tile),
                world.center(),
            );
            let decision = self.controller.decide(&self.tiles, id, error);
            if decision != Decision::Keep {
                decisions.push((id, decision));
            }

            match (node.children, decision) {
                (Some(children), Decision::Keep) => stack.extend(children.iter().rev()),
                // Merging takes effect next frame; keep showing the current
                // leaves until then.
                (Some(_), _) => self.visible_leaves(id, frustum.as_ref(), &mut displayed),
                (None, _) => displayed.push(id),
            }
        }

        Traversal {
            displayed,
            decisions,
        }
    }

    fn visible_leaves(&self, id: TileId, frustum: Option<&Frustum>, out: &mut Vec<TileId>) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.tiles.get(id) else {
                continue;
            };
            let world = self.volumes.world_bounding_volume(node);
            if !frustum.is_none_or(|frustum| frustum.intersects_aabb(&world)) {
                continue;
            }
            match node.children {
                Some(children) => stack.extend(children.iter().rev()),
                None => out.push(id),
            }
        }
    }

    fn apply_pending(&mut self) -> (usize, usize) {
        let mut subdivided = 0;
        let mut merged = 0;
        for (id, decision) in std::mem::take(&mut self.pending) {
            match decision {
                Decision::Subdivide => subdivided += usize::from(self.subdivide_tile(id)),
                Decision::Merge => merged += usize::from(self.merge_tile(id)),
                Decision::Keep => {}
            }
        }
        (subdivided, merged)
    }

    fn subdivide_tile(&mut self, id: TileId) -> bool {
        let Some(parent) = self.tiles.get(id) else {
            return false;
        };
        if parent.children.is_some() || parent.coordinate.level >= self.config.max_level() {
            return false;
        }

        let coordinate = parent.coordinate;
        let extents = parent.extent.split();
        let parent_range = self.volumes.vertical_range(parent);
        let mut inherited: [Option<Heightmap>; 4] = Quadrant::ALL.map(|quadrant| {
            parent
                .heightmap
                .as_ref()
                .map(|heightmap| heightmap.inherit(quadrant.pitch()))
        });

        let children = Quadrant::ALL.map(|quadrant| {
            let child = coordinate.child(quadrant);
            let extent = extents[quadrant.index()];
            let heightmap = inherited[quadrant.index()].take();
            let range = heightmap
                .as_ref()
                .and_then(Heightmap::min_max)
                .unwrap_or(parent_range);

            let mut node = TileNode::new(child, extent, self.volumes.initial_volume(extent, Some(range)));
            node.parent = Some(id);
            if heightmap.is_some() {
                node.elevation = ElevationState::Inherited;
                node.heightmap = heightmap;
            }

            let child_id = self.tiles.insert(node);
            self.index.insert(child, child_id);
            self.mark_dirty(child_id);
            child_id
        });

        if let Some(parent) = self.tiles.get_mut(id) {
            parent.children = Some(children);
        }
        self.links.entry(id).seams = None;
        self.invalidate_dependents(id);

        tracing::debug!(tile = %coordinate, "subdivided tile");
        true
    }

    fn merge_tile(&mut self, id: TileId) -> bool {
        let Some(node) = self.tiles.get_mut(id) else {
            return false;
        };
        let Some(children) = node.children.take() else {
            return false;
        };
        let coordinate = node.coordinate;

        // Index entries of disposed tiles are purged lazily.
        let mut disposed = 0;
        let mut stack = children.to_vec();
        while let Some(child) = stack.pop() {
            let Some(node) = self.tiles.remove(child) else {
                continue;
            };
            if let Some(grandchildren) = node.children {
                stack.extend(grandchildren);
            }
            if let Some(links) = self.links.remove(child) {
                for dependent in links.dependents {
                    self.mark_dirty(dependent);
                }
            }
            disposed += 1;
        }

        self.mark_dirty(id);
        self.invalidate_dependents(id);

        tracing::debug!(tile = %coordinate, disposed, "merged tile");
        true
    }

    /// Re-inherit `source` into every descendant without data of its own.
    fn propagate_inherited(&mut self, children: [TileId; 4], source: &Heightmap) {
        let keep_heightmap = self.config.enable_cpu_heightmap;
        let mut stack: Vec<(TileId, Heightmap)> = children
            .into_iter()
            .zip(Quadrant::ALL)
            .map(|(child, quadrant)| (child, source.inherit(quadrant.pitch())))
            .collect();

        while let Some((id, heightmap)) = stack.pop() {
            let Some(node) = self.tiles.get_mut(id) else {
                continue;
            };
            if node.elevation.is_own() {
                continue;
            }

            if let Some(range) = heightmap.min_max() {
                self.volumes.update_from_min_max(node, range.min, range.max);
            }
            if let Some(children) = node.children {
                stack.extend(
                    children
                        .into_iter()
                        .zip(Quadrant::ALL)
                        .map(|(child, quadrant)| (child, heightmap.inherit(quadrant.pitch()))),
                );
            }
            node.elevation = ElevationState::Inherited;
            node.heightmap = keep_heightmap.then_some(heightmap);

            self.mark_dirty(id);
            self.invalidate_dependents(id);
        }
    }

    fn mark_dirty(&mut self, id: TileId) {
        if let Some(node) = self.tiles.get(id) {
            self.dirty.insert(node.coordinate, id);
        }
    }

    fn invalidate_dependents(&mut self, id: TileId) {
        if self.links.get(id).is_none() {
            return;
        }
        let dependents = std::mem::take(&mut self.links.entry(id).dependents);
        for dependent in dependents {
            self.mark_dirty(dependent);
        }
    }
}
