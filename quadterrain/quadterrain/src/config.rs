//! Terrain configuration.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::coordinate::{MAX_ROOT_TILES, MAX_TILE_LEVEL, RootGrid};
use crate::error::{Error, Result};
use crate::extent::Extent;

/// Largest accepted [`TerrainConfig::segments_per_tile`].
pub const MAX_SEGMENTS_PER_TILE: u32 = 1024;

/// Options controlling tile layout, subdivision and stitching.
///
/// Every field has a default, so partial configuration files deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Planar rectangle covered by the terrain.
    pub extent: Extent,
    /// Translation from terrain-local to world coordinates.
    pub origin: DVec3,
    /// Root tiles along x.
    pub root_columns: u32,
    /// Root tiles along y.
    pub root_rows: u32,
    /// Screen-space error, in pixels, above which a tile subdivides.
    pub subdivision_threshold: f64,
    /// Deepest level tiles may reach. Defaults to [`MAX_TILE_LEVEL`].
    pub max_subdivision_level: Option<u32>,
    /// Whether border vertices are snapped and averaged across seams.
    pub enable_stitching: bool,
    /// Whether decoded heightmaps are kept for picking and stitching.
    ///
    /// When disabled, heightmaps only contribute their min/max to bounding
    /// volumes.
    pub enable_cpu_heightmap: bool,
    /// Grid segments along each tile edge. Must be a power of two no larger
    /// than [`MAX_SEGMENTS_PER_TILE`].
    pub segments_per_tile: u32,
    /// Whether an elevation source is attached. Without one, tiles are flat
    /// at [`TerrainConfig::flat_elevation`].
    pub elevation_enabled: bool,
    /// Elevation of flat tiles.
    pub flat_elevation: f64,
    /// How many ancestors may supply elevation data that lets a tile
    /// subdivide.
    pub subdivision_ancestor_depth: u32,
    /// Subtracted from the screen-space error of every tile.
    pub half_pixel_size: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            extent: Extent::new(DVec2::ZERO, DVec2::splat(10_000.0)),
            origin: DVec3::ZERO,
            root_columns: 1,
            root_rows: 1,
            subdivision_threshold: 1.5,
            max_subdivision_level: None,
            enable_stitching: true,
            enable_cpu_heightmap: true,
            segments_per_tile: 32,
            elevation_enabled: true,
            flat_elevation: 0.0,
            subdivision_ancestor_depth: 3,
            half_pixel_size: 0.0,
        }
    }
}

impl TerrainConfig {
    /// Check that the options describe a usable terrain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first rejected option.
    pub fn validate(&self) -> Result<()> {
        if !self.extent.is_valid() {
            return Err(Error::invalid_config(
                "extent",
                "corners must be finite with min < max",
            ));
        }
        if !self.origin.is_finite() {
            return Err(Error::invalid_config("origin", "must be finite"));
        }
        for (field, value) in [
            ("root_columns", self.root_columns),
            ("root_rows", self.root_rows),
        ] {
            if value == 0 || value > MAX_ROOT_TILES {
                return Err(Error::invalid_config(
                    field,
                    format!("must be between 1 and {MAX_ROOT_TILES}, got {value}"),
                ));
            }
        }
        if !(self.subdivision_threshold.is_finite() && self.subdivision_threshold >= 0.0) {
            return Err(Error::invalid_config(
                "subdivision_threshold",
                format!("must be finite and non-negative, got {}", self.subdivision_threshold),
            ));
        }
        if let Some(level) = self.max_subdivision_level {
            if level > MAX_TILE_LEVEL {
                return Err(Error::invalid_config(
                    "max_subdivision_level",
                    format!("must be at most {MAX_TILE_LEVEL}, got {level}"),
                ));
            }
        }
        if !self.segments_per_tile.is_power_of_two() {
            return Err(Error::invalid_config(
                "segments_per_tile",
                format!("must be a power of two, got {}", self.segments_per_tile),
            ));
        }
        if self.segments_per_tile > MAX_SEGMENTS_PER_TILE {
            return Err(Error::invalid_config(
                "segments_per_tile",
                format!(
                    "must be at most {MAX_SEGMENTS_PER_TILE}, got {}",
                    self.segments_per_tile
                ),
            ));
        }
        if !self.flat_elevation.is_finite() {
            return Err(Error::invalid_config("flat_elevation", "must be finite"));
        }
        if !(self.half_pixel_size.is_finite() && self.half_pixel_size >= 0.0) {
            return Err(Error::invalid_config(
                "half_pixel_size",
                format!("must be finite and non-negative, got {}", self.half_pixel_size),
            ));
        }
        Ok(())
    }

    /// The level-0 tile grid.
    #[must_use]
    pub fn root_grid(&self) -> RootGrid {
        RootGrid::new(self.root_columns, self.root_rows)
    }

    /// The deepest level tiles may reach.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.max_subdivision_level
            .unwrap_or(MAX_TILE_LEVEL)
            .min(MAX_TILE_LEVEL)
    }
}
