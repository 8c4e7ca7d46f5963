//! Viewer settings loaded from a RON file.

use std::path::Path;

use anyhow::Context;
use quadterrain::TerrainConfig;
use serde::{Deserialize, Serialize};

use crate::flight::FlightPath;
use crate::launch_params::LaunchParams;

/// Everything the viewer needs besides the launch parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub terrain: TerrainConfig,
    pub flight: FlightPath,
    pub elevation: ElevationSettings,
}

/// Shape and delivery of the procedural elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationSettings {
    /// Peak height above the origin.
    pub amplitude: f64,
    /// Horizontal size of the largest hills.
    pub wavelength: f64,
    /// Pixels per heightmap edge for preview data.
    pub preview_size: u32,
    /// Pixels per heightmap edge for final data.
    pub final_size: u32,
    /// Quantization step of the packed encoding.
    pub precision: f64,
}

impl Default for ElevationSettings {
    fn default() -> Self {
        Self {
            amplitude: 400.0,
            wavelength: 2500.0,
            preview_size: 4,
            final_size: 16,
            precision: 0.01,
        }
    }
}

impl Settings {
    /// Read settings from `path`, or use the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings = ron::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, params: &LaunchParams) {
        if let Some(altitude) = params.altitude {
            self.flight.altitude = altitude;
        }
        if let Some(threshold) = params.threshold {
            self.terrain.subdivision_threshold = threshold;
        }
        if let Some(level) = params.max_level {
            self.terrain.max_subdivision_level = Some(level);
        }
        if params.no_stitching {
            self.terrain.enable_stitching = false;
        }
        if params.flat {
            self.terrain.elevation_enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file() {
        let settings: Settings = ron::from_str(
            "(terrain: (root_columns: 2, segments_per_tile: 16), flight: (altitude: 900.0))",
        )
        .unwrap();
        assert_eq!(settings.terrain.root_columns, 2);
        assert_eq!(settings.terrain.segments_per_tile, 16);
        assert_eq!(settings.terrain.root_rows, 1);
        assert_eq!(settings.flight.altitude, 900.0);
        assert_eq!(settings.elevation, ElevationSettings::default());
    }

    #[test]
    fn test_overrides() {
        let mut settings = Settings::default();
        settings.apply(&LaunchParams {
            threshold: Some(4.0),
            flat: true,
            ..Default::default()
        });
        assert_eq!(settings.terrain.subdivision_threshold, 4.0);
        assert!(!settings.terrain.elevation_enabled);
        assert!(settings.terrain.enable_stitching);
    }
}
