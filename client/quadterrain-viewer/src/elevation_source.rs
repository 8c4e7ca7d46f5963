//! Procedural elevation delivered one frame after it is requested.
//!
//! Every displayed tile without data of its own gets a coarse preview first
//! and a finer, packed final heightmap on the frame after that.

use std::collections::HashSet;
use std::f64::consts::TAU;

use glam::DVec2;
use quadterrain::{
    ElevationData, Encoding, Error, Extent, FrameReport, Heightmap, Pitch, Terrain, TileCoordinate,
};

use crate::settings::ElevationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Preview,
    Final,
}

/// Counts for one call to [`ElevationSource::deliver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Delivery {
    pub previews: usize,
    pub finals: usize,
    pub dropped: usize,
}

/// Simulated elevation provider.
pub struct ElevationSource {
    settings: ElevationSettings,
    queue: Vec<(TileCoordinate, Stage)>,
    in_flight: HashSet<TileCoordinate>,
}

impl ElevationSource {
    pub fn new(settings: ElevationSettings) -> Self {
        Self {
            settings,
            queue: Vec::new(),
            in_flight: HashSet::new(),
        }
    }

    /// Requests not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Elevation at a terrain-local position.
    pub fn height(&self, point: DVec2) -> f64 {
        let k = TAU / self.settings.wavelength;
        let hills = (point.x * k).sin() * (point.y * k).cos();
        let ridges = (point.x * k * 2.3 + 1.0).sin() * (point.y * k * 1.7).sin();
        self.settings.amplitude * (0.5 + 0.35 * hills + 0.15 * ridges)
    }

    /// Queue displayed tiles that still lack data of their own.
    pub fn request(&mut self, terrain: &Terrain, report: &FrameReport) {
        for &coordinate in &report.displayed {
            let Some(tile) = terrain.tile(coordinate) else {
                continue;
            };
            if tile.elevation_state().is_own() || !self.in_flight.insert(coordinate) {
                continue;
            }
            self.queue.push((coordinate, Stage::Preview));
        }
    }

    /// Hand everything requested so far to the terrain.
    pub fn deliver(&mut self, terrain: &mut Terrain) -> anyhow::Result<Delivery> {
        let mut delivery = Delivery::default();
        let mut next = Vec::new();

        for (coordinate, stage) in std::mem::take(&mut self.queue) {
            let Some(extent) = terrain.tile(coordinate).map(|tile| tile.extent()) else {
                self.in_flight.remove(&coordinate);
                delivery.dropped += 1;
                continue;
            };
            let data = match stage {
                Stage::Preview => ElevationData::new(
                    self.heightmap(extent, self.settings.preview_size, Encoding::ValueAlpha)?,
                    false,
                ),
                Stage::Final => {
                    let encoding = Encoding::Packed {
                        precision: self.settings.precision,
                        offset: self.settings.amplitude,
                    };
                    ElevationData::new(self.heightmap(extent, self.settings.final_size, encoding)?, true)
                }
            };

            match terrain.set_elevation(coordinate, data) {
                Ok(()) => {}
                Err(Error::UnknownTile(_)) => {
                    self.in_flight.remove(&coordinate);
                    delivery.dropped += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            match stage {
                Stage::Preview => {
                    delivery.previews += 1;
                    next.push((coordinate, Stage::Final));
                }
                Stage::Final => {
                    delivery.finals += 1;
                    self.in_flight.remove(&coordinate);
                }
            }
        }

        self.queue = next;
        Ok(delivery)
    }

    /// Sample the height field at pixel centers, north row first.
    fn heightmap(&self, extent: Extent, size: u32, encoding: Encoding) -> anyhow::Result<Heightmap> {
        let pixels = f64::from(size);
        let elevations: Vec<Option<f64>> = (0..size)
            .flat_map(|row| (0..size).map(move |column| (column, row)))
            .map(|(column, row)| {
                let uv = DVec2::new(
                    (f64::from(column) + 0.5) / pixels,
                    1.0 - (f64::from(row) + 0.5) / pixels,
                );
                Some(self.height(extent.min + uv * extent.size()))
            })
            .collect();
        Ok(Heightmap::from_elevations(
            size,
            size,
            &elevations,
            encoding,
            Pitch::IDENTITY,
        )?)
    }
}
