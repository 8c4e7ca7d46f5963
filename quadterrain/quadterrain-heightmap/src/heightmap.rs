//! CPU-side heightmap buffers.

use glam::DVec2;

use crate::encoding::{self, Encoding, PACKED_STRIDE, VALUE_ALPHA_STRIDE};
use crate::error::{HeightmapError, HeightmapResult};
use crate::pitch::{Pitch, UvRect};

/// Raw pixel storage of a heightmap, one variant per [`Encoding`].
#[derive(Debug, Clone, PartialEq)]
pub enum HeightmapData {
    /// RGBA8 pixels with a quantized 24-bit elevation.
    Packed {
        /// Interleaved RGBA bytes.
        pixels: Vec<u8>,
        /// Quantization step.
        precision: f64,
        /// Offset added before quantization.
        offset: f64,
    },
    /// Interleaved elevation/validity floats.
    ValueAlpha {
        /// Interleaved channel values.
        pixels: Vec<f32>,
    },
}

impl HeightmapData {
    /// The encoding of this buffer.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        match *self {
            Self::Packed {
                precision, offset, ..
            } => Encoding::Packed { precision, offset },
            Self::ValueAlpha { .. } => Encoding::ValueAlpha,
        }
    }

    /// Number of channels stored.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        match self {
            Self::Packed { pixels, .. } => pixels.len(),
            Self::ValueAlpha { pixels } => pixels.len(),
        }
    }

    /// Decode the elevation of the pixel at `index`.
    ///
    /// Returns `None` for "no data" pixels (unless `ignore_no_data` is set)
    /// and for indices outside the buffer.
    #[must_use]
    pub fn decode(&self, index: usize, ignore_no_data: bool) -> Option<f64> {
        match self {
            Self::Packed {
                pixels,
                precision,
                offset,
            } => {
                let start = index.checked_mul(PACKED_STRIDE)?;
                let pixel: [u8; 4] = pixels.get(start..start + PACKED_STRIDE)?.try_into().ok()?;
                encoding::decode_packed(pixel, *precision, *offset, ignore_no_data)
            }
            Self::ValueAlpha { pixels } => {
                let start = index.checked_mul(VALUE_ALPHA_STRIDE)?;
                let pixel: [f32; 2] = pixels
                    .get(start..start + VALUE_ALPHA_STRIDE)?
                    .try_into()
                    .ok()?;
                encoding::decode_value_alpha(pixel, ignore_no_data)
            }
        }
    }
}

/// Lowest and highest elevation of a set of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    /// Lowest elevation.
    pub min: f64,
    /// Highest elevation.
    pub max: f64,
}

impl MinMax {
    /// A degenerate range holding one value.
    #[must_use]
    pub fn splat(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Grow the range to include `value`.
    #[must_use]
    pub fn include(self, value: f64) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    /// Whether `other` lies entirely within this range.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.min <= other.min && other.max <= self.max
    }
}

/// A per-tile elevation buffer.
///
/// Pixels are stored row by row, north first: row 0 covers `v = 1` and the
/// last row covers `v = 0`. The [`Pitch`] locates the owning tile's surface
/// inside the buffer, so a child tile can reuse its parent's pixels by
/// carrying a narrower pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    data: HeightmapData,
    width: u32,
    height: u32,
    pitch: Pitch,
}

impl Heightmap {
    /// Wrap an encoded buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero, the buffer does not hold
    /// exactly `width * height` pixels, or the quantization is invalid.
    pub fn new(data: HeightmapData, width: u32, height: u32, pitch: Pitch) -> HeightmapResult<Self> {
        if width == 0 || height == 0 {
            return Err(HeightmapError::EmptyDimensions { width, height });
        }

        let encoding = data.encoding();
        encoding.validate()?;

        let expected = width as usize * height as usize * encoding.stride();
        let actual = data.channel_count();
        if expected != actual {
            return Err(HeightmapError::BufferSizeMismatch { expected, actual });
        }

        Ok(Self {
            data,
            width,
            height,
            pitch,
        })
    }

    /// Encode a grid of elevations, north row first.
    ///
    /// `None` samples are stored as "no data".
    ///
    /// # Errors
    ///
    /// Returns an error if the sample count does not match the dimensions or a
    /// value cannot be encoded.
    pub fn from_elevations(
        width: u32,
        height: u32,
        elevations: &[Option<f64>],
        encoding: Encoding,
        pitch: Pitch,
    ) -> HeightmapResult<Self> {
        let expected = width as usize * height as usize;
        if elevations.len() != expected {
            return Err(HeightmapError::BufferSizeMismatch {
                expected: expected * encoding.stride(),
                actual: elevations.len() * encoding.stride(),
            });
        }

        let data = match encoding {
            Encoding::Packed { precision, offset } => {
                let mut pixels = Vec::with_capacity(expected * PACKED_STRIDE);
                for &value in elevations {
                    pixels.extend(encoding::encode_packed_pixel(value, precision, offset)?);
                }
                HeightmapData::Packed {
                    pixels,
                    precision,
                    offset,
                }
            }
            Encoding::ValueAlpha => {
                // Elevations are stored as f32 on the GPU side as well.
                #[allow(clippy::cast_possible_truncation)]
                let pixels = elevations
                    .iter()
                    .flat_map(|value| match value {
                        Some(value) => [*value as f32, 1.0],
                        None => [0.0, 0.0],
                    })
                    .collect();
                HeightmapData::ValueAlpha { pixels }
            }
        };

        Self::new(data, width, height, pitch)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of channels per pixel.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.data.encoding().stride()
    }

    /// The transform from tile surface coordinates to buffer coordinates.
    #[must_use]
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// The encoded pixel storage.
    #[must_use]
    pub fn data(&self) -> &HeightmapData {
        &self.data
    }

    /// Decode the pixel at a flat index (`row * width + column`).
    #[must_use]
    pub fn decode(&self, index: usize, ignore_no_data: bool) -> Option<f64> {
        self.data.decode(index, ignore_no_data)
    }

    /// Sample the elevation at a tile surface coordinate.
    ///
    /// The coordinate goes through the pitch and picks the nearest pixel; no
    /// interpolation happens. Coordinates outside the buffer clamp to its
    /// border.
    #[must_use]
    pub fn sample(&self, uv: DVec2, ignore_no_data: bool) -> Option<f64> {
        if !uv.is_finite() {
            return None;
        }

        let buffer_uv = self.pitch.apply(uv);
        let column = nearest_pixel(buffer_uv.x, self.width);
        let row = nearest_pixel(1.0 - buffer_uv.y, self.height);

        self.decode(self.index(column, row), ignore_no_data)
    }

    /// Lowest and highest valid elevation over a rectangle of the tile surface.
    ///
    /// Every pixel whose footprint overlaps the rectangle is considered, with
    /// at least one pixel per axis. Returns `None` if all of them are "no
    /// data".
    #[must_use]
    pub fn region_min_max(&self, rect: UvRect) -> Option<MinMax> {
        if !(rect.min.is_finite() && rect.max.is_finite()) {
            return None;
        }

        let buffer_rect = self.pitch.apply_rect(rect);
        let (column_start, column_end) = pixel_span(buffer_rect.min.x, buffer_rect.max.x, self.width);
        let (row_start, row_end) =
            pixel_span(1.0 - buffer_rect.max.y, 1.0 - buffer_rect.min.y, self.height);

        let mut result: Option<MinMax> = None;
        for row in row_start..=row_end {
            for column in column_start..=column_end {
                if let Some(value) = self.decode(self.index(column, row), false) {
                    result = Some(match result {
                        Some(range) => range.include(value),
                        None => MinMax::splat(value),
                    });
                }
            }
        }
        result
    }

    /// Lowest and highest valid elevation over the whole tile surface.
    #[must_use]
    pub fn min_max(&self) -> Option<MinMax> {
        self.region_min_max(UvRect::FULL)
    }

    /// Clone this heightmap for a tile whose surface maps into this one's
    /// through `child`.
    ///
    /// The pixels are copied rather than shared, so later changes to this
    /// heightmap never leak into the inheriting tile.
    #[must_use]
    pub fn inherit(&self, child: Pitch) -> Self {
        Self {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
            pitch: child.then(self.pitch),
        }
    }

    /// Ground distance covered by one pixel, for a tile of the given width.
    ///
    /// Inherited heightmaps cover their tile with fewer pixels and report a
    /// coarser resolution.
    #[must_use]
    pub fn resolution(&self, tile_width: f64) -> f64 {
        let pixels_across = f64::from(self.width) * self.pitch.scale.x.abs();
        if pixels_across > 0.0 {
            tile_width / pixels_across
        } else {
            f64::INFINITY
        }
    }

    fn index(&self, column: u32, row: u32) -> usize {
        row as usize * self.width as usize + column as usize
    }
}

/// Nearest pixel index for a normalized coordinate, clamped to the buffer.
fn nearest_pixel(t: f64, size: u32) -> u32 {
    let max = f64::from(size - 1);
    let index = (t * f64::from(size) - 0.5).round().clamp(0.0, max);
    // Clamped to [0, size - 1] above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = index as u32;
    index
}

/// Inclusive pixel range whose footprints overlap `[start, end]`.
fn pixel_span(start: f64, end: f64, size: u32) -> (u32, u32) {
    let max = f64::from(size - 1);
    let first = (start * f64::from(size)).floor().clamp(0.0, max);
    let last = ((end * f64::from(size)).ceil() - 1.0).clamp(first, max);
    // Both clamped to [0, size - 1] above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let span = (first as u32, last as u32);
    span
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed() -> Encoding {
        Encoding::Packed {
            precision: 0.1,
            offset: 20000.0,
        }
    }

    /// 4x4 heightmap where the value encodes its position: `10 * row + column`.
    fn grid(encoding: Encoding) -> Heightmap {
        let elevations: Vec<Option<f64>> = (0..16)
            .map(|i| Some(f64::from(10 * (i / 4) + i % 4)))
            .collect();
        Heightmap::from_elevations(4, 4, &elevations, encoding, Pitch::IDENTITY).unwrap()
    }

    #[test]
    fn test_new_rejects_size_mismatch() {
        let data = HeightmapData::ValueAlpha {
            pixels: vec![0.0; 6],
        };
        assert!(matches!(
            Heightmap::new(data, 2, 2, Pitch::IDENTITY),
            Err(HeightmapError::BufferSizeMismatch {
                expected: 8,
                actual: 6
            })
        ));
    }

    #[test]
    fn test_new_rejects_empty() {
        let data = HeightmapData::ValueAlpha { pixels: vec![] };
        assert!(matches!(
            Heightmap::new(data, 0, 4, Pitch::IDENTITY),
            Err(HeightmapError::EmptyDimensions { .. })
        ));
    }

    #[test]
    fn test_sample_corners() {
        for encoding in [packed(), Encoding::ValueAlpha] {
            let heightmap = grid(encoding);

            // Row 0 is north (v = 1).
            let north_west = heightmap.sample(DVec2::new(0.0, 1.0), false).unwrap();
            let south_east = heightmap.sample(DVec2::new(1.0, 0.0), false).unwrap();
            assert!((north_west - 0.0).abs() < 0.1);
            assert!((south_east - 33.0).abs() < 0.1);
        }
    }

    #[test]
    fn test_sample_nearest_pixel() {
        let heightmap = grid(Encoding::ValueAlpha);

        // u = 0.3 falls in column 1 (footprint [0.25, 0.5]).
        // v = 0.6 falls in row 1 (footprint v in [0.5, 0.75]).
        let value = heightmap.sample(DVec2::new(0.3, 0.6), false).unwrap();
        assert!((value - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_clamps_outside() {
        let heightmap = grid(Encoding::ValueAlpha);
        let value = heightmap.sample(DVec2::new(-3.0, 7.0), false).unwrap();
        assert!((value - 0.0).abs() < 1e-6);
        assert_eq!(heightmap.sample(DVec2::new(f64::NAN, 0.5), false), None);
    }

    #[test]
    fn test_sample_no_data() {
        let heightmap = Heightmap::from_elevations(
            2,
            1,
            &[None, Some(5.0)],
            packed(),
            Pitch::IDENTITY,
        )
        .unwrap();

        assert_eq!(heightmap.sample(DVec2::new(0.0, 0.5), false), None);
        assert!(heightmap.sample(DVec2::new(0.0, 0.5), true).is_some());
        assert!((heightmap.sample(DVec2::new(1.0, 0.5), false).unwrap() - 5.0).abs() < 0.1);
    }

    #[test]
    fn test_region_min_max() {
        let heightmap = grid(Encoding::ValueAlpha);

        let full = heightmap.min_max().unwrap();
        assert!((full.min - 0.0).abs() < 1e-6);
        assert!((full.max - 33.0).abs() < 1e-6);

        // South-west quadrant: rows 2-3, columns 0-1.
        let south_west = heightmap
            .region_min_max(UvRect::from_corners(DVec2::ZERO, DVec2::splat(0.5)))
            .unwrap();
        assert!((south_west.min - 20.0).abs() < 1e-6);
        assert!((south_west.max - 31.0).abs() < 1e-6);
    }

    #[test]
    fn test_region_min_max_all_no_data() {
        let heightmap =
            Heightmap::from_elevations(2, 2, &[None; 4], Encoding::ValueAlpha, Pitch::IDENTITY)
                .unwrap();
        assert_eq!(heightmap.min_max(), None);
    }

    #[test]
    fn test_region_min_max_skips_no_data() {
        let heightmap = Heightmap::from_elevations(
            2,
            2,
            &[Some(100.0), None, Some(-5.0), Some(7.0)],
            Encoding::ValueAlpha,
            Pitch::IDENTITY,
        )
        .unwrap();
        let range = heightmap.min_max().unwrap();
        assert!((range.min + 5.0).abs() < 1e-6);
        assert!((range.max - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_inherit_maps_child_quadrant() {
        let parent = grid(Encoding::ValueAlpha);

        // North-east child: offset (0.5, 0.5), half scale.
        let child = parent.inherit(Pitch::new(DVec2::splat(0.5), DVec2::splat(0.5)));
        let range = child.min_max().unwrap();
        assert!((range.min - 2.0).abs() < 1e-6);
        assert!((range.max - 13.0).abs() < 1e-6);
        assert!(parent.min_max().unwrap().contains(range));

        // The child's own north-east corner is the parent's.
        let corner = child.sample(DVec2::ONE, false).unwrap();
        assert!((corner - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolution() {
        let parent = grid(Encoding::ValueAlpha);
        assert!((parent.resolution(100.0) - 25.0).abs() < 1e-9);

        let child = parent.inherit(Pitch::new(DVec2::ZERO, DVec2::splat(0.5)));
        assert!((child.resolution(50.0) - 25.0).abs() < 1e-9);
    }
}
