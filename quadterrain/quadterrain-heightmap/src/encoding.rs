//! Per-pixel elevation encodings.
//!
//! Two layouts are supported:
//!
//! - **Packed**: 4 bytes per pixel. The elevation is quantized and stored as a
//!   24-bit integer spread over the first three channels, little end first:
//!   `value = (r + g * 256 + b * 65536) * precision - offset`. The fourth
//!   channel is a validity flag where 0 means "no data".
//! - **Value/alpha**: 2 floats per pixel, the elevation followed by a validity
//!   channel where 0 means "no data".

use crate::error::{HeightmapError, HeightmapResult};

/// Number of channels per pixel in the packed layout.
pub const PACKED_STRIDE: usize = 4;

/// Number of channels per pixel in the value/alpha layout.
pub const VALUE_ALPHA_STRIDE: usize = 2;

/// Largest integer representable in the three packed channels.
pub const MAX_PACKED_VALUE: u32 = (1 << 24) - 1;

/// Describes how elevations are laid out in a heightmap buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoding {
    /// RGBA8 pixels with a quantized 24-bit elevation.
    Packed {
        /// Quantization step, in elevation units.
        precision: f64,
        /// Added to elevations before quantization so they stay non-negative.
        offset: f64,
    },
    /// Two `f32` channels: elevation and validity.
    ValueAlpha,
}

impl Encoding {
    /// Number of channels per pixel.
    #[must_use]
    pub fn stride(self) -> usize {
        match self {
            Self::Packed { .. } => PACKED_STRIDE,
            Self::ValueAlpha => VALUE_ALPHA_STRIDE,
        }
    }

    /// Check that the quantization parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the precision is not positive and finite, or the
    /// offset is not finite.
    pub fn validate(self) -> HeightmapResult<()> {
        if let Self::Packed { precision, offset } = self {
            if !(precision.is_finite() && precision > 0.0) || !offset.is_finite() {
                return Err(HeightmapError::InvalidPrecision { precision });
            }
        }
        Ok(())
    }
}

/// Quantize an elevation into the 24-bit packed integer.
///
/// The result is `round((value + offset) / precision)`.
///
/// # Errors
///
/// Returns an error if the quantized value does not fit in 24 bits or the
/// precision is invalid.
pub fn encode_packed(value: f64, precision: f64, offset: f64) -> HeightmapResult<u32> {
    Encoding::Packed { precision, offset }.validate()?;

    let packed = ((value + offset) / precision).round();
    if !packed.is_finite() || packed < 0.0 || packed > f64::from(MAX_PACKED_VALUE) {
        return Err(HeightmapError::OutOfRange {
            value,
            precision,
            offset,
        });
    }

    // Range checked above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let packed = packed as u32;
    Ok(packed)
}

/// Split a packed integer into its `r`, `g`, `b` channels.
#[must_use]
pub fn packed_to_rgb(packed: u32) -> [u8; 3] {
    let [r, g, b, _] = packed.to_le_bytes();
    [r, g, b]
}

/// Encode an optional elevation as one packed RGBA pixel.
///
/// `None` produces a fully transparent pixel, which decodes as "no data".
///
/// # Errors
///
/// Returns an error if the elevation is out of the encodable range.
pub fn encode_packed_pixel(
    value: Option<f64>,
    precision: f64,
    offset: f64,
) -> HeightmapResult<[u8; 4]> {
    match value {
        Some(value) => {
            let [r, g, b] = packed_to_rgb(encode_packed(value, precision, offset)?);
            Ok([r, g, b, u8::MAX])
        }
        None => Ok([0; 4]),
    }
}

/// Decode one packed RGBA pixel.
///
/// Returns `None` when the validity channel is 0, unless `ignore_no_data` is
/// set, in which case the stored value is decoded anyway.
#[must_use]
pub fn decode_packed(
    pixel: [u8; 4],
    precision: f64,
    offset: f64,
    ignore_no_data: bool,
) -> Option<f64> {
    let [r, g, b, a] = pixel;
    if a == 0 && !ignore_no_data {
        return None;
    }

    let packed = u32::from(r) + u32::from(g) * 256 + u32::from(b) * 65536;
    Some(f64::from(packed) * precision - offset)
}

/// Decode one value/alpha pixel.
#[must_use]
pub fn decode_value_alpha(pixel: [f32; 2], ignore_no_data: bool) -> Option<f64> {
    let [value, alpha] = pixel;
    if alpha == 0.0 && !ignore_no_data {
        return None;
    }
    Some(f64::from(value))
}
