//! Encode, decode and sample per-tile elevation heightmaps.
//!
//! This crate provides the CPU-side view of a terrain tile's elevation
//! texture: point lookups for picking and seam stitching, and region min/max
//! queries for bounding volumes. It has no knowledge of the tile tree; the
//! caller decides which heightmap belongs to which tile and supplies the
//! [`Pitch`] mapping the tile's surface into the buffer.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Owned buffers**: Inheriting a heightmap copies its pixels
//! - **Missing data is not an error**: "no data" pixels decode to `None`

mod encoding;
mod error;
mod heightmap;
mod pitch;

pub use encoding::{
    Encoding, MAX_PACKED_VALUE, PACKED_STRIDE, VALUE_ALPHA_STRIDE, decode_packed,
    decode_value_alpha, encode_packed, encode_packed_pixel, packed_to_rgb,
};
pub use error::{HeightmapError, HeightmapResult};
pub use heightmap::{Heightmap, HeightmapData, MinMax};
pub use pitch::{Pitch, UvRect};
