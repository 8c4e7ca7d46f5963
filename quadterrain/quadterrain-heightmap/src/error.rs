//! Error types for heightmap construction.

use thiserror::Error;

/// Errors that can occur while building or encoding a heightmap.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HeightmapError {
    /// A heightmap must have at least one pixel in each direction.
    #[error("heightmap dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    /// The buffer does not hold `width * height * stride` channels.
    #[error("buffer size mismatch: expected {expected} channels, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    /// The quantization step must be a positive finite number.
    #[error("invalid precision {precision}: must be positive and finite")]
    InvalidPrecision { precision: f64 },
    /// The elevation cannot be represented by the 24-bit packed encoding.
    #[error("elevation {value} out of range for precision {precision} and offset {offset}")]
    OutOfRange {
        value: f64,
        precision: f64,
        offset: f64,
    },
}

/// Result type for heightmap operations.
pub type HeightmapResult<T> = Result<T, HeightmapError>;
