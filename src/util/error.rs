//! Error types for prodmatch.

use thiserror::Error;

/// Result alias for prodmatch operations.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Reasons an image buffer could not be turned into comparable pixels.
///
/// A decode failure is scoped to a single image: the selector records it
/// against the offending candidate and keeps scanning the rest of the pool.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer contains no bytes.
    #[error("image buffer is empty")]
    Empty,
    /// The declared geometry has no pixels.
    #[error("image has zero area ({width}x{height})")]
    ZeroArea { width: usize, height: usize },
    /// The buffer length disagrees with `width * height * channels`.
    #[error("buffer length {got} does not match {width}x{height}x{channels} (expected {expected})")]
    LengthMismatch {
        width: usize,
        height: usize,
        channels: usize,
        expected: usize,
        got: usize,
    },
    /// Only gray, RGB and RGBA interleaved buffers are accepted.
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(usize),
    /// The encoded stream could not be decoded.
    #[error("malformed image data: {0}")]
    Malformed(String),
    /// Encoded input was supplied but the `image-io` feature is disabled.
    #[error("encoded input requires the `image-io` feature")]
    UnsupportedEncoding,
}

/// Invalid engine configuration, rejected when the configuration is built.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Fusion weights must add up to exactly 100.
    #[error("fusion weights sum to {sum}, expected 100")]
    WeightsSum { sum: f32 },
    /// A fusion weight is below zero.
    #[error("fusion weight for {metric} is negative ({value})")]
    NegativeWeight { metric: &'static str, value: f32 },
    /// A fusion weight is NaN or infinite.
    #[error("fusion weight for {metric} is not finite")]
    NonFiniteWeight { metric: &'static str },
    /// The high-confidence threshold lies outside `[0, 100]`.
    #[error("high-confidence threshold {0} outside [0, 100]")]
    Threshold(f32),
    /// Consistency multipliers must be finite and at least 1.
    #[error("consistency multiplier {0} must be finite and >= 1")]
    BonusMultiplier(f32),
    /// Any other out-of-range tuning parameter.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

/// Errors that can occur when running prodmatch algorithms.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MatchError {
    /// An image could not be decoded or validated.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// The engine configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// `find_best_match` was called with no candidates.
    #[error("candidate pool is empty")]
    EmptyPool,
    /// Width or height is zero, or the product overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing slice is too short for the requested view.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest does not fit inside the image.
    #[error("roi ({x}, {y}, {width}x{height}) outside {img_width}x{img_height} image")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A pyramid level or similar index does not exist.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// A template has no usable intensity variation.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
}
