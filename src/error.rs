//! Error type shared by every filter.
//!
//! All filters are pure functions of their inputs, so every error is terminal
//! for the call that produced it.

use thiserror::Error;

/// Errors raised by raster access and image operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImageError {
    #[error("pixel ({x}, {y}) channel {channel} is outside a {width}x{height} raster")]
    OutOfBounds {
        x: usize,
        y: usize,
        channel: usize,
        width: usize,
        height: usize,
    },

    #[error("invalid stretch range: hi ({hi}) must be greater than lo ({lo})")]
    InvalidRange { lo: f64, hi: f64 },

    #[error("histogram is degenerate: every sample has the same intensity")]
    DegenerateHistogram,

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid raster dimensions {width}x{height} for {len} bytes")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("image decoding failed: {0}")]
    Decode(String),

    #[error("image encoding failed: {0}")]
    Encode(String),
}

impl ImageError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        ImageError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ImageError>;
