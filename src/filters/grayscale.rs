//! Grayscale reduction.
//!
//! The public filter uses the plain channel average `(R + G + B) / 3`.
//! Edge detection and local equalization read the reduced image through the
//! plane helpers below instead of re-encoding it into a raster first.

use ndarray::Array2;

use crate::raster::{quantize, RasterBuffer};

/// ITU-R BT.601 luma coefficients used by local equalization.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

// ============================================================================
// Average grayscale
// ============================================================================

/// Average of the three color channels, rounded to nearest.
#[inline]
pub(crate) fn average(r: u8, g: u8, b: u8) -> u8 {
    quantize((r as f64 + g as f64 + b as f64) / 3.0)
}

/// Convert an image to grayscale by averaging R, G and B.
///
/// # Arguments
/// * `input` - Source raster (alpha ignored)
///
/// # Returns
/// New raster with R=G=B=average and alpha 255
pub fn grayscale(input: &RasterBuffer) -> RasterBuffer {
    let (width, height) = input.dimensions();
    RasterBuffer::from_gray_fn(width, height, |x, y| {
        average(
            input.sample(x, y, 0),
            input.sample(x, y, 1),
            input.sample(x, y, 2),
        )
    })
}

/// Grayscale-reduced image as a `(height, width)` plane of reals.
///
/// Values are exactly what [`grayscale`] would store, so convolving this
/// plane matches convolving the R channel of the reduced raster.
pub fn gray_plane(input: &RasterBuffer) -> Array2<f64> {
    let (width, height) = input.dimensions();
    Array2::from_shape_fn((height, width), |(y, x)| {
        average(
            input.sample(x, y, 0),
            input.sample(x, y, 1),
            input.sample(x, y, 2),
        ) as f64
    })
}

// ============================================================================
// Luma
// ============================================================================

/// BT.601 luma plane, unrounded.
pub(crate) fn luma_plane(input: &RasterBuffer) -> Array2<f64> {
    let (width, height) = input.dimensions();
    Array2::from_shape_fn((height, width), |(y, x)| {
        LUMA_R * input.sample(x, y, 0) as f64
            + LUMA_G * input.sample(x, y, 1) as f64
            + LUMA_B * input.sample(x, y, 2) as f64
    })
}
