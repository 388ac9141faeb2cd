//! Point transforms: Negative, Gamma, Log, Bit-plane slicing.
//!
//! These are pixel-wise operations that don't require spatial context.
//! Each transform is precomputed into a 256-entry lookup table and applied to
//! R, G and B independently; alpha is forced to 255. Fractional results are
//! rounded to nearest on write.

use crate::error::{ImageError, Result};
use crate::raster::{quantize, RasterBuffer};

/// Precompute `f` over every 8-bit input value.
fn build_lut<F: Fn(f64) -> f64>(f: F) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = quantize(f(i as f64));
    }
    lut
}

fn apply_lut(input: &RasterBuffer, lut: &[u8; 256]) -> RasterBuffer {
    input.map_rgb(|_, v| lut[v as usize])
}

fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ImageError::invalid_parameter(
            name,
            format!("must be a finite value greater than 0, got {value}"),
        ));
    }
    Ok(())
}

// ============================================================================
// Negative
// ============================================================================

/// Invert every color channel: `v' = 255 - v`.
pub fn negative(input: &RasterBuffer) -> RasterBuffer {
    input.map_rgb(|_, v| 255 - v)
}

// ============================================================================
// Gamma
// ============================================================================

/// Power-law transform `v' = 255 * (v / 255)^gamma`.
///
/// # Arguments
/// * `input` - Source raster
/// * `gamma` - Exponent, must be > 0. 1.0 is the identity, < 1 brightens.
///
/// # Returns
/// Gamma-adjusted raster, or `InvalidParameter` for a non-positive gamma
pub fn gamma(input: &RasterBuffer, gamma: f64) -> Result<RasterBuffer> {
    require_positive("gamma", gamma)?;
    let lut = build_lut(|v| 255.0 * (v / 255.0).powf(gamma));
    Ok(apply_lut(input, &lut))
}

// ============================================================================
// Log
// ============================================================================

/// Logarithmic transform `v' = c * ln(1 + v)` with `c = 255 / ln(1 + scale)`.
///
/// `scale` is the input value mapped to 255; inputs above it saturate.
pub fn log_transform(input: &RasterBuffer, scale: f64) -> Result<RasterBuffer> {
    require_positive("scale", scale)?;
    let c = 255.0 / scale.ln_1p();
    let lut = build_lut(|v| c * v.ln_1p());
    Ok(apply_lut(input, &lut))
}

// ============================================================================
// Bit-plane slicing
// ============================================================================

/// Extract one bit plane of the R channel as a binary mask.
///
/// Pixels whose R value has bit `plane` set become white, all others black.
/// G and B of the input are ignored.
pub fn bit_plane(input: &RasterBuffer, plane: u8) -> Result<RasterBuffer> {
    if plane > 7 {
        return Err(ImageError::invalid_parameter(
            "plane",
            format!("bit plane must be in 0..=7, got {plane}"),
        ));
    }
    let (width, height) = input.dimensions();
    Ok(RasterBuffer::from_gray_fn(width, height, |x, y| {
        if (input.sample(x, y, 0) >> plane) & 1 == 1 {
            255
        } else {
            0
        }
    }))
}
