//! Linear stretching: Histogram, Contrast and Intensity stretching.
//!
//! All three map `[lo, hi]` linearly onto `[0, 255]`:
//!
//! ```text
//! v' = clamp(((v - lo) * 255) / (hi - lo), 0, 255)
//! ```
//!
//! Histogram stretching takes an independent `(lo, hi)` per color channel;
//! contrast and intensity stretching share one pair across R, G and B.

use crate::error::{ImageError, Result};
use crate::raster::{quantize, RasterBuffer};

fn check_range(lo: f64, hi: f64) -> Result<()> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Err(ImageError::InvalidRange { lo, hi });
    }
    Ok(())
}

fn stretch_lut(lo: f64, hi: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        *slot = quantize(((v as f64 - lo) * 255.0) / (hi - lo));
    }
    lut
}

// ============================================================================
// Per-channel bounds
// ============================================================================

/// Stretch each color channel with its own bounds.
///
/// # Arguments
/// * `input` - Source raster
/// * `lo` - Lower bound per channel, `[r, g, b]`
/// * `hi` - Upper bound per channel, each strictly greater than its `lo`
///
/// # Returns
/// Stretched raster, or `InvalidRange` when any channel has `hi <= lo`
pub fn histogram_stretch(input: &RasterBuffer, lo: [f64; 3], hi: [f64; 3]) -> Result<RasterBuffer> {
    for c in 0..3 {
        check_range(lo[c], hi[c])?;
    }
    let luts = [
        stretch_lut(lo[0], hi[0]),
        stretch_lut(lo[1], hi[1]),
        stretch_lut(lo[2], hi[2]),
    ];
    Ok(input.map_rgb(|c, v| luts[c][v as usize]))
}

// ============================================================================
// Shared bounds
// ============================================================================

/// Stretch R, G and B with one shared `(lo, hi)` pair.
pub fn contrast_stretch(input: &RasterBuffer, lo: f64, hi: f64) -> Result<RasterBuffer> {
    check_range(lo, hi)?;
    let lut = stretch_lut(lo, hi);
    Ok(input.map_rgb(|_, v| lut[v as usize]))
}

/// Intensity stretching. Same mapping as [`contrast_stretch`]; kept as its own
/// entry point because callers expose the two as distinct tools.
pub fn intensity_stretch(input: &RasterBuffer, lo: f64, hi: f64) -> Result<RasterBuffer> {
    contrast_stretch(input, lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[u8]) -> RasterBuffer {
        let data = values.iter().flat_map(|&v| [v, v, v, 255]).collect();
        RasterBuffer::from_raw(values.len(), 1, data).unwrap()
    }

    #[test]
    fn test_contrast_stretch_maps_bounds() {
        let img = row(&[50, 100, 150, 10, 200]);
        let result = contrast_stretch(&img, 50.0, 150.0).unwrap();
        let reds: Vec<u8> = (0..5).map(|x| result.pixel(x, 0).unwrap()[0]).collect();
        // 100 -> 127.5 rounds to 128; out-of-range values clamp.
        assert_eq!(reds, vec![0, 128, 255, 0, 255]);
    }

    #[test]
    fn test_intensity_matches_contrast() {
        let img = row(&[0, 33, 66, 99, 255]);
        assert_eq!(
            intensity_stretch(&img, 20.0, 80.0).unwrap(),
            contrast_stretch(&img, 20.0, 80.0).unwrap()
        );
    }

    #[test]
    fn test_histogram_stretch_per_channel() {
        let img = RasterBuffer::from_raw(1, 1, vec![100, 100, 100, 0]).unwrap();
        let result = histogram_stretch(&img, [0.0, 100.0, 50.0], [200.0, 255.0, 100.0]).unwrap();
        // r: 100/200*255 = 127.5 -> 128, g: below lo -> 0, b: at hi -> 255
        assert_eq!(result.pixel(0, 0).unwrap(), [128, 0, 255, 255]);
    }

    #[test]
    fn test_invalid_range() {
        let img = row(&[1]);
        assert_eq!(
            contrast_stretch(&img, 10.0, 10.0),
            Err(ImageError::InvalidRange { lo: 10.0, hi: 10.0 })
        );
        assert!(histogram_stretch(&img, [0.0; 3], [255.0, 255.0, 0.0]).is_err());
    }
}
