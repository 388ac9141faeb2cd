//! Convolution primitives shared by the edge detectors.
//!
//! This module provides:
//! - [`Kernel`], an odd-sized square weight matrix addressed from its center
//! - Gaussian kernel generation and smoothing
//! - 2D convolution over a real-valued plane with a selectable [`Border`]
//! - Gradient magnitude and normalization back to an 8-bit raster
//!
//! Planes are `ndarray::Array2<f64>` of shape `(height, width)`. Convolution
//! runs one output row per rayon task.

use std::str::FromStr;

use ndarray::{Array2, Zip};
use rayon::prelude::*;

use crate::error::{ImageError, Result};
use crate::raster::{quantize, RasterBuffer};

/// Peaks below this are treated as an all-zero response when normalizing.
/// Kernels whose weights cancel leave rounding residue of this order on flat
/// input.
const MIN_PEAK: f64 = 1e-6;

// ============================================================================
// Kernel
// ============================================================================

/// Odd-sized square convolution kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Array2<f64>,
}

impl Kernel {
    /// Wrap a weight matrix. It must be square with an odd side.
    pub fn new(weights: Array2<f64>) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows != cols || rows % 2 == 0 {
            return Err(ImageError::invalid_parameter(
                "kernel",
                format!("kernel must be square with an odd size, got {rows}x{cols}"),
            ));
        }
        Ok(Self { weights })
    }

    /// Build a kernel from fixed rows. `N` must be odd.
    pub fn from_rows<const N: usize>(rows: [[f64; N]; N]) -> Result<Self> {
        Self::new(Array2::from_shape_fn((N, N), |(y, x)| rows[y][x]))
    }

    /// Fixed kernels compiled into the crate; sizes are known to be odd.
    pub(crate) fn fixed<const N: usize>(rows: [[f64; N]; N]) -> Self {
        debug_assert!(N % 2 == 1);
        Self {
            weights: Array2::from_shape_fn((N, N), |(y, x)| rows[y][x]),
        }
    }

    /// Normalized Gaussian kernel.
    ///
    /// Weights follow `exp(-(x² + y²) / (2σ²)) / (2πσ²)` over offsets
    /// `-center..=center`, then are scaled to sum to 1.
    ///
    /// # Arguments
    /// * `size` - Odd side length
    /// * `sigma` - Standard deviation, > 0
    pub fn gaussian(size: usize, sigma: f64) -> Result<Self> {
        if size % 2 == 0 {
            return Err(ImageError::invalid_parameter(
                "size",
                format!("gaussian kernel size must be odd, got {size}"),
            ));
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(ImageError::invalid_parameter(
                "sigma",
                format!("sigma must be a finite value greater than 0, got {sigma}"),
            ));
        }

        let center = (size / 2) as f64;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut weights = Array2::from_shape_fn((size, size), |(y, x)| {
            let dy = y as f64 - center;
            let dx = x as f64 - center;
            (-(dx * dx + dy * dy) / two_sigma_sq).exp() / (std::f64::consts::PI * two_sigma_sq)
        });

        let sum = weights.sum();
        weights /= sum;
        Ok(Self { weights })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.weights.nrows()
    }

    /// Index of the center row/column.
    pub fn center(&self) -> usize {
        self.size() / 2
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Weight at offset `(dy, dx)` from the center, or `None` when the
    /// offset falls outside the kernel.
    pub fn at(&self, dy: isize, dx: isize) -> Option<f64> {
        let c = self.center() as isize;
        let y = usize::try_from(c + dy).ok()?;
        let x = usize::try_from(c + dx).ok()?;
        self.weights.get((y, x)).copied()
    }
}

// ============================================================================
// Convolution
// ============================================================================

/// How samples outside the image are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Border {
    /// Out-of-bounds samples are 0.
    Zero,
    /// Out-of-bounds samples repeat the nearest edge pixel.
    #[default]
    Replicate,
}

impl FromStr for Border {
    type Err = ImageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(Border::Zero),
            "replicate" | "clamp" => Ok(Border::Replicate),
            other => Err(ImageError::UnsupportedOperation(format!("border `{other}`"))),
        }
    }
}

/// Read `plane[y][x]` under `border`.
#[inline]
pub(crate) fn sample(plane: &Array2<f64>, x: isize, y: isize, border: Border) -> f64 {
    let (height, width) = plane.dim();
    let inside = x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height;
    match border {
        _ if inside => plane[[y as usize, x as usize]],
        Border::Zero => 0.0,
        Border::Replicate => {
            let cx = x.clamp(0, width as isize - 1) as usize;
            let cy = y.clamp(0, height as isize - 1) as usize;
            plane[[cy, cx]]
        }
    }
}

/// Convolve with zero padding.
///
/// Output `(x, y)` is `Σ kernel[ky][kx] * sample(x + kx - c, y + ky - c)`,
/// with samples outside the image taken as 0.
pub fn convolve(plane: &Array2<f64>, kernel: &Kernel) -> Array2<f64> {
    convolve_with_border(plane, kernel, Border::Zero)
}

/// Convolve with an explicit border policy.
pub fn convolve_with_border(plane: &Array2<f64>, kernel: &Kernel, border: Border) -> Array2<f64> {
    let (height, width) = plane.dim();
    let size = kernel.size();
    let c = kernel.center() as isize;
    let weights = kernel.weights();

    let rows: Vec<Vec<f64>> = (0..height)
        .into_par_iter()
        .map(|y| {
            (0..width)
                .map(|x| {
                    let mut sum = 0.0;
                    for ky in 0..size {
                        for kx in 0..size {
                            let w = weights[[ky, kx]];
                            if w == 0.0 {
                                continue;
                            }
                            let sx = x as isize + kx as isize - c;
                            let sy = y as isize + ky as isize - c;
                            sum += w * sample(plane, sx, sy, border);
                        }
                    }
                    sum
                })
                .collect()
        })
        .collect();

    Array2::from_shape_fn((height, width), |(y, x)| rows[y][x])
}

// ============================================================================
// Gaussian smoothing
// ============================================================================

/// Gaussian pre-smoothing settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussianParams {
    /// Odd kernel side length.
    pub size: usize,
    /// Standard deviation.
    pub sigma: f64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self { size: 5, sigma: 1.0 }
    }
}

/// Smooth `plane` with a normalized Gaussian kernel.
pub fn gaussian_smooth(plane: &Array2<f64>, params: GaussianParams, border: Border) -> Result<Array2<f64>> {
    let kernel = Kernel::gaussian(params.size, params.sigma)?;
    Ok(convolve_with_border(plane, &kernel, border))
}

// ============================================================================
// Magnitude and normalization
// ============================================================================

/// Per-pixel `sqrt(gx² + gy²)`.
pub fn gradient_magnitude(gx: &Array2<f64>, gy: &Array2<f64>) -> Array2<f64> {
    Zip::from(gx).and(gy).map_collect(|&a, &b| a.hypot(b))
}

/// Map `|m| / max|m|` onto 0..=255 and write it into R, G and B.
///
/// A map whose peak `max|m|` is below 1e-6 counts as all zero and is divided
/// by 1 instead, giving black. Smoothing a uniform image produces a constant
/// plane whose value is rarely an exact integer; LoG and Kompas responses
/// over it cancel only up to rounding, and without the cutoff that residue
/// would be stretched to full white. Callers that need to normalize genuinely
/// tiny responses should scale the map first.
pub fn normalize_magnitude(map: &Array2<f64>) -> RasterBuffer {
    let peak = map.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let peak = if peak < MIN_PEAK { 1.0 } else { peak };
    let (height, width) = map.dim();
    RasterBuffer::from_gray_fn(width, height, |x, y| quantize(map[[y, x]].abs() / peak * 255.0))
}
