//! WebAssembly exports for PixelLab filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images cross
//! the boundary as flat RGBA byte arrays (length = width * height * 4) and
//! come back in the same layout. Errors surface as thrown JS strings.

use wasm_bindgen::prelude::*;

use crate::error::ImageError;
use crate::filters::core::GaussianParams;
use crate::filters::edge::{Compass, EdgeOperator, EdgeParams};
use crate::filters::{blend, color_adjust, edge, grayscale, histogram, levels};
use crate::raster::{Channel, RasterBuffer};

fn to_js(err: ImageError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_raster(data: &[u8], width: usize, height: usize) -> Result<RasterBuffer, JsValue> {
    RasterBuffer::from_raw(width, height, data.to_vec()).map_err(to_js)
}

fn to_bytes(result: crate::Result<RasterBuffer>) -> Result<Vec<u8>, JsValue> {
    result.map(RasterBuffer::into_raw).map_err(to_js)
}

/// wasm32 memory cannot hold more than `u32::MAX` pixels.
fn counts_to_js(counts: &[u64]) -> Vec<u32> {
    counts.iter().map(|&c| u32::try_from(c).unwrap_or(u32::MAX)).collect()
}

// ============================================================================
// Point transforms
// ============================================================================

/// Average R, G and B into a gray image.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// Flat array of RGBA bytes with grayscale values
#[wasm_bindgen]
pub fn grayscale_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(Ok(grayscale::grayscale(&input)))
}

#[wasm_bindgen]
pub fn negative_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(Ok(color_adjust::negative(&input)))
}

/// Power-law transform; `gamma` must be > 0.
#[wasm_bindgen]
pub fn gamma_wasm(data: &[u8], width: usize, height: usize, gamma: f64) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(color_adjust::gamma(&input, gamma))
}

/// Logarithmic transform; `scale` is the input value mapped to 255.
#[wasm_bindgen]
pub fn log_transform_wasm(data: &[u8], width: usize, height: usize, scale: f64) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(color_adjust::log_transform(&input, scale))
}

/// Binary mask of bit `plane` (0-7) of the red channel.
#[wasm_bindgen]
pub fn bit_plane_wasm(data: &[u8], width: usize, height: usize, plane: u8) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(color_adjust::bit_plane(&input, plane))
}

// ============================================================================
// Stretching
// ============================================================================

/// Per-channel stretch; `lo` and `hi` hold three values each (R, G, B).
#[wasm_bindgen]
pub fn histogram_stretch_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    lo: &[f64],
    hi: &[f64],
) -> Result<Vec<u8>, JsValue> {
    let bounds = |name: &'static str, values: &[f64]| -> Result<[f64; 3], JsValue> {
        <[f64; 3]>::try_from(values).map_err(|_| {
            to_js(ImageError::invalid_parameter(
                name,
                format!("expected 3 values, got {}", values.len()),
            ))
        })
    };
    let lo = bounds("lo", lo)?;
    let hi = bounds("hi", hi)?;
    let input = to_raster(data, width, height)?;
    to_bytes(levels::histogram_stretch(&input, lo, hi))
}

#[wasm_bindgen]
pub fn contrast_stretch_wasm(data: &[u8], width: usize, height: usize, lo: f64, hi: f64) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(levels::contrast_stretch(&input, lo, hi))
}

#[wasm_bindgen]
pub fn intensity_stretch_wasm(data: &[u8], width: usize, height: usize, lo: f64, hi: f64) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(levels::intensity_stretch(&input, lo, hi))
}

// ============================================================================
// Histograms and equalization
// ============================================================================

/// 256-bin histogram of `channel` ("r", "g", "b"), or of the gray average
/// when `channel` is empty.
#[wasm_bindgen]
pub fn histogram_wasm(data: &[u8], width: usize, height: usize, channel: &str) -> Result<Vec<u32>, JsValue> {
    let input = to_raster(data, width, height)?;
    let channel = if channel.trim().is_empty() {
        None
    } else {
        Some(channel.parse::<Channel>().map_err(to_js)?)
    };
    Ok(counts_to_js(histogram::histogram(&input, channel).counts()))
}

/// Running sum of the same histogram [`histogram_wasm`] returns.
#[wasm_bindgen]
pub fn cumulative_histogram_wasm(data: &[u8], width: usize, height: usize, channel: &str) -> Result<Vec<u32>, JsValue> {
    let input = to_raster(data, width, height)?;
    let channel = if channel.trim().is_empty() {
        None
    } else {
        Some(channel.parse::<Channel>().map_err(to_js)?)
    };
    let cdf = histogram::histogram(&input, channel).cumulative();
    Ok(counts_to_js(cdf.values()))
}

#[wasm_bindgen]
pub fn equalize_global_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(histogram::equalize_global(&input))
}

#[wasm_bindgen]
pub fn equalize_channels_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(histogram::equalize_channels(&input))
}

/// Local equalization over an odd `window` x `window` neighbourhood.
#[wasm_bindgen]
pub fn equalize_local_wasm(data: &[u8], width: usize, height: usize, window: usize) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(histogram::equalize_local(&input, window))
}

// ============================================================================
// Compositing
// ============================================================================

/// Blend two images; `operation` is a tag such as "XOR" or "G1 NOT G2".
///
/// # Returns
/// RGBA bytes of size `min(width1, width2) x min(height1, height2)`
#[wasm_bindgen]
pub fn composite_wasm(
    first: &[u8],
    width1: usize,
    height1: usize,
    second: &[u8],
    width2: usize,
    height2: usize,
    operation: &str,
) -> Result<Vec<u8>, JsValue> {
    let op: blend::BlendOperation = operation.parse().map_err(to_js)?;
    let a = to_raster(first, width1, height1)?;
    let b = to_raster(second, width2, height2)?;
    to_bytes(Ok(blend::composite(&a, &b, op)))
}

#[wasm_bindgen]
pub fn invert_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let input = to_raster(data, width, height)?;
    to_bytes(Ok(blend::invert(&input)))
}

// ============================================================================
// Edge detection
// ============================================================================

/// Edge detection.
///
/// # Arguments
/// * `operator` - "sobel", "prewitt", "roberts", "log" or "kompas"
/// * `smoothing` - Gaussian pre-smoothing with `size` (odd) and `sigma`
/// * `binarize` - Roberts only: threshold to 0/255
/// * `direction` - Kompas only: "all" or "N", "NE", ... "NW"
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn edges_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    operator: &str,
    smoothing: bool,
    size: usize,
    sigma: f64,
    binarize: bool,
    direction: &str,
) -> Result<Vec<u8>, JsValue> {
    let op = match operator.parse::<EdgeOperator>().map_err(to_js)? {
        EdgeOperator::Roberts { .. } => EdgeOperator::Roberts { binarize },
        EdgeOperator::Kompas(_) => EdgeOperator::Kompas(direction.parse::<Compass>().map_err(to_js)?),
        other => other,
    };
    let params = EdgeParams {
        smoothing: smoothing.then_some(GaussianParams { size, sigma }),
    };
    let input = to_raster(data, width, height)?;
    to_bytes(edge::edges(&input, op, &params))
}
