//! PixelLab Rust Core
//!
//! Pixel-level transforms over 8-bit RGBA rasters, with Python bindings via
//! PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! Every operation works on a [`RasterBuffer`]: an `(height, width, 4)` array
//! of `u8` in RGBA order. Input alpha is ignored and every output pixel is
//! opaque.
//!
//! ## Operation Families
//! - Point transforms: grayscale, negative, gamma, log, bit-plane slicing
//! - Linear stretching: histogram, contrast and intensity stretching
//! - Histograms and equalization (global, per-channel, local)
//! - Two-image compositing with bitwise and arithmetic blends
//! - Convolution and edge detection (Sobel, Prewitt, Roberts, LoG, Kompas)
//!
//! ## Features
//! - `python`: PyO3 extension module
//! - `wasm`: wasm-bindgen exports over flat RGBA byte slices
//! - `codec`: PNG/JPEG/BMP decode and encode through the `image` crate
//! - `serde`: serialization of parameters and histograms

pub mod error;
pub mod filters;
pub mod raster;

#[cfg(feature = "codec")]
pub mod codec;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{ImageError, Result};
pub use raster::{Channel, RasterBuffer};

pub use filters::blend::{composite, invert, BlendOperation};
pub use filters::color_adjust::{bit_plane, gamma, log_transform, negative};
pub use filters::core::{
    convolve, convolve_with_border, gaussian_smooth, gradient_magnitude, normalize_magnitude, Border,
    GaussianParams, Kernel,
};
pub use filters::edge::{
    edges, kompas, laplacian_of_gaussian, prewitt, roberts, sobel, Compass, CompassDirection,
    EdgeOperator, EdgeParams,
};
pub use filters::grayscale::{gray_plane, grayscale};
pub use filters::histogram::{
    cumulative, equalization_table, equalize_channels, equalize_global, equalize_local, histogram,
    rgb_histograms, ChannelCumulative, ChannelHistograms, CumulativeHistogram, Histogram,
};
pub use filters::levels::{contrast_stretch, histogram_stretch, intensity_stretch};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::ImageError;
    use crate::filters::{blend, color_adjust, edge, grayscale as gray, histogram as hist, levels};
    use crate::filters::core::GaussianParams;
    use crate::filters::edge::{Compass, EdgeOperator, EdgeParams};
    use crate::raster::{Channel, RasterBuffer};

    fn to_py_err(err: ImageError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    fn to_raster(image: &PyReadonlyArray3<'_, u8>) -> PyResult<RasterBuffer> {
        RasterBuffer::from_array(image.as_array().to_owned()).map_err(to_py_err)
    }

    fn to_numpy<'py>(py: Python<'py>, result: crate::Result<RasterBuffer>) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let buffer = result.map_err(to_py_err)?;
        Ok(buffer.into_array().into_pyarray(py))
    }

    // ========================================================================
    // Point transforms
    // ========================================================================

    /// Average R, G and B into a gray RGBA image.
    #[pyfunction]
    pub fn grayscale<'py>(py: Python<'py>, image: PyReadonlyArray3<'py, u8>) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, Ok(gray::grayscale(&input)))
    }

    /// Invert every color channel.
    #[pyfunction]
    pub fn negative<'py>(py: Python<'py>, image: PyReadonlyArray3<'py, u8>) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, Ok(color_adjust::negative(&input)))
    }

    /// Power-law transform `255 * (v / 255)^gamma`.
    #[pyfunction]
    pub fn gamma<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        gamma: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, color_adjust::gamma(&input, gamma))
    }

    /// Logarithmic transform; `scale` is the input value mapped to 255.
    #[pyfunction]
    #[pyo3(signature = (image, scale=255.0))]
    pub fn log_transform<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        scale: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, color_adjust::log_transform(&input, scale))
    }

    /// Binary mask of bit `plane` (0-7) of the red channel.
    #[pyfunction]
    pub fn bit_plane<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        plane: u8,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, color_adjust::bit_plane(&input, plane))
    }

    // ========================================================================
    // Stretching
    // ========================================================================

    /// Stretch each channel from its own `(lo, hi)` onto 0-255.
    #[pyfunction]
    pub fn histogram_stretch<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        lo: [f64; 3],
        hi: [f64; 3],
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, levels::histogram_stretch(&input, lo, hi))
    }

    /// Stretch R, G and B from a shared `(lo, hi)` onto 0-255.
    #[pyfunction]
    pub fn contrast_stretch<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        lo: f64,
        hi: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, levels::contrast_stretch(&input, lo, hi))
    }

    #[pyfunction]
    pub fn intensity_stretch<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        lo: f64,
        hi: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, levels::intensity_stretch(&input, lo, hi))
    }

    // ========================================================================
    // Histograms and equalization
    // ========================================================================

    /// 256-bin histogram of one channel ("r", "g", "b") or of the gray
    /// average when `channel` is None.
    #[pyfunction]
    #[pyo3(signature = (image, channel=None))]
    pub fn histogram(image: PyReadonlyArray3<'_, u8>, channel: Option<&str>) -> PyResult<Vec<u64>> {
        let input = to_raster(&image)?;
        let channel = channel
            .map(str::parse::<Channel>)
            .transpose()
            .map_err(to_py_err)?;
        Ok(hist::histogram(&input, channel).counts().to_vec())
    }

    /// Running sum of a 256-bin histogram.
    #[pyfunction]
    pub fn cumulative_histogram(counts: Vec<u64>) -> PyResult<Vec<u64>> {
        let histogram = hist::Histogram::try_from(counts).map_err(to_py_err)?;
        Ok(histogram.cumulative().values().to_vec())
    }

    /// Red, green and blue histograms in one pass.
    #[pyfunction]
    pub fn rgb_histograms(image: PyReadonlyArray3<'_, u8>) -> PyResult<(Vec<u64>, Vec<u64>, Vec<u64>)> {
        let input = to_raster(&image)?;
        let h = hist::rgb_histograms(&input);
        Ok((h.red.counts().to_vec(), h.green.counts().to_vec(), h.blue.counts().to_vec()))
    }

    /// Global equalization driven by the red channel's CDF.
    #[pyfunction]
    pub fn equalize_global<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, hist::equalize_global(&input))
    }

    /// Equalize R, G and B each against its own CDF.
    #[pyfunction]
    pub fn equalize_channels<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, hist::equalize_channels(&input))
    }

    /// Local equalization over an odd `window` x `window` neighbourhood.
    #[pyfunction]
    #[pyo3(signature = (image, window=3))]
    pub fn equalize_local<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        window: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        // Release the GIL for the row-parallel pass
        let result = py.allow_threads(|| hist::equalize_local(&input, window));
        to_numpy(py, result)
    }

    // ========================================================================
    // Compositing
    // ========================================================================

    /// Blend two images with an operation tag such as "AND", "NOT G1" or
    /// "Addition". Output covers the common top-left region.
    #[pyfunction]
    pub fn composite<'py>(
        py: Python<'py>,
        first: PyReadonlyArray3<'py, u8>,
        second: PyReadonlyArray3<'py, u8>,
        operation: &str,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let op: blend::BlendOperation = operation.parse().map_err(to_py_err)?;
        let a = to_raster(&first)?;
        let b = to_raster(&second)?;
        to_numpy(py, Ok(blend::composite(&a, &b, op)))
    }

    #[pyfunction]
    pub fn invert<'py>(py: Python<'py>, image: PyReadonlyArray3<'py, u8>) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_raster(&image)?;
        to_numpy(py, Ok(blend::invert(&input)))
    }

    // ========================================================================
    // Edge detection
    // ========================================================================

    /// Edge detection.
    ///
    /// # Arguments
    /// * `operator` - "sobel", "prewitt", "roberts", "log" or "kompas"
    /// * `smoothing` - Gaussian pre-smoothing on/off
    /// * `size`, `sigma` - Gaussian kernel size (odd) and standard deviation
    /// * `binarize` - Roberts only: threshold the result to 0/255
    /// * `direction` - Kompas only: "all" or one of "N", "NE", ... "NW"
    #[pyfunction]
    #[pyo3(signature = (image, operator, smoothing=true, size=5, sigma=1.0, binarize=false, direction="all"))]
    #[allow(clippy::too_many_arguments)]
    pub fn edges<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        operator: &str,
        smoothing: bool,
        size: usize,
        sigma: f64,
        binarize: bool,
        direction: &str,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let op = match operator.parse::<EdgeOperator>().map_err(to_py_err)? {
            EdgeOperator::Roberts { .. } => EdgeOperator::Roberts { binarize },
            EdgeOperator::Kompas(_) => EdgeOperator::Kompas(direction.parse::<Compass>().map_err(to_py_err)?),
            other => other,
        };
        let params = EdgeParams {
            smoothing: smoothing.then_some(GaussianParams { size, sigma }),
        };
        let input = to_raster(&image)?;
        let result = py.allow_threads(|| edge::edges(&input, op, &params));
        to_numpy(py, result)
    }

    /// Python module definition
    #[pymodule]
    pub fn pixellab(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Point transforms
        m.add_function(wrap_pyfunction!(grayscale, m)?)?;
        m.add_function(wrap_pyfunction!(negative, m)?)?;
        m.add_function(wrap_pyfunction!(gamma, m)?)?;
        m.add_function(wrap_pyfunction!(log_transform, m)?)?;
        m.add_function(wrap_pyfunction!(bit_plane, m)?)?;

        // Stretching
        m.add_function(wrap_pyfunction!(histogram_stretch, m)?)?;
        m.add_function(wrap_pyfunction!(contrast_stretch, m)?)?;
        m.add_function(wrap_pyfunction!(intensity_stretch, m)?)?;

        // Histograms
        m.add_function(wrap_pyfunction!(histogram, m)?)?;
        m.add_function(wrap_pyfunction!(cumulative_histogram, m)?)?;
        m.add_function(wrap_pyfunction!(rgb_histograms, m)?)?;
        m.add_function(wrap_pyfunction!(equalize_global, m)?)?;
        m.add_function(wrap_pyfunction!(equalize_channels, m)?)?;
        m.add_function(wrap_pyfunction!(equalize_local, m)?)?;

        // Compositing
        m.add_function(wrap_pyfunction!(composite, m)?)?;
        m.add_function(wrap_pyfunction!(invert, m)?)?;

        // Edge detection
        m.add_function(wrap_pyfunction!(edges, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::pixellab;
