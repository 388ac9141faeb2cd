//! Edge detection: Sobel, Prewitt, Roberts, Laplacian of Gaussian, Kompas.
//!
//! Every operator works the same way:
//! 1. Reduce the input to a grayscale plane (`(R + G + B) / 3`)
//! 2. Optionally pre-smooth it with a Gaussian ([`EdgeParams::smoothing`])
//! 3. Convolve with the operator's fixed kernels
//! 4. Normalize the absolute response onto 0..=255
//!
//! Output is grayscale (same value in R, G and B) with alpha 255. Every
//! convolution, including smoothing and the Roberts neighbours, replicates
//! the nearest edge pixel for out-of-bounds samples, so a uniform image has
//! no edges anywhere.
//!
//! Kernels are oriented with x growing right and y growing down.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Zip};
use tracing::{debug, instrument};

use super::core::{
    convolve_with_border, gaussian_smooth, gradient_magnitude, normalize_magnitude, sample, Border,
    GaussianParams, Kernel,
};
use super::grayscale::gray_plane;
use crate::error::{ImageError, Result};
use crate::raster::RasterBuffer;

/// Normalized Roberts values above this become white in binary mode.
const ROBERTS_THRESHOLD: u8 = 30;

/// Out-of-bounds policy shared by every edge operator.
const EDGE_BORDER: Border = Border::Replicate;

// ============================================================================
// Parameters
// ============================================================================

/// Settings shared by every edge operator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeParams {
    /// Gaussian pre-smoothing; `None` runs the operator on the raw gray plane.
    pub smoothing: Option<GaussianParams>,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            smoothing: Some(GaussianParams::default()),
        }
    }
}

impl EdgeParams {
    /// No pre-smoothing.
    pub fn unsmoothed() -> Self {
        Self { smoothing: None }
    }
}

// ============================================================================
// Compass directions
// ============================================================================

/// Direction of a Kompas (Prewitt compass) mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompassDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

/// Outer ring positions of a 3x3 mask, clockwise from the top-left corner.
const RING: [(usize, usize); 8] = [(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0)];

/// Ring weights of the north mask `[[1,1,1],[1,-2,1],[-1,-1,-1]]`.
const NORTH_RING: [f64; 8] = [1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, 1.0];

impl CompassDirection {
    /// All directions, clockwise from north.
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::N,
        CompassDirection::NE,
        CompassDirection::E,
        CompassDirection::SE,
        CompassDirection::S,
        CompassDirection::SW,
        CompassDirection::W,
        CompassDirection::NW,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            CompassDirection::N => "N",
            CompassDirection::NE => "NE",
            CompassDirection::E => "E",
            CompassDirection::SE => "SE",
            CompassDirection::S => "S",
            CompassDirection::SW => "SW",
            CompassDirection::W => "W",
            CompassDirection::NW => "NW",
        }
    }

    /// Number of 45° clockwise steps from north.
    const fn steps(self) -> usize {
        self as usize
    }

    /// The 3x3 mask for this direction: the north mask with its outer ring
    /// rotated `steps()` positions clockwise. The center weight stays -2.
    pub fn kernel(self) -> Kernel {
        let mut rows = [[0.0; 3]; 3];
        rows[1][1] = -2.0;
        for (i, &(y, x)) in RING.iter().enumerate() {
            rows[y][x] = NORTH_RING[(i + 8 - self.steps()) % 8];
        }
        Kernel::fixed(rows)
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CompassDirection {
    type Err = ImageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        CompassDirection::ALL
            .into_iter()
            .find(|d| d.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ImageError::UnsupportedOperation(format!("compass direction `{wanted}`")))
    }
}

/// Which Kompas masks to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Compass {
    /// A single direction.
    Direction(CompassDirection),
    /// Per-pixel maximum absolute response over all eight directions.
    All,
}

impl FromStr for Compass {
    type Err = ImageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Compass::All)
        } else {
            s.parse().map(Compass::Direction)
        }
    }
}

// ============================================================================
// Operator selection
// ============================================================================

/// Edge operator together with its operator-specific options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeOperator {
    Sobel,
    Prewitt,
    Roberts { binarize: bool },
    LaplacianOfGaussian,
    Kompas(Compass),
}

impl fmt::Display for EdgeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeOperator::Sobel => f.write_str("sobel"),
            EdgeOperator::Prewitt => f.write_str("prewitt"),
            EdgeOperator::Roberts { binarize: false } => f.write_str("roberts"),
            EdgeOperator::Roberts { binarize: true } => f.write_str("roberts (binary)"),
            EdgeOperator::LaplacianOfGaussian => f.write_str("log"),
            EdgeOperator::Kompas(Compass::All) => f.write_str("kompas"),
            EdgeOperator::Kompas(Compass::Direction(d)) => write!(f, "kompas {d}"),
        }
    }
}

impl FromStr for EdgeOperator {
    type Err = ImageError;

    /// Parse an operator name. Roberts parses as the non-binary variant and
    /// Kompas as all directions.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sobel" => Ok(EdgeOperator::Sobel),
            "prewitt" => Ok(EdgeOperator::Prewitt),
            "roberts" => Ok(EdgeOperator::Roberts { binarize: false }),
            "log" | "laplacian" | "laplacian-of-gaussian" => Ok(EdgeOperator::LaplacianOfGaussian),
            "kompas" | "compass" => Ok(EdgeOperator::Kompas(Compass::All)),
            other => Err(ImageError::UnsupportedOperation(format!("edge operator `{other}`"))),
        }
    }
}

// ============================================================================
// Fixed kernels
// ============================================================================

fn sobel_kernels() -> (Kernel, Kernel) {
    (
        Kernel::fixed([[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]]),
        Kernel::fixed([[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]]),
    )
}

fn prewitt_kernels() -> (Kernel, Kernel) {
    (
        Kernel::fixed([[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]]),
        Kernel::fixed([[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]),
    )
}

fn log_kernel() -> Kernel {
    Kernel::fixed([
        [0.0, 0.0, -1.0, 0.0, 0.0],
        [0.0, -1.0, -2.0, -1.0, 0.0],
        [-1.0, -2.0, 16.0, -2.0, -1.0],
        [0.0, -1.0, -2.0, -1.0, 0.0],
        [0.0, 0.0, -1.0, 0.0, 0.0],
    ])
}

// ============================================================================
// Operators
// ============================================================================

/// Gray plane of `input`, smoothed when `params` asks for it.
fn prepare(input: &RasterBuffer, params: &EdgeParams) -> Result<Array2<f64>> {
    let plane = gray_plane(input);
    match params.smoothing {
        Some(gaussian) => gaussian_smooth(&plane, gaussian, EDGE_BORDER),
        None => Ok(plane),
    }
}

fn gradient_pair(plane: &Array2<f64>, (kx, ky): (Kernel, Kernel)) -> Array2<f64> {
    let gx = convolve_with_border(plane, &kx, EDGE_BORDER);
    let gy = convolve_with_border(plane, &ky, EDGE_BORDER);
    gradient_magnitude(&gx, &gy)
}

/// Run `op` on `input`.
///
/// # Arguments
/// * `input` - Source raster, reduced to grayscale internally
/// * `op` - Operator and its options
/// * `params` - Gaussian pre-smoothing
///
/// # Returns
/// Normalized edge map, or `InvalidParameter` for bad Gaussian settings
#[instrument(skip_all, fields(op = %op, width = input.width(), height = input.height()))]
pub fn edges(input: &RasterBuffer, op: EdgeOperator, params: &EdgeParams) -> Result<RasterBuffer> {
    debug!(smoothing = ?params.smoothing, "detecting edges");
    match op {
        EdgeOperator::Sobel => sobel(input, params),
        EdgeOperator::Prewitt => prewitt(input, params),
        EdgeOperator::Roberts { binarize } => roberts(input, params, binarize),
        EdgeOperator::LaplacianOfGaussian => laplacian_of_gaussian(input, params),
        EdgeOperator::Kompas(compass) => kompas(input, params, compass),
    }
}

/// Sobel gradient magnitude.
pub fn sobel(input: &RasterBuffer, params: &EdgeParams) -> Result<RasterBuffer> {
    let plane = prepare(input, params)?;
    Ok(normalize_magnitude(&gradient_pair(&plane, sobel_kernels())))
}

/// Prewitt gradient magnitude.
pub fn prewitt(input: &RasterBuffer, params: &EdgeParams) -> Result<RasterBuffer> {
    let plane = prepare(input, params)?;
    Ok(normalize_magnitude(&gradient_pair(&plane, prewitt_kernels())))
}

/// Roberts cross over each pixel and its right, bottom and bottom-right
/// neighbours:
///
/// ```text
/// gx = p(x, y)     - p(x+1, y+1)
/// gy = p(x+1, y)   - p(x, y+1)
/// ```
///
/// With `binarize`, normalized values above 30 become 255 and the rest 0.
pub fn roberts(input: &RasterBuffer, params: &EdgeParams, binarize: bool) -> Result<RasterBuffer> {
    let plane = prepare(input, params)?;
    let magnitude = Array2::from_shape_fn(plane.dim(), |(y, x)| {
        let (x, y) = (x as isize, y as isize);
        let p = |dx: isize, dy: isize| sample(&plane, x + dx, y + dy, EDGE_BORDER);
        let gx = p(0, 0) - p(1, 1);
        let gy = p(1, 0) - p(0, 1);
        gx.hypot(gy)
    });

    let normalized = normalize_magnitude(&magnitude);
    if !binarize {
        return Ok(normalized);
    }
    let (width, height) = normalized.dimensions();
    Ok(RasterBuffer::from_gray_fn(width, height, |x, y| {
        if normalized.sample(x, y, 0) > ROBERTS_THRESHOLD {
            255
        } else {
            0
        }
    }))
}

/// Laplacian of Gaussian: smooth, apply the 5x5 LoG mask, normalize `|result|`.
pub fn laplacian_of_gaussian(input: &RasterBuffer, params: &EdgeParams) -> Result<RasterBuffer> {
    let plane = prepare(input, params)?;
    let response = convolve_with_border(&plane, &log_kernel(), EDGE_BORDER);
    Ok(normalize_magnitude(&response))
}

/// Raw Kompas response before normalization.
fn kompas_response(plane: &Array2<f64>, compass: Compass) -> Array2<f64> {
    match compass {
        Compass::Direction(direction) => convolve_with_border(plane, &direction.kernel(), EDGE_BORDER),
        Compass::All => {
            let mut strongest = Array2::<f64>::zeros(plane.dim());
            for direction in CompassDirection::ALL {
                let response = convolve_with_border(plane, &direction.kernel(), EDGE_BORDER);
                Zip::from(&mut strongest)
                    .and(&response)
                    .for_each(|best, &r| *best = best.max(r.abs()));
            }
            strongest
        }
    }
}

/// Kompas (compass) edge detection in one direction or all eight.
pub fn kompas(input: &RasterBuffer, params: &EdgeParams, compass: Compass) -> Result<RasterBuffer> {
    let plane = prepare(input, params)?;
    Ok(normalize_magnitude(&kompas_response(&plane, compass)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::core::convolve;
    use ndarray::array;

    fn gray(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> RasterBuffer {
        RasterBuffer::from_gray_fn(width, height, f)
    }

    fn reds(img: &RasterBuffer) -> Vec<u8> {
        img.as_raw().chunks(4).map(|px| px[0]).collect()
    }

    #[test]
    fn test_sobel_uniform_image_is_black() {
        let img = gray(5, 5, |_, _| 128);
        let result = sobel(&img, &EdgeParams::default()).unwrap();
        assert!(result.as_raw().chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_every_operator_on_uniform_image_is_black() {
        let img = gray(6, 4, |_, _| 77);
        let ops = [
            EdgeOperator::Sobel,
            EdgeOperator::Prewitt,
            EdgeOperator::Roberts { binarize: false },
            EdgeOperator::Roberts { binarize: true },
            EdgeOperator::LaplacianOfGaussian,
            EdgeOperator::Kompas(Compass::All),
            EdgeOperator::Kompas(Compass::Direction(CompassDirection::NE)),
        ];
        for op in ops {
            let result = edges(&img, op, &EdgeParams::default()).unwrap();
            assert!(reds(&result).iter().all(|&v| v == 0), "{op}");
        }
    }

    #[test]
    fn test_sobel_vertical_step() {
        let img = gray(6, 3, |x, _| if x < 3 { 0 } else { 255 });
        let result = sobel(&img, &EdgeParams::unsmoothed()).unwrap();
        for y in 0..3 {
            let row: Vec<u8> = (0..6).map(|x| result.pixel(x, y).unwrap()[0]).collect();
            assert_eq!(row, vec![0, 0, 255, 255, 0, 0]);
        }
    }

    #[test]
    fn test_image_frame_is_not_an_edge() {
        let img = gray(5, 5, |_, _| 200);
        let result = prewitt(&img, &EdgeParams::unsmoothed()).unwrap();
        assert!(reds(&result).iter().all(|&v| v == 0));

        // The zero-padded generic convolution would see a step at the frame.
        let (gx, _) = prewitt_kernels();
        let padded = convolve(&gray_plane(&img), &gx);
        assert_eq!(padded[[2, 2]], 0.0);
        assert!(padded[[2, 0]].abs() > 0.0);
    }

    #[test]
    fn test_roberts_diagonal_response() {
        // Single bright pixel: responds at itself and its top-left neighbours.
        let img = gray(4, 4, |x, y| if (x, y) == (2, 2) { 255 } else { 0 });
        let result = roberts(&img, &EdgeParams::unsmoothed(), false).unwrap();
        assert_eq!(result.pixel(2, 2).unwrap()[0], 255);
        assert_eq!(result.pixel(1, 1).unwrap()[0], 255);
        assert_eq!(result.pixel(2, 1).unwrap()[0], 255);
        assert_eq!(result.pixel(1, 2).unwrap()[0], 255);
        assert_eq!(result.pixel(0, 0).unwrap()[0], 0);
        assert_eq!(result.pixel(3, 3).unwrap()[0], 0);
    }

    #[test]
    fn test_roberts_binary_output() {
        let img = gray(8, 8, |x, y| ((x * 29 + y * 53) % 256) as u8);
        let result = roberts(&img, &EdgeParams::default(), true).unwrap();
        assert!(reds(&result).iter().all(|&v| v == 0 || v == 255));
        assert!(result.as_raw().chunks(4).all(|px| px[0] == px[1] && px[1] == px[2]));
    }

    #[test]
    fn test_roberts_threshold_is_strictly_above_30() {
        // One row: neighbour differences of 255, 30 and 31 normalize to
        // exactly 255, 30 and 31.
        let values = [0u8, 255, 225, 194];
        let img = gray(4, 1, |x, _| values[x]);

        let plain = roberts(&img, &EdgeParams::unsmoothed(), false).unwrap();
        assert_eq!(reds(&plain), vec![255, 30, 31, 0]);

        let binary = roberts(&img, &EdgeParams::unsmoothed(), true).unwrap();
        assert_eq!(reds(&binary), vec![255, 0, 255, 0]);
    }

    #[test]
    fn test_log_responds_to_point() {
        let img = gray(7, 7, |x, y| if (x, y) == (3, 3) { 255 } else { 0 });
        let result = laplacian_of_gaussian(&img, &EdgeParams::unsmoothed()).unwrap();
        assert_eq!(result.pixel(3, 3).unwrap()[0], 255);
        // Kernel weight -2 relative to the 16 center.
        assert_eq!(result.pixel(3, 2).unwrap()[0], 32);
        assert_eq!(result.pixel(0, 0).unwrap()[0], 0);
    }

    #[test]
    fn test_compass_kernels() {
        let n = CompassDirection::N.kernel();
        assert_eq!(n.weights(), &array![[1.0, 1.0, 1.0], [1.0, -2.0, 1.0], [-1.0, -1.0, -1.0]]);
        let s = CompassDirection::S.kernel();
        assert_eq!(s.weights(), &array![[-1.0, -1.0, -1.0], [1.0, -2.0, 1.0], [1.0, 1.0, 1.0]]);
        let e = CompassDirection::E.kernel();
        assert_eq!(e.weights(), &array![[-1.0, 1.0, 1.0], [-1.0, -2.0, 1.0], [-1.0, 1.0, 1.0]]);
        for d in CompassDirection::ALL {
            assert_eq!(d.kernel().weights().sum(), 0.0, "{d}");
        }
    }

    #[test]
    fn test_compass_all_is_max_over_directions() {
        let plane = Array2::from_shape_fn((6, 6), |(y, x)| ((x * 37 + y * 11) % 97) as f64);
        let all = kompas_response(&plane, Compass::All);
        for d in CompassDirection::ALL {
            let single = kompas_response(&plane, Compass::Direction(d));
            Zip::from(&all)
                .and(&single)
                .for_each(|&a, &s| assert!(a >= s.abs() - 1e-9));
        }
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!("Sobel".parse::<EdgeOperator>().unwrap(), EdgeOperator::Sobel);
        assert_eq!("log".parse::<EdgeOperator>().unwrap(), EdgeOperator::LaplacianOfGaussian);
        assert_eq!(
            "roberts".parse::<EdgeOperator>().unwrap(),
            EdgeOperator::Roberts { binarize: false }
        );
        assert_eq!("kompas".parse::<EdgeOperator>().unwrap(), EdgeOperator::Kompas(Compass::All));
        assert!(matches!(
            "canny".parse::<EdgeOperator>(),
            Err(ImageError::UnsupportedOperation(_))
        ));
        assert_eq!("sw".parse::<CompassDirection>().unwrap(), CompassDirection::SW);
        assert_eq!("ALL".parse::<Compass>().unwrap(), Compass::All);
        assert!("north".parse::<Compass>().is_err());
    }

    #[test]
    fn test_invalid_smoothing_is_rejected() {
        let img = gray(3, 3, |_, _| 0);
        let params = EdgeParams {
            smoothing: Some(GaussianParams { size: 4, sigma: 1.0 }),
        };
        assert!(edges(&img, EdgeOperator::Sobel, &params).is_err());
    }
}
