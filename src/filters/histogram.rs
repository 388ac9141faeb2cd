//! Histograms and histogram equalization.
//!
//! ## Global equalization
//!
//! Builds the R-channel histogram, takes its cumulative distribution and
//! remaps every intensity through
//!
//! ```text
//! table[v] = round((cdf[v] - cdf_min) / (cdf_max - cdf_min) * 255)
//! ```
//!
//! where `cdf_min` is the first non-zero CDF entry. The input is expected to
//! be grayscale already; each channel is looked up in the same table.
//!
//! ## Local equalization
//!
//! For every pixel, the histogram of its `n x n` neighbourhood (clipped to the
//! image, never padded) yields `floor(255 * cdf[v] / total)`. Rows are
//! processed in parallel, each with a sliding column histogram.

use std::ops::Index;

use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::error::{ImageError, Result};
use crate::filters::grayscale::{average, luma_plane};
use crate::raster::{quantize, Channel, RasterBuffer};

/// Number of intensity bins.
pub const BINS: usize = 256;

// ============================================================================
// Histogram types
// ============================================================================

/// Frequency of each 8-bit intensity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<u64>", into = "Vec<u64>"))]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    fn empty() -> Self {
        Self {
            counts: vec![0; BINS],
        }
    }

    #[inline]
    fn add(&mut self, value: u8) {
        self.counts[value as usize] += 1;
    }

    /// Counts indexed by intensity, always 256 entries.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of samples counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Prefix sums of the counts.
    pub fn cumulative(&self) -> CumulativeHistogram {
        let mut running = 0u64;
        let values = self
            .counts
            .iter()
            .map(|&count| {
                running += count;
                running
            })
            .collect();
        CumulativeHistogram { values }
    }
}

impl Index<u8> for Histogram {
    type Output = u64;

    fn index(&self, value: u8) -> &u64 {
        &self.counts[value as usize]
    }
}

impl TryFrom<Vec<u64>> for Histogram {
    type Error = ImageError;

    fn try_from(counts: Vec<u64>) -> Result<Self> {
        if counts.len() != BINS {
            return Err(ImageError::invalid_parameter(
                "counts",
                format!("expected {BINS} bins, got {}", counts.len()),
            ));
        }
        Ok(Self { counts })
    }
}

impl From<Histogram> for Vec<u64> {
    fn from(hist: Histogram) -> Self {
        hist.counts
    }
}

/// Cumulative distribution of a [`Histogram`]; non-decreasing, last entry is
/// the sample count.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CumulativeHistogram {
    values: Vec<u64>,
}

impl CumulativeHistogram {
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Total sample count (`cdf[255]`).
    pub fn total(&self) -> u64 {
        self.values[BINS - 1]
    }

    /// First non-zero entry, i.e. the count of the darkest occupied bin.
    pub fn first_nonzero(&self) -> Option<u64> {
        self.values.iter().copied().find(|&v| v > 0)
    }
}

impl Index<u8> for CumulativeHistogram {
    type Output = u64;

    fn index(&self, value: u8) -> &u64 {
        &self.values[value as usize]
    }
}

/// Cumulative distribution of `hist`.
pub fn cumulative(hist: &Histogram) -> CumulativeHistogram {
    hist.cumulative()
}

/// Red, green and blue histograms computed in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelHistograms {
    pub red: Histogram,
    pub green: Histogram,
    pub blue: Histogram,
}

/// Cumulative counterparts of [`ChannelHistograms`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelCumulative {
    pub red: CumulativeHistogram,
    pub green: CumulativeHistogram,
    pub blue: CumulativeHistogram,
}

impl ChannelHistograms {
    pub fn cumulative(&self) -> ChannelCumulative {
        ChannelCumulative {
            red: self.red.cumulative(),
            green: self.green.cumulative(),
            blue: self.blue.cumulative(),
        }
    }
}

// ============================================================================
// Histogram construction
// ============================================================================

/// Histogram of one channel, or of the grayscale-reduced image when `channel`
/// is `None`.
pub fn histogram(input: &RasterBuffer, channel: Option<Channel>) -> Histogram {
    let (width, height) = input.dimensions();
    let mut hist = Histogram::empty();
    for y in 0..height {
        for x in 0..width {
            let value = match channel {
                Some(ch) => input.sample(x, y, ch.index()),
                None => average(
                    input.sample(x, y, 0),
                    input.sample(x, y, 1),
                    input.sample(x, y, 2),
                ),
            };
            hist.add(value);
        }
    }
    hist
}

/// Histograms of R, G and B.
pub fn rgb_histograms(input: &RasterBuffer) -> ChannelHistograms {
    let (width, height) = input.dimensions();
    let mut red = Histogram::empty();
    let mut green = Histogram::empty();
    let mut blue = Histogram::empty();
    for y in 0..height {
        for x in 0..width {
            red.add(input.sample(x, y, 0));
            green.add(input.sample(x, y, 1));
            blue.add(input.sample(x, y, 2));
        }
    }
    ChannelHistograms { red, green, blue }
}

// ============================================================================
// Global equalization
// ============================================================================

/// Remapping table for global equalization of `hist`.
///
/// Fails with [`ImageError::DegenerateHistogram`] when every sample falls in
/// one bin, since `cdf_max == cdf_min` leaves the mapping undefined.
pub fn equalization_table(hist: &Histogram) -> Result<[u8; BINS]> {
    let cdf = hist.cumulative();
    let cdf_min = cdf.first_nonzero().ok_or(ImageError::DegenerateHistogram)?;
    let cdf_max = cdf.total();
    if cdf_max == cdf_min {
        return Err(ImageError::DegenerateHistogram);
    }

    let range = (cdf_max - cdf_min) as f64;
    let mut table = [0u8; BINS];
    for (v, slot) in table.iter_mut().enumerate() {
        *slot = quantize((cdf.values[v] as f64 - cdf_min as f64) / range * 255.0);
    }
    debug!(cdf_min, cdf_max, "equalization table built");
    Ok(table)
}

/// Global histogram equalization driven by the R channel.
///
/// # Arguments
/// * `input` - Grayscale raster (R = G = B); other inputs are remapped with
///   the red channel's table
///
/// # Returns
/// Equalized raster, or `DegenerateHistogram` for a constant image
#[instrument(skip_all, fields(width = input.width(), height = input.height()))]
pub fn equalize_global(input: &RasterBuffer) -> Result<RasterBuffer> {
    let table = equalization_table(&histogram(input, Some(Channel::Red)))?;
    Ok(input.map_rgb(|_, v| table[v as usize]))
}

/// Equalize R, G and B independently, each against its own distribution.
///
/// A constant channel has no distribution to spread and is passed through
/// unchanged.
#[instrument(skip_all, fields(width = input.width(), height = input.height()))]
pub fn equalize_channels(input: &RasterBuffer) -> Result<RasterBuffer> {
    let hists = rgb_histograms(input);
    let mut tables = [[0u8; BINS]; 3];
    for (c, hist) in [&hists.red, &hists.green, &hists.blue].into_iter().enumerate() {
        tables[c] = match equalization_table(hist) {
            Ok(table) => table,
            Err(ImageError::DegenerateHistogram) => {
                debug!(channel = c, "constant channel left unchanged");
                identity_table()
            }
            Err(err) => return Err(err),
        };
    }
    Ok(input.map_rgb(|c, v| tables[c][v as usize]))
}

fn identity_table() -> [u8; BINS] {
    let mut table = [0u8; BINS];
    for (v, slot) in table.iter_mut().enumerate() {
        *slot = v as u8;
    }
    table
}

// ============================================================================
// Local equalization
// ============================================================================

/// Luma of every pixel binned to an intensity.
fn luma_bins(input: &RasterBuffer) -> Array2<u8> {
    // The epsilon keeps exact integers such as 255 * (0.299 + 0.587 + 0.114)
    // from flooring one bin low.
    luma_plane(input).mapv(|v| (v + 1e-9).floor().clamp(0.0, 255.0) as u8)
}

/// Sliding-window equalization of one output row.
fn equalize_row(bins: &Array2<u8>, y: usize, half: usize) -> Vec<u8> {
    let (height, width) = bins.dim();
    let y0 = y.saturating_sub(half);
    let y1 = (y + half).min(height - 1);
    let rows = (y1 - y0 + 1) as u64;

    let mut hist = [0u64; BINS];
    let add_column = |hist: &mut [u64; BINS], x: usize| {
        for yy in y0..=y1 {
            hist[bins[[yy, x]] as usize] += 1;
        }
    };
    let remove_column = |hist: &mut [u64; BINS], x: usize| {
        for yy in y0..=y1 {
            hist[bins[[yy, x]] as usize] -= 1;
        }
    };

    for x in 0..=half.min(width - 1) {
        add_column(&mut hist, x);
    }

    let mut out = Vec::with_capacity(width);
    for x in 0..width {
        if x > 0 {
            if x + half < width {
                add_column(&mut hist, x + half);
            }
            if x > half {
                remove_column(&mut hist, x - half - 1);
            }
        }

        let cols = ((x + half).min(width - 1) - x.saturating_sub(half) + 1) as u64;
        let total = rows * cols;
        let value = bins[[y, x]] as usize;
        let cdf: u64 = hist[..=value].iter().sum();
        // floor(255 / total * cdf), evaluated exactly.
        out.push((255 * cdf / total) as u8);
    }
    out
}

/// Local (windowed) histogram equalization.
///
/// # Arguments
/// * `input` - Source raster, reduced to BT.601 luma internally
/// * `window` - Odd neighbourhood size, at least 1
///
/// # Returns
/// Grayscale raster with the equalized value in R, G and B
#[instrument(skip_all, fields(width = input.width(), height = input.height(), window = window))]
pub fn equalize_local(input: &RasterBuffer, window: usize) -> Result<RasterBuffer> {
    if window == 0 || window % 2 == 0 {
        return Err(ImageError::invalid_parameter(
            "window",
            format!("window size must be odd and at least 1, got {window}"),
        ));
    }
    let (width, height) = input.dimensions();
    let half = window / 2;
    let bins = luma_bins(input);

    let rows: Vec<Vec<u8>> = (0..height)
        .into_par_iter()
        .map(|y| equalize_row(&bins, y, half))
        .collect();

    debug!(half, "local equalization finished");
    Ok(RasterBuffer::from_gray_fn(width, height, |x, y| rows[y][x]))
}
