//! RGBA raster buffer shared by every filter.
//!
//! A [`RasterBuffer`] owns an `ndarray::Array3<u8>` of shape
//! `(height, width, 4)`. Every buffer produced by a filter in this crate has
//! alpha fixed at 255; alpha of externally sourced input is ignored.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array3, ArrayView3, Axis};

use crate::error::{ImageError, Result};

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Alpha value written by every filter.
pub const OPAQUE: u8 = 255;

/// One of the four interleaved channels of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    /// The three color channels, in storage order.
    pub const RGB: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Offset of the channel inside an RGBA pixel.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Alpha => "alpha",
        };
        f.write_str(name)
    }
}

impl FromStr for Channel {
    type Err = ImageError;

    /// Accepts the full name or its first letter, ignoring case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" | "red" => Ok(Channel::Red),
            "g" | "green" => Ok(Channel::Green),
            "b" | "blue" => Ok(Channel::Blue),
            "a" | "alpha" => Ok(Channel::Alpha),
            other => Err(ImageError::UnsupportedOperation(format!("channel `{other}`"))),
        }
    }
}

/// Owned W×H grid of RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    pixels: Array3<u8>,
}

impl RasterBuffer {
    /// Opaque black raster of the given size.
    ///
    /// Zero-sized rasters are rejected with [`ImageError::InvalidDimensions`].
    pub fn new(width: usize, height: usize) -> Result<Self> {
        byte_len(width, height, 0)?;
        let mut pixels = Array3::<u8>::zeros((height, width, CHANNELS));
        pixels.index_axis_mut(Axis(2), 3).fill(OPAQUE);
        Ok(Self { pixels })
    }

    /// Wrap an interleaved RGBA byte vector (row-major, 4 bytes per pixel).
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        if len != byte_len(width, height, len)? {
            return Err(ImageError::InvalidDimensions { width, height, len });
        }
        let pixels = Array3::from_shape_vec((height, width, CHANNELS), data)
            .map_err(|_| ImageError::InvalidDimensions { width, height, len })?;
        Ok(Self { pixels })
    }

    /// Wrap an existing `(height, width, 4)` array.
    pub fn from_array(pixels: Array3<u8>) -> Result<Self> {
        let (height, width, channels) = pixels.dim();
        let len = pixels.len();
        byte_len(width, height, len)?;
        if channels != CHANNELS {
            return Err(ImageError::InvalidDimensions { width, height, len });
        }
        let pixels = if pixels.is_standard_layout() {
            pixels
        } else {
            pixels.as_standard_layout().into_owned()
        };

        // A sliced array can start past the front of its backing vector, or
        // stop short of its end; keep only the visible elements.
        let (mut data, offset) = pixels.into_raw_vec_and_offset();
        data.drain(..offset.unwrap_or(0));
        data.truncate(len);
        let pixels = Array3::from_shape_vec((height, width, CHANNELS), data)
            .map_err(|_| ImageError::InvalidDimensions { width, height, len })?;
        Ok(Self { pixels })
    }

    /// Build an opaque raster from a per-pixel RGB function.
    pub(crate) fn from_rgb_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> [u8; 3],
    {
        let mut pixels = Array3::<u8>::zeros((height, width, CHANNELS));
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = f(x, y);
                pixels[[y, x, 0]] = r;
                pixels[[y, x, 1]] = g;
                pixels[[y, x, 2]] = b;
                pixels[[y, x, 3]] = OPAQUE;
            }
        }
        Self { pixels }
    }

    /// Build an opaque grayscale raster, writing the same value into R, G, B.
    pub(crate) fn from_gray_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> u8,
    {
        let mut pixels = Array3::<u8>::zeros((height, width, CHANNELS));
        for y in 0..height {
            for x in 0..width {
                let v = f(x, y);
                pixels[[y, x, 0]] = v;
                pixels[[y, x, 1]] = v;
                pixels[[y, x, 2]] = v;
                pixels[[y, x, 3]] = OPAQUE;
            }
        }
        Self { pixels }
    }

    /// Apply `f` to every color channel value, forcing alpha to 255.
    pub(crate) fn map_rgb<F>(&self, f: F) -> Self
    where
        F: Fn(usize, u8) -> u8,
    {
        let mut pixels = self.pixels.clone();
        for mut px in pixels.lanes_mut(Axis(2)) {
            for c in 0..3 {
                let v = px[c];
                px[c] = f(c, v);
            }
            px[3] = OPAQUE;
        }
        Self { pixels }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    /// `(width, height)`
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Read one channel of one pixel.
    pub fn get(&self, x: usize, y: usize, channel: Channel) -> Result<u8> {
        self.check_bounds(x, y, channel)?;
        Ok(self.pixels[[y, x, channel.index()]])
    }

    /// Write one channel of one pixel.
    pub fn set(&mut self, x: usize, y: usize, channel: Channel, value: u8) -> Result<()> {
        self.check_bounds(x, y, channel)?;
        self.pixels[[y, x, channel.index()]] = value;
        Ok(())
    }

    /// Read a whole RGBA pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Result<[u8; 4]> {
        self.check_bounds(x, y, Channel::Red)?;
        Ok([
            self.pixels[[y, x, 0]],
            self.pixels[[y, x, 1]],
            self.pixels[[y, x, 2]],
            self.pixels[[y, x, 3]],
        ])
    }

    /// Unchecked channel read for filters that already iterate inside bounds.
    #[inline]
    pub(crate) fn sample(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.pixels[[y, x, channel]]
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Interleaved RGBA bytes in row-major order.
    pub fn as_raw(&self) -> &[u8] {
        // Buffers are always built in standard layout.
        self.pixels.as_slice().unwrap_or(&[])
    }

    /// Owned RGBA bytes; always `width * height * 4` long, since every
    /// constructor stores a compact array.
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels.into_raw_vec_and_offset().0
    }

    pub fn into_array(self) -> Array3<u8> {
        self.pixels
    }

    fn check_bounds(&self, x: usize, y: usize, channel: Channel) -> Result<()> {
        let (width, height) = self.dimensions();
        if x >= width || y >= height {
            return Err(ImageError::OutOfBounds {
                x,
                y,
                channel: channel.index(),
                width,
                height,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for RasterBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Byte length of a `width` x `height` RGBA raster. `len` is only reported
/// back in the error for zero-sized or overflowing dimensions.
fn byte_len(width: usize, height: usize, len: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height, len });
    }
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
        .ok_or(ImageError::InvalidDimensions { width, height, len })
}

/// Round to nearest and saturate into the 8-bit channel range.
#[inline]
pub(crate) fn quantize(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn test_new_is_opaque_black() {
        let buf = RasterBuffer::new(3, 2).unwrap();
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.pixel(2, 1).unwrap(), [0, 0, 0, 255]);
        assert_eq!(buf.as_raw().len(), 3 * 2 * 4);
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let err = RasterBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidDimensions {
                width: 2,
                height: 2,
                len: 15
            }
        );
    }

    #[test]
    fn test_zero_sized_raster_is_rejected() {
        assert!(RasterBuffer::new(0, 4).is_err());
        assert!(RasterBuffer::from_raw(4, 0, Vec::new()).is_err());
    }

    #[test]
    fn test_huge_dimensions_are_rejected() {
        assert!(matches!(
            RasterBuffer::new(usize::MAX, 2),
            Err(ImageError::InvalidDimensions { .. })
        ));
        assert!(RasterBuffer::from_raw(usize::MAX / 2, 3, vec![0; 4]).is_err());
    }

    #[test]
    fn test_from_array_of_sliced_rows() {
        let full = Array3::from_shape_fn((3, 2, 4), |(y, x, c)| (y * 100 + x * 4 + c) as u8);
        let tail = full.slice_move(s![1.., .., ..]);
        let buf = RasterBuffer::from_array(tail).unwrap();
        assert_eq!(buf.dimensions(), (2, 2));
        assert_eq!(buf.as_raw().len(), 16);
        assert_eq!(buf.pixel(0, 0).unwrap(), [100, 101, 102, 103]);
        let raw = buf.clone().into_raw();
        assert_eq!(raw.len(), 16);
        assert_eq!(raw, buf.as_raw());
    }

    #[test]
    fn test_from_array_of_strided_columns() {
        let full = Array3::from_shape_fn((2, 4, 4), |(y, x, c)| (y * 16 + x * 4 + c) as u8);
        let even = full.slice_move(s![.., ..;2, ..]);
        let raw = RasterBuffer::from_array(even).unwrap().into_raw();
        assert_eq!(&raw[..8], &[0, 1, 2, 3, 8, 9, 10, 11]);
        assert_eq!(raw.len(), 16);
    }

    #[test]
    fn test_from_raw_is_row_major() {
        let data: Vec<u8> = (0..16).collect();
        let buf = RasterBuffer::from_raw(2, 2, data).unwrap();
        // Second pixel of the first row starts at byte 4.
        assert_eq!(buf.pixel(1, 0).unwrap(), [4, 5, 6, 7]);
        assert_eq!(buf.get(0, 1, Channel::Blue).unwrap(), 10);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut buf = RasterBuffer::new(2, 2).unwrap();
        assert!(matches!(
            buf.get(2, 0, Channel::Red),
            Err(ImageError::OutOfBounds { x: 2, y: 0, .. })
        ));
        assert!(buf.set(0, 5, Channel::Green, 1).is_err());
        buf.set(1, 1, Channel::Green, 42).unwrap();
        assert_eq!(buf.get(1, 1, Channel::Green).unwrap(), 42);
    }

    #[test]
    fn test_map_rgb_forces_alpha() {
        let buf = RasterBuffer::from_raw(1, 1, vec![1, 2, 3, 7]).unwrap();
        let out = buf.map_rgb(|_, v| v + 1);
        assert_eq!(out.pixel(0, 0).unwrap(), [2, 3, 4, 255]);
        // Input untouched.
        assert_eq!(buf.pixel(0, 0).unwrap(), [1, 2, 3, 7]);
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!("R".parse::<Channel>().unwrap(), Channel::Red);
        assert_eq!("blue".parse::<Channel>().unwrap(), Channel::Blue);
        assert!("luma".parse::<Channel>().is_err());
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        assert_eq!(quantize(1.49), 1);
        assert_eq!(quantize(1.5), 2);
        assert_eq!(quantize(-3.0), 0);
        assert_eq!(quantize(300.0), 255);
    }
}
