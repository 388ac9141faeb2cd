//! Decode and encode collaborators backed by the `image` crate.
//!
//! Decoding accepts anything the enabled `image` codecs understand (PNG, JPEG,
//! BMP) and always yields RGBA8. Encoding writes the raster in the requested
//! container; formats without an alpha channel receive RGB.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, instrument};

use crate::error::{ImageError, Result};
use crate::raster::RasterBuffer;

/// Decode an encoded image into an RGBA raster.
///
/// # Returns
/// The decoded raster, or `Decode` when the bytes are not a readable image
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<RasterBuffer> {
    let image = image::load_from_memory(bytes).map_err(|err| ImageError::Decode(err.to_string()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(width, height, "decoded image");
    RasterBuffer::from_raw(width as usize, height as usize, rgba.into_raw())
}

/// Encode `buffer` as `format`.
#[instrument(skip_all, fields(format = ?format, width = buffer.width(), height = buffer.height()))]
pub fn encode(buffer: &RasterBuffer, format: ImageFormat) -> Result<Vec<u8>> {
    let (width, height) = buffer.dimensions();
    let too_large = || ImageError::Encode(format!("{width}x{height} exceeds encoder limits"));
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;

    let rgba = RgbaImage::from_raw(w, h, buffer.as_raw().to_vec()).ok_or_else(too_large)?;
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
        _ => DynamicImage::ImageRgba8(rgba),
    };

    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ImageError::Encode(err.to_string()))?;
    debug!(len = bytes.len(), "encoded image");
    Ok(bytes)
}
