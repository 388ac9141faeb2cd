//! Filter modules for RGBA pixel transforms.
//!
//! ## Pixel Format
//!
//! Every filter reads and writes a [`RasterBuffer`](crate::raster::RasterBuffer):
//!
//! | Shape | Type | Description |
//! |-------|------|-------------|
//! | (H, W, 4) | u8 | Red, green, blue, alpha, 0-255 |
//!
//! Input alpha is ignored; every output pixel has alpha 255.
//!
//! ## Filter Categories
//!
//! - **Pixel-wise**: grayscale, negative, gamma, log, bit-plane slicing
//! - **Tonal**: histogram, contrast and intensity stretching
//! - **Histogram**: histograms, CDFs, global/per-channel/local equalization
//! - **Compositing**: two-image bitwise and arithmetic blends
//! - **Edge detection**: Sobel, Prewitt, Roberts, LoG, Kompas
//!
//! Convolution and local equalization run row-parallel on rayon.

pub mod grayscale;
pub mod color_adjust;
pub mod levels;
pub mod histogram;
pub mod blend;

// Convolution engine and the operators built on it
pub mod core;
pub mod edge;
