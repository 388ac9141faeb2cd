//! Two-image channel compositor.
//!
//! Combines two rasters channel by channel under a [`BlendOperation`]. Inputs
//! of different size are cropped to their common top-left region; nothing is
//! scaled. Alpha of the result is always 255.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::error::ImageError;
use crate::raster::{quantize, RasterBuffer};

/// Per-channel binary combinator. `G1` is the first image, `G2` the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendOperation {
    And,
    Or,
    Xor,
    Xnor,
    Nand,
    Nor,
    NotG1,
    NotG2,
    G1NotG2,
    G2NotG1,
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl BlendOperation {
    pub const ALL: [BlendOperation; 14] = [
        BlendOperation::And,
        BlendOperation::Or,
        BlendOperation::Xor,
        BlendOperation::Xnor,
        BlendOperation::Nand,
        BlendOperation::Nor,
        BlendOperation::NotG1,
        BlendOperation::NotG2,
        BlendOperation::G1NotG2,
        BlendOperation::G2NotG1,
        BlendOperation::Addition,
        BlendOperation::Subtraction,
        BlendOperation::Multiplication,
        BlendOperation::Division,
    ];

    /// Tag used by UIs and bindings, e.g. `"NOT G1"` or `"Addition"`.
    pub const fn tag(self) -> &'static str {
        match self {
            BlendOperation::And => "AND",
            BlendOperation::Or => "OR",
            BlendOperation::Xor => "XOR",
            BlendOperation::Xnor => "XNOR",
            BlendOperation::Nand => "NAND",
            BlendOperation::Nor => "NOR",
            BlendOperation::NotG1 => "NOT G1",
            BlendOperation::NotG2 => "NOT G2",
            BlendOperation::G1NotG2 => "G1 NOT G2",
            BlendOperation::G2NotG1 => "G2 NOT G1",
            BlendOperation::Addition => "Addition",
            BlendOperation::Subtraction => "Subtraction",
            BlendOperation::Multiplication => "Multiplication",
            BlendOperation::Division => "Division",
        }
    }

    /// Combine one channel value of each image.
    #[inline]
    pub fn apply(self, v1: u8, v2: u8) -> u8 {
        match self {
            BlendOperation::And => v1 & v2,
            BlendOperation::Or => v1 | v2,
            BlendOperation::Xor => v1 ^ v2,
            BlendOperation::Xnor => 255 - (v1 ^ v2),
            BlendOperation::Nand => 255 - (v1 & v2),
            BlendOperation::Nor => 255 - (v1 | v2),
            BlendOperation::NotG1 => 255 - v1,
            BlendOperation::NotG2 => 255 - v2,
            BlendOperation::G1NotG2 => v1 & (255 - v2),
            BlendOperation::G2NotG1 => v2 & (255 - v1),
            BlendOperation::Addition => v1.saturating_add(v2),
            BlendOperation::Subtraction => v1.saturating_sub(v2),
            BlendOperation::Multiplication => quantize(v1 as f64 * v2 as f64 / 255.0),
            BlendOperation::Division => {
                if v2 == 0 {
                    255
                } else {
                    quantize((v1 as f64 / v2 as f64 * 255.0).min(255.0))
                }
            }
        }
    }
}

impl fmt::Display for BlendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for BlendOperation {
    type Err = ImageError;

    /// Parse a tag as produced by [`BlendOperation::tag`], ignoring case and
    /// surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BlendOperation::ALL
            .into_iter()
            .find(|op| op.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ImageError::UnsupportedOperation(format!("blend operation `{wanted}`")))
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Blend two rasters channel by channel.
///
/// # Arguments
/// * `first` - Image `G1`
/// * `second` - Image `G2`
/// * `op` - Combinator applied to each of R, G and B
///
/// # Returns
/// Raster of size `(min(W1, W2), min(H1, H2))` with alpha 255
#[instrument(skip_all, fields(op = %op))]
pub fn composite(first: &RasterBuffer, second: &RasterBuffer, op: BlendOperation) -> RasterBuffer {
    let width = first.width().min(second.width());
    let height = first.height().min(second.height());
    if first.dimensions() != second.dimensions() {
        debug!(width, height, "cropping inputs to common region");
    }

    RasterBuffer::from_rgb_fn(width, height, |x, y| {
        let mut out = [0u8; 3];
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = op.apply(first.sample(x, y, c), second.sample(x, y, c));
        }
        out
    })
}

/// Negative of `input`, expressed as `composite(input, input, NOT G1)`.
pub fn invert(input: &RasterBuffer) -> RasterBuffer {
    composite(input, input, BlendOperation::NotG1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::color_adjust::negative;

    fn image(width: usize, height: usize, seed: u32) -> RasterBuffer {
        let mut data = Vec::with_capacity(width * height * 4);
        for i in 0..(width * height) as u32 {
            data.push(((i * 37 + seed) % 256) as u8);
            data.push(((i * 91 + seed * 3) % 256) as u8);
            data.push(((i * 13 + seed * 7) % 256) as u8);
            data.push((seed % 256) as u8);
        }
        RasterBuffer::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_output_is_cropped_to_common_region() {
        let a = image(5, 3, 1);
        let b = image(2, 7, 2);
        let result = composite(&a, &b, BlendOperation::Addition);
        assert_eq!(result.dimensions(), (2, 3));
        assert!(result.as_raw().chunks(4).all(|px| px[3] == 255));
        // Cropping keeps the top-left pixels of both inputs.
        let expected = a.pixel(1, 2).unwrap()[0].saturating_add(b.pixel(1, 2).unwrap()[0]);
        assert_eq!(result.pixel(1, 2).unwrap()[0], expected);
    }

    #[test]
    fn test_bitwise_ops_are_commutative() {
        let a = image(4, 4, 5);
        let b = image(4, 4, 11);
        for op in [BlendOperation::And, BlendOperation::Or, BlendOperation::Xor] {
            assert_eq!(composite(&a, &b, op), composite(&b, &a, op), "{op}");
        }
    }

    #[test]
    fn test_xor_with_self_is_black() {
        let a = image(3, 3, 9);
        let result = composite(&a, &a, BlendOperation::Xor);
        assert!(result.as_raw().chunks(4).all(|px| px[..3] == [0, 0, 0]));
    }

    #[test]
    fn test_not_g1_with_self_is_negative() {
        let a = image(3, 2, 4);
        assert_eq!(composite(&a, &a, BlendOperation::NotG1), negative(&a));
        assert_eq!(invert(&a), negative(&a));
    }

    #[test]
    fn test_channel_formulas() {
        let cases = [
            (BlendOperation::And, 0b1100, 0b1010, 0b1000),
            (BlendOperation::Or, 0b1100, 0b1010, 0b1110),
            (BlendOperation::Xor, 0b1100, 0b1010, 0b0110),
            (BlendOperation::Xnor, 0b1100, 0b1010, 255 - 0b0110),
            (BlendOperation::Nand, 0b1100, 0b1010, 255 - 0b1000),
            (BlendOperation::Nor, 0b1100, 0b1010, 255 - 0b1110),
            (BlendOperation::NotG1, 10, 99, 245),
            (BlendOperation::NotG2, 10, 99, 156),
            (BlendOperation::G1NotG2, 0xF0, 0x30, 0xC0),
            (BlendOperation::G2NotG1, 0xF0, 0x3C, 0x0C),
            (BlendOperation::Addition, 200, 100, 255),
            (BlendOperation::Addition, 20, 30, 50),
            (BlendOperation::Subtraction, 20, 30, 0),
            (BlendOperation::Subtraction, 30, 20, 10),
            (BlendOperation::Multiplication, 255, 128, 128),
            (BlendOperation::Multiplication, 100, 100, 39),
            (BlendOperation::Division, 50, 100, 128),
            (BlendOperation::Division, 200, 100, 255),
            (BlendOperation::Division, 7, 0, 255),
        ];
        for (op, v1, v2, expected) in cases {
            assert_eq!(op.apply(v1, v2), expected, "{op}({v1}, {v2})");
        }
    }

    #[test]
    fn test_division_by_zero_pixel_is_white() {
        let a = RasterBuffer::from_raw(1, 1, vec![10, 0, 200, 255]).unwrap();
        let b = RasterBuffer::from_raw(1, 1, vec![0, 0, 100, 255]).unwrap();
        let result = composite(&a, &b, BlendOperation::Division);
        assert_eq!(result.pixel(0, 0).unwrap(), [255, 255, 255, 255]);
    }

    #[test]
    fn test_parse_tags() {
        for op in BlendOperation::ALL {
            assert_eq!(op.tag().parse::<BlendOperation>().unwrap(), op);
        }
        assert_eq!("g1 not g2".parse::<BlendOperation>().unwrap(), BlendOperation::G1NotG2);
        assert!(matches!(
            "Screen".parse::<BlendOperation>(),
            Err(ImageError::UnsupportedOperation(_))
        ));
    }
}
