//! Weighted RGB to intensity reduction.

use spotcount_core::{GrayImage, RgbImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Perceptual intensity `floor(0.299 R + 0.587 G + 0.114 B)`.
///
/// Evaluated in fixed point so the floor is exact: binary floating point
/// would round grey inputs such as `(1, 1, 1)` down to 0.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    (weighted / 1000) as u8
}

/// Reduce an RGB grid to a single-channel grid of the same size.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src), fields(width = src.width, height = src.height))
)]
pub fn rgb_to_gray(src: &RgbImageView<'_>) -> GrayImage {
    GrayImage {
        width: src.width,
        height: src.height,
        data: src.data.iter().map(|&[r, g, b]| luma(r, g, b)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotcount_core::RgbImage;

    #[test]
    fn luma_matches_weighted_floor() {
        assert_eq!(luma(255, 0, 0), 76); // 76.245
        assert_eq!(luma(0, 255, 0), 149); // 149.685
        assert_eq!(luma(0, 0, 255), 29); // 29.07
        assert_eq!(luma(10, 120, 5), 74); // 2.99 + 70.44 + 0.57 = 74.0
        assert_eq!(luma(0, 160, 220), 119); // 93.92 + 25.08 = 119.0
    }

    #[test]
    fn luma_is_identity_on_grey() {
        for v in 0..=255u8 {
            assert_eq!(luma(v, v, v), v);
        }
    }

    #[test]
    fn greyscale_is_idempotent_on_grey_grids() {
        let rgb = RgbImage::from_rows(&[[[3, 3, 3], [128, 128, 128]], [[254, 254, 254], [0, 0, 0]]])
            .expect("grid");
        let gray = rgb_to_gray(&rgb.view());
        assert_eq!(gray.data, vec![3, 128, 254, 0]);
        assert_eq!(rgb_to_gray(&gray.to_rgb().view()), gray);
    }
}
