//! Threshold edge classification over the von Neumann neighbourhood.

use spotcount_core::{GrayImage, GrayImageView};

use crate::VON_NEUMANN;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Intensity written for edge pixels.
pub const EDGE: u8 = 255;
/// Intensity written for everything else.
pub const NON_EDGE: u8 = 0;

#[inline]
fn is_edge(src: &GrayImageView<'_>, x: usize, y: usize, epsilon: u8) -> bool {
    if src.is_border(x, y) {
        return false;
    }
    let center = src.at(x, y);
    VON_NEUMANN.iter().any(|&(dx, dy)| {
        let n = src.at(x.wrapping_add_signed(dx), y.wrapping_add_signed(dy));
        center.abs_diff(n) > epsilon
    })
}

/// Mark an interior pixel as an edge when its intensity differs from any
/// orthogonal neighbour by more than `epsilon`. Border pixels are never edges.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src), fields(width = src.width, height = src.height))
)]
pub fn detect_edges(src: &GrayImageView<'_>, epsilon: u8) -> GrayImage {
    let mut out = GrayImage::filled(src.width, src.height, NON_EDGE);
    for y in 0..src.height {
        for x in 0..src.width {
            if is_edge(src, x, y, epsilon) {
                out.set(x, y, EDGE);
            }
        }
    }
    log::debug!(
        "edge detection (epsilon={epsilon}): {} edge pixels",
        out.count_value(EDGE)
    );
    out
}
