//! Cellular-automaton noise smoothing.

use spotcount_core::{GrayImage, GrayImageView};

use crate::VON_NEUMANN;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Majority vote over a center value followed by its neighbours.
///
/// The most frequent value wins. If the center is tied for the highest
/// count it is kept; among other tied values the one that reached the
/// maximum first wins.
pub fn majority_vote(center: u8, neighbours: [u8; 4]) -> u8 {
    let mut counts = [0u8; 256];
    let mut best_count = 0u8;
    let mut best_value = center;
    for v in std::iter::once(center).chain(neighbours) {
        let c = &mut counts[v as usize];
        *c += 1;
        if *c > best_count {
            best_count = *c;
            best_value = v;
        }
    }
    if counts[center as usize] == best_count {
        center
    } else {
        best_value
    }
}

/// Apply one majority-vote pass to every interior pixel.
///
/// Border pixels are copied unchanged. Reads come only from `src`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src), fields(width = src.width, height = src.height))
)]
pub fn reduce_noise(src: &GrayImageView<'_>) -> GrayImage {
    let mut out = src.to_grid();
    let mut changed = 0usize;
    for y in 0..src.height {
        for x in 0..src.width {
            if src.is_border(x, y) {
                continue;
            }
            let center = src.at(x, y);
            let neighbours = VON_NEUMANN.map(|(dx, dy)| {
                src.at(x.wrapping_add_signed(dx), y.wrapping_add_signed(dy))
            });
            let v = majority_vote(center, neighbours);
            if v != center {
                out.set(x, y, v);
                changed += 1;
            }
        }
    }
    log::trace!("noise reduction changed {changed} pixels");
    out
}
