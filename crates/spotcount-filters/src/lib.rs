//! Per-pixel filters that turn a colour photograph into a binary edge map.
//!
//! The stages run in this order:
//! - [`rgb_to_gray`]: weighted greyscale reduction,
//! - [`reduce_noise`]: majority vote over the von Neumann neighbourhood,
//! - [`detect_edges`]: OR-of-four-directions intensity threshold.
//!
//! Every stage reads only its input grid and returns a fresh one, so results
//! never depend on scan order.

mod edges;
mod greyscale;
mod noise;

pub use edges::{detect_edges, EDGE, NON_EDGE};
pub use greyscale::{luma, rgb_to_gray};
pub use noise::{majority_vote, reduce_noise};

/// Orthogonal neighbour offsets, in the order they are visited.
pub(crate) const VON_NEUMANN: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
