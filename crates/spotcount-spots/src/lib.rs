//! Spot counting on binary edge maps.
//!
//! Design:
//! - Build a thin ring template per scale (radius `r1..=r2`) from a fixed
//!   calibration table.
//! - Slide each template over the edge map (top-left anchored) and score
//!   every window by sum of absolute differences.
//! - Count a match only when its central footprint touches no pixel already
//!   credited to an earlier match, at this scale or a smaller one.
//!
//! It does **not** produce the edge map. Feed it the output of
//! `spotcount-filters` or any other 0/255 grid.

mod calibration;
mod error;
mod mask;
mod matcher;
mod types;

pub use calibration::{calibration, ScaleCalibration, CALIBRATION, MAX_SCALE_SPAN};
pub use error::SpotDetectError;
pub use mask::{mask_side, Mask, MASK_OFF, MASK_ON};
pub use matcher::SpotDetector;
pub use types::{CountedSpot, ScaleReport, SpotDetectParams, SpotDetectionResult};
