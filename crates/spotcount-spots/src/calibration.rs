//! Empirical per-scale matching constants.

use serde::{Deserialize, Serialize};

/// Template and acceptance settings for one scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleCalibration {
    /// Half-width of the ring band, in squared-distance units.
    pub ring_width: i64,
    /// Inward shift of the ring radius.
    pub delta: i64,
    /// A window matches when its SAD score is strictly below this.
    pub max_diff: u32,
}

const fn entry(ring_width: i64, delta: i64, max_diff: u32) -> ScaleCalibration {
    ScaleCalibration {
        ring_width,
        delta,
        max_diff,
    }
}

/// Indexed by scale `s = radius - r1`. Hand-tuned; there is no formula.
pub const CALIBRATION: [ScaleCalibration; 8] = [
    entry(6, 0, 4800),
    entry(9, 1, 6625),
    entry(12, 1, 11000),
    entry(15, 1, 15000),
    entry(18, 1, 19000),
    entry(21, 1, 23000),
    entry(24, 2, 28000),
    entry(27, 2, 35000),
];

/// Largest supported `r2 - r1`.
pub const MAX_SCALE_SPAN: usize = CALIBRATION.len() - 1;

/// Calibration for a scale index, or `None` past the end of the table.
#[inline]
pub fn calibration(scale: usize) -> Option<ScaleCalibration> {
    CALIBRATION.get(scale).copied()
}
