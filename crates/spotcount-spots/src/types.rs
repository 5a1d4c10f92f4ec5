use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use spotcount_core::GrayImage;

use crate::mask::mask_side;
use crate::{SpotDetectError, MAX_SCALE_SPAN};

fn default_dedup() -> bool {
    true
}

/// Parameters for spot detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotDetectParams {
    /// Smallest spot radius in pixels (scale 0).
    pub r1: usize,
    /// Largest spot radius in pixels; `r2 - r1` selects the last scale.
    pub r2: usize,
    /// Suppress matches whose center footprint overlaps an earlier one.
    ///
    /// Turning this off counts every accepted window and is only useful for
    /// diagnostics.
    #[serde(default = "default_dedup")]
    pub dedup: bool,
}

impl Default for SpotDetectParams {
    fn default() -> Self {
        Self {
            r1: 4,
            r2: 4 + MAX_SCALE_SPAN,
            dedup: true,
        }
    }
}

impl SpotDetectParams {
    pub fn new(r1: usize, r2: usize) -> Self {
        Self {
            r1,
            r2,
            dedup: true,
        }
    }

    /// Number of scales after `r1`, if the range is supported.
    pub fn span(&self) -> Result<usize, SpotDetectError> {
        match self.r2.checked_sub(self.r1) {
            Some(span) if span <= MAX_SCALE_SPAN => Ok(span),
            _ => Err(SpotDetectError::CalibrationRangeExceeded {
                r1: self.r1,
                r2: self.r2,
                max: MAX_SCALE_SPAN,
            }),
        }
    }
}

/// Scan statistics for one template radius.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleReport {
    pub scale: usize,
    pub radius: usize,
    pub mask_side: usize,
    /// Window positions visited, including blank ones.
    pub windows: usize,
    /// Windows whose score passed the threshold.
    pub matches: usize,
    /// Matches added to the spot count.
    pub counted: usize,
}

impl ScaleReport {
    /// Report for a scale whose mask does not fit the image.
    pub fn skipped(scale: usize, radius: usize) -> Self {
        Self {
            scale,
            radius,
            mask_side: mask_side(radius).unwrap_or(0),
            windows: 0,
            matches: 0,
            counted: 0,
        }
    }
}

/// A match that was added to the spot count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedSpot {
    /// Template center in image coordinates (window origin + radius).
    pub center: Point2<usize>,
    pub radius: usize,
    pub scale: usize,
    /// Sum of absolute differences against the ring template.
    pub score: u32,
}

/// Spot detection result.
#[derive(Clone, Debug, Serialize)]
pub struct SpotDetectionResult {
    /// Total number of counted spots over all scales.
    pub count: usize,
    pub scales: Vec<ScaleReport>,
    pub spots: Vec<CountedSpot>,
    /// Edge pixels covered by any match, for display.
    #[serde(skip)]
    pub spot_image: GrayImage,
}

impl SpotDetectionResult {
    /// Counts of each scale, in scan order.
    pub fn per_scale_counts(&self) -> Vec<usize> {
        self.scales.iter().map(|s| s.counted).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_accepts_full_table_and_rejects_beyond() {
        assert_eq!(SpotDetectParams::new(4, 4).span(), Ok(0));
        assert_eq!(SpotDetectParams::new(0, 7).span(), Ok(7));
        assert_eq!(
            SpotDetectParams::new(4, 12).span(),
            Err(SpotDetectError::CalibrationRangeExceeded {
                r1: 4,
                r2: 12,
                max: 7
            })
        );
        assert!(SpotDetectParams::new(5, 4).span().is_err());
    }

    #[test]
    fn params_deserialize_with_default_dedup() {
        let params: SpotDetectParams =
            serde_json::from_str(r#"{ "r1": 3, "r2": 6 }"#).expect("params json");
        assert_eq!(params, SpotDetectParams::new(3, 6));
        assert!(params.dedup);
    }
}
