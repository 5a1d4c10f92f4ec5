//! Sliding-window ring matching with overlap bookkeeping.

use nalgebra::Point2;
use spotcount_core::{GrayImage, GrayImageView};

use crate::mask::{mask_side, Mask, MASK_ON};
use crate::{
    CountedSpot, ScaleCalibration, ScaleReport, SpotDetectError, SpotDetectParams,
    SpotDetectionResult, CALIBRATION,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Multi-scale spot detector.
///
/// Scales are scanned strictly in order `r1, r1 + 1, ..., r2`; pixels credited
/// to a spot at one scale suppress overlapping matches at every later scale.
#[derive(Clone, Debug)]
pub struct SpotDetector {
    params: SpotDetectParams,
    span: usize,
}

impl SpotDetector {
    /// Create a detector, rejecting radius ranges the calibration table
    /// does not cover.
    pub fn new(params: SpotDetectParams) -> Result<Self, SpotDetectError> {
        let span = params.span()?;
        Ok(Self { params, span })
    }

    #[inline]
    pub fn params(&self) -> &SpotDetectParams {
        &self.params
    }

    /// Count spots in a 0/255 edge map.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, edges),
            fields(width = edges.width, height = edges.height, r1 = self.params.r1, r2 = self.params.r2)
        )
    )]
    pub fn detect(&self, edges: &GrayImageView<'_>) -> SpotDetectionResult {
        let mut acc = SpotAccumulator::new(edges.width, edges.height, self.params.dedup);
        let mut scales = Vec::with_capacity(self.span + 1);

        for (scale, cal) in CALIBRATION.iter().enumerate().take(self.span + 1) {
            let report = match ScaleTemplate::fitting(scale, self.params.r1, cal, edges) {
                Some(template) => scan_scale(edges, &template, &mut acc),
                None => ScaleReport::skipped(scale, self.params.r1.saturating_add(scale)),
            };
            log::debug!(
                "scale {} (radius {}, side {}): {} windows, {} matches, {} counted",
                report.scale,
                report.radius,
                report.mask_side,
                report.windows,
                report.matches,
                report.counted
            );
            scales.push(report);
        }

        let result = acc.finish(scales);
        log::info!("counted {} spots", result.count);
        result
    }
}

/// Templates and threshold for one scale.
struct ScaleTemplate {
    scale: usize,
    ring: Mask,
    center: Mask,
    max_diff: u32,
}

impl ScaleTemplate {
    /// Build the masks for `r1 + scale`, or `None` when the mask would not
    /// leave a one-pixel margin inside `edges` (or its side overflows).
    fn fitting(
        scale: usize,
        r1: usize,
        cal: &ScaleCalibration,
        edges: &GrayImageView<'_>,
    ) -> Option<Self> {
        let radius = r1.checked_add(scale)?;
        let side = mask_side(radius)?;
        if side >= edges.width || side >= edges.height {
            return None;
        }
        let ring = Mask::spot_ring(radius, cal);
        let center = Mask::spot_center(radius, cal);
        log::trace!(
            "scale {scale}: ring has {} cells, footprint {}",
            ring.on_count(),
            center.on_count()
        );
        Some(Self {
            scale,
            ring,
            center,
            max_diff: cal.max_diff,
        })
    }
}

/// Mutable state owned by one `detect` call.
struct SpotAccumulator {
    width: usize,
    counted: Vec<bool>, // row-major, len = w*h
    spot_image: GrayImage,
    spots: Vec<CountedSpot>,
    count: usize,
    dedup: bool,
}

impl SpotAccumulator {
    fn new(width: usize, height: usize, dedup: bool) -> Self {
        Self {
            width,
            counted: vec![false; width * height],
            spot_image: GrayImage::filled(width, height, 0),
            spots: Vec::new(),
            count: 0,
            dedup,
        }
    }

    /// Paint the matched block's edge pixels and claim the center footprint.
    ///
    /// Returns true when the match adds to the count: its footprint touched
    /// no previously claimed pixel (or dedup is off). The footprint is
    /// claimed either way.
    fn record_match(
        &mut self,
        edges: &GrayImageView<'_>,
        template: &ScaleTemplate,
        x: usize,
        y: usize,
    ) -> bool {
        let side = template.ring.side();
        for j in 0..side {
            for i in 0..side {
                if edges.at(x + i, y + j) == MASK_ON {
                    self.spot_image.set(x + i, y + j, MASK_ON);
                }
            }
        }

        let mut seen = false;
        for (i, j) in template.center.on_cells() {
            let idx = (y + j) * self.width + (x + i);
            seen |= self.counted[idx];
            self.counted[idx] = true;
        }

        let counts = !self.dedup || !seen;
        if counts {
            self.count += 1;
        }
        counts
    }

    fn finish(self, scales: Vec<ScaleReport>) -> SpotDetectionResult {
        SpotDetectionResult {
            count: self.count,
            scales,
            spots: self.spots,
            spot_image: self.spot_image,
        }
    }
}

/// Scan every top-left window origin that keeps the template inside the
/// image, outer loop over `x`, inner over `y`.
///
/// Origins stop one short of the last position that would still fit. The
/// caller guarantees `side < width` and `side < height`.
fn scan_scale(
    edges: &GrayImageView<'_>,
    template: &ScaleTemplate,
    acc: &mut SpotAccumulator,
) -> ScaleReport {
    let side = template.ring.side();
    let radius = template.ring.radius();
    let mut report = ScaleReport {
        scale: template.scale,
        radius,
        mask_side: side,
        windows: 0,
        matches: 0,
        counted: 0,
    };
    for x in 0..edges.width - side {
        for y in 0..edges.height - side {
            report.windows += 1;
            if is_blank(edges, x, y, side) {
                continue;
            }
            let Some(score) = window_score(edges, &template.ring, x, y, template.max_diff) else {
                continue;
            };
            report.matches += 1;
            if acc.record_match(edges, template, x, y) {
                report.counted += 1;
                acc.spots.push(CountedSpot {
                    center: Point2::new(x + radius, y + radius),
                    radius,
                    scale: template.scale,
                    score,
                });
            }
        }
    }
    report
}

fn is_blank(edges: &GrayImageView<'_>, x: usize, y: usize, side: usize) -> bool {
    (0..side).all(|j| {
        let row = (y + j) * edges.width + x;
        edges.data[row..row + side].iter().all(|&v| v == 0)
    })
}

/// Sum of absolute differences between the window at `(x, y)` and `mask`,
/// or `None` once it reaches `max_diff`.
fn window_score(
    edges: &GrayImageView<'_>,
    mask: &Mask,
    x: usize,
    y: usize,
    max_diff: u32,
) -> Option<u32> {
    let side = mask.side();
    let mut sum = 0u32;
    for j in 0..side {
        let row = (y + j) * edges.width + x;
        let block = &edges.data[row..row + side];
        let tmpl = &mask.data()[j * side..(j + 1) * side];
        sum += block
            .iter()
            .zip(tmpl)
            .map(|(&b, &m)| b.abs_diff(m) as u32)
            .sum::<u32>();
        if sum >= max_diff {
            return None;
        }
    }
    Some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(img: &mut GrayImage, mask: &Mask, x: usize, y: usize) {
        for (i, j) in mask.on_cells() {
            img.set(x + i, y + j, MASK_ON);
        }
    }

    fn ring(scale: usize, radius: usize) -> Mask {
        Mask::spot_ring(radius, &CALIBRATION[scale])
    }

    fn detect(img: &GrayImage, r1: usize, r2: usize, dedup: bool) -> SpotDetectionResult {
        let params = SpotDetectParams { r1, r2, dedup };
        SpotDetector::new(params)
            .expect("valid range")
            .detect(&img.view())
    }

    #[test]
    fn single_ring_is_counted_once() {
        let mut img = GrayImage::filled(20, 20, 0);
        stamp(&mut img, &ring(0, 4), 5, 6);

        let res = detect(&img, 4, 4, true);
        assert_eq!(res.count, 1);
        assert_eq!(res.scales.len(), 1);
        assert_eq!(res.scales[0].windows, 11 * 11);
        assert_eq!(res.scales[0].matches, 1);
        assert_eq!(res.spots.len(), 1);
        assert_eq!(res.spots[0].center, Point2::new(9, 10));
        assert_eq!(res.spots[0].score, 0);
        assert_eq!(res.spot_image, img);
    }

    #[test]
    fn blank_image_has_no_matches() {
        let img = GrayImage::filled(30, 30, 0);
        let res = detect(&img, 2, 9, true);
        assert_eq!(res.count, 0);
        assert_eq!(res.scales.len(), 8);
        assert!(res.scales.iter().all(|s| s.matches == 0));
        assert_eq!(res.spot_image.count_value(MASK_ON), 0);
    }

    #[test]
    fn window_must_leave_one_pixel_margin() {
        // The only exact fit is origin (0, 0), which the scan reaches only
        // when the image is at least one pixel larger than the mask.
        let mask = ring(0, 4);
        let mut tight = GrayImage::filled(9, 9, 0);
        stamp(&mut tight, &mask, 0, 0);
        let res = detect(&tight, 4, 4, true);
        assert_eq!(res.count, 0);
        assert_eq!(res.scales[0].windows, 0);

        let mut roomy = GrayImage::filled(10, 10, 0);
        stamp(&mut roomy, &mask, 0, 0);
        assert_eq!(detect(&roomy, 4, 4, true).count, 1);
    }

    #[test]
    fn oversized_scales_contribute_nothing() {
        let mut img = GrayImage::filled(12, 12, 0);
        stamp(&mut img, &ring(0, 4), 1, 1);
        let res = detect(&img, 4, 11, true);
        assert_eq!(res.count, 1);
        assert!(res.scales[2..].iter().all(|s| s.windows == 0));
    }

    #[test]
    fn huge_radii_score_zero_without_building_masks() {
        let mut img = GrayImage::filled(20, 20, 0);
        stamp(&mut img, &ring(0, 4), 5, 6);

        for r in [1_000_000_000, usize::MAX - 3, usize::MAX] {
            let res = detect(&img, r, r, true);
            assert_eq!(res.count, 0);
            assert_eq!(res.scales.len(), 1);
            assert_eq!(res.scales[0].windows, 0);
            assert_eq!(res.scales[0].radius, r);
        }

        // `2 * radius + 1` overflows at every scale of this range.
        let res = detect(&img, usize::MAX - 3, usize::MAX, true);
        assert_eq!(res.count, 0);
        assert_eq!(res.scales.len(), 4);
        assert!(res.scales.iter().all(|s| s.windows == 0 && s.mask_side == 0));
    }

    #[test]
    fn separated_rings_are_counted_separately() {
        let mask = ring(0, 4);
        let mut img = GrayImage::filled(40, 20, 0);
        stamp(&mut img, &mask, 3, 4);
        stamp(&mut img, &mask, 22, 6);

        let res = detect(&img, 4, 4, true);
        assert_eq!(res.count, 2);
        let centers: Vec<_> = res.spots.iter().map(|s| s.center).collect();
        assert_eq!(centers, vec![Point2::new(7, 8), Point2::new(26, 10)]);
    }

    #[test]
    fn overlapping_matches_in_one_scale_count_once() {
        // Two rings one pixel apart: both windows match, footprints overlap.
        let mask = ring(0, 4);
        let mut img = GrayImage::filled(20, 20, 0);
        stamp(&mut img, &mask, 5, 6);
        stamp(&mut img, &mask, 6, 6);

        let res = detect(&img, 4, 4, true);
        assert_eq!(res.scales[0].matches, 2);
        assert_eq!(res.count, 1);
        assert_eq!(res.spots[0].center, Point2::new(9, 10));

        assert_eq!(detect(&img, 4, 4, false).count, 2);
    }

    #[test]
    fn claimed_pixels_suppress_larger_scales() {
        let mut img = GrayImage::filled(20, 20, 0);
        stamp(&mut img, &ring(0, 4), 5, 6);

        let res = detect(&img, 4, 5, true);
        assert_eq!(res.per_scale_counts(), vec![1, 0]);
        assert_eq!(res.scales[1].matches, 1);
        assert_eq!(res.count, 1);

        let raw = detect(&img, 4, 5, false);
        assert_eq!(raw.per_scale_counts(), vec![1, 1]);
        assert_eq!(raw.count, 2);
    }

    #[test]
    fn total_is_sum_of_scales_and_dedup_never_adds() {
        let mut img = GrayImage::filled(48, 40, 0);
        stamp(&mut img, &ring(0, 4), 2, 3);
        stamp(&mut img, &ring(0, 4), 3, 3);
        stamp(&mut img, &ring(1, 5), 20, 20);
        stamp(&mut img, &ring(2, 6), 30, 4);

        let deduped = detect(&img, 4, 6, true);
        let raw = detect(&img, 4, 6, false);
        for res in [&deduped, &raw] {
            assert_eq!(res.count, res.per_scale_counts().iter().sum::<usize>());
        }
        assert!(deduped.count <= raw.count);
        assert_eq!(deduped.spots.len(), deduped.count);
    }

    #[test]
    fn span_beyond_table_is_rejected_up_front() {
        let err = SpotDetector::new(SpotDetectParams::new(2, 10)).unwrap_err();
        assert_eq!(
            err,
            SpotDetectError::CalibrationRangeExceeded {
                r1: 2,
                r2: 10,
                max: 7
            }
        );
        assert!(SpotDetector::new(SpotDetectParams::new(3, 2)).is_err());
    }

    #[test]
    fn early_exit_keeps_threshold_semantics() {
        let mask = ring(0, 4);
        let mut img = GrayImage::filled(10, 10, 0);
        stamp(&mut img, &mask, 0, 0);
        let view = img.view();
        assert_eq!(window_score(&view, &mask, 0, 0, 1), Some(0));
        assert_eq!(window_score(&view, &mask, 0, 0, 0), None);
        // Binary inputs: every score is a whole number of mismatched pixels.
        assert_eq!(window_score(&view, &mask, 1, 0, u32::MAX).map(|s| s % 255), Some(0));
    }
}
