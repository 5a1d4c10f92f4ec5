/// Errors returned by the spot detector.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpotDetectError {
    #[error("radius span r2 - r1 must lie in 0..={max} (r1={r1}, r2={r2})")]
    CalibrationRangeExceeded { r1: usize, r2: usize, max: usize },
}
