//! Stage sequencing from an RGB grid to an edge map or a spot count.

use serde::{Deserialize, Serialize};

use crate::core::{GrayImage, ImageError, RgbImageView};
use crate::filters::{detect_edges, reduce_noise, rgb_to_gray};
use crate::spots::{SpotDetectError, SpotDetectParams, SpotDetectionResult, SpotDetector};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pipeline depth. Each stage consumes the previous stage's grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greyscale,
    NoiseReduction,
    EdgeDetection,
    SpotDetection,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Greyscale,
        Stage::NoiseReduction,
        Stage::EdgeDetection,
        Stage::SpotDetection,
    ];

    /// Stage for a numeric mode `0..=3`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Short tag appended to output file names.
    pub fn suffix(self) -> &'static str {
        match self {
            Stage::Greyscale => "GS",
            Stage::NoiseReduction => "NR",
            Stage::EdgeDetection => "ED",
            Stage::SpotDetection => "SD",
        }
    }
}

/// Input-contract violations, checked once before any stage runs.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidDimensions(#[from] ImageError),
    #[error(transparent)]
    CalibrationRangeExceeded(#[from] SpotDetectError),
    #[error("parameter {name}={value} is outside {min}..={max}")]
    ParameterOutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

fn default_epsilon() -> i32 {
    10
}

/// Parameters for [`run_pipeline`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Last stage to run.
    pub stage: Stage,
    /// Edge threshold in `0..=255`; required from [`Stage::EdgeDetection`] on.
    #[serde(default = "default_epsilon")]
    pub epsilon: i32,
    /// Radius range and dedup switch; used by [`Stage::SpotDetection`] only.
    #[serde(default)]
    pub spots: SpotDetectParams,
    /// Keep a copy of every grid produced before the last stage.
    #[serde(default)]
    pub keep_intermediate: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            stage: Stage::SpotDetection,
            epsilon: default_epsilon(),
            spots: SpotDetectParams::default(),
            keep_intermediate: false,
        }
    }
}

impl PipelineParams {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    /// Full pipeline with the given edge threshold and radius range.
    pub fn spot_detection(epsilon: i32, r1: usize, r2: usize) -> Self {
        Self {
            stage: Stage::SpotDetection,
            epsilon,
            spots: SpotDetectParams::new(r1, r2),
            keep_intermediate: false,
        }
    }

    fn checked_epsilon(&self) -> Result<u8, PipelineError> {
        u8::try_from(self.epsilon).map_err(|_| PipelineError::ParameterOutOfRange {
            name: "epsilon",
            value: self.epsilon as i64,
            min: 0,
            max: 255,
        })
    }
}

/// Result of a pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub stage: Stage,
    /// Grid produced by the last stage.
    pub image: GrayImage,
    /// Present when the last stage is [`Stage::SpotDetection`].
    pub detection: Option<SpotDetectionResult>,
    /// Grids of the earlier stages, when requested.
    pub intermediates: Vec<(Stage, GrayImage)>,
}

impl PipelineOutput {
    pub fn spot_count(&self) -> Option<usize> {
        self.detection.as_ref().map(|d| d.count)
    }

    /// Every retained grid in stage order, ending with the final one.
    pub fn stage_images(&self) -> impl Iterator<Item = (Stage, &GrayImage)> {
        self.intermediates
            .iter()
            .map(|(s, img)| (*s, img))
            .chain(std::iter::once((self.stage, &self.image)))
    }
}

struct StageTrace {
    keep: bool,
    grids: Vec<(Stage, GrayImage)>,
}

impl StageTrace {
    fn record(&mut self, stage: Stage, grid: &GrayImage) {
        if self.keep {
            self.grids.push((stage, grid.clone()));
        }
    }
}

/// Run stages `0..=params.stage` over `image`.
///
/// All parameters are validated before the first stage; on error nothing
/// has been computed.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(image, params),
        fields(width = image.width, height = image.height, stage = ?params.stage)
    )
)]
pub fn run_pipeline(
    image: &RgbImageView<'_>,
    params: &PipelineParams,
) -> Result<PipelineOutput, PipelineError> {
    image.validate()?;
    let epsilon = if params.stage >= Stage::EdgeDetection {
        Some(params.checked_epsilon()?)
    } else {
        None
    };
    let detector = if params.stage == Stage::SpotDetection {
        Some(SpotDetector::new(params.spots)?)
    } else {
        None
    };

    let mut trace = StageTrace {
        keep: params.keep_intermediate,
        grids: Vec::new(),
    };

    log::debug!("greyscale {}x{}", image.width, image.height);
    let mut grid = rgb_to_gray(image);

    if params.stage >= Stage::NoiseReduction {
        trace.record(Stage::Greyscale, &grid);
        log::debug!("noise reduction");
        grid = reduce_noise(&grid.view());
    }

    if let Some(epsilon) = epsilon {
        trace.record(Stage::NoiseReduction, &grid);
        log::debug!("edge detection, epsilon={epsilon}");
        grid = detect_edges(&grid.view(), epsilon);
    }

    let detection = detector.map(|detector| {
        trace.record(Stage::EdgeDetection, &grid);
        log::debug!(
            "spot detection, radii {}..={}",
            detector.params().r1,
            detector.params().r2
        );
        detector.detect(&grid.view())
    });
    if let Some(det) = &detection {
        grid = det.spot_image.clone();
    }

    Ok(PipelineOutput {
        stage: params.stage,
        image: grid,
        detection,
        intermediates: trace.grids,
    })
}
