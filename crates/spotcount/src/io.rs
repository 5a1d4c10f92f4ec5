//! JSON configuration and report helpers.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::core::ImageSize;
use crate::pipeline::{PipelineError, PipelineOutput, PipelineParams, Stage};
use crate::spots::{CountedSpot, ScaleReport, SpotDetectParams};

#[derive(thiserror::Error, Debug)]
pub enum SpotcountIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

fn default_stage() -> Stage {
    Stage::SpotDetection
}

fn default_epsilon() -> i32 {
    PipelineParams::default().epsilon
}

/// File-driven run description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub image_path: String,
    #[serde(default = "default_stage")]
    pub stage: Stage,
    #[serde(default = "default_epsilon")]
    pub epsilon: i32,
    #[serde(default)]
    pub spots: SpotDetectParams,
    /// Directory for stage images; `out` when absent.
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
    /// Write every stage image, not just the last one.
    #[serde(default)]
    pub all_stages: bool,
}

impl PipelineConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SpotcountIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SpotcountIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("out"))
    }

    pub fn to_params(&self) -> PipelineParams {
        PipelineParams {
            stage: self.stage,
            epsilon: self.epsilon,
            spots: self.spots,
            keep_intermediate: self.all_stages,
        }
    }
}

/// Output path for a stage image: `<out_dir>/<name>_<SUFFIX>.png`, where
/// `<name>` is the input file name up to its first `.`.
pub fn stage_output_path(input: &Path, out_dir: &Path, stage: Stage) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    out_dir.join(format!("{stem}_{}.png", stage.suffix()))
}

/// Summary of one run, serialised next to the stage images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub image_path: String,
    pub size: ImageSize,
    pub stage: Stage,
    pub epsilon: Option<i32>,
    pub spot_params: Option<SpotDetectParams>,
    pub spot_count: Option<usize>,
    #[serde(default)]
    pub scales: Vec<ScaleReport>,
    #[serde(default)]
    pub spots: Vec<CountedSpot>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl PipelineReport {
    pub fn new(image_path: impl Into<String>, params: &PipelineParams, output: &PipelineOutput) -> Self {
        let detection = output.detection.as_ref();
        Self {
            image_path: image_path.into(),
            size: output.image.size(),
            stage: output.stage,
            epsilon: (output.stage >= Stage::EdgeDetection).then_some(params.epsilon),
            spot_params: detection.map(|_| params.spots),
            spot_count: output.spot_count(),
            scales: detection.map(|d| d.scales.clone()).unwrap_or_default(),
            spots: detection.map(|d| d.spots.clone()).unwrap_or_default(),
            outputs: Vec::new(),
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SpotcountIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
