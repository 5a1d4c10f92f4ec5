//! High-level facade crate for the `spotcount-*` workspace.
//!
//! This crate provides:
//! - re-exports of the stage crates,
//! - the pipeline orchestrator that runs greyscale, noise reduction, edge
//!   detection and spot counting up to a requested depth,
//! - JSON config/report helpers,
//! - (feature `image`) decoding, encoding and a file-to-file runner.
//!
//! ## Quickstart
//!
//! ```no_run
//! use spotcount::image_io::load_rgb;
//! use spotcount::{run_pipeline, PipelineParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rgb = load_rgb("cheetah.png")?;
//! let params = PipelineParams::spot_detection(10, 4, 11);
//! let out = run_pipeline(&rgb.view(), &params)?;
//! println!("spots: {:?}", out.spot_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `spotcount::core`: pixel grids and logging.
//! - `spotcount::filters`: greyscale, noise reduction, edge detection.
//! - `spotcount::spots`: ring masks, calibration and the spot detector.
//! - `spotcount::image_io` (feature `image`): `image` crate interop.

pub use spotcount_core as core;
pub use spotcount_filters as filters;
pub use spotcount_spots as spots;

mod io;
mod pipeline;

#[cfg(feature = "image")]
pub mod image_io;

pub use io::{stage_output_path, PipelineConfig, PipelineReport, SpotcountIoError};
pub use pipeline::{run_pipeline, PipelineError, PipelineOutput, PipelineParams, Stage};

pub use spotcount_core::{GrayImage, GrayImageView, RgbImage, RgbImageView};
pub use spotcount_spots::{SpotDetectParams, SpotDetectionResult, SpotDetector};
