//! Conversions between `image` buffers and the pipeline's pixel grids, plus a
//! file-to-file runner.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage as LumaImage, Luma, RgbImage as ImageRgb};

use crate::core::{GrayImage, RgbImage};
use crate::io::{stage_output_path, PipelineConfig, PipelineReport, SpotcountIoError};
use crate::pipeline::{run_pipeline, PipelineOutput, PipelineParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Copy an `image::RgbImage` into a pipeline grid.
pub fn rgb_from_image(img: &ImageRgb) -> RgbImage {
    RgbImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.pixels().map(|p| p.0).collect(),
    }
}

/// Decode any format supported by `image` and drop alpha.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, SpotcountIoError> {
    let img = image::open(path)?.to_rgb8();
    Ok(rgb_from_image(&img))
}

pub fn gray_to_image(img: &GrayImage) -> LumaImage {
    LumaImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        Luma([img.at(x as usize, y as usize)])
    })
}

/// Encode a grid; the format follows the file extension.
pub fn save_gray(path: impl AsRef<Path>, img: &GrayImage) -> Result<(), SpotcountIoError> {
    gray_to_image(img).save(path)?;
    Ok(())
}

/// Write the final grid (or every retained grid) into `out_dir`.
pub fn save_stage_images(
    input: &Path,
    out_dir: &Path,
    output: &PipelineOutput,
    all_stages: bool,
) -> Result<Vec<PathBuf>, SpotcountIoError> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    for (stage, img) in output.stage_images() {
        if !all_stages && stage != output.stage {
            continue;
        }
        let path = stage_output_path(input, out_dir, stage);
        save_gray(&path, img)?;
        log::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Load the configured image, run the pipeline, write stage images and the
/// optional JSON report.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(cfg), fields(image = %cfg.image_path)))]
pub fn run_config(cfg: &PipelineConfig) -> Result<PipelineReport, SpotcountIoError> {
    let input = PathBuf::from(&cfg.image_path);
    let rgb = load_rgb(&input)?;
    log::info!("loaded {} ({}x{})", input.display(), rgb.width, rgb.height);

    let params: PipelineParams = cfg.to_params();
    let output = run_pipeline(&rgb.view(), &params)?;

    let written = save_stage_images(&input, &cfg.output_dir(), &output, cfg.all_stages)?;
    let mut report = PipelineReport::new(cfg.image_path.clone(), &params, &output);
    report.outputs = written
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    if let Some(report_path) = &cfg.report_path {
        report.write_json(report_path)?;
        log::info!("wrote report {report_path}");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;
    use crate::spots::SpotDetectParams;

    #[test]
    fn image_conversions_keep_layout() {
        let src = ImageRgb::from_fn(3, 2, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let rgb = rgb_from_image(&src);
        assert_eq!(rgb.width, 3);
        assert_eq!(rgb.height, 2);
        assert_eq!(rgb.at(2, 1), [2, 1, 7]);

        let gray = GrayImage::from_rows(&[[1u8, 2, 3], [4, 5, 6]]).expect("grid");
        let luma = gray_to_image(&gray);
        assert_eq!(luma.get_pixel(2, 1).0, [6]);
        assert_eq!(luma.get_pixel(0, 1).0, [4]);
    }

    #[test]
    fn run_config_writes_every_stage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("cat.png");
        ImageRgb::from_pixel(16, 16, image::Rgb([120, 90, 60]))
            .save(&input)
            .expect("save input");

        let cfg = PipelineConfig {
            image_path: input.to_string_lossy().into_owned(),
            stage: Stage::SpotDetection,
            epsilon: 10,
            spots: SpotDetectParams::new(3, 4),
            output_dir: Some(dir.path().join("out").to_string_lossy().into_owned()),
            report_path: Some(dir.path().join("report.json").to_string_lossy().into_owned()),
            all_stages: true,
        };
        let report = run_config(&cfg).expect("run");
        assert_eq!(report.spot_count, Some(0));
        assert_eq!(report.outputs.len(), 4);
        for suffix in ["GS", "NR", "ED", "SD"] {
            assert!(dir.path().join("out").join(format!("cat_{suffix}.png")).is_file());
        }

        let raw = fs::read_to_string(dir.path().join("report.json")).expect("report");
        let parsed: PipelineReport = serde_json::from_str(&raw).expect("report json");
        assert_eq!(parsed.scales.len(), 2);
    }
}
