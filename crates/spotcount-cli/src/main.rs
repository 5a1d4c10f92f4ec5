//! spotcount CLI: run the coat-pattern pipeline on one image and write the
//! resulting stage image(s).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{info, warn};
use spotcount::image_io::run_config;
use spotcount::core::LogSettings;
use spotcount::{PipelineConfig, SpotDetectParams, SpotcountIoError, Stage};

#[derive(Parser, Debug)]
#[command(name = "spotcount")]
#[command(about = "Count spots on an animal coat photograph (greyscale, noise reduction, edges, ring matching)")]
#[command(version, allow_negative_numbers = true)]
struct Cli {
    /// Pipeline depth: 0 greyscale, 1 noise reduction, 2 edge detection, 3 spot detection.
    #[arg(required_unless_present = "config")]
    mode: Option<i64>,

    /// Input image (any format the `image` crate decodes).
    #[arg(required_unless_present = "config")]
    image: Option<PathBuf>,

    /// Mode-dependent values: EPSILON for mode 2, EPSILON R1 R2 for mode 3.
    values: Vec<i64>,

    /// Directory for output images.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Write the image of every stage up to MODE, not just the last one.
    #[arg(long)]
    all_stages: bool,

    /// Count every matching window, including overlapping ones.
    #[arg(long)]
    no_dedup: bool,

    /// Write a JSON report of the run.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Load the run from a JSON config instead of positional arguments.
    #[arg(long, conflicts_with_all = ["mode", "image", "values"])]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log line format on stderr (text or json).
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("invalid number of arguments")]
    ArgumentCount,
    #[error("invalid mode")]
    Mode,
    #[error("invalid epsilon {0} (expected 0..=255)")]
    Epsilon(i64),
    #[error("invalid or missing file")]
    File,
    #[error("invalid radius {0}")]
    Radius(i64),
    #[error(transparent)]
    Logging(#[from] spotcount::core::LoggerError),
    #[error(transparent)]
    Run(#[from] SpotcountIoError),
}

/// Numeric values expected after the image for each mode.
fn expected_values(mode: i64) -> Option<usize> {
    match mode {
        0 | 1 => Some(0),
        2 => Some(1),
        3 => Some(3),
        _ => None,
    }
}

/// Edge threshold as typed, before any narrowing.
fn epsilon(value: i64) -> Result<i32, CliError> {
    match u8::try_from(value) {
        Ok(eps) => Ok(i32::from(eps)),
        Err(_) => Err(CliError::Epsilon(value)),
    }
}

fn radius(value: i64) -> Result<usize, CliError> {
    usize::try_from(value).map_err(|_| CliError::Radius(value))
}

fn config_from_args(cli: &Cli) -> Result<PipelineConfig, CliError> {
    let (Some(mode), Some(image)) = (cli.mode, cli.image.as_ref()) else {
        return Err(CliError::ArgumentCount);
    };
    if let Some(n) = expected_values(mode) {
        if cli.values.len() != n {
            return Err(CliError::ArgumentCount);
        }
    }
    let stage = u8::try_from(mode)
        .ok()
        .and_then(Stage::from_index)
        .ok_or(CliError::Mode)?;
    let epsilon = match cli.values.first() {
        Some(&value) => epsilon(value)?,
        None => 0,
    };
    if !image.is_file() {
        return Err(CliError::File);
    }

    let spots = match cli.values[..] {
        [_, r1, r2] => SpotDetectParams::new(radius(r1)?, radius(r2)?),
        _ => SpotDetectParams::default(),
    };

    Ok(PipelineConfig {
        image_path: image.to_string_lossy().into_owned(),
        stage,
        epsilon,
        spots,
        output_dir: None,
        report_path: None,
        all_stages: false,
    })
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, CliError> {
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::load_json(path)?,
        None => config_from_args(cli)?,
    };
    if let Some(dir) = &cli.out_dir {
        cfg.output_dir = Some(dir.to_string_lossy().into_owned());
    }
    if let Some(report) = &cli.report {
        cfg.report_path = Some(report.to_string_lossy().into_owned());
    }
    cfg.all_stages |= cli.all_stages;
    if cli.no_dedup {
        cfg.spots.dedup = false;
    }
    Ok(cfg)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let cfg = build_config(cli)?;
    info!(
        "running {:?} on {} (output dir {})",
        cfg.stage,
        cfg.image_path,
        cfg.output_dir().display()
    );
    if !cfg.spots.dedup {
        warn!("dedup disabled: overlapping matches are counted separately");
    }

    let report = run_config(&cfg)?;
    if let Some(count) = report.spot_count {
        println!("{count}");
    }
    Ok(())
}

fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let settings = LogSettings::parse(&cli.log_level, &cli.log_format)?;
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init_with_filter(settings.level);
        spotcount::core::init_tracing(settings);
    }
    #[cfg(not(feature = "tracing"))]
    spotcount::core::init(settings)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match init_logging(&cli).and_then(|()| run(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}
