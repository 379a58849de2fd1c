use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use sensorcal_core::{
    mat3_rows, AffineError, AffineMeasurement, AffineSolver, CalibrationListener, RobustEstimator,
    RobustMethod, RobustOptions,
};
use serde::{Deserialize, Serialize};

/// Robust calibration of a triaxial sensor from reference/measured pairs.
#[derive(Debug, Parser)]
#[command(author, version, about = "Robust affine sensor calibration")]
struct Args {
    /// Path to JSON file containing the measurements (and optional quality scores).
    #[arg(long)]
    input: PathBuf,

    /// Optional path to JSON calibration config. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Robust method, overriding the config (ransac, lmeds, msac, prosac, promeds).
    #[arg(long, value_parser = parse_method)]
    method: Option<RobustMethod>,

    /// Sampling seed, overriding the config.
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_method(s: &str) -> std::result::Result<RobustMethod, String> {
    RobustMethod::ALL
        .into_iter()
        .find(|m| m.to_string().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown method `{s}`"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibrationInput {
    measurements: Vec<AffineMeasurement>,
    #[serde(default)]
    quality_scores: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CalibrationConfig {
    method: RobustMethod,
    robust: RobustOptions,
    common_axis_used: bool,
    estimate_secondary: bool,
}

/// Calibration outcome; matrices are row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibrationReport {
    method: RobustMethod,
    bias: [f64; 3],
    matrix: [[f64; 3]; 3],
    secondary: Option<[[f64; 3]; 3]>,
    inliers: Vec<usize>,
    num_measurements: usize,
    iterations: usize,
    failed_subsets: usize,
    refined: bool,
    mse: Option<f64>,
    chi_sq: Option<f64>,
    robust_scale: Option<f64>,
    covariance: Option<Vec<Vec<f64>>>,
}

struct ProgressLog;

impl CalibrationListener<AffineSolver, AffineError> for ProgressLog {
    fn on_progress_change(
        &mut self,
        _estimator: &RobustEstimator<AffineSolver, AffineError>,
        progress: f64,
    ) {
        debug!("progress {:.0}%", 100.0 * progress);
    }
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(value)
}

fn run_calibration(
    input: CalibrationInput,
    config: &CalibrationConfig,
) -> Result<CalibrationReport> {
    let solver = AffineSolver::new(config.common_axis_used, config.estimate_secondary);
    let estimator = RobustEstimator::create(config.method, solver, AffineError, config.robust)?;
    let num_measurements = input.measurements.len();
    match input.quality_scores {
        Some(scores) => estimator.set_measurements_with_quality(input.measurements, scores)?,
        None => estimator.set_measurements(input.measurements)?,
    }
    estimator.set_listener(Some(Box::new(ProgressLog)))?;

    estimator.calibrate()?;

    let result = estimator
        .result()
        .context("calibration finished without a result")?;
    let inliers = estimator
        .inliers_data()
        .context("calibration finished without inliers")?;

    Ok(CalibrationReport {
        method: config.method,
        bias: result.model.bias.into(),
        matrix: mat3_rows(&result.model.matrix),
        secondary: result.model.secondary.as_ref().map(mat3_rows),
        inliers: inliers.inlier_indices(),
        num_measurements,
        iterations: result.iterations,
        failed_subsets: result.failed_subsets,
        refined: result.refined,
        mse: result.mse,
        chi_sq: result.chi_sq,
        robust_scale: inliers.robust_scale,
        covariance: result
            .covariance
            .map(|c| c.row_iter().map(|r| r.iter().copied().collect()).collect()),
    })
}

fn run_calibration_from_files(
    input_path: &Path,
    config_path: Option<&Path>,
    method: Option<RobustMethod>,
    seed: Option<u64>,
) -> Result<String> {
    let input: CalibrationInput = load_json_file(input_path)?;

    let mut config = if let Some(cfg_path) = config_path {
        load_json_file::<CalibrationConfig>(cfg_path)?
    } else {
        CalibrationConfig::default()
    };
    if let Some(method) = method {
        config.method = method;
    }
    if let Some(seed) = seed {
        config.robust.seed = seed;
    }

    let report = run_calibration(input, &config)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let json = run_calibration_from_files(
        &args.input,
        args.config.as_deref(),
        args.method,
        args.seed,
    )?;
    println!("{json}");
    Ok(())
}
