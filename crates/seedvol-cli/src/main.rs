//! seedvol CLI — measure seed length, width, height and volume from
//! top/side image pairs.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use seedvol::{
    calibrate_pixel_size, discover_pairs, run_batch, CalibrationModel, ImagePair, LoadedPair,
    Measurer,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "seedvol")]
#[command(about = "Estimate seed dimensions and volume from top and side silhouettes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure a single top/side image pair.
    Measure(CliMeasureArgs),

    /// Measure every TopImage*/SideImage* pair in a directory.
    Batch(CliBatchArgs),

    /// Derive cm/px scale factors from an image of a reference rectangle.
    CalibrateScale(CliCalibrateArgs),

    /// Write the default calibration model as JSON.
    ConfigTemplate {
        /// Output path for the calibration JSON.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CalibrationArgs {
    /// Calibration model (JSON). Missing fields use defaults.
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Override the top-view binarization threshold.
    #[arg(long)]
    top_threshold: Option<u8>,

    /// Override the side-view binarization threshold.
    #[arg(long)]
    side_threshold: Option<u8>,

    /// Override the morphological closing radius (px).
    #[arg(long)]
    closing_radius: Option<u8>,

    /// Override the top-view scale (cm/px).
    #[arg(long)]
    top_scale: Option<f64>,
}

impl CalibrationArgs {
    fn load(&self) -> CliResult<CalibrationModel> {
        let mut model = match &self.calibration {
            Some(path) => {
                tracing::info!("Loading calibration: {}", path.display());
                CalibrationModel::from_json_file(path)?
            }
            None => CalibrationModel::default(),
        };
        self.apply(&mut model);
        Ok(model)
    }

    fn apply(&self, model: &mut CalibrationModel) {
        if let Some(t) = self.top_threshold {
            model.top_threshold = t;
        }
        if let Some(t) = self.side_threshold {
            model.side_threshold = t;
        }
        if let Some(r) = self.closing_radius {
            model.closing_radius_px = r;
        }
        if let Some(s) = self.top_scale {
            model.top_scale_cm_per_px = s;
        }
    }
}

#[derive(Debug, Clone, Args)]
struct CliMeasureArgs {
    /// Top-view image.
    #[arg(long)]
    top: PathBuf,

    /// Side-view image.
    #[arg(long)]
    side: PathBuf,

    /// Path to write the measurement (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    calibration: CalibrationArgs,
}

#[derive(Debug, Clone, Args)]
struct CliBatchArgs {
    /// Directory holding TopImage*/SideImage* files.
    #[arg(long)]
    dir: PathBuf,

    /// Path to write all measurements (JSON array).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    calibration: CalibrationArgs,
}

#[derive(Debug, Clone, Args)]
struct CliCalibrateArgs {
    /// Image of a dark reference rectangle on a light background.
    #[arg(long)]
    image: PathBuf,

    /// Physical length of the reference (longer side), cm.
    #[arg(long)]
    length_cm: f64,

    /// Physical width of the reference (shorter side), cm.
    #[arg(long)]
    width_cm: f64,

    /// Binarization threshold applied to the inverted image.
    #[arg(long, default_value = "60")]
    threshold: u8,

    /// Morphological closing radius (px).
    #[arg(long, default_value = "2")]
    closing_radius: u8,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Measure(args) => run_measure(&args),
        Commands::Batch(args) => run_batch_dir(&args),
        Commands::CalibrateScale(args) => run_calibrate_scale(&args),
        Commands::ConfigTemplate { out } => run_config_template(&out),
    }
}

// ── measure ────────────────────────────────────────────────────────────

fn run_measure(args: &CliMeasureArgs) -> CliResult<()> {
    let measurer = Measurer::new(args.calibration.load()?)?;
    let pair = ImagePair {
        top: args.top.clone(),
        side: args.side.clone(),
    };

    tracing::info!("Loading images: {} / {}", pair.top.display(), pair.side.display());
    let loaded = LoadedPair::load(&pair)?;
    let mut record = measurer.measure(&loaded.views());
    record.top_path = Some(pair.top);
    record.side_path = Some(pair.side);

    tracing::info!(
        "length={:.4} cm width={:.4} cm height={:.4} cm volume={:.5} cm3",
        record.length_cm,
        record.width_cm,
        record.height_cm,
        record.volume_cm3
    );
    if !record.is_valid() {
        tracing::warn!("Object flagged: {}", record.flags);
    }

    let json = serde_json::to_string_pretty(&record)?;
    match &args.out {
        Some(out) => {
            std::fs::write(out, &json)?;
            tracing::info!("Result written to {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

// ── batch ──────────────────────────────────────────────────────────────

fn run_batch_dir(args: &CliBatchArgs) -> CliResult<()> {
    let measurer = Measurer::new(args.calibration.load()?)?;
    let pairs = discover_pairs(&args.dir)?;
    if pairs.is_empty() {
        tracing::warn!("No TopImage* files found in {}", args.dir.display());
    }

    let records = run_batch(&measurer, &pairs)?;
    let valid = records.iter().filter(|r| r.is_valid()).count();
    tracing::info!("Measured {} objects ({} valid)", records.len(), valid);

    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());
    Ok(())
}

// ── calibrate-scale ────────────────────────────────────────────────────

fn run_calibrate_scale(args: &CliCalibrateArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());
    let gray = image::open(&args.image)?.to_luma8();

    let scale = calibrate_pixel_size(
        &gray,
        args.threshold,
        args.closing_radius,
        args.length_cm,
        args.width_cm,
    )?;

    println!("length scale: {:.9} cm/px", scale.length_cm_per_px);
    println!("width scale:  {:.9} cm/px", scale.width_cm_per_px);
    Ok(())
}

// ── config-template ────────────────────────────────────────────────────

fn run_config_template(out: &Path) -> CliResult<()> {
    CalibrationModel::default().to_json_file(out)?;
    tracing::info!("Default calibration written to {}", out.display());
    Ok(())
}
