//! Ocean current frame renderer.
//!
//! Loads current samples (a JSON sample list, or a u/v grid decimated into
//! samples), attaches a streamline overlay to a geographic viewport, replays
//! the pan/zoom/resize steps of a session file and writes every frame as PNG.

mod config;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use current_common::{load_samples_json, CurrentGrid};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::SessionConfig;
use session::run_session;

#[derive(Parser, Debug)]
#[command(name = "current-render")]
#[command(about = "Render ocean current streamline frames for a viewport session")]
struct Args {
    /// Session file (overlay settings, viewport and steps)
    #[arg(short, long, env = "SESSION_CONFIG", default_value = "config/session.yaml")]
    config: PathBuf,

    /// JSON file with current samples
    #[arg(long, env = "SAMPLES_PATH", conflicts_with = "grid", required_unless_present = "grid")]
    samples: Option<PathBuf>,

    /// JSON u/v grid to decimate into samples
    #[arg(long, env = "GRID_PATH")]
    grid: Option<PathBuf>,

    /// Keep every Nth grid row and column
    #[arg(long, default_value = "1")]
    sample_factor: usize,

    /// Directory for rendered frames
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "frames")]
    output_dir: PathBuf,

    /// Override the session's overlay opacity
    #[arg(long)]
    opacity: Option<f32>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting current renderer");

    let mut session = SessionConfig::load(&args.config)?;
    if let Some(opacity) = args.opacity {
        session.opacity = opacity;
    }

    let samples = match (&args.samples, &args.grid) {
        (Some(path), _) => load_samples_json(path)
            .with_context(|| format!("Failed to load samples from {:?}", path))?,
        (None, Some(path)) => CurrentGrid::load_json(path)
            .with_context(|| format!("Failed to load grid from {:?}", path))?
            .decimate(args.sample_factor)?,
        (None, None) => anyhow::bail!("Either --samples or --grid is required"),
    };
    info!(count = samples.len(), "Loaded current samples");

    let report = run_session(&session, samples, &args.output_dir)?;

    info!(
        frames = report.frames.len(),
        redraws = report.redraws,
        glyphs = report.glyphs,
        output_dir = %args.output_dir.display(),
        "Session complete"
    );

    Ok(())
}
