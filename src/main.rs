//! Thermoscope - webcam gauge reader
//!
//! Periodically sends a cropped region of the live camera feed to a remote
//! vision-language endpoint, parses the numeric reading out of the reply,
//! and charts/logs the resulting time series.

mod app;
mod capture;
mod chart;
mod config;
mod overlay;
mod reader;
mod selection;
mod shared;
mod storage;
mod vision;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::app::ThermoscopeApp;
use crate::capture::CameraSource;
use crate::config::AppConfig;
use crate::reader::ReadingScheduler;
use crate::shared::SessionState;
use crate::storage::RunLog;
use crate::vision::OpenAiVision;

/// Thermoscope - periodic gauge readings from a webcam
#[derive(Parser, Debug)]
#[command(name = "thermoscope")]
#[command(about = "Reads a numeric gauge from the webcam via a vision-language service")]
struct Args {
    /// Camera device index (overrides config)
    #[arg(short, long)]
    camera: Option<u32>,

    /// Seconds between automatic readings (overrides config)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Directory for per-run CSV logs (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// List available cameras and exit
    #[arg(long)]
    list_cameras: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    // List cameras mode
    if args.list_cameras {
        println!("Available cameras:");
        let cameras = capture::list_cameras();
        if cameras.is_empty() {
            println!("  No cameras detected");
        } else {
            for (index, name) in cameras {
                println!("  [{}] {}", index, name);
            }
        }
        return Ok(());
    }

    // Load or create configuration, then apply CLI overrides
    let mut config = load_or_create_config();
    if let Some(camera) = args.camera {
        config.capture.camera_index = camera;
    }
    if let Some(interval) = args.interval {
        config.reader.interval_secs = interval;
    }

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => match &config.log.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => storage::get_data_dir()?,
        },
    };

    info!("Thermoscope starting...");
    info!("Controls: drag to select the gauge region, C clears it, Q quits");
    info!(
        "Reading automatically every {} seconds",
        config.reader.interval_secs
    );

    // A camera that cannot be opened is fatal at startup (non-zero exit)
    let camera = CameraSource::open(config.capture.camera_index)
        .context("Could not open webcam")?;

    let run_log = RunLog::create(&data_dir)?;
    let backend = OpenAiVision::new(&config.reader.api_base, &config.reader.model)?;

    let interval = Duration::from_secs(config.reader.interval_secs);
    let session = Arc::new(Mutex::new(SessionState::new(config.history.cap(), interval)));
    let scheduler = ReadingScheduler::new(
        session,
        Arc::new(backend),
        Arc::new(run_log),
        interval,
    );

    let options = ThermoscopeApp::options(&camera);
    let app = ThermoscopeApp::new(camera, scheduler);

    eframe::run_native(
        "Thermoscope",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {e}"))?;

    info!("Thermoscope shutdown complete");

    Ok(())
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config() -> AppConfig {
    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(config) = config::load_config(&config_path) {
                info!("Loaded configuration from {:?}", config_path);
                return config;
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}
