#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use spark_dodge::{Measurementor, ResponseTable};
use spark_guide::config::GuideConfig;
use spark_guide::pipeline::FramePipeline;
use spark_guide::runner::{run, RunSettings};
use spark_guide::service::{LogAnnouncer, Services};
use spark_guide::signal::shutdown_signal;
use spark_guide::source::ReplayFeed;
use spark_guide::log_init;
use std::path::PathBuf;

/// Walking guidance from recorded obstacle detections.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// YAML configuration; defaults are used when the file is missing.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Recorded detections to replay.
    #[arg(long)]
    replay: PathBuf,

    /// Stop after this many processed frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Overrides the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GuideConfig::load_or_default(&cli.config)?;
    log_init(cli.log_level.as_deref().unwrap_or(&config.log_level));
    if !cli.config.exists() {
        info!("No config at {}, using defaults", cli.config.display());
    }

    let constant = config
        .calibration
        .calibrate()
        .context("calibration failed, cannot measure distances")?;
    info!(
        "Calibrated at {} cm: focal length {:.2}",
        constant.reference_distance(),
        constant.focal_length()
    );

    let responses = match &config.output.response_table {
        Some(path) => ResponseTable::load(path)?,
        None => ResponseTable::default(),
    };
    let measurementor = Measurementor::new(constant).with_metric(config.calibration.size_metric);
    let pipeline = FramePipeline::new(measurementor, config.maze.resolution, responses);

    let feed = ReplayFeed::open(&cli.replay)?;
    let expected = (config.frame.width, config.frame.height);
    if feed.frame_size() != expected {
        warn!(
            "Recording is {:?} but the camera is configured for {:?}",
            feed.frame_size(),
            expected
        );
    }
    let (camera, detector) = feed.split();

    let services = Services::start(
        config.output.environmental_model.clone(),
        LogAnnouncer,
        config.output.channel_capacity,
    );
    let settings = RunSettings::from_config(&config.capture, cli.max_frames);

    let outcome = run(camera, detector, &pipeline, &services, &settings, shutdown_signal()).await;
    services.shutdown().await;

    let summary = outcome?;
    info!(
        "Done: {} frames, {} guided, {} capture failures",
        summary.frames, summary.guided, summary.capture_failures
    );
    Ok(())
}
