// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use gesture_commander::data::DataExporter;
use gesture_commander::mediapipe_bridge::ReplaySource;
use gesture_commander::{GestureTracker, LoggingSink, OutputSettings, TrackerConfig};

#[derive(Parser, Debug)]
#[command(name = "gesture_commander", about = "Replay recorded hand landmarks through the gesture pipeline")]
struct Cli {
    /// Detector output, one JSON frame per line
    replay: PathBuf,

    /// Tracker configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory that receives the session folder
    #[arg(long)]
    out: Option<PathBuf>,

    /// Session name (default: timestamped)
    #[arg(long)]
    session: Option<String>,
}

impl Cli {
    fn output_settings(&self) -> OutputSettings {
        let mut output = OutputSettings::default();
        if let Some(dir) = &self.out {
            output.output_directory = dir.clone();
        }
        if let Some(name) = &self.session {
            output.session_name = Some(name.clone());
        }
        output
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = match &cli.config {
        Some(path) => TrackerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrackerConfig::default(),
    };
    let output = cli.output_settings();

    let mut source = ReplaySource::open(&cli.replay, &config)?;
    let mut tracker = GestureTracker::new(config)?;
    let mut sink = LoggingSink::new();
    let mut exporter = DataExporter::new(&output.output_directory, output.session_name.clone());

    info!(replay = %cli.replay.display(), session = exporter.session_name(), "replaying detector output");

    tracker.run(&mut source, &mut sink, |output| exporter.add_frame(output))?;

    let csv_path = exporter.export_csv().context("Failed to export telemetry")?;
    let report_path = exporter.generate_report().context("Failed to write report")?;
    info!(csv = %csv_path.display(), report = %report_path.display(), "session exported");

    let summary = exporter.summary();
    println!(
        "{} frames, {} in control mode, {} in brightness mode, final brightness {}",
        summary.total_frames,
        summary.control_frames,
        summary.brightness_frames,
        summary.last_brightness.map_or_else(|| "-".to_string(), |b| format!("{}%", b)),
    );

    Ok(())
}
