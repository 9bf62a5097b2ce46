// src/data.rs
use crate::tracking::FrameOutput;
use anyhow::Result;
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct TelemetryRecord {
    frame: usize,
    hands_present: bool,

    left_pointing: &'static str,
    left_open_confidence: f64,
    left_confidence: f64,

    right_pointing: &'static str,
    right_open_confidence: f64,
    right_confidence: f64,
    right_x: f64,
    right_y: f64,

    // Right hand finger straightness
    right_thumb_straightness: f64,
    right_index_straightness: f64,
    right_middle_straightness: f64,
    right_ring_straightness: f64,
    right_pinky_straightness: f64,

    right_thumb_extended: bool,
    right_index_extended: bool,
    right_middle_extended: bool,
    right_ring_extended: bool,
    right_pinky_extended: bool,

    // Control state
    activation_frames: u32,
    is_gesture_control_active: bool,
    brightness_control_frames: u32,
    is_brightness_control: bool,
    brightness: Option<u8>,
}

impl TelemetryRecord {
    fn new(frame: usize, output: &FrameOutput) -> Self {
        let left = &output.snapshot.left;
        let right = &output.snapshot.right;
        let straight = &right.finger_straightness;
        let extended = &right.extended_fingers;

        Self {
            frame,
            hands_present: output.hands_present,
            left_pointing: left.pointing_direction.as_str(),
            left_open_confidence: left.open_confidence,
            left_confidence: left.confidence,
            right_pointing: right.pointing_direction.as_str(),
            right_open_confidence: right.open_confidence,
            right_confidence: right.confidence,
            right_x: right.coordinates.0,
            right_y: right.coordinates.1,
            right_thumb_straightness: straight.thumb,
            right_index_straightness: straight.index,
            right_middle_straightness: straight.middle,
            right_ring_straightness: straight.ring,
            right_pinky_straightness: straight.pinky,
            right_thumb_extended: extended.thumb,
            right_index_extended: extended.index,
            right_middle_extended: extended.middle,
            right_ring_extended: extended.ring,
            right_pinky_extended: extended.pinky,
            activation_frames: output.control.activation_frames,
            is_gesture_control_active: output.control.is_gesture_control_active,
            brightness_control_frames: output.control.brightness_control_frames,
            is_brightness_control: output.control.is_brightness_control,
            brightness: output.brightness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSummary {
    pub total_frames: usize,
    pub frames_with_hands: usize,
    pub control_frames: usize,
    pub brightness_frames: usize,
    /// Times control mode engaged.
    pub activations: usize,
    pub last_brightness: Option<u8>,
    pub min_brightness: Option<u8>,
    pub max_brightness: Option<u8>,
}

pub struct DataExporter {
    output_dir: PathBuf,
    session_name: String,
    records: Vec<TelemetryRecord>,
}

impl DataExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            records: Vec::new(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn add_frame(&mut self, output: &FrameOutput) {
        let frame = self.records.len();
        self.records.push(TelemetryRecord::new(frame, output));
    }

    pub fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary {
            total_frames: self.records.len(),
            ..SessionSummary::default()
        };
        let mut was_active = false;

        for record in &self.records {
            if record.hands_present {
                summary.frames_with_hands += 1;
            }
            if record.is_gesture_control_active {
                summary.control_frames += 1;
                if !was_active {
                    summary.activations += 1;
                }
            }
            was_active = record.is_gesture_control_active;

            if record.is_brightness_control {
                summary.brightness_frames += 1;
            }
            if let Some(b) = record.brightness {
                summary.last_brightness = Some(b);
                summary.min_brightness = Some(summary.min_brightness.map_or(b, |m| m.min(b)));
                summary.max_brightness = Some(summary.max_brightness.map_or(b, |m| m.max(b)));
            }
        }

        summary
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("gesture_telemetry.csv");

        // Create directory if it doesn't exist
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);
        for record in &self.records {
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(csv_path)
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let report_path = self.session_dir().join("report.html");

        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&report_path, self.create_html_report())?;
        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let summary = self.summary();
        let detection_rate = if summary.total_frames == 0 {
            0.0
        } else {
            summary.frames_with_hands as f64 / summary.total_frames as f64 * 100.0
        };
        let fmt_level = |level: Option<u8>| level.map_or_else(|| "-".to_string(), |b| format!("{}%", b));

        format!(r#"
<!DOCTYPE html>
<html>
<head>
    <title>Gesture Session Report - {}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-item {{ margin: 10px 0; }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
    </style>
</head>
<body>
    <h1>Gesture Control Session Report</h1>
    <div class="stats">
        <h2>Session: {}</h2>
        <div class="stat-item">
            <span class="stat-label">Total Frames:</span>
            <span class="stat-value">{}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Hand Detection Rate:</span>
            <span class="stat-value">{:.1}%</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Light Control Mode:</span>
            <span class="stat-value">{} frames ({} activations)</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Brightness Control:</span>
            <span class="stat-value">{} frames</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Brightness (last / min / max):</span>
            <span class="stat-value">{} / {} / {}</span>
        </div>
    </div>
</body>
</html>
        "#,
            self.session_name,
            self.session_name,
            summary.total_frames,
            detection_rate,
            summary.control_frames,
            summary.activations,
            summary.brightness_frames,
            fmt_level(summary.last_brightness),
            fmt_level(summary.min_brightness),
            fmt_level(summary.max_brightness),
        )
    }
}
