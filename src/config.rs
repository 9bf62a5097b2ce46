// src/config.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::GestureError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Straightness above which a finger counts as extended.
    pub extension_threshold: f64,
    /// Consecutive qualifying frames before control mode engages.
    pub activation_frames: u32,
    /// Consecutive disqualifying frames before everything resets.
    pub deactivation_frames: u32,
    /// Consecutive qualifying frames before the brightness sub-mode engages.
    pub brightness_frames: u32,
    /// Share of the frame height covered by the brightness band.
    pub band_fraction: f64,
    pub snap_step: u8,
    /// Detector hands scoring below this are dropped by the bridge.
    pub min_detection_confidence: f64,
    /// Flip x so the view matches a mirror.
    pub mirror_input: bool,
    /// Frames kept for the processing-time average.
    pub history_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            extension_threshold: 0.6,
            activation_frames: 10,
            deactivation_frames: 15,
            brightness_frames: 10,
            band_fraction: 0.5,
            snap_step: 5,
            min_detection_confidence: 0.7,
            mirror_input: true,
            history_size: 30,
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GestureError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GestureError> {
        if !(0.0..1.0).contains(&self.extension_threshold) {
            return Err(GestureError::InvalidConfig(format!(
                "extension_threshold must be in [0, 1), got {}",
                self.extension_threshold
            )));
        }
        if self.activation_frames == 0 || self.deactivation_frames == 0 || self.brightness_frames == 0 {
            return Err(GestureError::InvalidConfig(
                "frame thresholds must be at least 1".to_string(),
            ));
        }
        if !(self.band_fraction > 0.0 && self.band_fraction <= 1.0) {
            return Err(GestureError::InvalidConfig(format!(
                "band_fraction must be in (0, 1], got {}",
                self.band_fraction
            )));
        }
        if self.snap_step == 0 || self.snap_step > 100 {
            return Err(GestureError::InvalidConfig(format!(
                "snap_step must be in 1..=100, got {}",
                self.snap_step
            )));
        }
        if self.history_size == 0 {
            return Err(GestureError::InvalidConfig(
                "history_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub output_directory: PathBuf,
    pub session_name: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("GestureCommander")))
                .unwrap_or_else(|| PathBuf::from("./output")),
            session_name: None,
        }
    }
}
