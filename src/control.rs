// src/control.rs - fingertip height to brightness percentage
use tracing::info;

/// Highest brightness level accepted by the light bridge.
pub const BRIDGE_MAX_LEVEL: u8 = 254;

/// A vertical band centred in the frame; the top maps to 100 %, the bottom to 0 %.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessBand {
    line_start: f64,
    line_end: f64,
    step: u8,
}

impl BrightnessBand {
    /// `frame_height` in pixels, `band_fraction` of that height covered by the band.
    pub fn new(frame_height: f64, band_fraction: f64, step: u8) -> Self {
        let band_height = frame_height * band_fraction;
        let line_start = (frame_height - band_height) / 2.0;
        Self {
            line_start,
            line_end: line_start + band_height,
            step,
        }
    }

    pub fn line_start(&self) -> f64 {
        self.line_start
    }

    pub fn line_end(&self) -> f64 {
        self.line_end
    }

    /// Position inside the band in [0, 1], 1.0 at the top. `y` is in pixels.
    pub fn raw_level(&self, y: f64) -> f64 {
        let span = self.line_end - self.line_start;
        if span <= 0.0 {
            return 0.0;
        }
        let y = y.clamp(self.line_start, self.line_end);
        1.0 - (y - self.line_start) / span
    }

    pub fn percent(&self, y: f64) -> u8 {
        snap_to_step(self.raw_level(y) * 100.0, self.step)
    }
}

/// Rounds a percentage to the nearest multiple of `step`, clamped to 0..=100.
pub fn snap_to_step(value: f64, step: u8) -> u8 {
    let step = f64::from(step.max(1));
    let snapped = (value / step).round() * step;
    snapped.clamp(0.0, 100.0) as u8
}

/// Percentage to the bridge's 0..=254 brightness scale.
pub fn to_bridge_level(percent: u8) -> u8 {
    let percent = f64::from(percent.min(100));
    (percent / 100.0 * f64::from(BRIDGE_MAX_LEVEL)).round() as u8
}

/// Bridge level back to a display percentage.
pub fn from_bridge_level(level: u8) -> u8 {
    let level = f64::from(level.min(BRIDGE_MAX_LEVEL));
    (level / f64::from(BRIDGE_MAX_LEVEL) * 100.0).round() as u8
}

/// Receives the brightness percentage once per frame while the sub-mode is active.
pub trait BrightnessSink {
    fn set_brightness(&mut self, percent: u8);
}

impl BrightnessSink for Vec<u8> {
    fn set_brightness(&mut self, percent: u8) {
        self.push(percent);
    }
}

/// Reports brightness changes through `tracing`; repeats of the same value are not logged.
#[derive(Debug, Default)]
pub struct LoggingSink {
    last: Option<u8>,
    bridge_level: Option<u8>,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// Level last sent on the bridge's 0..=254 scale.
    pub fn bridge_level(&self) -> Option<u8> {
        self.bridge_level
    }

    /// The percentage the light shows after quantization to the bridge scale.
    pub fn applied_percent(&self) -> Option<u8> {
        self.bridge_level.map(from_bridge_level)
    }
}

impl BrightnessSink for LoggingSink {
    fn set_brightness(&mut self, percent: u8) {
        let level = to_bridge_level(percent);
        if self.last != Some(percent) {
            info!(percent, bridge_level = level, applied = from_bridge_level(level), "brightness");
        }
        self.last = Some(percent);
        self.bridge_level = Some(level);
    }
}
