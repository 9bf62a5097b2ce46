// src/tracking.rs - per-frame pipeline: analysis, hand assignment, state update, brightness
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::config::TrackerConfig;
use crate::control::{BrightnessBand, BrightnessSink};
use crate::error::GestureError;
use crate::geometry::{analyze_hand, HandClassification};
use crate::gesture::{step, ControlView, GesturePhase, GestureState, GestureThresholds};
use crate::landmarks::{HandFrame, Handedness};
use crate::mediapipe_bridge::FrameSource;

/// Both hands from the user's point of view. Undetected sides are neutral.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HandsSnapshot {
    pub left: HandClassification,
    pub right: HandClassification,
}

impl HandsSnapshot {
    pub fn side(&self, side: Handedness) -> &HandClassification {
        match side {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: Handedness) -> &mut HandClassification {
        match side {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }
}

/// Resolves detector hands into user-facing sides.
///
/// The detector labels hands before the view is mirrored, so its `left` is the
/// user's right hand and vice versa. Only the first hand per detector label is
/// kept.
pub fn assign_hands(hands: &[HandFrame], extension_threshold: f64) -> HandsSnapshot {
    let mut snapshot = HandsSnapshot::default();
    let mut seen_left = false;
    let mut seen_right = false;

    for (i, hand) in hands.iter().enumerate() {
        let seen = match hand.handedness {
            Handedness::Left => &mut seen_left,
            Handedness::Right => &mut seen_right,
        };
        if *seen {
            debug!(hand = i, label = hand.handedness.as_str(), "dropping duplicate hand label");
            continue;
        }
        *seen = true;

        let side = hand.handedness.mirrored();
        *snapshot.side_mut(side) = analyze_hand(hand, extension_threshold);
    }

    snapshot
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Everything the detector delivers for one processed video frame.
#[derive(Debug, Clone, Default)]
pub struct FrameEvent {
    pub hands: Vec<HandFrame>,
    /// Dimensions of the render surface; `None` until it is ready.
    pub surface: Option<FrameSize>,
}

impl FrameEvent {
    pub fn frame_size(&self) -> Result<FrameSize, GestureError> {
        match self.surface {
            Some(size) if size.width > 0 && size.height > 0 => Ok(size),
            _ => Err(GestureError::InputUnavailable),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameOutput {
    pub snapshot: HandsSnapshot,
    pub control: ControlView,
    pub hands_present: bool,
    /// Percentage pushed to the light while the brightness sub-mode is active.
    pub brightness: Option<u8>,
    /// Tracked point in normalized coordinates, x pinned to the sub-mode anchor.
    pub control_point: Option<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub avg_processing_time: f32,
    frame_times: VecDeque<f32>,
    history_size: usize,
}

impl PerformanceMetrics {
    pub fn new(history_size: usize) -> Self {
        let history_size = history_size.max(1);
        Self {
            frames_processed: 0,
            frames_skipped: 0,
            avg_processing_time: 0.0,
            frame_times: VecDeque::with_capacity(history_size),
            history_size,
        }
    }

    fn record(&mut self, elapsed: f32) {
        self.frames_processed += 1;
        self.frame_times.push_front(elapsed);
        if self.frame_times.len() > self.history_size {
            self.frame_times.pop_back();
        }
        self.avg_processing_time =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
    }
}

pub struct GestureTracker {
    config: TrackerConfig,
    thresholds: GestureThresholds,
    state: GestureState,
    metrics: PerformanceMetrics,
}

impl GestureTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, GestureError> {
        config.validate()?;
        Ok(Self {
            thresholds: GestureThresholds::from(&config),
            metrics: PerformanceMetrics::new(config.history_size),
            state: GestureState::default(),
            config,
        })
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Runs one frame through the pipeline. Returns `None` when the frame was
    /// skipped because its surface is not ready; the state is then untouched.
    pub fn process_frame(&mut self, event: &FrameEvent) -> Option<FrameOutput> {
        let start = Instant::now();

        let size = match event.frame_size() {
            Ok(size) => size,
            Err(e) => {
                trace!("skipping frame: {}", e);
                self.metrics.frames_skipped += 1;
                return None;
            }
        };

        // Classify every hand first so the reducer sees this frame's finished snapshot.
        let snapshot = assign_hands(&event.hands, self.config.extension_threshold);
        let hands_present = !event.hands.is_empty();

        let next = step(&self.state, &snapshot, hands_present, &self.thresholds);
        self.log_transition(&next);
        self.state = next;

        // The light follows the fingertip only while the user's right hand is in view.
        let right_in_view = event
            .hands
            .iter()
            .any(|hand| hand.handedness.mirrored() == Handedness::Right);

        let (brightness, control_point) = if self.state.is_brightness_control && right_in_view {
            let band = BrightnessBand::new(
                f64::from(size.height),
                self.config.band_fraction,
                self.config.snap_step,
            );
            let y = snapshot.right.coordinates.1;
            let percent = band.percent(y * f64::from(size.height));
            (Some(percent), self.state.initial_x.map(|x| (x, y)))
        } else {
            (None, None)
        };

        debug!(
            hands = event.hands.len(),
            right = snapshot.right.pointing_direction.as_str(),
            phase = ?self.state.phase(),
            deactivation = self.state.deactivation_frames,
            "frame"
        );

        self.metrics.record(start.elapsed().as_secs_f32());

        Some(FrameOutput {
            snapshot,
            control: self.state.view(),
            hands_present,
            brightness,
            control_point,
        })
    }

    /// Drains `source`, pushing each emitted percentage into `sink` and handing
    /// every processed frame to `on_frame`. Returns the number of frames processed.
    pub fn run<S, K, F>(&mut self, source: &mut S, sink: &mut K, mut on_frame: F) -> anyhow::Result<usize>
    where
        S: FrameSource + ?Sized,
        K: BrightnessSink + ?Sized,
        F: FnMut(&FrameOutput),
    {
        let mut processed = 0;
        while let Some(event) = source.next_event() {
            let event = event?;
            if let Some(output) = self.process_frame(&event) {
                if let Some(percent) = output.brightness {
                    sink.set_brightness(percent);
                }
                on_frame(&output);
                processed += 1;
            }
        }
        info!(
            processed,
            skipped = self.metrics.frames_skipped,
            avg_ms = self.metrics.avg_processing_time * 1000.0,
            "replay finished"
        );
        Ok(processed)
    }

    fn log_transition(&self, next: &GestureState) {
        let before = self.state.phase();
        let after = next.phase();
        if before == after {
            return;
        }
        match after {
            GesturePhase::Active if !self.state.is_gesture_control_active => {
                info!("gesture control active")
            }
            GesturePhase::Active if self.state.is_brightness_control => {
                info!("brightness control released")
            }
            GesturePhase::ActiveBrightness => info!(
                anchor_x = next.initial_x,
                anchor_y = next.initial_y,
                "brightness control engaged"
            ),
            GesturePhase::Idle if self.state.is_gesture_control_active => {
                info!("gesture control reset")
            }
            _ => debug!(?before, ?after, "phase"),
        }
    }
}
