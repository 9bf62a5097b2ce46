// src/mediapipe_bridge.rs - detector output as a pull-based frame source
use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

use crate::config::TrackerConfig;
use crate::landmarks::{HandFrame, Handedness};
use crate::tracking::{FrameEvent, FrameSize};

/// Yields one detection event per processed video frame until exhausted.
pub trait FrameSource {
    fn next_event(&mut self) -> Option<Result<FrameEvent>>;
}

/// An in-memory, bounded sequence of events.
pub struct VecSource {
    events: VecDeque<FrameEvent>,
}

impl VecSource {
    pub fn new(events: impl IntoIterator<Item = FrameEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl FrameSource for VecSource {
    fn next_event(&mut self) -> Option<Result<FrameEvent>> {
        self.events.pop_front().map(Ok)
    }
}

/// JSON structures for one line of recorded detector output
#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f64,
    y: f64,
    #[serde(default)]
    z: f64,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    score: f64,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    hands: Vec<HandJson>,
}

#[derive(Debug, Clone, Copy)]
struct BridgeOptions {
    min_confidence: f64,
    mirror: bool,
}

/// Replays recorded detector output, one JSON object per line.
pub struct ReplaySource<R> {
    reader: R,
    options: BridgeOptions,
    line_number: usize,
    buffer: String,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, config: &TrackerConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Cannot open replay file {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file), config))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R, config: &TrackerConfig) -> Self {
        Self {
            reader,
            options: BridgeOptions {
                min_confidence: config.min_detection_confidence,
                mirror: config.mirror_input,
            },
            line_number: 0,
            buffer: String::new(),
        }
    }

    fn parse_line(&self, line: &str) -> Result<FrameEvent> {
        let detection: DetectionJson = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse detection on line {}", self.line_number))?;

        let surface = match (detection.width, detection.height) {
            (Some(width), Some(height)) => Some(FrameSize { width, height }),
            _ => None,
        };

        let mut hands = Vec::with_capacity(detection.hands.len());
        for (i, hand) in detection.hands.into_iter().enumerate() {
            if hand.score < self.options.min_confidence {
                continue;
            }
            let Some(handedness) = Handedness::from_label(&hand.handedness) else {
                warn!(line = self.line_number, hand = i, label = %hand.handedness, "unknown handedness label");
                continue;
            };
            let points = hand
                .landmarks
                .iter()
                .map(|lm| Vector3::new(lm.x, lm.y, lm.z))
                .collect();
            match HandFrame::new(points, handedness, hand.score) {
                Ok(frame) if self.options.mirror => hands.push(frame.mirrored()),
                Ok(frame) => hands.push(frame),
                Err(e) => warn!(line = self.line_number, hand = i, "skipping hand: {}", e),
            }
        }

        Ok(FrameEvent { hands, surface })
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    fn next_event(&mut self) -> Option<Result<FrameEvent>> {
        loop {
            self.buffer.clear();
            self.line_number += 1;
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = self.buffer.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(self.parse_line(line));
                }
                Err(e) => {
                    return Some(
                        Err(e).with_context(|| format!("Failed to read line {}", self.line_number)),
                    )
                }
            }
        }
    }
}
