// src/landmarks.rs
use nalgebra::Vector3;
use serde::Serialize;

use crate::error::GestureError;

/// One hand landmark in normalized image space (x, y in [0, 1], z relative to the wrist).
pub type Landmark = Vector3<f64>;

pub const LANDMARK_COUNT: usize = 21;

// MediaPipe hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Base, two interior joints and tip, in that order.
    pub fn joints(self) -> [usize; 4] {
        match self {
            Finger::Thumb => [THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP],
            Finger::Index => [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
            Finger::Middle => [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
            Finger::Ring => [RING_MCP, RING_PIP, RING_DIP, RING_TIP],
            Finger::Pinky => [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

/// A value per finger, e.g. straightness scores or extension flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Fingers<T> {
    pub thumb: T,
    pub index: T,
    pub middle: T,
    pub ring: T,
    pub pinky: T,
}

impl<T: Copy> Fingers<T> {
    pub fn from_fn(mut f: impl FnMut(Finger) -> T) -> Self {
        Self {
            thumb: f(Finger::Thumb),
            index: f(Finger::Index),
            middle: f(Finger::Middle),
            ring: f(Finger::Ring),
            pinky: f(Finger::Pinky),
        }
    }

    pub fn get(&self, finger: Finger) -> T {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(T) -> U) -> Fingers<U> {
        Fingers::from_fn(|finger| f(self.get(finger)))
    }
}

impl Fingers<bool> {
    pub fn count(&self) -> usize {
        Finger::ALL.iter().filter(|f| self.get(**f)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn mirrored(self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }

    /// Parses a detector label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Handedness::Left),
            "right" => Some(Handedness::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

/// One detected hand for one frame, as reported by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    /// Detector label, computed before any mirroring.
    pub handedness: Handedness,
    pub confidence: f64,
}

impl HandFrame {
    pub fn new(
        landmarks: Vec<Landmark>,
        handedness: Handedness,
        confidence: f64,
    ) -> Result<Self, GestureError> {
        let found = landmarks.len();
        let landmarks: [Landmark; LANDMARK_COUNT] =
            landmarks.try_into().map_err(|_| GestureError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found,
            })?;

        Ok(Self {
            landmarks,
            handedness,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    /// Copy with x flipped for a user-facing (selfie) view. The label is left as reported.
    pub fn mirrored(&self) -> Self {
        let mut landmarks = self.landmarks;
        for lm in landmarks.iter_mut() {
            lm.x = 1.0 - lm.x;
        }
        Self {
            landmarks,
            handedness: self.handedness,
            confidence: self.confidence,
        }
    }

    pub fn finger(&self, finger: Finger) -> [Landmark; 4] {
        finger.joints().map(|i| self.landmarks[i])
    }

    pub fn index_tip(&self) -> Landmark {
        self.landmarks[INDEX_TIP]
    }
}
