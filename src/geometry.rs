// src/geometry.rs - per-hand, per-frame landmark analysis
use serde::Serialize;
use std::f64::consts::{FRAC_PI_4, PI};
use tracing::trace;

use crate::landmarks::{
    Finger, Fingers, HandFrame, Landmark, INDEX_DIP, INDEX_MCP, INDEX_TIP, MIDDLE_DIP,
    MIDDLE_MCP, MIDDLE_TIP, PINKY_DIP, PINKY_MCP, PINKY_TIP, RING_DIP, RING_MCP, RING_TIP,
    THUMB_MCP, THUMB_TIP, WRIST,
};

/// Base-to-tip lines shorter than this are treated as occluded fingers.
pub const MIN_FINGER_LENGTH: f64 = 1e-4;
pub const DEFAULT_EXTENSION_THRESHOLD: f64 = 0.6;

const LEGACY_FINGER_ANGLE: f64 = 2.8;
const LEGACY_THUMB_ANGLE: f64 = FRAC_PI_4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PointingDirection {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl PointingDirection {
    /// Buckets an angle (degrees, image coordinates with y pointing down) into
    /// eight 45° sectors centred on the axes. Lower bounds are inclusive.
    pub fn from_degrees(angle: f64) -> Self {
        let angle = normalize_degrees(angle);
        // Shift by half a sector so each bucket starts at a multiple of 45°.
        let sector = (((angle + 22.5) % 360.0) / 45.0).floor() as u8;
        match sector {
            0 => PointingDirection::Right,
            1 => PointingDirection::DownRight,
            2 => PointingDirection::Down,
            3 => PointingDirection::DownLeft,
            4 => PointingDirection::Left,
            5 => PointingDirection::UpLeft,
            6 => PointingDirection::Up,
            _ => PointingDirection::UpRight,
        }
    }

    /// Left, right and every diagonal containing either.
    pub fn is_horizontal(&self) -> bool {
        !matches!(
            self,
            PointingDirection::None | PointingDirection::Up | PointingDirection::Down
        )
    }

    /// Straight up or down only; diagonals do not count.
    pub fn is_vertical(&self) -> bool {
        matches!(self, PointingDirection::Up | PointingDirection::Down)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PointingDirection::None => "none",
            PointingDirection::Up => "up",
            PointingDirection::Down => "down",
            PointingDirection::Left => "left",
            PointingDirection::Right => "right",
            PointingDirection::UpLeft => "up-left",
            PointingDirection::UpRight => "up-right",
            PointingDirection::DownLeft => "down-left",
            PointingDirection::DownRight => "down-right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandClassification {
    pub is_open: bool,
    pub open_confidence: f64,
    pub pointing_direction: PointingDirection,
    /// Index fingertip in normalized image space.
    pub coordinates: (f64, f64),
    pub confidence: f64,
    pub finger_straightness: Fingers<f64>,
    pub extended_fingers: Fingers<bool>,
}

impl HandClassification {
    /// Classification used for a side with no detected hand.
    pub fn neutral() -> Self {
        Self {
            is_open: false,
            open_confidence: 0.0,
            pointing_direction: PointingDirection::None,
            coordinates: (0.0, 0.0),
            confidence: 0.0,
            finger_straightness: Fingers::default(),
            extended_fingers: Fingers::default(),
        }
    }
}

impl Default for HandClassification {
    fn default() -> Self {
        Self::neutral()
    }
}

/// How close the interior joints lie to the base-tip line, in [0, 1].
pub fn finger_straightness(base: &Landmark, joint1: &Landmark, joint2: &Landmark, tip: &Landmark) -> f64 {
    let line = tip - base;
    let line_length = line.norm();
    if line_length < MIN_FINGER_LENGTH {
        return 0.0;
    }
    let direction = line / line_length;

    let total_deviation: f64 = [joint1, joint2]
        .iter()
        .map(|joint| {
            let offset = *joint - base;
            let along = offset.dot(&direction);
            (offset - direction * along).norm()
        })
        .sum();

    (1.0 - total_deviation / (0.5 * line_length)).max(0.0)
}

pub fn is_extended(straightness: f64, threshold: f64) -> bool {
    straightness > threshold
}

/// Angle between two vectors in radians; 0 when either is zero-length.
pub fn angle_between(v1: &Landmark, v2: &Landmark) -> f64 {
    let mag1 = v1.norm();
    let mag2 = v2.norm();
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }
    (v1.dot(v2) / (mag1 * mag2)).clamp(-1.0, 1.0).acos()
}

/// Angle-based extension check for the four long fingers. Only feeds the
/// open-hand display statistic, never the gesture machine.
pub fn legacy_finger_extended(base: &Landmark, mid: &Landmark, tip: &Landmark) -> bool {
    // Joint angle at `mid`: ~π when the finger is straight.
    angle_between(&(base - mid), &(tip - mid)) > LEGACY_FINGER_ANGLE
}

/// Angle-based thumb check: thumb direction against the wrist-to-pinky axis.
pub fn legacy_thumb_extended(tip: &Landmark, knuckle: &Landmark, pinky_base: &Landmark, wrist: &Landmark) -> bool {
    angle_between(&(tip - knuckle), &(pinky_base - wrist)) > LEGACY_THUMB_ANGLE
}

pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Direction from `base` to `tip` in the image plane, degrees in [0, 360).
pub fn pointing_angle_degrees(base: &Landmark, tip: &Landmark) -> f64 {
    normalize_degrees((tip.y - base.y).atan2(tip.x - base.x) * 180.0 / PI)
}

fn legacy_extension(hand: &HandFrame) -> Fingers<bool> {
    let lm = &hand.landmarks;
    let long = |base: usize, mid: usize, tip: usize| legacy_finger_extended(&lm[base], &lm[mid], &lm[tip]);

    Fingers {
        thumb: legacy_thumb_extended(&lm[THUMB_TIP], &lm[THUMB_MCP], &lm[PINKY_MCP], &lm[WRIST]),
        index: long(INDEX_MCP, INDEX_DIP, INDEX_TIP),
        middle: long(MIDDLE_MCP, MIDDLE_DIP, MIDDLE_TIP),
        ring: long(RING_MCP, RING_DIP, RING_TIP),
        pinky: long(PINKY_MCP, PINKY_DIP, PINKY_TIP),
    }
}

pub fn analyze_hand(hand: &HandFrame, extension_threshold: f64) -> HandClassification {
    let straightness = Fingers::from_fn(|finger: Finger| {
        let [base, joint1, joint2, tip] = hand.finger(finger);
        finger_straightness(&base, &joint1, &joint2, &tip)
    });
    let extended_fingers = straightness.map(|s| is_extended(s, extension_threshold));

    let legacy = legacy_extension(hand);
    for finger in Finger::ALL {
        trace!(
            finger = finger.as_str(),
            straightness = straightness.get(finger),
            extended = extended_fingers.get(finger),
            legacy = legacy.get(finger),
            "finger"
        );
    }
    let open_confidence = legacy.count() as f64 / Finger::ALL.len() as f64;

    let tip = hand.index_tip();
    let angle = pointing_angle_degrees(&hand.landmarks[INDEX_MCP], &tip);

    HandClassification {
        is_open: legacy.count() == Finger::ALL.len(),
        open_confidence,
        pointing_direction: PointingDirection::from_degrees(angle),
        coordinates: (tip.x, tip.y),
        confidence: hand.confidence,
        finger_straightness: straightness,
        extended_fingers,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{hand_pose, open_hand};
    use super::*;
    use crate::landmarks::Handedness;
    use nalgebra::Vector3;

    #[test]
    fn test_degenerate_finger_has_zero_straightness() {
        let p = Vector3::new(0.5, 0.5, 0.0);
        let near = Vector3::new(0.5 + 5e-5, 0.5, 0.0);
        let joint = Vector3::new(0.7, 0.2, 0.0);
        assert_eq!(finger_straightness(&p, &joint, &joint, &near), 0.0);
        assert_eq!(finger_straightness(&p, &p, &p, &p), 0.0);
    }

    #[test]
    fn test_collinear_finger_is_fully_straight() {
        let base = Vector3::new(0.1, 0.2, 0.0);
        let tip = Vector3::new(0.4, 0.8, 0.3);
        let j1 = base + (tip - base) * 0.3;
        let j2 = base + (tip - base) * 0.7;
        assert!((finger_straightness(&base, &j1, &j2, &tip) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bent_finger_scores_low() {
        let base = Vector3::new(0.0, 0.0, 0.0);
        let j1 = Vector3::new(0.0, 0.04, 0.0);
        let j2 = Vector3::new(0.04, 0.04, 0.0);
        let tip = Vector3::new(0.04, 0.0, 0.0);
        let s = finger_straightness(&base, &j1, &j2, &tip);
        assert_eq!(s, 0.0);
        assert!(!is_extended(s, DEFAULT_EXTENSION_THRESHOLD));
    }

    #[test]
    fn test_extension_threshold_is_strict() {
        assert!(!is_extended(0.6, 0.6));
        assert!(is_extended(0.6000001, 0.6));
    }

    #[test]
    fn test_direction_sector_boundaries() {
        assert_eq!(PointingDirection::from_degrees(22.4999), PointingDirection::Right);
        assert_eq!(PointingDirection::from_degrees(22.5), PointingDirection::DownRight);
        assert_eq!(PointingDirection::from_degrees(337.5), PointingDirection::Right);
        assert_eq!(PointingDirection::from_degrees(337.4999), PointingDirection::UpRight);
        assert_eq!(PointingDirection::from_degrees(0.0), PointingDirection::Right);
        assert_eq!(PointingDirection::from_degrees(90.0), PointingDirection::Down);
        assert_eq!(PointingDirection::from_degrees(157.5), PointingDirection::Left);
        assert_eq!(PointingDirection::from_degrees(180.0), PointingDirection::Left);
        assert_eq!(PointingDirection::from_degrees(225.0), PointingDirection::UpLeft);
        assert_eq!(PointingDirection::from_degrees(270.0), PointingDirection::Up);
        assert_eq!(PointingDirection::from_degrees(-90.0), PointingDirection::Up);
    }

    #[test]
    fn test_direction_groups() {
        assert!(PointingDirection::Left.is_horizontal());
        assert!(PointingDirection::UpRight.is_horizontal());
        assert!(!PointingDirection::Up.is_horizontal());
        assert!(PointingDirection::Down.is_vertical());
        assert!(!PointingDirection::DownLeft.is_vertical());
        assert!(!PointingDirection::None.is_horizontal());
        assert_eq!(PointingDirection::DownLeft.as_str(), "down-left");
    }

    #[test]
    fn test_pointing_angle_uses_image_axes() {
        let base = Vector3::new(0.5, 0.5, 0.0);
        let up = Vector3::new(0.5, 0.3, 0.0);
        assert!((pointing_angle_degrees(&base, &up) - 270.0).abs() < 1e-9);
        let left = Vector3::new(0.3, 0.5, 0.0);
        assert!((pointing_angle_degrees(&base, &left) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_activation_pose() {
        let hand = hand_pose(Handedness::Left, [false, true, false, false, true], 270.0, (0.4, 0.3));
        let info = analyze_hand(&hand, DEFAULT_EXTENSION_THRESHOLD);

        assert!(info.extended_fingers.index);
        assert!(info.extended_fingers.pinky);
        assert!(!info.extended_fingers.middle);
        assert!(!info.extended_fingers.ring);
        assert_eq!(info.pointing_direction, PointingDirection::Up);
        assert!((info.coordinates.0 - 0.4).abs() < 1e-9);
        assert!((info.coordinates.1 - 0.3).abs() < 1e-9);
        assert!((info.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_splayed_hand_is_open() {
        let hand = open_hand(Handedness::Right, 270.0, (0.5, 0.3));
        let info = analyze_hand(&hand, DEFAULT_EXTENSION_THRESHOLD);
        assert_eq!(info.open_confidence, 1.0);
        assert!(info.is_open);
        assert_eq!(info.extended_fingers.count(), 5);
    }

    #[test]
    fn test_open_confidence_counts_legacy_fingers() {
        // Thumb straight but parallel to the fingers: within 45 degrees of the
        // wrist-to-pinky axis, so only the four long fingers count.
        let flat = hand_pose(Handedness::Right, [true; 5], 270.0, (0.5, 0.3));
        let info = analyze_hand(&flat, DEFAULT_EXTENSION_THRESHOLD);
        assert!(info.extended_fingers.thumb);
        assert!((info.open_confidence - 0.8).abs() < 1e-12);
        assert!(!info.is_open);

        // Curled thumb tip folds back across the palm, away from the pinky axis.
        let fist = hand_pose(Handedness::Right, [false; 5], 270.0, (0.5, 0.3));
        let info = analyze_hand(&fist, DEFAULT_EXTENSION_THRESHOLD);
        assert_eq!(info.extended_fingers.count(), 0);
        assert!((info.open_confidence - 0.2).abs() < 1e-12);
        assert!(!info.is_open);
    }

    #[test]
    fn test_legacy_finger_angle() {
        let base = Vector3::new(0.0, 0.0, 0.0);
        let mid = Vector3::new(0.0, -0.05, 0.0);
        let straight_tip = Vector3::new(0.0, -0.1, 0.0);
        let bent_tip = Vector3::new(0.04, -0.06, 0.0);
        assert!(legacy_finger_extended(&base, &mid, &straight_tip));
        assert!(!legacy_finger_extended(&base, &mid, &bent_tip));
    }

    #[test]
    fn test_legacy_thumb_angle() {
        let wrist = Vector3::new(0.5, 0.9, 0.0);
        let pinky_base = Vector3::new(0.4, 0.7, 0.0);
        let knuckle = Vector3::new(0.6, 0.8, 0.0);
        // Thumb sticking out sideways, away from the pinky axis.
        let out = Vector3::new(0.75, 0.8, 0.0);
        assert!(legacy_thumb_extended(&out, &knuckle, &pinky_base, &wrist));
        // Thumb tucked along the wrist-pinky axis.
        let tucked = knuckle + (pinky_base - wrist) * 0.3;
        assert!(!legacy_thumb_extended(&tucked, &knuckle, &pinky_base, &wrist));
    }

    #[test]
    fn test_neutral_classification() {
        let neutral = HandClassification::neutral();
        assert_eq!(neutral.pointing_direction, PointingDirection::None);
        assert_eq!(neutral.extended_fingers.count(), 0);
        assert_eq!(neutral, HandClassification::default());
    }
}
