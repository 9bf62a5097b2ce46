// src/gesture.rs - debounced gesture-control state machine
//!
//! The right hand alone drives control. An index+pinky "horns" pose held for
//! `activation_frames` engages control mode; while engaged, dropping the pinky
//! and pointing sideways for `brightness_frames` engages the brightness
//! sub-mode and anchors it at the fingertip. A streak of `deactivation_frames`
//! bad frames resets everything, and while such a streak is building no other
//! transition happens.

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::tracking::HandsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureThresholds {
    pub activation_frames: u32,
    pub deactivation_frames: u32,
    pub brightness_frames: u32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            activation_frames: 10,
            deactivation_frames: 15,
            brightness_frames: 10,
        }
    }
}

impl From<&TrackerConfig> for GestureThresholds {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            activation_frames: config.activation_frames,
            deactivation_frames: config.deactivation_frames,
            brightness_frames: config.brightness_frames,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GestureState {
    pub activation_frames: u32,
    pub deactivation_frames: u32,
    pub is_gesture_control_active: bool,
    pub brightness_control_frames: u32,
    pub is_brightness_control: bool,
    /// Fingertip position captured on sub-mode entry. Never recalibrated while
    /// the sub-mode stays active.
    pub initial_x: Option<f64>,
    pub initial_y: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Arming(u32),
    Active,
    ActiveArmingBrightness(u32),
    ActiveBrightness,
}

/// The part of the state shown to rendering and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ControlView {
    pub activation_frames: u32,
    pub is_gesture_control_active: bool,
    pub brightness_control_frames: u32,
    pub is_brightness_control: bool,
}

impl GestureState {
    pub fn phase(&self) -> GesturePhase {
        match (self.is_gesture_control_active, self.is_brightness_control) {
            (false, _) if self.activation_frames == 0 => GesturePhase::Idle,
            (false, _) => GesturePhase::Arming(self.activation_frames),
            (true, true) => GesturePhase::ActiveBrightness,
            (true, false) if self.brightness_control_frames > 0 => {
                GesturePhase::ActiveArmingBrightness(self.brightness_control_frames)
            }
            (true, false) => GesturePhase::Active,
        }
    }

    pub fn view(&self) -> ControlView {
        ControlView {
            activation_frames: self.activation_frames,
            is_gesture_control_active: self.is_gesture_control_active,
            brightness_control_frames: self.brightness_control_frames,
            is_brightness_control: self.is_brightness_control,
        }
    }

    pub fn anchor(&self) -> Option<(f64, f64)> {
        self.initial_x.zip(self.initial_y)
    }
}

/// Advances the state by one frame. `hands_present` is false when the detector
/// reported no hands at all.
pub fn step(
    prev: &GestureState,
    hands: &HandsSnapshot,
    hands_present: bool,
    thresholds: &GestureThresholds,
) -> GestureState {
    let right = &hands.right;
    let fingers = &right.extended_fingers;

    let deactivate = !hands_present
        || (prev.is_gesture_control_active && (fingers.middle || fingers.ring || !fingers.index));

    if deactivate {
        let deactivation_frames = prev.deactivation_frames + 1;
        if deactivation_frames >= thresholds.deactivation_frames {
            return GestureState::default();
        }
        return GestureState {
            deactivation_frames,
            ..prev.clone()
        };
    }

    let activation_gesture = fingers.index && fingers.pinky && !fingers.middle && !fingers.ring;

    if !prev.is_gesture_control_active {
        if !activation_gesture {
            return GestureState::default();
        }
        let activation_frames = prev.activation_frames + 1;
        return GestureState {
            activation_frames,
            deactivation_frames: 0,
            is_gesture_control_active: activation_frames >= thresholds.activation_frames,
            ..prev.clone()
        };
    }

    let is_pinky_down = !fingers.pinky && fingers.index;
    let direction = right.pointing_direction;

    if prev.is_brightness_control && (direction.is_vertical() || !is_pinky_down) {
        return exit_brightness(prev);
    }

    if is_pinky_down && direction.is_horizontal() {
        if prev.is_brightness_control {
            return GestureState {
                deactivation_frames: 0,
                ..prev.clone()
            };
        }

        let brightness_control_frames = prev.brightness_control_frames + 1;
        if brightness_control_frames >= thresholds.brightness_frames {
            let (x, y) = right.coordinates;
            return GestureState {
                deactivation_frames: 0,
                brightness_control_frames,
                is_brightness_control: true,
                initial_x: Some(x),
                initial_y: Some(y),
                ..prev.clone()
            };
        }
        return GestureState {
            deactivation_frames: 0,
            brightness_control_frames,
            ..prev.clone()
        };
    }

    exit_brightness(prev)
}

fn exit_brightness(prev: &GestureState) -> GestureState {
    GestureState {
        deactivation_frames: 0,
        brightness_control_frames: 0,
        is_brightness_control: false,
        initial_x: None,
        initial_y: None,
        ..prev.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{HandClassification, PointingDirection};
    use crate::landmarks::Fingers;

    fn right_hand(
        index: bool,
        middle: bool,
        ring: bool,
        pinky: bool,
        direction: PointingDirection,
        tip: (f64, f64),
    ) -> HandsSnapshot {
        let mut right = HandClassification::neutral();
        right.extended_fingers = Fingers { thumb: false, index, middle, ring, pinky };
        right.pointing_direction = direction;
        right.coordinates = tip;
        right.confidence = 0.9;
        HandsSnapshot {
            left: HandClassification::neutral(),
            right,
        }
    }

    fn horns() -> HandsSnapshot {
        right_hand(true, false, false, true, PointingDirection::Up, (0.5, 0.4))
    }

    fn point_left(tip: (f64, f64)) -> HandsSnapshot {
        right_hand(true, false, false, false, PointingDirection::Left, tip)
    }

    fn fist() -> HandsSnapshot {
        right_hand(false, false, false, false, PointingDirection::Up, (0.5, 0.5))
    }

    fn run(mut state: GestureState, frames: &[HandsSnapshot]) -> GestureState {
        let thresholds = GestureThresholds::default();
        for hands in frames {
            state = step(&state, hands, true, &thresholds);
        }
        state
    }

    fn active_state() -> GestureState {
        let state = run(GestureState::default(), &vec![horns(); 10]);
        assert!(state.is_gesture_control_active);
        state
    }

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(GestureState::default().phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_nine_frames_then_break_resets_arming() {
        let mut frames = vec![horns(); 9];
        let state = run(GestureState::default(), &frames);
        assert_eq!(state.phase(), GesturePhase::Arming(9));

        frames.push(right_hand(true, false, false, false, PointingDirection::Up, (0.5, 0.4)));
        let state = run(GestureState::default(), &frames);
        assert_eq!(state.activation_frames, 0);
        assert!(!state.is_gesture_control_active);
        assert_eq!(state, GestureState::default());
    }

    #[test]
    fn test_ten_frames_activate() {
        let state = run(GestureState::default(), &vec![horns(); 10]);
        assert!(state.is_gesture_control_active);
        assert_eq!(state.activation_frames, 10);
        assert_eq!(state.phase(), GesturePhase::Active);
    }

    #[test]
    fn test_fist_while_idle_stays_idle() {
        let state = run(GestureState::default(), &[fist(), fist()]);
        assert_eq!(state, GestureState::default());
    }

    #[test]
    fn test_deactivation_needs_fifteen_frames() {
        let active = active_state();

        let state = run(active.clone(), &vec![fist(); 14]);
        assert!(state.is_gesture_control_active);
        assert_eq!(state.deactivation_frames, 14);
        assert_eq!(state.activation_frames, 10);

        let state = run(state, &[fist()]);
        assert_eq!(state, GestureState::default());
    }

    #[test]
    fn test_good_frame_clears_deactivation_streak() {
        let state = run(active_state(), &vec![fist(); 5]);
        assert_eq!(state.deactivation_frames, 5);
        let state = run(state, &[horns()]);
        assert_eq!(state.deactivation_frames, 0);
        assert!(state.is_gesture_control_active);
    }

    #[test]
    fn test_deactivation_streak_freezes_submode_arming() {
        let state = run(active_state(), &vec![point_left((0.3, 0.5)); 4]);
        assert_eq!(state.brightness_control_frames, 4);

        // Middle finger up while active is a deactivation frame.
        let middle = right_hand(true, true, false, false, PointingDirection::Left, (0.3, 0.5));
        let state = run(state, &[middle]);
        assert_eq!(state.brightness_control_frames, 4);
        assert_eq!(state.deactivation_frames, 1);
    }

    #[test]
    fn test_no_hands_counts_as_deactivation() {
        let active = active_state();
        let next = step(
            &active,
            &HandsSnapshot::default(),
            false,
            &GestureThresholds::default(),
        );
        assert_eq!(next.deactivation_frames, 1);
        assert_eq!(
            GestureState { deactivation_frames: 0, ..next.clone() },
            active
        );
    }

    #[test]
    fn test_brightness_submode_entry_captures_anchor() {
        let mut frames: Vec<HandsSnapshot> = (0..9).map(|i| point_left((0.3, 0.4 + i as f64 * 0.01))).collect();
        frames.push(point_left((0.31, 0.62)));

        let armed = run(active_state(), &frames[..9]);
        assert_eq!(armed.phase(), GesturePhase::ActiveArmingBrightness(9));
        assert_eq!(armed.anchor(), None);

        let state = run(active_state(), &frames);
        assert!(state.is_brightness_control);
        assert_eq!(state.phase(), GesturePhase::ActiveBrightness);
        assert_eq!(state.initial_x, Some(0.31));
        assert_eq!(state.initial_y, Some(0.62));
    }

    #[test]
    fn test_diagonal_counts_as_horizontal() {
        let diag = right_hand(true, false, false, false, PointingDirection::DownRight, (0.6, 0.5));
        let state = run(active_state(), &vec![diag; 10]);
        assert!(state.is_brightness_control);
    }

    #[test]
    fn test_break_during_submode_arming_resets_counter() {
        let mut frames = vec![point_left((0.3, 0.5)); 5];
        frames.push(horns());
        let state = run(active_state(), &frames);
        assert_eq!(state.brightness_control_frames, 0);
        assert!(state.is_gesture_control_active);
        assert!(!state.is_brightness_control);
    }

    #[test]
    fn test_anchor_not_recalibrated() {
        let state = run(active_state(), &vec![point_left((0.3, 0.5)); 10]);
        let state = run(state, &[point_left((0.2, 0.7)), point_left((0.25, 0.3))]);
        assert!(state.is_brightness_control);
        assert_eq!(state.anchor(), Some((0.3, 0.5)));
        assert_eq!(state.brightness_control_frames, 10);
    }

    #[test]
    fn test_vertical_point_exits_submode() {
        let state = run(active_state(), &vec![point_left((0.3, 0.5)); 10]);
        let up = right_hand(true, false, false, false, PointingDirection::Up, (0.3, 0.5));
        let state = run(state, &[up]);
        assert!(!state.is_brightness_control);
        assert!(state.is_gesture_control_active);
        assert_eq!(state.brightness_control_frames, 0);
        assert_eq!(state.anchor(), None);
    }

    #[test]
    fn test_pinky_up_exits_submode() {
        let state = run(active_state(), &vec![point_left((0.3, 0.5)); 10]);
        let state = run(state, &[horns()]);
        assert_eq!(state.phase(), GesturePhase::Active);
    }

    #[test]
    fn test_submode_implies_control_active() {
        let mut state = run(active_state(), &vec![point_left((0.3, 0.5)); 10]);
        let thresholds = GestureThresholds::default();
        for _ in 0..15 {
            state = step(&state, &HandsSnapshot::default(), false, &thresholds);
            assert!(!state.is_brightness_control || state.is_gesture_control_active);
        }
        assert_eq!(state, GestureState::default());
    }

    #[test]
    fn test_view_exposes_public_fields() {
        let state = run(GestureState::default(), &vec![horns(); 3]);
        let view = state.view();
        assert_eq!(view.activation_frames, 3);
        assert!(!view.is_gesture_control_active);
        assert_eq!(view.brightness_control_frames, 0);
    }
}
