// src/lib.rs
pub mod config;
pub mod control;
pub mod data;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod landmarks;
pub mod mediapipe_bridge;
pub mod tracking;

pub use config::{OutputSettings, TrackerConfig};
pub use control::{BrightnessBand, BrightnessSink, LoggingSink};
pub use error::GestureError;
pub use gesture::{ControlView, GesturePhase, GestureState};
pub use tracking::{FrameEvent, FrameOutput, FrameSize, GestureTracker, HandsSnapshot};
