// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GestureError {
    /// The frame surface needed for calibration is not ready; the frame is skipped.
    #[error("frame surface unavailable")]
    InputUnavailable,

    #[error("expected {expected} hand landmarks, found {found}")]
    LandmarkCount { expected: usize, found: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
