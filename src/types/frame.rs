//! Per-frame input record

use serde::{Deserialize, Serialize};
use crate::types::LandmarkSet;

/// One detection result per captured video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Landmarks of the first detected face, `None` when no face was found
    #[serde(default)]
    pub landmarks: Option<LandmarkSet>,
    /// Capture time in milliseconds on a monotonic clock
    pub timestamp_ms: f64,
}

impl FrameInput {
    pub fn new(landmarks: Option<LandmarkSet>, timestamp_ms: f64) -> Self {
        Self { landmarks, timestamp_ms }
    }

    /// Frame with no face detected
    pub fn empty(timestamp_ms: f64) -> Self {
        Self { landmarks: None, timestamp_ms }
    }

    pub fn has_face(&self) -> bool {
        self.landmarks.is_some()
    }
}
