//! Geometry helpers over normalized landmarks
//!
//! Pure functions, no state.

use crate::types::{EyeIndices, FrameError, Landmark, LandmarkSet};
use crate::YAW_SPAN_EPSILON;

/// Euclidean distance between two landmarks
pub fn distance(a: Landmark, b: Landmark) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Eye aspect ratio: lid distance over corner distance.
///
/// Near 0 when closed, roughly 0.2–0.4 when open. A zero corner distance
/// yields 0 instead of dividing.
pub fn ear(landmarks: &LandmarkSet, eye: &EyeIndices) -> Result<f64, FrameError> {
    let v = distance(landmarks.point(eye.top)?, landmarks.point(eye.bottom)?);
    let h = distance(landmarks.point(eye.outer)?, landmarks.point(eye.inner)?);
    if h == 0.0 {
        return Ok(0.0);
    }
    Ok(v / h)
}

/// Horizontal deviation of the nose from the cheek midpoint, in half-span units.
///
/// Positive: nose right of center. Negative: left. ~0 when facing the camera.
pub fn yaw_proxy(
    landmarks: &LandmarkSet,
    left_cheek: usize,
    right_cheek: usize,
    nose: usize,
) -> Result<f64, FrameError> {
    let left = landmarks.point(left_cheek)?;
    let right = landmarks.point(right_cheek)?;
    let nose = landmarks.point(nose)?;

    let center_x = (left.x + right.x) / 2.0;
    let half_span = ((right.x - left.x).abs() / 2.0).max(YAW_SPAN_EPSILON);
    Ok((nose.x - center_x) / half_span)
}

/// One EMA step. The first sample passes through unchanged.
pub fn ema(previous: Option<f64>, next: f64, alpha: f64) -> f64 {
    match previous {
        None => next,
        Some(prev) => prev * (1.0 - alpha) + next * alpha,
    }
}
