//! Landmark definitions
//!
//! Coordinates are normalized to the frame: `x, y ∈ [0, 1]`.

use serde::{Deserialize, Serialize};
use crate::types::FrameError;

/// A single 2D facial landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Inside the normalized frame, edges included
    pub fn in_frame(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Indexed landmark collection as produced by the face-mesh detector.
///
/// Indices are semantically fixed by the detector's convention, see
/// [`LandmarkIndices`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Landmark at `idx`, checked for presence, finiteness and frame bounds
    pub fn point(&self, idx: usize) -> Result<Landmark, FrameError> {
        let p = self
            .points
            .get(idx)
            .copied()
            .ok_or(FrameError::LandmarkOutOfRange { index: idx, len: self.points.len() })?;
        if !p.is_finite() {
            return Err(FrameError::NonFiniteLandmark { index: idx });
        }
        if !p.in_frame() {
            return Err(FrameError::LandmarkOutsideFrame { index: idx, x: p.x, y: p.y });
        }
        Ok(p)
    }

    /// Overwrite the landmark at `idx`, growing the set with origin points if needed
    pub fn set(&mut self, idx: usize, p: Landmark) {
        if self.points.len() <= idx {
            self.points.resize(idx + 1, Landmark::new(0.0, 0.0));
        }
        self.points[idx] = p;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

/// The four landmark indices an eye-aspect-ratio needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeIndices {
    /// Upper lid
    pub top: usize,
    /// Lower lid
    pub bottom: usize,
    /// Outer corner
    pub outer: usize,
    /// Inner corner
    pub inner: usize,
}

/// Semantic landmark positions consumed by the pipeline.
///
/// Defaults follow the MediaPipe 468-point face mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkIndices {
    pub left_eye: EyeIndices,
    pub right_eye: EyeIndices,
    pub left_cheek: usize,
    pub right_cheek: usize,
    pub nose_tip: usize,
}

impl Default for LandmarkIndices {
    fn default() -> Self {
        Self::face_mesh_468()
    }
}

impl LandmarkIndices {
    /// MediaPipe face mesh (468/478 points)
    pub fn face_mesh_468() -> Self {
        Self {
            left_eye: EyeIndices { top: 159, bottom: 145, outer: 33, inner: 133 },
            right_eye: EyeIndices { top: 386, bottom: 374, outer: 263, inner: 362 },
            left_cheek: 234,
            right_cheek: 454,
            nose_tip: 1,
        }
    }

    /// dlib / iBUG 68-point layout
    pub fn ibug_68() -> Self {
        Self {
            left_eye: EyeIndices { top: 37, bottom: 41, outer: 36, inner: 39 },
            right_eye: EyeIndices { top: 44, bottom: 46, outer: 45, inner: 42 },
            left_cheek: 1,
            right_cheek: 15,
            nose_tip: 30,
        }
    }

    /// Smallest landmark set length that covers every index
    pub fn required_len(&self) -> usize {
        [
            self.left_eye.top,
            self.left_eye.bottom,
            self.left_eye.outer,
            self.left_eye.inner,
            self.right_eye.top,
            self.right_eye.bottom,
            self.right_eye.outer,
            self.right_eye.inner,
            self.left_cheek,
            self.right_cheek,
            self.nose_tip,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_out_of_range() {
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5)]);
        assert!(set.point(0).is_ok());
        assert!(matches!(
            set.point(3),
            Err(FrameError::LandmarkOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_point_rejects_nan() {
        let set = LandmarkSet::new(vec![Landmark::new(f64::NAN, 0.5)]);
        assert!(matches!(set.point(0), Err(FrameError::NonFiniteLandmark { index: 0 })));
    }

    #[test]
    fn test_point_rejects_outside_frame() {
        let set = LandmarkSet::new(vec![
            Landmark::new(1e308, 0.5),
            Landmark::new(0.5, -0.01),
            Landmark::new(1.0, 0.0),
        ]);
        assert!(matches!(set.point(0), Err(FrameError::LandmarkOutsideFrame { index: 0, .. })));
        assert!(matches!(set.point(1), Err(FrameError::LandmarkOutsideFrame { index: 1, .. })));
        // Edges are inside
        assert!(set.point(2).is_ok());
    }

    #[test]
    fn test_set_grows() {
        let mut set = LandmarkSet::default();
        set.set(4, Landmark::new(0.1, 0.2));
        assert_eq!(set.len(), 5);
        assert_eq!(set.point(4).unwrap(), Landmark::new(0.1, 0.2));
    }

    #[test]
    fn test_required_len() {
        assert_eq!(LandmarkIndices::face_mesh_468().required_len(), 455);
        assert_eq!(LandmarkIndices::ibug_68().required_len(), 47);
    }

    #[test]
    fn test_landmark_set_json_is_plain_array() {
        let set = LandmarkSet::new(vec![Landmark::new(0.25, 0.75)]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"x":0.25,"y":0.75}]"#);
    }
}
