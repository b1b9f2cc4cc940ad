//! Synthetic landmark sets and scripted sessions
//!
//! Used for demo traces (`livecheck --demo`) and tests.

use crate::types::{FrameInput, Landmark, LandmarkIndices, LandmarkSet};

/// Frame interval of generated scripts (~30 fps)
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 30.0;

/// Raw EAR of an open eye in generated faces
pub const OPEN_EAR: f64 = 0.30;

/// Raw EAR of a closed eye in generated faces
pub const CLOSED_EAR: f64 = 0.05;

/// A face whose raw per-eye EAR and yaw proxy equal `ear` and `yaw` exactly
pub fn face(indices: &LandmarkIndices, ear: f64, yaw: f64) -> LandmarkSet {
    let mut set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); indices.required_len()]);

    // Eye corners 0.1 apart, lids split by ear * 0.1
    for (eye, cx) in [(indices.left_eye, 0.4), (indices.right_eye, 0.6)] {
        set.set(eye.outer, Landmark::new(cx - 0.05, 0.45));
        set.set(eye.inner, Landmark::new(cx + 0.05, 0.45));
        set.set(eye.top, Landmark::new(cx, 0.45 - ear * 0.05));
        set.set(eye.bottom, Landmark::new(cx, 0.45 + ear * 0.05));
    }

    // Cheek half-span 0.2, nose offset yaw * 0.2
    set.set(indices.left_cheek, Landmark::new(0.3, 0.6));
    set.set(indices.right_cheek, Landmark::new(0.7, 0.6));
    set.set(indices.nose_tip, Landmark::new(0.5 + yaw * 0.2, 0.55));
    set
}

/// One segment of a scripted session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Constant face for `ms`
    Hold { ear: f64, yaw: f64, ms: f64 },
    /// No face for `ms`
    Absent { ms: f64 },
}

/// Builds a frame sequence at a fixed frame rate
#[derive(Debug, Clone)]
pub struct Script {
    indices: LandmarkIndices,
    interval_ms: f64,
    now_ms: f64,
    frames: Vec<FrameInput>,
}

impl Script {
    pub fn new(indices: LandmarkIndices) -> Self {
        Self { indices, interval_ms: FRAME_INTERVAL_MS, now_ms: 0.0, frames: Vec::new() }
    }

    pub fn with_interval(mut self, interval_ms: f64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        let (face_set, ms) = match segment {
            Segment::Hold { ear, yaw, ms } => (Some(face(&self.indices, ear, yaw)), ms),
            Segment::Absent { ms } => (None, ms),
        };
        let end = self.now_ms + ms;
        while self.now_ms < end {
            self.frames.push(FrameInput::new(face_set.clone(), self.now_ms));
            self.now_ms += self.interval_ms;
        }
        self
    }

    /// Eyes open, facing the camera
    pub fn rest(self, ms: f64) -> Self {
        self.segment(Segment::Hold { ear: OPEN_EAR, yaw: 0.0, ms })
    }

    /// Eyes closed for `closed_ms`, then reopened
    pub fn blink(self, closed_ms: f64) -> Self {
        self.segment(Segment::Hold { ear: CLOSED_EAR, yaw: 0.0, ms: closed_ms })
    }

    /// Head turned to `yaw` for `ms`, eyes open
    pub fn turn(self, yaw: f64, ms: f64) -> Self {
        self.segment(Segment::Hold { ear: OPEN_EAR, yaw, ms })
    }

    pub fn absent(self, ms: f64) -> Self {
        self.segment(Segment::Absent { ms })
    }

    /// Timestamp the next frame would get
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn build(self) -> Vec<FrameInput> {
        self.frames
    }
}

/// A complete passing session: two blinks, a left turn, a right turn
pub fn demo_session(indices: LandmarkIndices) -> Vec<FrameInput> {
    Script::new(indices)
        .rest(500.0)
        .blink(200.0)
        .rest(500.0)
        .blink(200.0)
        .rest(500.0)
        .turn(-0.8, 700.0)
        .rest(500.0)
        .turn(0.8, 700.0)
        .rest(300.0)
        .build()
}
