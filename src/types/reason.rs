//! Reason codes attached to every frame output

use serde::{Deserialize, Serialize};

/// What happened on a frame, most significant event wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // L001: Input
    // =========================================================================
    /// No face in this frame, in-progress blink and hold interrupted
    L001_NO_FACE,
    /// Frame could not be processed and was skipped
    L001_FRAME_ERROR,

    // =========================================================================
    // L002: Eyes
    // =========================================================================
    /// Face tracked, nothing notable
    L002_TRACKING,
    /// Eyes just dropped below the close threshold
    L002_EYES_CLOSING,
    /// Eyes still below the reopen threshold
    L002_EYES_CLOSED,

    // =========================================================================
    // L003: Blinks
    // =========================================================================
    /// Closed→open transition counted as a blink
    L003_BLINK_COUNTED,
    /// Closure shorter than the minimum duration
    L003_BLINK_TOO_SHORT,
    /// Blink inside the refractory window of the previous one
    L003_BLINK_REFRACTORY,

    // =========================================================================
    // L004: Turns
    // =========================================================================
    /// Yaw beyond threshold, hold accumulating
    L004_TURN_HOLDING,
    /// Left turn held long enough
    L004_TURN_LEFT_COMMITTED,
    /// Right turn held long enough
    L004_TURN_RIGHT_COMMITTED,

    // =========================================================================
    // L005: Verdict
    // =========================================================================
    /// Verdict reached on this frame
    L005_LIVENESS_PASSED,
    /// Verdict already reached, frame ignored
    L005_SESSION_COMPLETE,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::L001_NO_FACE => "L001_NO_FACE",
            Self::L001_FRAME_ERROR => "L001_FRAME_ERROR",
            Self::L002_TRACKING => "L002_TRACKING",
            Self::L002_EYES_CLOSING => "L002_EYES_CLOSING",
            Self::L002_EYES_CLOSED => "L002_EYES_CLOSED",
            Self::L003_BLINK_COUNTED => "L003_BLINK_COUNTED",
            Self::L003_BLINK_TOO_SHORT => "L003_BLINK_TOO_SHORT",
            Self::L003_BLINK_REFRACTORY => "L003_BLINK_REFRACTORY",
            Self::L004_TURN_HOLDING => "L004_TURN_HOLDING",
            Self::L004_TURN_LEFT_COMMITTED => "L004_TURN_LEFT_COMMITTED",
            Self::L004_TURN_RIGHT_COMMITTED => "L004_TURN_RIGHT_COMMITTED",
            Self::L005_LIVENESS_PASSED => "L005_LIVENESS_PASSED",
            Self::L005_SESSION_COMPLETE => "L005_SESSION_COMPLETE",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::L001_NO_FACE => "No face detected",
            Self::L001_FRAME_ERROR => "Frame skipped",
            Self::L002_TRACKING => "Tracking face",
            Self::L002_EYES_CLOSING => "Eyes closing",
            Self::L002_EYES_CLOSED => "Eyes closed",
            Self::L003_BLINK_COUNTED => "Blink counted",
            Self::L003_BLINK_TOO_SHORT => "Closure too short for a blink",
            Self::L003_BLINK_REFRACTORY => "Blink too soon after the previous one",
            Self::L004_TURN_HOLDING => "Holding head turn",
            Self::L004_TURN_LEFT_COMMITTED => "Left turn done",
            Self::L004_TURN_RIGHT_COMMITTED => "Right turn done",
            Self::L005_LIVENESS_PASSED => "Liveness passed",
            Self::L005_SESSION_COMPLETE => "Session complete",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
