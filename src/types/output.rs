//! Per-frame output handed to the frame callback

use colored::Colorize;
use serde::{Deserialize, Serialize};
use crate::types::{LivenessStep, ReasonCode};

/// Output structure for each processed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessOutput {
    /// Timestamp of the frame that produced this output (ms)
    pub timestamp_ms: f64,
    /// Terminal verdict, latched once true
    pub liveness_passed: bool,
    pub blink_count: u32,
    pub turned_left: bool,
    pub turned_right: bool,
    /// Smoothed left-eye EAR, 0 on a faceless frame
    pub left_ear: f64,
    /// Smoothed right-eye EAR, 0 on a faceless frame
    pub right_ear: f64,
    /// Smoothed yaw proxy, 0 on a faceless frame
    pub yaw_deviation: f64,
    /// Pending instruction
    pub step: LivenessStep,
    /// Completion fraction in [0, 1]
    pub progress: f64,
    /// What happened on this frame
    pub reason: ReasonCode,
}

impl LivenessOutput {
    /// Output of a freshly reset session
    pub fn initial() -> Self {
        Self {
            timestamp_ms: 0.0,
            liveness_passed: false,
            blink_count: 0,
            turned_left: false,
            turned_right: false,
            left_ear: 0.0,
            right_ear: 0.0,
            yaw_deviation: 0.0,
            step: LivenessStep::Blink,
            progress: 0.0,
            reason: ReasonCode::L002_TRACKING,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let line = format!(
            "{} [{}] blinks={} L={} R={} | ear={:.3}/{:.3} yaw={:+.3} | {}",
            self.step.emoji(),
            self.step,
            self.blink_count,
            self.turned_left,
            self.turned_right,
            self.left_ear,
            self.right_ear,
            self.yaw_deviation,
            self.reason.code(),
        );
        line.color(self.step.color()).to_string()
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "t={:.0} | step={} | blinks={} | left={} | right={} | ear={:.3}/{:.3} | yaw={:.3} | passed={} | reason={}",
            self.timestamp_ms,
            self.step,
            self.blink_count,
            self.turned_left,
            self.turned_right,
            self.left_ear,
            self.right_ear,
            self.yaw_deviation,
            self.liveness_passed,
            self.reason.code()
        )
    }
}

/// Round a reported metric to three decimals
pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
