//! On-screen instruction step
//!
//! Purely presentational: derived from detector state after every frame,
//! never fed back into the detectors.
//!
//! BLINK → LEFT → RIGHT → PASS (whichever is still pending)

use colored::Color;
use serde::{Deserialize, Serialize};

/// The instruction currently shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LivenessStep {
    /// Blinks still missing
    Blink,
    /// Left turn still missing
    Left,
    /// Right turn still missing
    Right,
    /// Verdict reached
    Pass,
}

impl LivenessStep {
    /// Project detector state onto the instruction ordering
    pub fn derive(
        blink_count: u32,
        blinks_required: u32,
        turned_left: bool,
        turned_right: bool,
        passed: bool,
    ) -> Self {
        if passed {
            LivenessStep::Pass
        } else if blink_count < blinks_required {
            LivenessStep::Blink
        } else if !turned_left {
            LivenessStep::Left
        } else if !turned_right {
            LivenessStep::Right
        } else {
            LivenessStep::Pass
        }
    }

    /// Terminal color for this step
    pub fn color(&self) -> Color {
        match self {
            LivenessStep::Blink => Color::Blue,
            LivenessStep::Left => Color::Yellow,
            LivenessStep::Right => Color::Magenta,
            LivenessStep::Pass => Color::Green,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LivenessStep::Blink => "👁",
            LivenessStep::Left => "⬅",
            LivenessStep::Right => "➡",
            LivenessStep::Pass => "✅",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            LivenessStep::Blink => "Blink twice",
            LivenessStep::Left => "Turn your head left",
            LivenessStep::Right => "Turn your head right",
            LivenessStep::Pass => "Verification passed",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            LivenessStep::Blink => "Look at the camera and blink normally.",
            LivenessStep::Left => "Turn slowly until the step is marked done.",
            LivenessStep::Right => "Turn slowly to the other side.",
            LivenessStep::Pass => "Liveness confirmed.",
        }
    }
}

impl std::fmt::Display for LivenessStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LivenessStep::Blink => "BLINK",
            LivenessStep::Left => "LEFT",
            LivenessStep::Right => "RIGHT",
            LivenessStep::Pass => "PASS",
        };
        write!(f, "{}", name)
    }
}

/// Completion fraction shown in the progress bar: blinks, left, right weigh 1/3 each
pub fn progress(blink_count: u32, blinks_required: u32, turned_left: bool, turned_right: bool) -> f64 {
    let required = blinks_required.max(1);
    let blink_part = blink_count.min(required) as f64 / required as f64;
    let turns = turned_left as u8 as f64 + turned_right as u8 as f64;
    (blink_part + turns) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_ordering() {
        assert_eq!(LivenessStep::derive(0, 2, false, false, false), LivenessStep::Blink);
        assert_eq!(LivenessStep::derive(2, 2, false, false, false), LivenessStep::Left);
        assert_eq!(LivenessStep::derive(2, 2, true, false, false), LivenessStep::Right);
        assert_eq!(LivenessStep::derive(2, 2, true, true, true), LivenessStep::Pass);
    }

    #[test]
    fn test_turns_before_blinks_still_show_blink() {
        // Detectors are independent; the projection just reports what is pending
        assert_eq!(LivenessStep::derive(1, 2, true, true, false), LivenessStep::Blink);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(0, 2, false, false), 0.0);
        assert!((progress(1, 2, false, false) - 1.0 / 6.0).abs() < 1e-9);
        assert!((progress(5, 2, true, true) - 1.0).abs() < 1e-9);
    }
}
