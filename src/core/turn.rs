//! Turn detector: held yaw excursion in either direction
//!
//! - |yaw| >= threshold starts (or continues) a hold in the yaw's direction
//! - a hold lasting >= hold_min_ms commits that direction's flag
//! - dropping under the threshold, flipping sign, or losing the face
//!   restarts the hold
//!
//! Committed flags never clear within a session.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::types::LivenessConfig;

/// Head turn direction, by the sign of the yaw proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    fn of(yaw: f64) -> Self {
        if yaw > 0.0 {
            TurnDirection::Right
        } else {
            TurnDirection::Left
        }
    }
}

/// Result of feeding one sample to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnOutcome {
    /// Within the centered band
    Centered,
    /// Beyond threshold, hold not yet long enough
    Holding { direction: TurnDirection, held_ms: f64 },
    /// Hold satisfied and the flag was newly set
    Committed(TurnDirection),
    /// Hold satisfied for an already committed direction
    AlreadyCommitted(TurnDirection),
}

/// Turn state machine
#[derive(Debug, Clone)]
pub struct TurnDetector {
    /// |yaw| threshold
    yaw_abs_threshold: f64,
    /// Continuous hold required
    hold_min_ms: f64,
    /// Current excursion: direction and start time
    beyond_since: Option<(TurnDirection, f64)>,
    turned_left: bool,
    turned_right: bool,
}

impl Default for TurnDetector {
    fn default() -> Self {
        Self::from_config(&LivenessConfig::default())
    }
}

impl TurnDetector {
    pub fn new(yaw_abs_threshold: f64, hold_min_ms: f64) -> Self {
        Self {
            yaw_abs_threshold,
            hold_min_ms,
            beyond_since: None,
            turned_left: false,
            turned_right: false,
        }
    }

    pub fn from_config(config: &LivenessConfig) -> Self {
        Self::new(config.yaw_abs_threshold, config.yaw_hold_min_ms)
    }

    /// Update with the smoothed yaw at `now_ms`
    pub fn update(&mut self, yaw: f64, now_ms: f64) -> TurnOutcome {
        if yaw.abs() < self.yaw_abs_threshold {
            if self.beyond_since.take().is_some() {
                debug!(yaw, "turn hold interrupted");
            }
            return TurnOutcome::Centered;
        }

        let direction = TurnDirection::of(yaw);
        let since = match self.beyond_since {
            Some((held_dir, since)) if held_dir == direction => since,
            _ => {
                self.beyond_since = Some((direction, now_ms));
                debug!(?direction, yaw, now_ms, "turn hold started");
                return TurnOutcome::Holding { direction, held_ms: 0.0 };
            }
        };

        let held_ms = now_ms - since;
        if held_ms < self.hold_min_ms {
            return TurnOutcome::Holding { direction, held_ms };
        }

        let flag = match direction {
            TurnDirection::Left => &mut self.turned_left,
            TurnDirection::Right => &mut self.turned_right,
        };
        if *flag {
            return TurnOutcome::AlreadyCommitted(direction);
        }
        *flag = true;
        info!(?direction, held_ms, "turn committed");
        TurnOutcome::Committed(direction)
    }

    /// Face lost: abandon the current hold, flags stay
    pub fn tracking_lost(&mut self) {
        self.beyond_since = None;
    }

    pub fn turned_left(&self) -> bool {
        self.turned_left
    }

    pub fn turned_right(&self) -> bool {
        self.turned_right
    }

    /// Start time of the current hold
    pub fn beyond_since(&self) -> Option<f64> {
        self.beyond_since.map(|(_, since)| since)
    }

    /// Reset detector to initial state, keeping its thresholds
    pub fn reset(&mut self) {
        *self = Self::new(self.yaw_abs_threshold, self.hold_min_ms);
    }
}

// =============================================================================
// TESTS
// =============================================================================
