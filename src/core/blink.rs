//! Blink detector: hysteresis state machine over smoothed average EAR
//!
//! State transitions:
//! - OPEN → CLOSED: ear < close_threshold
//! - CLOSED → OPEN: ear >= open_threshold (close + hysteresis)
//!
//! A CLOSED → OPEN transition counts as a blink only if the eyes stayed
//! closed for at least `min_closed_ms` and the previous counted blink is at
//! least `refractory_ms` old.

use tracing::{debug, info};
use crate::types::LivenessConfig;

/// Result of feeding one sample to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlinkOutcome {
    /// Open and staying open
    Open,
    /// Just crossed below the close threshold
    Closing,
    /// Still inside the closed band
    Closed,
    /// Reopened and counted
    Counted,
    /// Reopened after a closure shorter than the minimum
    TooShort { closed_ms: f64 },
    /// Reopened inside the refractory window
    Refractory { since_last_ms: f64 },
}

/// Blink state machine
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    /// Close threshold
    close_threshold: f64,
    /// Reopen threshold, above the close threshold
    open_threshold: f64,
    /// Shortest closure that counts
    min_closed_ms: f64,
    /// Minimum gap between counted blinks
    refractory_ms: f64,
    /// Eyes currently considered closed
    was_closed: bool,
    /// When the current closure began
    closed_since: Option<f64>,
    /// Counted blinks this session
    blink_count: u32,
    /// When the last counted blink reopened; `None` before the first
    last_blink_at: Option<f64>,
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::from_config(&LivenessConfig::default())
    }
}

impl BlinkDetector {
    pub fn new(close_threshold: f64, open_threshold: f64, min_closed_ms: f64, refractory_ms: f64) -> Self {
        Self {
            close_threshold,
            open_threshold,
            min_closed_ms,
            refractory_ms,
            was_closed: false,
            closed_since: None,
            blink_count: 0,
            last_blink_at: None,
        }
    }

    pub fn from_config(config: &LivenessConfig) -> Self {
        Self::new(
            config.ear_close_threshold,
            config.ear_open_threshold(),
            config.ear_close_min_duration_ms,
            config.blink_refractory_ms,
        )
    }

    /// Update with the smoothed average EAR at `now_ms`
    pub fn update(&mut self, ear: f64, now_ms: f64) -> BlinkOutcome {
        // Closed eyes stay closed until the higher reopen threshold is crossed
        let closed = if self.was_closed {
            ear < self.open_threshold
        } else {
            ear < self.close_threshold
        };

        if closed {
            if self.was_closed {
                return BlinkOutcome::Closed;
            }
            self.was_closed = true;
            self.closed_since = Some(now_ms);
            debug!(ear, now_ms, "eyes closing");
            return BlinkOutcome::Closing;
        }

        if !self.was_closed {
            return BlinkOutcome::Open;
        }

        // CLOSED → OPEN
        let closed_ms = now_ms - self.closed_since.unwrap_or(now_ms);
        self.was_closed = false;
        self.closed_since = None;

        if closed_ms < self.min_closed_ms {
            debug!(closed_ms, "closure too short, not a blink");
            return BlinkOutcome::TooShort { closed_ms };
        }

        if let Some(last) = self.last_blink_at {
            let since_last_ms = now_ms - last;
            if since_last_ms < self.refractory_ms {
                debug!(since_last_ms, "blink inside refractory window");
                return BlinkOutcome::Refractory { since_last_ms };
            }
        }

        self.blink_count += 1;
        self.last_blink_at = Some(now_ms);
        info!(count = self.blink_count, closed_ms, "blink counted");
        BlinkOutcome::Counted
    }

    /// Face lost: abandon any in-progress closure
    pub fn tracking_lost(&mut self) {
        self.was_closed = false;
        self.closed_since = None;
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    pub fn is_closed(&self) -> bool {
        self.was_closed
    }

    pub fn closed_since(&self) -> Option<f64> {
        self.closed_since
    }

    /// Reset detector to initial state, keeping its thresholds
    pub fn reset(&mut self) {
        *self = Self::new(self.close_threshold, self.open_threshold, self.min_closed_ms, self.refractory_ms);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed (ear, t) pairs, return the final count
    fn feed(detector: &mut BlinkDetector, samples: &[(f64, f64)]) -> u32 {
        for &(ear, t) in samples {
            detector.update(ear, t);
        }
        detector.blink_count()
    }

    #[test]
    fn test_initial_state_is_open() {
        let d = BlinkDetector::default();
        assert!(!d.is_closed());
        assert_eq!(d.blink_count(), 0);
    }

    #[test]
    fn test_150ms_closure_counts_once() {
        let mut d = BlinkDetector::default();
        assert_eq!(d.update(0.30, 0.0), BlinkOutcome::Open);
        assert_eq!(d.update(0.10, 1000.0), BlinkOutcome::Closing);
        assert_eq!(d.update(0.10, 1075.0), BlinkOutcome::Closed);
        assert_eq!(d.update(0.30, 1150.0), BlinkOutcome::Counted);
        assert_eq!(d.blink_count(), 1);
    }

    #[test]
    fn test_50ms_closure_is_noise() {
        let mut d = BlinkDetector::default();
        d.update(0.30, 0.0);
        d.update(0.10, 1000.0);
        let out = d.update(0.30, 1050.0);
        assert_eq!(out, BlinkOutcome::TooShort { closed_ms: 50.0 });
        assert_eq!(d.blink_count(), 0);
    }

    #[test]
    fn test_first_blink_near_time_zero_counts() {
        let mut d = BlinkDetector::default();
        d.update(0.10, 0.0);
        assert_eq!(d.update(0.30, 150.0), BlinkOutcome::Counted);
    }

    #[test]
    fn test_refractory_counts_only_first() {
        let mut d = BlinkDetector::default();
        d.update(0.10, 0.0);
        assert_eq!(d.update(0.30, 150.0), BlinkOutcome::Counted);
        d.update(0.10, 160.0);
        let out = d.update(0.30, 300.0);
        assert_eq!(out, BlinkOutcome::Refractory { since_last_ms: 150.0 });
        assert_eq!(d.blink_count(), 1);
    }

    #[test]
    fn test_blinks_outside_refractory_both_count() {
        let mut d = BlinkDetector::default();
        let count = feed(&mut d, &[(0.10, 0.0), (0.30, 150.0), (0.10, 300.0), (0.30, 450.0)]);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_hysteresis_no_false_reopen() {
        let mut d = BlinkDetector::default();
        let mut t = 0.0;
        for i in 0..40 {
            let ear = if i % 2 == 0 { 0.17 } else { 0.19 };
            let out = d.update(ear, t);
            assert!(!matches!(out, BlinkOutcome::Counted | BlinkOutcome::TooShort { .. }));
            t += 100.0;
        }
        assert_eq!(d.blink_count(), 0);
        assert!(d.is_closed());
    }

    #[test]
    fn test_reopen_needs_open_threshold() {
        let mut d = BlinkDetector::default();
        d.update(0.10, 0.0);
        // Above close but below open: still closed
        assert_eq!(d.update(0.20, 200.0), BlinkOutcome::Closed);
        assert_eq!(d.update(0.22, 300.0), BlinkOutcome::Counted);
    }

    #[test]
    fn test_tracking_lost_interrupts_closure() {
        let mut d = BlinkDetector::default();
        d.update(0.10, 0.0);
        d.tracking_lost();
        assert!(!d.is_closed());
        assert_eq!(d.closed_since(), None);
        // Face back with eyes open: no blink from the interrupted closure
        assert_eq!(d.update(0.30, 400.0), BlinkOutcome::Open);
        assert_eq!(d.blink_count(), 0);
    }

    #[test]
    fn test_reset_clears_count() {
        let mut d = BlinkDetector::default();
        feed(&mut d, &[(0.10, 0.0), (0.30, 150.0)]);
        assert_eq!(d.blink_count(), 1);
        d.reset();
        assert_eq!(d.blink_count(), 0);
        assert!(!d.is_closed());
        // Refractory memory is gone too
        d.update(0.10, 160.0);
        assert_eq!(d.update(0.30, 300.0), BlinkOutcome::Counted);
    }
}
