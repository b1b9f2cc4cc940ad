//! Liveness aggregator

use tracing::info;
use crate::BLINKS_REQUIRED;

/// Pure verdict: enough blinks and both turns
pub fn liveness_verdict(blink_count: u32, blinks_required: u32, turned_left: bool, turned_right: bool) -> bool {
    blink_count >= blinks_required && turned_left && turned_right
}

/// Latching verdict. Once passed, stays passed until reset.
#[derive(Debug, Clone)]
pub struct LivenessAggregator {
    blinks_required: u32,
    passed: bool,
}

impl Default for LivenessAggregator {
    fn default() -> Self {
        Self::new(BLINKS_REQUIRED)
    }
}

impl LivenessAggregator {
    pub fn new(blinks_required: u32) -> Self {
        Self { blinks_required, passed: false }
    }

    /// Evaluate after a frame's detector updates. Returns true only on the
    /// frame where the verdict first latches.
    pub fn evaluate(&mut self, blink_count: u32, turned_left: bool, turned_right: bool) -> bool {
        if self.passed {
            return false;
        }
        if liveness_verdict(blink_count, self.blinks_required, turned_left, turned_right) {
            self.passed = true;
            info!(blink_count, "liveness passed");
            return true;
        }
        false
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn blinks_required(&self) -> u32 {
        self.blinks_required
    }

    pub fn reset(&mut self) {
        self.passed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_truth_table() {
        assert!(liveness_verdict(2, 2, true, true));
        assert!(liveness_verdict(3, 2, true, true));
        assert!(!liveness_verdict(1, 2, true, true));
        assert!(!liveness_verdict(2, 2, false, true));
        assert!(!liveness_verdict(2, 2, true, false));
    }

    #[test]
    fn test_latches() {
        let mut agg = LivenessAggregator::default();
        assert!(!agg.evaluate(1, true, true));
        assert!(agg.evaluate(2, true, true));
        assert!(agg.passed());

        // Later inputs cannot revert it, and it does not fire twice
        assert!(!agg.evaluate(0, false, false));
        assert!(agg.passed());
    }

    #[test]
    fn test_reset() {
        let mut agg = LivenessAggregator::default();
        agg.evaluate(2, true, true);
        agg.reset();
        assert!(!agg.passed());
    }
}
