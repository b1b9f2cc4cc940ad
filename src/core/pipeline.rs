//! Frame pipeline: one synchronous pass per video frame
//!
//! landmarks → EMA filters → blink / turn detectors → aggregator → output
//!
//! Frame errors stop at this boundary. All fallible work (landmark lookup,
//! timestamp checks) happens before any state is touched, so a bad frame
//! leaves the session exactly where it was.

use tracing::{debug, warn};

use crate::core::blink::{BlinkDetector, BlinkOutcome};
use crate::core::filter::SignalFilters;
use crate::core::geometry::{ear, yaw_proxy};
use crate::core::turn::{TurnDetector, TurnDirection, TurnOutcome};
use crate::core::verdict::LivenessAggregator;
use crate::types::{
    progress, round3, FrameError, FrameInput, LandmarkSet, LivenessConfig, LivenessOutput,
    LivenessStep, ReasonCode,
};

/// Raw per-frame measurements, computed before any mutation
#[derive(Debug, Clone, Copy)]
struct RawSample {
    left_ear: f64,
    right_ear: f64,
    yaw: f64,
}

/// Per-session liveness pipeline
#[derive(Debug, Clone)]
pub struct LivenessPipeline {
    config: LivenessConfig,
    filters: SignalFilters,
    blink: BlinkDetector,
    turn: TurnDetector,
    aggregator: LivenessAggregator,
    /// Output of the last successfully processed frame
    last_output: LivenessOutput,
    /// Timestamp of the last successfully processed frame
    last_timestamp: Option<f64>,
    /// Frames processed successfully
    frame_count: u64,
    /// Frames skipped because of an error
    error_count: u64,
}

impl Default for LivenessPipeline {
    fn default() -> Self {
        Self::new(LivenessConfig::default())
    }
}

impl LivenessPipeline {
    pub fn new(config: LivenessConfig) -> Self {
        Self {
            filters: SignalFilters::from_config(&config),
            blink: BlinkDetector::from_config(&config),
            turn: TurnDetector::from_config(&config),
            aggregator: LivenessAggregator::new(config.blinks_required),
            last_output: LivenessOutput::initial(),
            last_timestamp: None,
            frame_count: 0,
            error_count: 0,
            config,
        }
    }

    /// Process one frame. Never fails: a bad frame is logged and skipped.
    pub fn process(&mut self, frame: &FrameInput) -> LivenessOutput {
        if self.aggregator.passed() {
            let mut out = self.last_output.clone();
            out.reason = ReasonCode::L005_SESSION_COMPLETE;
            return out;
        }

        match self.try_process(frame) {
            Ok(out) => {
                self.frame_count += 1;
                self.last_output = out.clone();
                out
            }
            Err(e) => self.reject(e),
        }
    }

    /// Record a frame that failed before it reached the pipeline (or inside it)
    /// and return the last valid state tagged as skipped.
    pub fn reject(&mut self, err: FrameError) -> LivenessOutput {
        self.error_count += 1;
        warn!(error = %err, "frame skipped");
        let mut out = self.last_output.clone();
        out.reason = ReasonCode::L001_FRAME_ERROR;
        out
    }

    fn try_process(&mut self, frame: &FrameInput) -> Result<LivenessOutput, FrameError> {
        let now = frame.timestamp_ms;
        if !now.is_finite() {
            return Err(FrameError::NonFiniteTimestamp);
        }
        if let Some(previous) = self.last_timestamp {
            if now < previous {
                return Err(FrameError::TimestampRegressed { previous, now });
            }
        }

        let Some(landmarks) = frame.landmarks.as_ref() else {
            self.last_timestamp = Some(now);
            self.blink.tracking_lost();
            self.turn.tracking_lost();
            debug!(now, "no face, tracking lost");
            return Ok(self.output(now, 0.0, 0.0, 0.0, ReasonCode::L001_NO_FACE));
        };

        let raw = self.measure(landmarks)?;
        self.last_timestamp = Some(now);

        let smoothed = self.filters.update(raw.left_ear, raw.right_ear, raw.yaw);
        let blink = self.blink.update(smoothed.avg_ear(), now);
        let turn = self.turn.update(smoothed.yaw, now);
        let newly_passed = self.aggregator.evaluate(
            self.blink.blink_count(),
            self.turn.turned_left(),
            self.turn.turned_right(),
        );

        let reason = frame_reason(blink, turn, newly_passed);
        Ok(self.output(now, smoothed.left_ear, smoothed.right_ear, smoothed.yaw, reason))
    }

    fn measure(&self, landmarks: &LandmarkSet) -> Result<RawSample, FrameError> {
        let idx = &self.config.landmarks;
        let raw = RawSample {
            left_ear: ear(landmarks, &idx.left_eye)?,
            right_ear: ear(landmarks, &idx.right_eye)?,
            yaw: yaw_proxy(landmarks, idx.left_cheek, idx.right_cheek, idx.nose_tip)?,
        };
        // A non-finite sample would stick in the EMA filters for the rest of the session
        for (metric, value) in [("left_ear", raw.left_ear), ("right_ear", raw.right_ear), ("yaw", raw.yaw)] {
            if !value.is_finite() {
                return Err(FrameError::NonFiniteMetric { metric });
            }
        }
        Ok(raw)
    }

    fn output(&self, now: f64, left_ear: f64, right_ear: f64, yaw: f64, reason: ReasonCode) -> LivenessOutput {
        let blink_count = self.blink.blink_count();
        let turned_left = self.turn.turned_left();
        let turned_right = self.turn.turned_right();
        let passed = self.aggregator.passed();
        let required = self.aggregator.blinks_required();

        LivenessOutput {
            timestamp_ms: now,
            liveness_passed: passed,
            blink_count,
            turned_left,
            turned_right,
            left_ear: round3(left_ear),
            right_ear: round3(right_ear),
            yaw_deviation: round3(yaw),
            step: LivenessStep::derive(blink_count, required, turned_left, turned_right, passed),
            progress: progress(blink_count, required, turned_left, turned_right),
            reason,
        }
    }

    /// Full reset: counts, flags, verdict and filters
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn passed(&self) -> bool {
        self.aggregator.passed()
    }

    pub fn blink_count(&self) -> u32 {
        self.blink.blink_count()
    }

    pub fn turned_left(&self) -> bool {
        self.turn.turned_left()
    }

    pub fn turned_right(&self) -> bool {
        self.turn.turned_right()
    }

    /// True once any filter has seen a sample since the last reset
    pub fn filters_initialized(&self) -> bool {
        self.filters.is_initialized()
    }

    pub fn last_output(&self) -> &LivenessOutput {
        &self.last_output
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }
}

/// Pick the most significant event of the frame
fn frame_reason(blink: BlinkOutcome, turn: TurnOutcome, newly_passed: bool) -> ReasonCode {
    if newly_passed {
        return ReasonCode::L005_LIVENESS_PASSED;
    }
    match turn {
        TurnOutcome::Committed(TurnDirection::Left) => return ReasonCode::L004_TURN_LEFT_COMMITTED,
        TurnOutcome::Committed(TurnDirection::Right) => return ReasonCode::L004_TURN_RIGHT_COMMITTED,
        _ => {}
    }
    match blink {
        BlinkOutcome::Counted => return ReasonCode::L003_BLINK_COUNTED,
        BlinkOutcome::TooShort { .. } => return ReasonCode::L003_BLINK_TOO_SHORT,
        BlinkOutcome::Refractory { .. } => return ReasonCode::L003_BLINK_REFRACTORY,
        _ => {}
    }
    if matches!(turn, TurnOutcome::Holding { .. }) {
        return ReasonCode::L004_TURN_HOLDING;
    }
    match blink {
        BlinkOutcome::Closing => ReasonCode::L002_EYES_CLOSING,
        BlinkOutcome::Closed => ReasonCode::L002_EYES_CLOSED,
        _ => ReasonCode::L002_TRACKING,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::synthetic;
    use crate::types::{Landmark, LandmarkIndices};

    fn face(ear_value: f64, yaw: f64) -> LandmarkSet {
        synthetic::face(&LandmarkIndices::face_mesh_468(), ear_value, yaw)
    }

    #[test]
    fn test_face_fixture_measures_what_it_says() {
        let pipeline = LivenessPipeline::default();
        let raw = pipeline.measure(&face(0.3, 0.6)).unwrap();
        assert!((raw.left_ear - 0.3).abs() < 1e-9);
        assert!((raw.right_ear - 0.3).abs() < 1e-9);
        assert!((raw.yaw - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_first_frame_reports_raw_values() {
        let mut p = LivenessPipeline::default();
        let out = p.process(&FrameInput::new(Some(face(0.3, 0.1)), 0.0));
        assert_eq!(out.left_ear, 0.3);
        assert_eq!(out.yaw_deviation, 0.1);
        assert_eq!(out.reason, ReasonCode::L002_TRACKING);
        assert!(p.filters_initialized());
    }

    #[test]
    fn test_no_face_reports_zero_metrics() {
        let mut p = LivenessPipeline::default();
        p.process(&FrameInput::new(Some(face(0.3, 0.1)), 0.0));
        let out = p.process(&FrameInput::empty(33.0));
        assert_eq!(out.reason, ReasonCode::L001_NO_FACE);
        assert_eq!(out.left_ear, 0.0);
        assert_eq!(out.right_ear, 0.0);
        assert_eq!(out.yaw_deviation, 0.0);
    }

    #[test]
    fn test_bad_frame_is_swallowed() {
        let mut p = LivenessPipeline::default();
        let good = p.process(&FrameInput::new(Some(face(0.3, 0.0)), 0.0));

        let short = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); 10]);
        let out = p.process(&FrameInput::new(Some(short), 33.0));
        assert_eq!(out.reason, ReasonCode::L001_FRAME_ERROR);
        assert_eq!(out.left_ear, good.left_ear);
        assert_eq!(p.error_count(), 1);
        assert_eq!(p.frame_count(), 1);
        assert_eq!(p.last_output(), &good);

        // Next frame proceeds normally
        let out = p.process(&FrameInput::new(Some(face(0.3, 0.0)), 66.0));
        assert_eq!(out.reason, ReasonCode::L002_TRACKING);
    }

    #[test]
    fn test_far_off_cheeks_do_not_register_a_turn() {
        let mut p = LivenessPipeline::default();
        let idx = LandmarkIndices::face_mesh_468();

        let mut bad = face(0.3, 0.0);
        bad.set(idx.left_cheek, Landmark::new(1e308, 0.6));
        bad.set(idx.right_cheek, Landmark::new(1e308, 0.6));
        let out = p.process(&FrameInput::new(Some(bad), 0.0));
        assert_eq!(out.reason, ReasonCode::L001_FRAME_ERROR);
        assert!(!p.filters_initialized());

        let mut t = 0.0;
        for _ in 0..30 {
            t += 33.0;
            let out = p.process(&FrameInput::new(Some(face(0.3, 0.0)), t));
            assert!(out.yaw_deviation.is_finite());
            assert_eq!(out.reason, ReasonCode::L002_TRACKING);
        }
        assert!(!p.turned_left());
        assert!(!p.turned_right());
    }

    #[test]
    fn test_regressed_timestamp_is_skipped() {
        let mut p = LivenessPipeline::default();
        p.process(&FrameInput::new(Some(face(0.3, 0.0)), 100.0));
        let out = p.process(&FrameInput::new(Some(face(0.3, 0.0)), 50.0));
        assert_eq!(out.reason, ReasonCode::L001_FRAME_ERROR);

        let out = p.process(&FrameInput::new(Some(face(0.3, 0.0)), f64::NAN));
        assert_eq!(out.reason, ReasonCode::L001_FRAME_ERROR);
        assert_eq!(p.error_count(), 2);
    }

    #[test]
    fn test_closing_then_counted_reasons() {
        let mut p = LivenessPipeline::default();
        p.process(&FrameInput::new(Some(face(0.05, 0.0)), 0.0));
        // First sample initializes the filter, so the eyes read closed immediately
        assert_eq!(p.last_output().reason, ReasonCode::L002_EYES_CLOSING);

        let mut t = 0.0;
        while t < 165.0 {
            t += 33.0;
            p.process(&FrameInput::new(Some(face(0.05, 0.0)), t));
        }
        assert_eq!(p.last_output().reason, ReasonCode::L002_EYES_CLOSED);

        let mut counted = false;
        while t < 1000.0 && !counted {
            t += 33.0;
            counted = p.process(&FrameInput::new(Some(face(0.35, 0.0)), t)).reason
                == ReasonCode::L003_BLINK_COUNTED;
        }
        assert!(counted);
        assert_eq!(p.blink_count(), 1);
    }

    #[test]
    fn test_frame_reason_priority() {
        assert_eq!(
            frame_reason(BlinkOutcome::Counted, TurnOutcome::Committed(TurnDirection::Left), true),
            ReasonCode::L005_LIVENESS_PASSED
        );
        assert_eq!(
            frame_reason(BlinkOutcome::Counted, TurnOutcome::Committed(TurnDirection::Right), false),
            ReasonCode::L004_TURN_RIGHT_COMMITTED
        );
        assert_eq!(
            frame_reason(
                BlinkOutcome::Counted,
                TurnOutcome::Holding { direction: TurnDirection::Left, held_ms: 10.0 },
                false
            ),
            ReasonCode::L003_BLINK_COUNTED
        );
        assert_eq!(
            frame_reason(BlinkOutcome::Closed, TurnOutcome::Centered, false),
            ReasonCode::L002_EYES_CLOSED
        );
    }
}
