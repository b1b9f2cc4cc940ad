//! Livecheck: frame-driven liveness detection
//!
//! Turns a stream of per-frame facial landmarks into a boolean
//! "human present and responsive" verdict: two blinks plus a held
//! head turn to each side.
//!
//! Frame → filters (EMA) → blink / turn detectors → verdict → callback

pub mod core;
pub mod types;

// =============================================================================
// BLINK THRESHOLDS
// =============================================================================

/// Smoothed average EAR below which the eyes count as closed
pub const EAR_CLOSE_THRESHOLD: f64 = 0.18;

/// Reopening must exceed the close threshold by this margin
pub const EAR_HYSTERESIS: f64 = 0.03;

/// Closures shorter than this are noise, not blinks (milliseconds)
pub const EAR_CLOSE_MIN_DURATION_MS: f64 = 120.0;

/// Minimum gap between two counted blinks (milliseconds)
pub const BLINK_REFRACTORY_MS: f64 = 250.0;

/// Blinks needed for a passing verdict
pub const BLINKS_REQUIRED: u32 = 2;

// =============================================================================
// TURN THRESHOLDS
// =============================================================================

/// |smoothed yaw| at or above this counts as turned
pub const YAW_ABS_THRESHOLD: f64 = 0.55;

/// A turn must be held continuously this long to commit (milliseconds)
pub const YAW_HOLD_MIN_MS: f64 = 250.0;

// =============================================================================
// SMOOTHING
// =============================================================================

/// EMA weight of the newest EAR sample
pub const EAR_ALPHA: f64 = 0.35;

/// EMA weight of the newest yaw sample
pub const YAW_ALPHA: f64 = 0.25;

/// Floor for the inter-cheek half-span in the yaw proxy
pub const YAW_SPAN_EPSILON: f64 = 1e-6;

// =============================================================================
// SESSION
// =============================================================================

/// Pause between stop and start on retry, lets the camera tear down (milliseconds)
pub const RETRY_DELAY_MS: u64 = 80;

/// Lifetime of a granted pass flag (seconds)
pub const PASS_TTL_SECS: i64 = 90;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
