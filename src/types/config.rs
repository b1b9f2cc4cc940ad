//! Liveness configuration, loaded from TOML with `LIVECHECK_*` overrides

use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, LandmarkIndices};
use crate::{
    BLINKS_REQUIRED, BLINK_REFRACTORY_MS, EAR_ALPHA, EAR_CLOSE_MIN_DURATION_MS,
    EAR_CLOSE_THRESHOLD, EAR_HYSTERESIS, PASS_TTL_SECS, RETRY_DELAY_MS, YAW_ABS_THRESHOLD,
    YAW_ALPHA, YAW_HOLD_MIN_MS,
};

/// All tunables of a liveness session. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Smoothed EAR below this closes the eyes
    pub ear_close_threshold: f64,
    /// Added to the close threshold to get the reopen threshold
    pub ear_hysteresis: f64,
    /// Shortest closure that counts as a blink (ms)
    pub ear_close_min_duration_ms: f64,
    /// Minimum gap between counted blinks (ms)
    pub blink_refractory_ms: f64,
    /// Blinks needed to pass
    pub blinks_required: u32,
    /// |yaw| at or above this counts as turned
    pub yaw_abs_threshold: f64,
    /// Continuous hold needed to commit a turn (ms)
    pub yaw_hold_min_ms: f64,
    /// EMA weight for EAR samples
    pub ear_alpha: f64,
    /// EMA weight for yaw samples
    pub yaw_alpha: f64,
    /// Delay between stop and start on retry (ms)
    pub retry_delay_ms: u64,
    /// Pass flag lifetime (s)
    pub pass_ttl_secs: i64,
    /// Landmark positions in the detector's output
    pub landmarks: LandmarkIndices,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            ear_close_threshold: EAR_CLOSE_THRESHOLD,
            ear_hysteresis: EAR_HYSTERESIS,
            ear_close_min_duration_ms: EAR_CLOSE_MIN_DURATION_MS,
            blink_refractory_ms: BLINK_REFRACTORY_MS,
            blinks_required: BLINKS_REQUIRED,
            yaw_abs_threshold: YAW_ABS_THRESHOLD,
            yaw_hold_min_ms: YAW_HOLD_MIN_MS,
            ear_alpha: EAR_ALPHA,
            yaw_alpha: YAW_ALPHA,
            retry_delay_ms: RETRY_DELAY_MS,
            pass_ttl_secs: PASS_TTL_SECS,
            landmarks: LandmarkIndices::default(),
        }
    }
}

impl LivenessConfig {
    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LIVECHECK_*` environment variables on top of this config
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let f64_var = |key: &str, default: f64| -> f64 {
            lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
        };

        self.ear_close_threshold = f64_var("LIVECHECK_EAR_CLOSE_THRESHOLD", self.ear_close_threshold);
        self.ear_hysteresis = f64_var("LIVECHECK_EAR_HYSTERESIS", self.ear_hysteresis);
        self.ear_close_min_duration_ms =
            f64_var("LIVECHECK_EAR_CLOSE_MIN_DURATION_MS", self.ear_close_min_duration_ms);
        self.blink_refractory_ms = f64_var("LIVECHECK_BLINK_REFRACTORY_MS", self.blink_refractory_ms);
        self.yaw_abs_threshold = f64_var("LIVECHECK_YAW_ABS_THRESHOLD", self.yaw_abs_threshold);
        self.yaw_hold_min_ms = f64_var("LIVECHECK_YAW_HOLD_MIN_MS", self.yaw_hold_min_ms);
        self.ear_alpha = f64_var("LIVECHECK_EAR_ALPHA", self.ear_alpha);
        self.yaw_alpha = f64_var("LIVECHECK_YAW_ALPHA", self.yaw_alpha);
        self.blinks_required = lookup("LIVECHECK_BLINKS_REQUIRED")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.blinks_required);
        self.retry_delay_ms = lookup("LIVECHECK_RETRY_DELAY_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.retry_delay_ms);
        self.pass_ttl_secs = lookup("LIVECHECK_PASS_TTL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.pass_ttl_secs);
        self
    }

    /// Reopen threshold of the blink hysteresis band
    pub fn ear_open_threshold(&self) -> f64 {
        self.ear_close_threshold + self.ear_hysteresis
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ear_close_threshold", self.ear_close_threshold)?;
        positive("yaw_abs_threshold", self.yaw_abs_threshold)?;
        non_negative("ear_hysteresis", self.ear_hysteresis)?;
        non_negative("ear_close_min_duration_ms", self.ear_close_min_duration_ms)?;
        non_negative("blink_refractory_ms", self.blink_refractory_ms)?;
        non_negative("yaw_hold_min_ms", self.yaw_hold_min_ms)?;
        alpha("ear_alpha", self.ear_alpha)?;
        alpha("yaw_alpha", self.yaw_alpha)?;
        if self.blinks_required == 0 {
            return Err(ConfigError::Invalid {
                field: "blinks_required",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.pass_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                field: "pass_ttl_secs",
                reason: format!("must be positive, got {}", self.pass_ttl_secs),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("must be positive, got {}", v) })
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("must be >= 0, got {}", v) })
    }
}

fn alpha(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v > 0.0 && v <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("must be in (0, 1], got {}", v) })
    }
}
