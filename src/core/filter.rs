//! EMA signal filters

use crate::core::geometry::ema;
use crate::types::LivenessConfig;

/// Single exponentially smoothed scalar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaFilter {
    alpha: f64,
    value: Option<f64>,
}

impl EmaFilter {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    /// Feed a raw sample, return the smoothed value
    pub fn update(&mut self, raw: f64) -> f64 {
        let next = ema(self.value, raw, self.alpha);
        self.value = Some(next);
        next
    }

    /// Current smoothed value, `None` until the first sample
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    /// Back to uninitialized
    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Smoothed values after one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedSample {
    pub left_ear: f64,
    pub right_ear: f64,
    pub yaw: f64,
}

impl SmoothedSample {
    /// Mean of both eyes, the blink detector's input
    pub fn avg_ear(&self) -> f64 {
        (self.left_ear + self.right_ear) / 2.0
    }
}

/// The three per-session filters: left EAR, right EAR, yaw
#[derive(Debug, Clone)]
pub struct SignalFilters {
    left_ear: EmaFilter,
    right_ear: EmaFilter,
    yaw: EmaFilter,
}

impl SignalFilters {
    pub fn new(ear_alpha: f64, yaw_alpha: f64) -> Self {
        Self {
            left_ear: EmaFilter::new(ear_alpha),
            right_ear: EmaFilter::new(ear_alpha),
            yaw: EmaFilter::new(yaw_alpha),
        }
    }

    pub fn from_config(config: &LivenessConfig) -> Self {
        Self::new(config.ear_alpha, config.yaw_alpha)
    }

    pub fn update(&mut self, left_ear: f64, right_ear: f64, yaw: f64) -> SmoothedSample {
        SmoothedSample {
            left_ear: self.left_ear.update(left_ear),
            right_ear: self.right_ear.update(right_ear),
            yaw: self.yaw.update(yaw),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.left_ear.is_initialized() || self.right_ear.is_initialized() || self.yaw.is_initialized()
    }

    pub fn reset(&mut self) {
        self.left_ear.reset();
        self.right_ear.reset();
        self.yaw.reset();
    }
}
