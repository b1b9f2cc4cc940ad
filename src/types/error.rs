//! Error types
//!
//! `FrameError` never escapes the frame boundary; `AcquisitionError` is
//! surfaced to whoever called `start()` / `retry()`.

use thiserror::Error;

/// A single frame could not be processed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("landmark {index} missing (set has {len} points)")]
    LandmarkOutOfRange { index: usize, len: usize },

    #[error("landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark { index: usize },

    #[error("landmark {index} at ({x}, {y}) is outside the frame")]
    LandmarkOutsideFrame { index: usize, x: f64, y: f64 },

    #[error("{metric} is not finite")]
    NonFiniteMetric { metric: &'static str },

    #[error("non-finite frame timestamp")]
    NonFiniteTimestamp,

    #[error("frame timestamp {now}ms is before previous frame at {previous}ms")]
    TimestampRegressed { previous: f64, now: f64 },

    #[error("malformed frame record on line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Camera / detector acquisition failed; terminal for this attempt
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("PermissionDenied: {0} (permission blocked)")]
    PermissionDenied(String),

    #[error("DeviceNotFound: {0} (no camera device)")]
    DeviceNotFound(String),

    #[error("DeviceBusy: {0} (camera busy by another app)")]
    DeviceBusy(String),

    #[error("Overconstrained: {0} (change default camera in settings)")]
    Overconstrained(String),

    #[error("DetectorUnavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Io: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquisitionError {
    /// Map an I/O failure while opening `resource` onto the camera taxonomy
    pub fn from_io(resource: &str, err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => Self::DeviceNotFound(resource.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(resource.to_string()),
            ErrorKind::WouldBlock => Self::DeviceBusy(resource.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Configuration could not be loaded or is invalid
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_mapping() {
        let e = AcquisitionError::from_io("cam0", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, AcquisitionError::DeviceNotFound(_)));

        let e = AcquisitionError::from_io("cam0", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, AcquisitionError::PermissionDenied(_)));

        let e = AcquisitionError::from_io("cam0", io::Error::from(io::ErrorKind::InvalidData));
        assert!(matches!(e, AcquisitionError::Io(_)));
    }

    #[test]
    fn test_hint_in_message() {
        let e = AcquisitionError::DeviceBusy("cam0".into());
        assert_eq!(e.to_string(), "DeviceBusy: cam0 (camera busy by another app)");
    }
}
