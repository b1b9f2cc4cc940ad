//! Core types for Livecheck

mod landmark;
mod frame;
mod output;
mod step;
mod reason;
mod config;
mod error;

pub use landmark::{Landmark, LandmarkSet, EyeIndices, LandmarkIndices};
pub use frame::FrameInput;
pub use output::LivenessOutput;
pub(crate) use output::round3;
pub use step::{LivenessStep, progress};
pub use reason::ReasonCode;
pub use config::LivenessConfig;
pub use error::{FrameError, AcquisitionError, ConfigError};
