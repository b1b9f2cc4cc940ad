//! Session lifecycle: start / stop / retry around a frame source
//!
//! The camera and landmark detector are injected through [`SourceProvider`].
//! A session owns at most one acquired source and releases it on every
//! exit path: `stop()`, verdict reached, source exhausted, drop.

use std::thread::sleep;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::pipeline::LivenessPipeline;
use crate::types::{AcquisitionError, FrameError, FrameInput, LivenessConfig, LivenessOutput};

/// A running stream of per-frame detections
pub trait FrameSource {
    /// Next detection result; `None` when the stream has ended
    fn next_frame(&mut self) -> Option<Result<FrameInput, FrameError>>;

    /// Release camera / detector resources. Called exactly once per acquisition.
    fn release(&mut self) {}
}

/// Acquires a frame source (camera + detector)
pub trait SourceProvider {
    type Source: FrameSource;

    fn acquire(&self) -> Result<Self::Source, AcquisitionError>;
}

/// Invoked after every processed frame
pub type FrameCallback = Box<dyn FnMut(&LivenessOutput)>;

/// A liveness check session
pub struct LivenessSession<P: SourceProvider> {
    provider: P,
    pipeline: LivenessPipeline,
    source: Option<P::Source>,
    on_frame: Option<FrameCallback>,
    retry_delay: Duration,
}

impl<P: SourceProvider> LivenessSession<P> {
    pub fn new(provider: P, config: LivenessConfig) -> Self {
        Self {
            provider,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            pipeline: LivenessPipeline::new(config),
            source: None,
            on_frame: None,
        }
    }

    /// Register the per-frame callback
    pub fn on_frame(mut self, callback: impl FnMut(&LivenessOutput) + 'static) -> Self {
        self.on_frame = Some(Box::new(callback));
        self
    }

    /// Reset all state and acquire a frame source.
    ///
    /// Acquisition failure is returned as-is and never retried here.
    pub fn start(&mut self) -> Result<(), AcquisitionError> {
        self.stop();
        self.pipeline.reset();

        match self.provider.acquire() {
            Ok(source) => {
                self.source = Some(source);
                info!("liveness session started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "frame source acquisition failed");
                Err(e)
            }
        }
    }

    /// Halt frame delivery and release the source. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            info!(
                frames = self.pipeline.frame_count(),
                skipped = self.pipeline.error_count(),
                passed = self.pipeline.passed(),
                "liveness session stopped"
            );
        }
    }

    /// `stop()`, wait for hardware teardown, `start()`
    pub fn retry(&mut self) -> Result<(), AcquisitionError> {
        self.stop();
        if !self.retry_delay.is_zero() {
            sleep(self.retry_delay);
        }
        self.start()
    }

    /// Process one frame from the source and notify the callback.
    ///
    /// Returns `None` when not running or when the source has ended. The
    /// source is released once the verdict is reached.
    pub fn pump(&mut self) -> Option<LivenessOutput> {
        let next = self.source.as_mut()?.next_frame();
        let output = match next {
            None => {
                self.stop();
                return None;
            }
            Some(Ok(frame)) => self.pipeline.process(&frame),
            Some(Err(e)) => self.pipeline.reject(e),
        };

        if let Some(callback) = self.on_frame.as_mut() {
            callback(&output);
        }
        if output.liveness_passed {
            self.stop();
        }
        Some(output)
    }

    /// Pump until the verdict is reached or the source runs dry
    pub fn run(&mut self) -> Option<LivenessOutput> {
        let mut last = None;
        while let Some(output) = self.pump() {
            last = Some(output);
        }
        last
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    pub fn passed(&self) -> bool {
        self.pipeline.passed()
    }

    pub fn pipeline(&self) -> &LivenessPipeline {
        &self.pipeline
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: SourceProvider> Drop for LivenessSession<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Frames from an in-memory list
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    frames: std::collections::VecDeque<Result<FrameInput, FrameError>>,
}

impl VecSource {
    pub fn new(frames: impl IntoIterator<Item = FrameInput>) -> Self {
        Self { frames: frames.into_iter().map(Ok).collect() }
    }

    pub fn with_results(frames: impl IntoIterator<Item = Result<FrameInput, FrameError>>) -> Self {
        Self { frames: frames.into_iter().collect() }
    }
}

impl FrameSource for VecSource {
    fn next_frame(&mut self) -> Option<Result<FrameInput, FrameError>> {
        self.frames.pop_front()
    }
}
