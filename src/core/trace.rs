//! JSON-lines landmark traces as a frame source
//!
//! One frame per line:
//! `{"landmarks": [{"x": 0.5, "y": 0.4}, ...], "timestamp_ms": 33.0}`
//! with `"landmarks": null` (or absent) for a faceless frame. Blank lines
//! and lines starting with `#` are ignored.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::core::loader::ResourceCache;
use crate::core::session::{FrameSource, SourceProvider};
use crate::types::{AcquisitionError, FrameError, FrameInput};

/// Parsed trace: one entry per frame line
pub type Trace = Vec<Result<FrameInput, FrameError>>;

/// Parse a single trace line. `Ok(None)` for blank and comment lines.
pub fn parse_frame_line(line: &str, line_no: usize) -> Result<Option<FrameInput>, FrameError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| FrameError::Malformed { line: line_no, message: e.to_string() })
}

/// Parse a whole trace. Malformed lines are kept as per-frame errors.
pub fn parse_trace(content: &str) -> Trace {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_frame_line(line, i + 1).transpose())
        .collect()
}

/// Write frames as a JSON-lines trace
pub fn write_trace<W: Write>(mut writer: W, frames: &[FrameInput]) -> std::io::Result<()> {
    for frame in frames {
        serde_json::to_writer(&mut writer, frame)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Replays a trace file. The parsed file is cached, so retries do not re-read it.
#[derive(Debug, Clone)]
pub struct TraceProvider {
    path: PathBuf,
    cache: Arc<ResourceCache<Trace>>,
}

impl TraceProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_cache(path, Arc::new(ResourceCache::new()))
    }

    /// Share a cache between providers
    pub fn with_cache(path: impl Into<PathBuf>, cache: Arc<ResourceCache<Trace>>) -> Self {
        Self { path: path.into(), cache }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Trace, AcquisitionError> {
        let name = self.path.display().to_string();
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AcquisitionError::from_io(&name, e))?;
        let trace = parse_trace(&content);
        if trace.is_empty() {
            return Err(AcquisitionError::DetectorUnavailable(format!("{} contains no frames", name)));
        }
        info!(path = %name, frames = trace.len(), "trace loaded");
        Ok(trace)
    }
}

impl SourceProvider for TraceProvider {
    type Source = TraceSource;

    fn acquire(&self) -> Result<TraceSource, AcquisitionError> {
        let key = self.path.to_string_lossy();
        let frames = self.cache.get_or_load(&key, || self.load())?;
        Ok(TraceSource { frames, pos: 0 })
    }
}

/// Cursor over a cached trace
#[derive(Debug, Clone)]
pub struct TraceSource {
    frames: Arc<Trace>,
    pos: usize,
}

impl FrameSource for TraceSource {
    fn next_frame(&mut self) -> Option<Result<FrameInput, FrameError>> {
        let frame = self.frames.get(self.pos)?.clone();
        self.pos += 1;
        Some(frame)
    }
}
