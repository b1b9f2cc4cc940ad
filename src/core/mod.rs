//! Core modules for Livecheck

pub mod geometry;
pub mod filter;
pub mod blink;
pub mod turn;
pub mod verdict;
pub mod pipeline;
pub mod session;
pub mod loader;
pub mod trace;
pub mod synthetic;
pub mod pass;
pub mod api;

pub use filter::{EmaFilter, SignalFilters, SmoothedSample};
pub use blink::{BlinkDetector, BlinkOutcome};
pub use turn::{TurnDetector, TurnDirection, TurnOutcome};
pub use verdict::{LivenessAggregator, liveness_verdict};
pub use pipeline::LivenessPipeline;
pub use session::{FrameSource, SourceProvider, LivenessSession, FrameCallback, VecSource};
pub use loader::ResourceCache;
pub use trace::{TraceProvider, TraceSource, Trace, parse_frame_line, parse_trace, write_trace};
pub use synthetic::{Script, Segment, demo_session};
pub use pass::{PassStore, PassFlag, key_for_scope, safe_next_path, liveness_url};
pub use api::{create_router, run_server};
