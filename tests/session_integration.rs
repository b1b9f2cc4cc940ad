//! Integration tests for sessions over trace files
//!
//! Tests the full path: trace file → TraceProvider → LivenessSession → verdict

use std::cell::RefCell;
use std::fs::File;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use livecheck::core::{demo_session, write_trace, LivenessSession, ResourceCache, Script, TraceProvider};
use livecheck::types::{AcquisitionError, LandmarkIndices, LivenessConfig, ReasonCode};

fn temp_trace(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("livecheck_{}_{}.jsonl", name, std::process::id()));
    std::fs::write(&path, content).unwrap();
    path
}

fn demo_trace(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("livecheck_{}_{}.jsonl", name, std::process::id()));
    let file = File::create(&path).unwrap();
    write_trace(file, &demo_session(LandmarkIndices::face_mesh_468())).unwrap();
    path
}

fn config() -> LivenessConfig {
    LivenessConfig { retry_delay_ms: 0, ..LivenessConfig::default() }
}

#[test]
fn test_demo_trace_passes_and_releases() {
    let path = demo_trace("passes");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let mut session = LivenessSession::new(TraceProvider::new(&path), config())
        .on_frame(move |out| sink.borrow_mut().push(out.reason));
    session.start().unwrap();
    assert!(session.is_running());

    let last = session.run().unwrap();
    assert!(last.liveness_passed);
    assert_eq!(last.reason, ReasonCode::L005_LIVENESS_PASSED);
    assert!(session.passed());
    // Source released as soon as the verdict landed
    assert!(!session.is_running());

    let seen = seen.borrow();
    assert_eq!(seen.last(), Some(&ReasonCode::L005_LIVENESS_PASSED));
    assert_eq!(seen.iter().filter(|r| **r == ReasonCode::L003_BLINK_COUNTED).count(), 2);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_trace_is_device_not_found() {
    let path = std::env::temp_dir().join("livecheck_definitely_missing.jsonl");
    let mut session = LivenessSession::new(TraceProvider::new(&path), config());

    let err = session.start().unwrap_err();
    assert!(matches!(err, AcquisitionError::DeviceNotFound(_)), "got {:?}", err);
    assert!(!session.is_running());
    assert!(session.pump().is_none());
}

#[test]
fn test_empty_trace_is_detector_unavailable() {
    let path = temp_trace("empty", "# nothing here\n\n");
    let mut session = LivenessSession::new(TraceProvider::new(&path), config());

    let err = session.start().unwrap_err();
    assert!(matches!(err, AcquisitionError::DetectorUnavailable(_)), "got {:?}", err);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_malformed_lines_are_skipped() {
    let mut content = String::new();
    for (i, frame) in demo_session(LandmarkIndices::face_mesh_468()).iter().enumerate() {
        if i == 10 {
            content.push_str("{not json\n");
        }
        content.push_str(&serde_json::to_string(frame).unwrap());
        content.push('\n');
    }
    let path = temp_trace("malformed", &content);

    let mut session = LivenessSession::new(TraceProvider::new(&path), config());
    session.start().unwrap();
    let last = session.run().unwrap();

    assert!(last.liveness_passed);
    assert_eq!(session.pipeline().error_count(), 1);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_exhausted_trace_stops_without_verdict() {
    let frames = Script::new(LandmarkIndices::face_mesh_468()).rest(500.0).blink(200.0).rest(500.0).build();
    let path = std::env::temp_dir().join(format!("livecheck_short_{}.jsonl", std::process::id()));
    write_trace(File::create(&path).unwrap(), &frames).unwrap();

    let mut session = LivenessSession::new(TraceProvider::new(&path), config());
    session.start().unwrap();
    let last = session.run().unwrap();

    assert!(!last.liveness_passed);
    assert_eq!(last.blink_count, 1);
    assert!(!session.is_running());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_retry_replays_from_cache() {
    let path = demo_trace("retry");
    let cache = Arc::new(ResourceCache::new());
    let provider = TraceProvider::with_cache(&path, Arc::clone(&cache));

    let mut session = LivenessSession::new(provider, config());
    session.start().unwrap();
    for _ in 0..40 {
        session.pump();
    }
    assert!(session.pipeline().blink_count() > 0);

    // The file is gone, but the parsed trace is cached
    std::fs::remove_file(&path).unwrap();
    session.retry().unwrap();
    assert_eq!(session.pipeline().blink_count(), 0);
    assert_eq!(session.pipeline().frame_count(), 0);
    assert_eq!(cache.len(), 1);

    let last = session.run().unwrap();
    assert!(last.liveness_passed);
}

#[test]
fn test_stop_is_idempotent() {
    let path = demo_trace("stop");
    let mut session = LivenessSession::new(TraceProvider::new(&path), config());
    session.start().unwrap();
    session.pump();

    session.stop();
    session.stop();
    assert!(!session.is_running());
    assert!(session.pump().is_none());

    std::fs::remove_file(path).ok();
}
