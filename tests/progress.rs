//! Progress and cancellation tests.
//!
//! Decode-dependent tests are gated on the fixture file from
//! `tests/fixtures/` and skip silently when it is absent.

use std::path::Path;
use std::sync::{Arc, Mutex};

use scenecap::{
    CancellationToken, CaptureError, CaptureOptions, ProgressCallback, ProgressInfo,
    capture_scenes,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_cancel() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_default_trait() {
    let token = CancellationToken::default();
    assert!(!token.is_cancelled());
}

#[test]
fn cancelled_capture_returns_error() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let token = CancellationToken::new();
    token.cancel(); // Cancel immediately.

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let options = CaptureOptions::new().with_cancellation(token);

    let result = capture_scenes(path, dir.path(), &options);
    assert!(matches!(result, Err(CaptureError::Cancelled)));
}

// ── ProgressInfo ───────────────────────────────────────────────────

struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_fraction_matches_percentage() {
    let info = ProgressInfo {
        current: 25,
        total: Some(100),
        percentage: Some(25.0),
        elapsed: std::time::Duration::from_millis(5),
        estimated_remaining: None,
        status: "Processing frame 25 of 100".to_string(),
    };
    assert_eq!(info.fraction(), Some(0.25));
}

#[test]
fn progress_fraction_none_without_total() {
    let info = ProgressInfo {
        current: 25,
        total: None,
        percentage: None,
        elapsed: std::time::Duration::ZERO,
        estimated_remaining: None,
        status: "Processing frame 25".to_string(),
    };
    assert_eq!(info.fraction(), None);
}

#[test]
fn progress_reports_during_capture() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let recorder = Arc::new(RecordingProgress {
        infos: Mutex::new(Vec::new()),
    });
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let options = CaptureOptions::new()
        .with_progress(recorder.clone())
        .with_batch_size(1);

    capture_scenes(path, dir.path(), &options).expect("Failed to capture");

    let infos = recorder.infos.lock().unwrap();
    assert!(!infos.is_empty(), "Expected progress callbacks");

    // `current` is monotonically non-decreasing, statuses are non-empty.
    for window in infos.windows(2) {
        assert!(
            window[1].current >= window[0].current,
            "Progress current should be non-decreasing",
        );
    }
    for info in infos.iter() {
        assert!(!info.status.is_empty());
    }

    // The final report is the completion message.
    assert_eq!(infos.last().unwrap().status, "Analysis complete");
}

#[test]
fn progress_has_elapsed() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let recorder = Arc::new(RecordingProgress {
        infos: Mutex::new(Vec::new()),
    });
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let options = CaptureOptions::new()
        .with_progress(recorder.clone())
        .with_batch_size(1);

    capture_scenes(path, dir.path(), &options).expect("Failed to capture");

    let infos = recorder.infos.lock().unwrap();
    if let Some(last) = infos.last() {
        assert!(last.elapsed.as_nanos() > 0, "Expected positive elapsed time");
    }
}
