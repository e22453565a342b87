//! CaptureOptions builder tests.

use std::time::Duration;

use scenecap::{CaptureOptions, ReferenceUpdate, SceneFormat};

#[test]
fn defaults_match_reference_deployment() {
    let options = CaptureOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("CaptureOptions"));
    assert!(debug.contains("threshold: 3000000"));
    assert!(debug.contains("stride: 2"));
    assert!(debug.contains("reference_update: EveryFrame"));
    assert!(debug.contains("format: Jpeg"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn with_threshold() {
    let options = CaptureOptions::new().with_threshold(100_000);
    let debug = format!("{options:?}");
    assert!(debug.contains("threshold: 100000"));
}

#[test]
fn with_cutoff_accepts_none() {
    let options = CaptureOptions::new().with_cutoff(None);
    let debug = format!("{options:?}");
    assert!(debug.contains("cutoff: None"));
}

#[test]
fn with_cutoff_accepts_duration() {
    let options = CaptureOptions::new().with_cutoff(Duration::from_secs(9));
    let debug = format!("{options:?}");
    assert!(debug.contains("cutoff: Some(9s)"));
}

#[test]
fn stride_clamps_zero_to_one() {
    let options = CaptureOptions::new().with_stride(0);
    let debug = format!("{options:?}");
    assert!(debug.contains("stride: 1"));
}

#[test]
fn batch_size_clamps_zero_to_one() {
    let options = CaptureOptions::new().with_batch_size(0);
    let debug = format!("{options:?}");
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn with_reference_update() {
    let options = CaptureOptions::new().with_reference_update(ReferenceUpdate::OnDetection);
    let debug = format!("{options:?}");
    assert!(debug.contains("reference_update: OnDetection"));
}

#[test]
fn with_format() {
    let options = CaptureOptions::new().with_format(SceneFormat::Png);
    let debug = format!("{options:?}");
    assert!(debug.contains("format: Png"));
}

#[test]
fn default_trait_matches_new() {
    assert_eq!(
        format!("{:?}", CaptureOptions::default()),
        format!("{:?}", CaptureOptions::new()),
    );
}
