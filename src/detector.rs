//! Scene-change detection.
//!
//! [`ChangeDetector`] consumes decoded frames one at a time and decides, for
//! each sampled frame, whether it represents an abrupt visual change relative
//! to the current reference frame. The metric is deliberately simple: the sum
//! of absolute differences (SAD) over the full luminance plane, compared
//! against a caller-supplied threshold with strict inequality.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scenecap::{CaptureError, ChangeDetector, ReferenceUpdate, VideoSource};
//!
//! let mut source = VideoSource::open("ad.mp4")?;
//! let mut detector = ChangeDetector::new(3_000_000)
//!     .with_stride(2)
//!     .with_reference_update(ReferenceUpdate::EveryFrame);
//!
//! for frame in source.frames(Some(Duration::from_secs(4)))? {
//!     if let Some(event) = detector.observe(frame)? {
//!         println!("scene change at frame {} (score {})", event.frame_index, event.score);
//!     }
//! }
//! # Ok::<(), CaptureError>(())
//! ```

use crate::{error::CaptureError, frame::Frame};

/// When the detector's reference frame is replaced.
///
/// The two policies diverge on slow continuous changes: under
/// [`EveryFrame`](ReferenceUpdate::EveryFrame) a gradual transition spread
/// over many frames can fire repeatedly if each step clears the threshold,
/// while under [`OnDetection`](ReferenceUpdate::OnDetection) later frames
/// accumulate difference against the last detected scene until the threshold
/// is crossed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceUpdate {
    /// Every observed frame replaces the reference after it has been
    /// examined, whether or not it was sampled or fired a detection. Each
    /// evaluated frame is therefore compared against its immediate
    /// predecessor. This is the default.
    #[default]
    EveryFrame,
    /// The reference is replaced only when a detection fires, so frames are
    /// compared against the last detected scene (or the initial frame before
    /// any detection).
    OnDetection,
}

/// A positive detection produced by [`ChangeDetector::observe`].
///
/// Carries the frame content and its position in the decoded stream. Output
/// numbering is *not* assigned here — that is the
/// [`SceneWriter`](crate::SceneWriter)'s responsibility, so filtering events
/// between detection and persistence cannot desynchronise the file names.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    /// The frame that triggered the detection.
    pub frame: Frame,
    /// The SAD score that crossed the threshold.
    pub score: u64,
    /// 0-based position of the frame in the decoded stream.
    pub frame_index: u64,
}

/// Sum of absolute differences between two frames' luminance planes.
///
/// Symmetric, zero for identical frames, and monotonic in aggregate
/// brightness change. The accumulator is `u64`: the worst case is
/// `width × height × 255`, which overflows 32 bits already for a handful of
/// HD frames' worth of pixels.
///
/// # Errors
///
/// Returns [`CaptureError::FrameShapeMismatch`] when the two frames do not
/// have identical dimensions.
pub fn difference_score(reference: &Frame, candidate: &Frame) -> Result<u64, CaptureError> {
    if reference.shape() != candidate.shape() {
        let (expected_width, expected_height) = reference.shape();
        let (actual_width, actual_height) = candidate.shape();
        return Err(CaptureError::FrameShapeMismatch {
            expected_width,
            expected_height,
            actual_width,
            actual_height,
        });
    }

    let score = reference
        .luminance()
        .iter()
        .zip(candidate.luminance().iter())
        .map(|(&a, &b)| a.abs_diff(b) as u64)
        .sum();

    Ok(score)
}

/// The maximum SAD score any pair of frames of the given size can produce.
///
/// Useful for picking an "impossible" threshold in tests and for sanity
/// checks on caller-supplied values.
pub fn max_difference_score(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * 255
}

/// Stateful scene-change detector.
///
/// Feed decoded frames to [`observe`](ChangeDetector::observe) in
/// presentation order. The first frame establishes the initial reference and
/// is never scored; after that, every `stride`-th frame (default: every 2nd)
/// is converted to luminance, scored against the reference with
/// [`difference_score`], and fires a [`DetectionEvent`] when the score
/// *strictly* exceeds the threshold.
///
/// The threshold is accepted as-is: its useful domain for 8-bit video is
/// roughly `1e5`–`1e7`, and a threshold of zero makes every evaluated frame a
/// detection. Detector state does not survive the value — create a fresh
/// detector per video.
#[derive(Debug)]
pub struct ChangeDetector {
    threshold: u64,
    stride: u64,
    policy: ReferenceUpdate,
    reference: Option<Frame>,
    frames_observed: u64,
    frames_evaluated: u64,
}

impl ChangeDetector {
    /// Create a detector with the given threshold, a sampling stride of 2,
    /// and the [`ReferenceUpdate::EveryFrame`] policy.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            stride: 2,
            policy: ReferenceUpdate::default(),
            reference: None,
            frames_observed: 0,
            frames_evaluated: 0,
        }
    }

    /// Set the sampling stride: only every `stride`-th observed frame is
    /// scored. Clamped to a minimum of 1 (score every frame).
    #[must_use]
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Set the reference-update policy.
    #[must_use]
    pub fn with_reference_update(mut self, policy: ReferenceUpdate) -> Self {
        self.policy = policy;
        self
    }

    /// Total frames observed so far, including the initial reference and
    /// skipped frames.
    pub fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    /// Frames actually scored against the reference so far.
    pub fn frames_evaluated(&self) -> u64 {
        self.frames_evaluated
    }

    /// Examine one decoded frame.
    ///
    /// Returns `Ok(Some(event))` when the frame is sampled and its score
    /// strictly exceeds the threshold, `Ok(None)` otherwise. The very first
    /// frame only establishes the reference.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::FrameShapeMismatch`] if the frame's
    /// dimensions differ from the reference's — a consistent source never
    /// changes shape mid-stream, so this marks a corrupt frame.
    pub fn observe(&mut self, frame: Frame) -> Result<Option<DetectionEvent>, CaptureError> {
        let Some(reference) = self.reference.take() else {
            self.reference = Some(frame);
            self.frames_observed = 1;
            return Ok(None);
        };

        // Shape consistency is checked for every frame, sampled or not, so a
        // corrupt frame cannot silently become the next reference.
        if reference.shape() != frame.shape() {
            let (expected_width, expected_height) = reference.shape();
            let (actual_width, actual_height) = frame.shape();
            self.reference = Some(reference);
            return Err(CaptureError::FrameShapeMismatch {
                expected_width,
                expected_height,
                actual_width,
                actual_height,
            });
        }

        self.frames_observed += 1;
        let read_count = self.frames_observed - 1; // 1-based, excluding the initial reference
        let frame_index = self.frames_observed - 1; // 0-based stream position

        // Sampling: only every stride-th frame is scored.
        if read_count % self.stride != 0 {
            self.reference = Some(match self.policy {
                ReferenceUpdate::EveryFrame => frame,
                ReferenceUpdate::OnDetection => reference,
            });
            return Ok(None);
        }

        self.frames_evaluated += 1;
        let score = difference_score(&reference, &frame)?;
        let detected = score > self.threshold;

        if detected {
            log::debug!(
                "Scene change at frame {frame_index} (score {score} > {})",
                self.threshold,
            );
        }

        let event = detected.then(|| DetectionEvent {
            frame: frame.clone(),
            score,
            frame_index,
        });

        self.reference = Some(match self.policy {
            ReferenceUpdate::EveryFrame => frame,
            ReferenceUpdate::OnDetection if detected => frame,
            ReferenceUpdate::OnDetection => reference,
        });

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> Frame {
        Frame::from_rgb(width, height, vec![value; (width * height * 3) as usize]).unwrap()
    }

    #[test]
    fn identical_frames_score_zero() {
        let a = solid(8, 8, 120);
        let b = solid(8, 8, 120);
        assert_eq!(difference_score(&a, &b).unwrap(), 0);
    }

    #[test]
    fn score_is_symmetric() {
        let a = solid(8, 8, 10);
        let b = solid(8, 8, 200);
        assert_eq!(
            difference_score(&a, &b).unwrap(),
            difference_score(&b, &a).unwrap(),
        );
    }

    #[test]
    fn black_white_is_max_score() {
        let black = solid(4, 4, 0);
        let white = solid(4, 4, 255);
        assert_eq!(
            difference_score(&black, &white).unwrap(),
            max_difference_score(4, 4),
        );
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let a = solid(4, 4, 0);
        let b = solid(4, 5, 0);
        assert!(matches!(
            difference_score(&a, &b),
            Err(CaptureError::FrameShapeMismatch { .. }),
        ));
    }

    #[test]
    fn first_frame_is_never_scored() {
        let mut detector = ChangeDetector::new(0);
        assert!(detector.observe(solid(4, 4, 0)).unwrap().is_none());
        assert_eq!(detector.frames_evaluated(), 0);
    }

    #[test]
    fn strict_inequality_at_threshold() {
        let black = solid(4, 4, 0);
        let white = solid(4, 4, 255);
        let max = max_difference_score(4, 4);

        // Exactly equal to the threshold: no detection.
        let mut detector = ChangeDetector::new(max).with_stride(1);
        detector.observe(black.clone()).unwrap();
        assert!(detector.observe(white.clone()).unwrap().is_none());

        // One below: fires.
        let mut detector = ChangeDetector::new(max - 1).with_stride(1);
        detector.observe(black).unwrap();
        assert!(detector.observe(white).unwrap().is_some());
    }
}
