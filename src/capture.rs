//! The capture pipeline.
//!
//! [`capture_scenes`] drives the three stages — [`VideoSource`] →
//! [`ChangeDetector`](crate::ChangeDetector) → [`SceneWriter`] — in one
//! sequential, single-threaded pass over the opening segment of a video.
//! Each invocation is independent: no state is shared across runs, and all
//! resources (demuxer, decoder, scaler) are released on every exit path.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scenecap::{CaptureError, CaptureOptions, capture_scenes};
//!
//! let options = CaptureOptions::new()
//!     .with_threshold(3_000_000)
//!     .with_cutoff(Duration::from_secs(4));
//!
//! let report = capture_scenes("ad.mp4", "screenshots", &options)?;
//! println!("Saved {} scene-change screenshots.", report.scenes.len());
//! for scene in &report.scenes {
//!     println!("{}: {}", scene.caption(), scene.path.display());
//! }
//! # Ok::<(), CaptureError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    detector::{ChangeDetector, ReferenceUpdate},
    error::CaptureError,
    progress::{CancellationToken, NoOpProgress, ProgressCallback, ProgressTracker},
    source::VideoSource,
    writer::{SavedScene, SceneFormat, SceneWriter},
};

/// Default detection threshold, matching the reference deployment's
/// mid-range sensitivity.
pub const DEFAULT_THRESHOLD: u64 = 3_000_000;

/// Default analysis cutoff from the start of the video.
pub const DEFAULT_CUTOFF: Duration = Duration::from_secs(4);

/// Configuration for a capture run.
///
/// A builder that carries detection tuning plus optional progress- and
/// cancellation-related settings. A default-constructed value matches the
/// reference deployment: threshold 3 000 000, 4-second cutoff, stride 2,
/// JPEG output, reference replaced on every frame.
#[derive(Clone)]
pub struct CaptureOptions {
    pub(crate) threshold: u64,
    /// `None` disables the temporal cutoff (analyse to end-of-stream).
    pub(crate) cutoff: Option<Duration>,
    pub(crate) stride: u64,
    pub(crate) reference_update: ReferenceUpdate,
    pub(crate) format: SceneFormat,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for CaptureOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CaptureOptions")
            .field("threshold", &self.threshold)
            .field("cutoff", &self.cutoff)
            .field("stride", &self.stride)
            .field("reference_update", &self.reference_update)
            .field("format", &self.format)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            cutoff: Some(DEFAULT_CUTOFF),
            stride: 2,
            reference_update: ReferenceUpdate::default(),
            format: SceneFormat::default(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the detection threshold.
    ///
    /// Lower values are more sensitive. The useful domain for 8-bit video is
    /// roughly `1e5`–`1e7`; any value is accepted, and zero turns every
    /// evaluated frame into a detection.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Limit analysis to the first `cutoff` of the video. Pass `None` to
    /// analyse the whole stream.
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: impl Into<Option<Duration>>) -> Self {
        self.cutoff = cutoff.into();
        self
    }

    /// Set the sampling stride (evaluate every Nth decoded frame).
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Set the reference-update policy. See [`ReferenceUpdate`] for the
    /// behavioural difference between the two policies.
    #[must_use]
    pub fn with_reference_update(mut self, policy: ReferenceUpdate) -> Self {
        self.reference_update = policy;
        self
    }

    /// Set the output image format for saved scenes.
    #[must_use]
    pub fn with_format(mut self, format: SceneFormat) -> Self {
        self.format = format;
        self
    }

    /// Attach a progress callback.
    ///
    /// The callback is invoked every
    /// [`batch_size`](CaptureOptions::with_batch_size) processed frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the capture loop stops and returns
    /// [`CaptureError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every frame; 10 means every 10th frame. Clamped to
    /// a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Summary of one capture run.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// Saved scene images, in detection order. Indices are contiguous from 0
    /// and filename lexicographic order equals detection order.
    pub scenes: Vec<SavedScene>,
    /// Total frames decoded (including the initial reference and skipped
    /// frames).
    pub frames_decoded: u64,
    /// Frames that were actually scored against the reference.
    pub frames_evaluated: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl CaptureReport {
    /// Number of scene images saved.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }
}

/// Run the full scene-capture pipeline on one video.
///
/// Opens `input`, decodes the opening segment bounded by the configured
/// cutoff, detects abrupt changes between sampled frames, and writes each
/// detection into `output_dir` as `scene_NNN.<ext>`. The run is
/// deterministic given deterministic decoding: the same input, threshold,
/// and cutoff always produce the same per-frame decisions and count.
///
/// # Errors
///
/// - [`CaptureError::SourceUnavailable`] — the video cannot be opened, or
///   not a single frame could be decoded. Batch callers should report and
///   skip to the next input.
/// - [`CaptureError::SceneWrite`] — a detected scene could not be
///   persisted. Propagated immediately so the reported count never drifts
///   from the files on disk.
/// - [`CaptureError::Cancelled`] — the configured token was cancelled.
/// - [`CaptureError::FrameShapeMismatch`] — the decoder produced a frame
///   whose shape differs from the reference's.
pub fn capture_scenes<P, Q>(
    input: P,
    output_dir: Q,
    options: &CaptureOptions,
) -> Result<CaptureReport, CaptureError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let started = Instant::now();

    let mut source = VideoSource::open(input)?;
    let budget = source.metadata().frame_budget(options.cutoff);

    log::info!(
        "Capturing scenes from {} (threshold={}, cutoff={:?}, stride={}, budget={:?})",
        source.path().display(),
        options.threshold,
        options.cutoff,
        options.stride,
        budget,
    );

    let mut writer = SceneWriter::create(output_dir, options.format)?;
    let mut detector = ChangeDetector::new(options.threshold)
        .with_stride(options.stride)
        .with_reference_update(options.reference_update);
    let mut tracker = ProgressTracker::new(options.progress.clone(), budget, options.batch_size);

    let mut scenes = Vec::new();

    for frame in source.frames(options.cutoff)? {
        if options.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }

        if let Some(event) = detector.observe(frame)? {
            let saved = writer.write(&event.frame)?;
            log::debug!(
                "Saved {} (frame {}, score {})",
                saved.path.display(),
                event.frame_index,
                event.score,
            );
            scenes.push(saved);
        }

        tracker.advance(|current, total| match total {
            Some(total) => format!("Processing frame {current} of {total}"),
            None => format!("Processing frame {current}"),
        });
    }

    let frames_decoded = detector.frames_observed();

    // A source that opens but never yields a frame is unusable, not empty.
    if frames_decoded == 0 {
        return Err(CaptureError::SourceUnavailable {
            path: source.path().to_path_buf(),
            reason: "no decodable video frames".to_string(),
        });
    }

    tracker.finish("Analysis complete".to_string());

    let report = CaptureReport {
        scenes,
        frames_decoded,
        frames_evaluated: detector.frames_evaluated(),
        elapsed: started.elapsed(),
    };

    log::info!(
        "Saved {} scene-change screenshots ({} frames decoded, {} evaluated, {:.2?})",
        report.scene_count(),
        report.frames_decoded,
        report.frames_evaluated,
        report.elapsed,
    );

    Ok(report)
}
