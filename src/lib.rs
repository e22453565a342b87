//! # scenecap
//!
//! Extract scene-change still frames from the opening seconds of short
//! videos.
//!
//! `scenecap` decodes the first few seconds of a video (H.264 in MP4 is the
//! validated case), samples every Nth frame, scores each sampled frame
//! against a reference frame with a sum-of-absolute-differences metric over
//! luminance, and saves every frame whose score exceeds a threshold as a
//! sequentially numbered image (`scene_000.jpg`, `scene_001.jpg`, …).
//! Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; images are
//! written with the [`image`](https://crates.io/crates/image) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scenecap::{CaptureOptions, capture_scenes};
//!
//! let options = CaptureOptions::new()
//!     .with_threshold(3_000_000)
//!     .with_cutoff(Duration::from_secs(4));
//!
//! let report = capture_scenes("ad.mp4", "screenshots", &options).unwrap();
//! println!("Saved {} scene-change screenshots.", report.scene_count());
//! ```
//!
//! ## Granular API
//!
//! The pipeline stages are usable on their own:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scenecap::{CaptureError, ChangeDetector, SceneFormat, SceneWriter, VideoSource};
//!
//! let mut source = VideoSource::open("ad.mp4")?;
//! let mut detector = ChangeDetector::new(3_000_000);
//! let mut writer = SceneWriter::create("screenshots", SceneFormat::Jpeg)?;
//!
//! for frame in source.frames(Some(Duration::from_secs(4)))? {
//!     if let Some(event) = detector.observe(frame)? {
//!         writer.write(&event.frame)?;
//!     }
//! }
//! # Ok::<(), CaptureError>(())
//! ```
//!
//! ## Behaviour
//!
//! - **Cutoff** — analysis stops at
//!   `min(total_frame_count, floor(frame_rate × cutoff_seconds))` frames; a
//!   source with an unreadable frame rate is treated as unbounded rather
//!   than dividing by zero.
//! - **Sampling** — only every 2nd decoded frame is scored by default; the
//!   first frame establishes the reference and is never scored.
//! - **Reference update** — configurable via [`ReferenceUpdate`]: replace
//!   the reference on every frame (default) or only on detections.
//! - **Output** — fixed-width 3-digit indices assigned in detection order,
//!   so lexicographic filename order equals detection order.
//! - **Failure model** — an unopenable or fully undecodable input is
//!   [`CaptureError::SourceUnavailable`]; a mid-stream decode failure is
//!   treated as end-of-stream, not an error; a failed image write always
//!   propagates.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod capture;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod progress;
pub mod source;
pub mod writer;

pub use capture::{CaptureOptions, CaptureReport, DEFAULT_CUTOFF, DEFAULT_THRESHOLD, capture_scenes};
pub use detector::{ChangeDetector, DetectionEvent, ReferenceUpdate, difference_score, max_difference_score};
pub use error::CaptureError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::Frame;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use source::{FrameReader, SourceMetadata, VideoSource};
pub use writer::{SavedScene, SceneFormat, SceneWriter};
