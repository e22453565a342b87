//! Error types for the `scenecap` crate.
//!
//! This module defines [`CaptureError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (file
//! paths, frame shapes, stage of the pipeline) for per-input reporting when
//! several videos are processed in a batch.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `scenecap` operations.
///
/// Every public method that can fail returns `Result<T, CaptureError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    /// The video could not be opened, or not a single frame of it could be
    /// decoded. Fatal for this input only — batch callers should skip to the
    /// next input rather than abort.
    #[error("Source unavailable at {path}: {reason}")]
    SourceUnavailable {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the source could not be used.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    DecodeError(String),

    /// The decoder produced a frame whose dimensions differ from the
    /// reference frame's. Should not happen for a single consistent source;
    /// guards against corrupt frames mid-stream.
    #[error(
        "Frame shape mismatch: reference is {expected_width}x{expected_height}, \
         candidate is {actual_width}x{actual_height}"
    )]
    FrameShapeMismatch {
        /// Width of the reference frame.
        expected_width: u32,
        /// Height of the reference frame.
        expected_height: u32,
        /// Width of the candidate frame.
        actual_width: u32,
        /// Height of the candidate frame.
        actual_height: u32,
    },

    /// A scene image could not be persisted. Propagated rather than dropped,
    /// since a silent drop would desynchronise the reported count from the
    /// files actually on disk.
    #[error("Failed to write scene image {path}: {reason}")]
    SceneWrite {
        /// Destination path of the image that failed to write.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for CaptureError {
    fn from(error: FfmpegError) -> Self {
        CaptureError::FfmpegError(error.to_string())
    }
}
