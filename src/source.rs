//! Video source handling.
//!
//! [`VideoSource`] opens a video container via FFmpeg, caches stream
//! metadata, and hands out a lazy [`FrameReader`] that decodes the opening
//! segment of the video up to a temporal cutoff. The demuxer and decoder are
//! plain owned values, so they are released on every exit path — normal
//! completion, early stream end, or error — when the source and reader drop.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scenecap::{CaptureError, VideoSource};
//!
//! let mut source = VideoSource::open("ad.mp4")?;
//! println!("{:.2} fps, ~{} frames", source.metadata().frames_per_second,
//!     source.metadata().frame_count);
//!
//! for frame in source.frames(Some(Duration::from_secs(4)))? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), CaptureError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as RawFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{error::CaptureError, frame::Frame};

/// Cached metadata for the best video stream of an opened source.
#[derive(Debug, Clone)]
pub struct SourceMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate in frames per second. May be fractional; `0.0`
    /// when the container does not report a usable rate.
    pub frames_per_second: f64,
    /// Estimated total frame count. `0` when unknown.
    pub frame_count: u64,
    /// Video codec name (e.g. `h264`).
    pub codec: String,
    /// Container format name (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    pub container: String,
    /// Container-level duration. Zero when unreported.
    pub duration: Duration,
}

impl SourceMetadata {
    /// Number of frames covered by a temporal cutoff.
    ///
    /// Computed as `min(frame_count, floor(frames_per_second × seconds))`.
    /// When the frame rate is zero or unreadable the cutoff degrades to the
    /// total frame count (the source is treated as unbounded rather than
    /// dividing by zero); when that is also unknown, `None` is returned and
    /// decoding runs to end-of-stream.
    pub fn frame_budget(&self, cutoff: Option<Duration>) -> Option<u64> {
        let known_total = (self.frame_count > 0).then_some(self.frame_count);

        let Some(cutoff) = cutoff else {
            return known_total;
        };

        if self.frames_per_second <= 0.0 {
            return known_total;
        }

        let from_cutoff = (self.frames_per_second * cutoff.as_secs_f64()).floor() as u64;
        Some(match known_total {
            Some(total) => total.min(from_cutoff),
            None => from_cutoff,
        })
    }
}

/// An opened video file, ready to yield decoded frames.
///
/// Created via [`VideoSource::open`]. Holds the FFmpeg demuxer context and
/// metadata cached at open time. Obtain frames with
/// [`frames`](VideoSource::frames); the returned reader borrows the source
/// mutably, so only one pass can be active at a time.
pub struct VideoSource {
    pub(crate) input_context: Input,
    pub(crate) metadata: SourceMetadata,
    pub(crate) video_stream_index: usize,
    pub(crate) path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file for scene capture.
    ///
    /// Initialises FFmpeg (idempotent), opens the container, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::SourceUnavailable`] if the file cannot be
    /// opened or contains no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let source_path = path.to_path_buf();

        log::debug!("Opening video source: {}", source_path.display());

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init().map_err(|error| CaptureError::SourceUnavailable {
            path: source_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| CaptureError::SourceUnavailable {
                path: source_path.clone(),
                reason: error.to_string(),
            })?;

        let video_stream_index = input_context
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
            .ok_or_else(|| CaptureError::SourceUnavailable {
                path: source_path.clone(),
                reason: "no video stream".to_string(),
            })?;

        let container = input_context.format().name().to_string();

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let stream = input_context
            .stream(video_stream_index)
            .ok_or(CaptureError::NoVideoStream)?;

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                CaptureError::SourceUnavailable {
                    path: source_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| CaptureError::SourceUnavailable {
                    path: source_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        // Average frame rate, falling back to the real base rate. Both may be
        // missing; 0.0 marks the rate unusable and the cutoff degrades.
        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        // Prefer the container's declared frame count; estimate from the
        // duration otherwise.
        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = SourceMetadata {
            width: video_decoder.width(),
            height: video_decoder.height(),
            frames_per_second,
            frame_count,
            codec,
            container,
            duration,
        };

        log::info!(
            "Opened video source: {} ({}x{}, {:.2} fps, ~{} frames, codec={})",
            source_path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            path: source_path,
        })
    }

    /// Get a reference to the cached stream metadata.
    ///
    /// Metadata is extracted once during [`open`](VideoSource::open) and does
    /// not require additional decoding.
    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a lazy reader over the opening segment of the video.
    ///
    /// Frames are decoded on demand, in presentation order, and converted to
    /// packed RGB24. The sequence ends at
    /// `min(frame_count, floor(frames_per_second × cutoff))` frames or at
    /// end-of-stream, whichever comes first; `None` disables the temporal
    /// cutoff. The reader is non-restartable — it advances the demuxer's read
    /// cursor and supports no seeking.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::DecodeError`] if the decoder or the RGB
    /// scaler cannot be constructed. A decode failure *mid-sequence* is not
    /// an error: the reader logs it and ends the sequence early.
    pub fn frames(
        &mut self,
        cutoff: Option<Duration>,
    ) -> Result<FrameReader<'_>, CaptureError> {
        let budget = self.metadata.frame_budget(cutoff);
        FrameReader::new(self, budget)
    }
}

/// A lazy iterator over decoded video frames.
///
/// Yields [`Frame`] values one at a time; each call to
/// [`next()`](Iterator::next) reads and decodes just enough packets to
/// produce the next frame. Decode failures mid-stream terminate the sequence
/// instead of surfacing as errors — a truncated read is treated as reaching
/// end-of-stream.
///
/// Created via [`VideoSource::frames`].
pub struct FrameReader<'a> {
    source: &'a mut VideoSource,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    /// Maximum number of frames to yield. `None` means end-of-stream only.
    budget: Option<u64>,
    yielded: u64,
    decoded_frame: RawFrame,
    scaled_frame: RawFrame,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameReader<'a> {
    fn new(source: &'a mut VideoSource, budget: Option<u64>) -> Result<Self, CaptureError> {
        let video_stream_index = source.video_stream_index;

        let stream = source
            .input_context
            .stream(video_stream_index)
            .ok_or(CaptureError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| CaptureError::DecodeError(error.to_string()))?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| CaptureError::DecodeError(error.to_string()))?;

        log::debug!(
            "Frame reader ready (stream={video_stream_index}, budget={budget:?})",
        );

        Ok(Self {
            source,
            decoder,
            scaler,
            video_stream_index,
            budget,
            yielded: 0,
            decoded_frame: RawFrame::empty(),
            scaled_frame: RawFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// Number of frames yielded so far.
    pub fn frames_read(&self) -> u64 {
        self.yielded
    }

    /// The frame budget this reader was created with, if bounded.
    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    /// Scale and convert the current `decoded_frame` to a packed [`Frame`].
    fn convert_current_frame(&mut self) -> Option<Frame> {
        if let Err(error) = self.scaler.run(&self.decoded_frame, &mut self.scaled_frame) {
            log::warn!("Frame conversion failed mid-stream, ending sequence: {error}");
            return None;
        }

        let width = self.decoder.width();
        let height = self.decoder.height();
        let buffer = crate::frame::packed_rgb_buffer(&self.scaled_frame, width, height);
        Frame::from_rgb(width, height, buffer)
    }
}

impl Iterator for FrameReader<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.budget.is_some_and(|budget| self.yielded >= budget) {
            log::debug!("Frame budget reached after {} frames", self.yielded);
            self.done = true;
            return None;
        }

        loop {
            // Try to receive a frame the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                match self.convert_current_frame() {
                    Some(frame) => {
                        self.yielded += 1;
                        return Some(frame);
                    }
                    None => {
                        self.done = true;
                        return None;
                    }
                }
            }

            // Decoder has no buffered frames. Feed it more packets.
            if self.eof_sent {
                self.done = true;
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.source.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index
                        && let Err(error) = self.decoder.send_packet(&packet)
                    {
                        // A packet the decoder rejects mid-stream is treated
                        // as a truncated source, not an error.
                        log::warn!("Decode failed mid-stream, ending sequence: {error}");
                        self.done = true;
                        return None;
                    }
                    // Non-video packets are silently skipped.
                }
                Err(FfmpegError::Eof) => {
                    if self.decoder.send_eof().is_err() {
                        self.done = true;
                        return None;
                    }
                    self.eof_sent = true;
                }
                Err(_) => {
                    // Non-fatal read error — try the next packet.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(fps: f64, frame_count: u64) -> SourceMetadata {
        SourceMetadata {
            width: 640,
            height: 360,
            frames_per_second: fps,
            frame_count,
            codec: "h264".to_string(),
            container: "mp4".to_string(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn budget_clamps_to_frame_count() {
        // A 2-second video analysed with a 9-second cutoff: all frames.
        let meta = metadata(10.0, 20);
        assert_eq!(meta.frame_budget(Some(Duration::from_secs(9))), Some(20));
    }

    #[test]
    fn budget_from_cutoff() {
        let meta = metadata(10.0, 100);
        assert_eq!(meta.frame_budget(Some(Duration::from_secs(1))), Some(10));
        assert_eq!(
            meta.frame_budget(Some(Duration::from_secs_f64(2.55))),
            Some(25),
        );
    }

    #[test]
    fn budget_without_cutoff_is_total() {
        let meta = metadata(10.0, 100);
        assert_eq!(meta.frame_budget(None), Some(100));
    }

    #[test]
    fn zero_frame_rate_degrades_to_total() {
        let meta = metadata(0.0, 42);
        assert_eq!(meta.frame_budget(Some(Duration::from_secs(4))), Some(42));
    }

    #[test]
    fn fully_unknown_source_is_unbounded() {
        let meta = metadata(0.0, 0);
        assert_eq!(meta.frame_budget(Some(Duration::from_secs(4))), None);
        assert_eq!(meta.frame_budget(None), None);
    }

    #[test]
    fn fractional_frame_rate_floors() {
        let meta = metadata(29.97, 10_000);
        // floor(29.97 * 3) = 89
        assert_eq!(meta.frame_budget(Some(Duration::from_secs(3))), Some(89));
    }
}
