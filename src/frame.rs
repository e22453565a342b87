//! Decoded frame buffer.
//!
//! [`Frame`] is an opaque, tightly-packed RGB24 pixel buffer with a fixed
//! shape. Frames are immutable once produced: the detector examines each one
//! as "candidate", then either discards it or retains it as the new
//! reference. [`Frame::luminance`] produces the single-channel plane the
//! difference metric operates on.

use image::RgbImage;

use crate::error::CaptureError;

/// A single decoded video frame as packed 8-bit RGB.
///
/// The buffer holds exactly `width * height * 3` bytes in row-major order.
/// Width and height are fixed per video; a shape change mid-stream is a
/// decoder fault and is rejected by the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Construct a frame from a packed RGB24 buffer.
    ///
    /// Returns `None` if `data.len() != width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` pair, used for shape-consistency checks.
    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels in the frame.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Raw packed RGB24 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Convert to a single-channel 8-bit luminance plane.
    ///
    /// Uses the BT.601 weighting (`0.299 R + 0.587 G + 0.114 B`) in fixed
    /// point, matching the `image` crate's grayscale conversion.
    pub fn luminance(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|px| {
                let r = px[0] as u32;
                let g = px[1] as u32;
                let b = px[2] as u32;
                ((299 * r + 587 * g + 114 * b) / 1000) as u8
            })
            .collect()
    }

    /// Convert into an [`image::RgbImage`] for saving or display.
    pub fn into_image(self) -> Result<RgbImage, CaptureError> {
        let (width, height) = (self.width, self.height);
        RgbImage::from_raw(width, height, self.data).ok_or_else(|| {
            CaptureError::DecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    /// Borrowing variant of [`into_image`](Frame::into_image).
    pub fn to_image(&self) -> Result<RgbImage, CaptureError> {
        self.clone().into_image()
    }
}

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames may carry per-row padding (`stride > width * 3`); this strips
/// it so downstream code can assume packed rows.
pub(crate) fn packed_rgb_buffer(
    video_frame: &ffmpeg_next::frame::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_rejects_wrong_length() {
        assert!(Frame::from_rgb(2, 2, vec![0; 11]).is_none());
        assert!(Frame::from_rgb(2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn luminance_weighting() {
        // Pure white -> 255, pure black -> 0, pure green -> 149 (587 * 255 / 1000).
        let frame = Frame::from_rgb(3, 1, vec![255, 255, 255, 0, 0, 0, 0, 255, 0]).unwrap();
        assert_eq!(frame.luminance(), vec![255, 0, 149]);
    }

    #[test]
    fn into_image_round_trip() {
        let data = vec![10u8; 2 * 2 * 3];
        let frame = Frame::from_rgb(2, 2, data.clone()).unwrap();
        let image = frame.into_image().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.into_raw(), data);
    }
}
