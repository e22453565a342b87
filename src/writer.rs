//! Scene image persistence.
//!
//! [`SceneWriter`] owns the output numbering: each detected frame is written
//! as `scene_NNN.<ext>` with a fixed-width, zero-padded, 0-based index
//! assigned strictly in detection order. Because padding is fixed-width,
//! reading the output directory back in lexicographic filename order always
//! reproduces detection order. The padding is three digits — a video that
//! produces more than 999 scenes would break the lexicographic guarantee;
//! this is a documented edge case, not handled.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::ImageFormat;

use crate::{error::CaptureError, frame::Frame};

/// Output image encoding for saved scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneFormat {
    /// JPEG. This is the default.
    #[default]
    Jpeg,
    /// PNG (lossless, larger files).
    Png,
    /// Windows bitmap (uncompressed).
    Bmp,
}

impl SceneFormat {
    /// File extension for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            SceneFormat::Jpeg => "jpg",
            SceneFormat::Png => "png",
            SceneFormat::Bmp => "bmp",
        }
    }

    fn to_image_format(self) -> ImageFormat {
        match self {
            SceneFormat::Jpeg => ImageFormat::Jpeg,
            SceneFormat::Png => ImageFormat::Png,
            SceneFormat::Bmp => ImageFormat::Bmp,
        }
    }

    /// Parse from a file extension (`jpg`, `jpeg`, `png`, `bmp`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SceneFormat::Jpeg),
            "png" => Some(SceneFormat::Png),
            "bmp" => Some(SceneFormat::Bmp),
            _ => None,
        }
    }
}

/// A scene image that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedScene {
    /// 0-based output index, contiguous in detection order.
    pub index: u32,
    /// Path of the written image file.
    pub path: PathBuf,
}

impl SavedScene {
    /// 1-based display caption, e.g. `"Scene 3"`.
    pub fn caption(&self) -> String {
        format!("Scene {}", self.index + 1)
    }
}

/// Writes detected frames as sequentially numbered images.
///
/// Index assignment lives here rather than in the detector so that future
/// filtering of detection events cannot desynchronise the numbering from the
/// files on disk.
#[derive(Debug)]
pub struct SceneWriter {
    output_dir: PathBuf,
    format: SceneFormat,
    next_index: u32,
}

impl SceneWriter {
    /// Create a writer targeting `output_dir`, creating the directory (and
    /// any missing parents) if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::IoError`] if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(output_dir: P, format: SceneFormat) -> Result<Self, CaptureError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            output_dir,
            format,
            next_index: 0,
        })
    }

    /// Directory scenes are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of scenes written so far.
    pub fn scenes_written(&self) -> u32 {
        self.next_index
    }

    /// Path the next written scene will get.
    pub fn next_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "scene_{:03}.{}",
            self.next_index,
            self.format.extension(),
        ))
    }

    /// Persist a frame as the next numbered scene image.
    ///
    /// The index is assigned here, strictly in call order, starting at 0 and
    /// with no gaps.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::SceneWrite`] if the image cannot be encoded
    /// or the destination is not writable (disk full, permission denied).
    /// The index is *not* consumed on failure, so a retried write reuses it.
    pub fn write(&mut self, frame: &Frame) -> Result<SavedScene, CaptureError> {
        let path = self.next_path();
        let image = frame.to_image()?;

        image
            .save_with_format(&path, self.format.to_image_format())
            .map_err(|error| CaptureError::SceneWrite {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        let index = self.next_index;
        self.next_index += 1;

        log::debug!("Wrote scene {index} to {}", path.display());

        Ok(SavedScene { index, path })
    }
}
