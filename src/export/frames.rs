use image::DynamicImage;
use log::debug;
use std::path::{Path, PathBuf};

use crate::errors::ExportError;

/// Extensions tried, in order, for a decoded frame
const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Random access to decoded video frames
pub trait FrameSource: Send + Sync {
    /// The full frame at `index`
    fn frame(&self, index: u64) -> Result<DynamicImage, ExportError>;
}

/// Frames decoded ahead of time into `{index}.{png|jpg|jpeg|bmp}` files
#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    dir: PathBuf,
}

impl DirectoryFrameSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the decoded frame, if one exists
    pub fn frame_path(&self, index: u64) -> Option<PathBuf> {
        FRAME_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", index, ext)))
            .find(|path| path.is_file())
    }
}

impl FrameSource for DirectoryFrameSource {
    fn frame(&self, index: u64) -> Result<DynamicImage, ExportError> {
        let path = self.frame_path(index).ok_or(ExportError::FrameNotFound(index))?;
        debug!("Loading frame {} from {}", index, path.display());
        Ok(image::open(&path)?)
    }
}
