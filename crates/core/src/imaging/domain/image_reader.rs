use std::path::Path;

use crate::shared::frame::Frame;

/// Size and layout of a decoded image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl std::fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}, {} channels", self.width, self.height, self.channels)
    }
}

/// Decodes still images from disk into frames.
pub trait ImageReader: Send + Sync {
    /// Decode `path` into a 3-channel frame.
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Report the native size and channel count without converting pixels.
    fn info(&self, path: &Path) -> Result<ImageInfo, Box<dyn std::error::Error>>;
}
