use std::path::Path;

use crate::imaging::domain::image_reader::{ImageInfo, ImageReader};
use crate::shared::frame::{ChannelOrder, Frame};

/// Decodes image files with the `image` crate.
///
/// Any color type is expanded to 8-bit RGB, so grayscale datasets such as
/// PGM face collections come out as three identical channels.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let decoded = image::open(path)
            .map_err(|e| format!("Error opening and loading image {}: {e}", path.display()))?;
        let rgb = decoded.into_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("Image {} has no pixels", path.display()).into());
        }
        log::debug!("Decoded {} ({width}x{height})", path.display());
        Ok(Frame::new(rgb.into_raw(), width, height, 3, ChannelOrder::Rgb))
    }

    fn info(&self, path: &Path) -> Result<ImageInfo, Box<dyn std::error::Error>> {
        let decoded = image::open(path)
            .map_err(|e| format!("Could not read the image {}: {e}", path.display()))?;
        Ok(ImageInfo {
            width: decoded.width(),
            height: decoded.height(),
            channels: decoded.color().channel_count(),
        })
    }
}
