use serde::{Deserialize, Serialize};

use super::channel_stats::ChannelStats;
use crate::shared::constants::DINOV2_INPUT_SIZE;

/// How the long edge length is turned into whole pixels after scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRounding {
    /// Round to the nearest pixel.
    #[default]
    Nearest,
    /// Drop the fraction, as an integer cast in single precision does.
    /// Reproduces tensors produced by OpenCV-based pipelines bit for bit.
    Truncate,
}

impl std::fmt::Display for EdgeRounding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeRounding::Nearest => write!(f, "nearest"),
            EdgeRounding::Truncate => write!(f, "truncate"),
        }
    }
}

/// Settings for [`ImagePreprocessor`](super::image_preprocessor::ImagePreprocessor).
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Side length `S` of the square model input.
    pub size: u32,
    pub stats: ChannelStats,
    pub rounding: EdgeRounding,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            size: DINOV2_INPUT_SIZE,
            stats: ChannelStats::imagenet(),
            rounding: EdgeRounding::Nearest,
        }
    }
}

impl PreprocessConfig {
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_rounding(mut self, rounding: EdgeRounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Number of floats in one preprocessed image: `3 * S * S`.
    pub fn tensor_len(&self) -> usize {
        3 * (self.size as usize) * (self.size as usize)
    }
}
