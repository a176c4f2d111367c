use serde::{Deserialize, Serialize};

use crate::shared::constants::{IMAGENET_MEAN, IMAGENET_STD};

/// Per-channel normalization statistics, in model (RGB) channel order.
///
/// Values apply to samples already rescaled to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl ChannelStats {
    pub const fn new(mean: [f32; 3], std: [f32; 3]) -> Self {
        Self { mean, std }
    }

    pub const fn imagenet() -> Self {
        Self::new(IMAGENET_MEAN, IMAGENET_STD)
    }

    /// Index of the first channel whose standard deviation is zero or not finite.
    pub fn degenerate_channel(&self) -> Option<usize> {
        self.std.iter().position(|s| *s == 0.0 || !s.is_finite())
    }

    #[inline]
    pub fn normalize(&self, channel: usize, value: f32) -> f32 {
        (value - self.mean[channel]) / self.std[channel]
    }
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self::imagenet()
    }
}
