/// Turns decoded frames into normalized, channel-first model input.
///
/// Pipeline: BGR -> RGB, aspect-preserving area resize so the shorter side
/// equals `S`, centered `S x S` crop, rescale by 1/255, per-channel
/// `(x - mean) / std`, flatten as `[C, H, W]`.
use ndarray::{Array4, ArrayView3, ShapeError};

use super::area_resize::{resize_area, Window};
use super::preprocess_config::PreprocessConfig;
use super::preprocess_error::PreprocessError;
use super::resize_geometry::{crop_origin, resize_dimensions};
use crate::shared::frame::Frame;

const RESCALE_FACTOR: f32 = 1.0 / 255.0;

/// Output of one preprocessing call plus the geometry that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedTensor {
    /// `3 * size * size` floats, channel-major.
    pub values: Vec<f32>,
    pub size: u32,
    /// `(width, height)` of the decoded source.
    pub source_size: (u32, u32),
    /// `(width, height)` after the aspect-preserving resize.
    pub resized_size: (u32, u32),
    /// `(x, y)` of the crop inside the resized image.
    pub crop_origin: (u32, u32),
}

impl PreparedTensor {
    /// Batched `(1, 3, S, S)` view of the values, as ONNX Runtime expects.
    pub fn into_array(self) -> Result<Array4<f32>, ShapeError> {
        let side = self.size as usize;
        Array4::from_shape_vec((1, 3, side, side), self.values)
    }

    /// Values of one channel plane, `None` past the last channel.
    pub fn channel(&self, c: usize) -> Option<&[f32]> {
        let plane = (self.size as usize) * (self.size as usize);
        self.values.get(c * plane..(c + 1) * plane)
    }
}

/// Stateless after construction; `&self` methods may run on many threads at once.
#[derive(Clone, Debug)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Result<Self, PreprocessError> {
        if config.size == 0 {
            return Err(PreprocessError::InvalidInput(
                "target size must be positive".into(),
            ));
        }
        if let Some(c) = config.stats.degenerate_channel() {
            return Err(PreprocessError::InvalidInput(format!(
                "standard deviation of channel {c} must be non-zero and finite"
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Flat channel-first tensor of length `3 * S * S`.
    pub fn preprocess(&self, frame: &Frame) -> Result<Vec<f32>, PreprocessError> {
        self.prepare(frame).map(|prepared| prepared.values)
    }

    pub fn prepare(&self, frame: &Frame) -> Result<PreparedTensor, PreprocessError> {
        validate(frame)?;
        let size = self.config.size;
        let rgb = frame.to_rgb();

        let (width, height) = (rgb.width(), rgb.height());
        let (new_w, new_h) = resize_dimensions(width, height, size, self.config.rounding);
        let (x0, y0) = crop_origin(new_w, new_h, size)?;
        log::trace!(
            "preprocess {width}x{height} -> resize {new_w}x{new_h} -> crop {size}x{size} at ({x0}, {y0})"
        );

        let side = size as usize;
        let window = Window {
            x: x0 as usize,
            y: y0 as usize,
            width: side,
            height: side,
        };
        let cropped = resize_area(
            rgb.data(),
            width as usize,
            height as usize,
            3,
            new_w as usize,
            new_h as usize,
            window,
        );
        let chw = ArrayView3::from_shape((side, side, 3), &cropped)
            .map_err(|e| PreprocessError::InvalidInput(e.to_string()))?
            .permuted_axes([2, 0, 1]);

        let stats = &self.config.stats;
        let values: Vec<f32> = chw
            .indexed_iter()
            .map(|((c, _, _), &v)| stats.normalize(c, v as f32 * RESCALE_FACTOR))
            .collect();
        debug_assert_eq!(values.len(), self.config.tensor_len());

        Ok(PreparedTensor {
            values,
            size,
            source_size: (width, height),
            resized_size: (new_w, new_h),
            crop_origin: (x0, y0),
        })
    }
}

fn validate(frame: &Frame) -> Result<(), PreprocessError> {
    if frame.is_empty() {
        return Err(PreprocessError::InvalidInput("image is empty".into()));
    }
    if frame.channels() != 3 {
        return Err(PreprocessError::InvalidInput(format!(
            "expected 3 channels, got {}",
            frame.channels()
        )));
    }
    let expected = frame.width() as usize * frame.height() as usize * 3;
    if frame.data().len() != expected {
        return Err(PreprocessError::InvalidInput(format!(
            "pixel buffer holds {} bytes, expected {expected}",
            frame.data().len()
        )));
    }
    Ok(())
}
