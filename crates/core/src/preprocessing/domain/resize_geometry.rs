use super::preprocess_config::EdgeRounding;
use super::preprocess_error::PreprocessError;

/// Target dimensions for an aspect-preserving resize whose shorter side becomes `size`.
///
/// Returns `(new_width, new_height)`. Ties (square sources) resize by height.
/// Callers guarantee non-zero inputs.
pub fn resize_dimensions(
    width: u32,
    height: u32,
    size: u32,
    rounding: EdgeRounding,
) -> (u32, u32) {
    if width < height {
        (size, scale_edge(size, height, width, rounding))
    } else {
        (scale_edge(size, width, height, rounding), size)
    }
}

/// `size * long / short`, made whole according to `rounding`.
fn scale_edge(size: u32, long: u32, short: u32, rounding: EdgeRounding) -> u32 {
    match rounding {
        EdgeRounding::Nearest => (size as f64 * long as f64 / short as f64).round() as u32,
        EdgeRounding::Truncate => (size as f32 * long as f32 / short as f32) as u32,
    }
}

/// Top-left corner of a centered `size x size` crop.
///
/// Uses floor division, so an odd leftover puts the extra pixel after the crop.
pub fn crop_origin(width: u32, height: u32, size: u32) -> Result<(u32, u32), PreprocessError> {
    if width < size || height < size {
        return Err(PreprocessError::CropOutOfBounds {
            width,
            height,
            size,
        });
    }
    Ok(((width - size) / 2, (height - size) / 2))
}
