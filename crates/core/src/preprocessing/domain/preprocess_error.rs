use thiserror::Error;

/// Failures of the preprocessing transform.
///
/// Both are deterministic: retrying with the same input fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot crop {size}x{size} from a {width}x{height} image")]
    CropOutOfBounds { width: u32, height: u32, size: u32 },
}
