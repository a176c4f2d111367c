use std::path::Path;
use std::time::Instant;

use crate::imaging::domain::image_reader::ImageReader;
use crate::preprocessing::domain::image_preprocessor::{ImagePreprocessor, PreparedTensor};

/// Single-image preprocessing: read → preprocess.
pub struct PreprocessImageUseCase {
    reader: Box<dyn ImageReader>,
    preprocessor: ImagePreprocessor,
}

impl PreprocessImageUseCase {
    pub fn new(reader: Box<dyn ImageReader>, preprocessor: ImagePreprocessor) -> Self {
        Self {
            reader,
            preprocessor,
        }
    }

    pub fn preprocessor(&self) -> &ImagePreprocessor {
        &self.preprocessor
    }

    pub fn execute(&self, input_path: &Path) -> Result<PreparedTensor, Box<dyn std::error::Error>> {
        let start = Instant::now();
        let frame = self.reader.read(input_path)?;
        let read_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let prepared = self.preprocessor.prepare(&frame)?;
        log::debug!(
            "{}: read {read_ms:.1}ms, preprocess {:.1}ms",
            input_path.display(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(prepared)
    }
}

#[cfg(test)]
pub(crate) mod stubs {
    use super::*;
    use crate::imaging::domain::image_reader::ImageInfo;
    use crate::shared::frame::Frame;

    /// Hands out clones of one frame for every path; paths ending in
    /// `missing.png` fail to decode.
    pub struct StubImageReader {
        frame: Frame,
    }

    impl StubImageReader {
        pub fn new(frame: Frame) -> Self {
            Self { frame }
        }
    }

    impl ImageReader for StubImageReader {
        fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            if path.ends_with("missing.png") {
                return Err(format!("Error opening and loading image {}", path.display()).into());
            }
            Ok(self.frame.clone())
        }

        fn info(&self, _path: &Path) -> Result<ImageInfo, Box<dyn std::error::Error>> {
            Ok(ImageInfo {
                width: self.frame.width(),
                height: self.frame.height(),
                channels: self.frame.channels(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stubs::StubImageReader;
    use super::*;
    use crate::preprocessing::domain::preprocess_config::PreprocessConfig;
    use crate::preprocessing::domain::preprocess_error::PreprocessError;
    use crate::shared::frame::{ChannelOrder, Frame};

    fn use_case(frame: Frame, size: u32) -> PreprocessImageUseCase {
        let preprocessor =
            ImagePreprocessor::new(PreprocessConfig::default().with_size(size)).unwrap();
        PreprocessImageUseCase::new(Box::new(StubImageReader::new(frame)), preprocessor)
    }

    #[test]
    fn test_execute_returns_prepared_tensor() {
        let frame = Frame::new(vec![90u8; 40 * 20 * 3], 40, 20, 3, ChannelOrder::Bgr);
        let prepared = use_case(frame, 10).execute(Path::new("a.png")).unwrap();
        assert_eq!(prepared.values.len(), 300);
        assert_eq!(prepared.resized_size, (20, 10));
        assert_eq!(prepared.crop_origin, (5, 0));
    }

    #[test]
    fn test_read_failure_propagates() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, ChannelOrder::Rgb);
        let err = use_case(frame, 2).execute(Path::new("missing.png")).unwrap_err();
        assert!(err.to_string().contains("Error opening and loading image"));
    }

    #[test]
    fn test_empty_image_surfaces_invalid_input() {
        let frame = Frame::new(Vec::new(), 0, 0, 3, ChannelOrder::Bgr);
        let err = use_case(frame, 2).execute(Path::new("a.png")).unwrap_err();
        let err = err.downcast::<PreprocessError>().unwrap();
        assert!(matches!(*err, PreprocessError::InvalidInput(_)));
    }
}
