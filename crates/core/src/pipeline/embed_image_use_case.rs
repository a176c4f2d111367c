use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::embedding::domain::embedding_math::l2_normalize;
use crate::embedding::domain::image_embedder::ImageEmbedder;
use crate::pipeline::preprocess_image_use_case::PreprocessImageUseCase;

/// One image's embedding, ready for printing or serialization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmbeddingRecord {
    pub path: PathBuf,
    pub dimension: usize,
    pub values: Vec<f32>,
}

/// Embedding pipeline: read → preprocess → infer → (optionally) L2-normalize.
pub struct EmbedImageUseCase {
    preprocess: PreprocessImageUseCase,
    embedder: Box<dyn ImageEmbedder>,
    normalize: bool,
}

impl EmbedImageUseCase {
    pub fn new(
        preprocess: PreprocessImageUseCase,
        embedder: Box<dyn ImageEmbedder>,
        normalize: bool,
    ) -> Self {
        Self {
            preprocess,
            embedder,
            normalize,
        }
    }

    pub fn execute(&mut self, input_path: &Path) -> Result<EmbeddingRecord, Box<dyn std::error::Error>> {
        let prepared = self.preprocess.execute(input_path)?;
        let tensor = prepared.into_array()?;

        let start = Instant::now();
        let mut values = self.embedder.embed(tensor)?;
        log::debug!(
            "{}: inference {:.1}ms",
            input_path.display(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        if self.normalize {
            l2_normalize(&mut values);
        }

        Ok(EmbeddingRecord {
            path: input_path.to_path_buf(),
            dimension: values.len(),
            values,
        })
    }

    /// Embed every path in order, stopping at the first failure.
    pub fn execute_all(
        &mut self,
        input_paths: &[PathBuf],
    ) -> Result<Vec<EmbeddingRecord>, Box<dyn std::error::Error>> {
        let total = input_paths.len();
        let mut records = Vec::with_capacity(total);
        for (i, path) in input_paths.iter().enumerate() {
            log::info!("Embedding {}/{total}: {}", i + 1, path.display());
            records.push(self.execute(path)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::preprocess_image_use_case::stubs::StubImageReader;
    use crate::preprocessing::domain::image_preprocessor::ImagePreprocessor;
    use crate::preprocessing::domain::preprocess_config::PreprocessConfig;
    use crate::shared::frame::{ChannelOrder, Frame};
    use approx::assert_relative_eq;
    use ndarray::Array4;
    use std::sync::{Arc, Mutex};

    /// Returns the per-channel means of the tensor it was given.
    struct StubEmbedder {
        shapes: Arc<Mutex<Vec<Vec<usize>>>>,
    }

    impl ImageEmbedder for StubEmbedder {
        fn embed(&mut self, tensor: Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
            self.shapes.lock().unwrap().push(tensor.shape().to_vec());
            let plane = tensor.shape()[2] * tensor.shape()[3];
            Ok((0..3)
                .map(|c| tensor.index_axis(ndarray::Axis(1), c).sum() / plane as f32)
                .collect())
        }
    }

    fn use_case(normalize: bool) -> (EmbedImageUseCase, Arc<Mutex<Vec<Vec<usize>>>>) {
        let frame = Frame::new(vec![255u8; 30 * 20 * 3], 30, 20, 3, ChannelOrder::Rgb);
        let preprocessor =
            ImagePreprocessor::new(PreprocessConfig::default().with_size(8)).unwrap();
        let preprocess =
            PreprocessImageUseCase::new(Box::new(StubImageReader::new(frame)), preprocessor);
        let shapes = Arc::new(Mutex::new(Vec::new()));
        let embedder = StubEmbedder {
            shapes: shapes.clone(),
        };
        (
            EmbedImageUseCase::new(preprocess, Box::new(embedder), normalize),
            shapes,
        )
    }

    #[test]
    fn test_execute_feeds_batched_tensor() {
        let (mut uc, shapes) = use_case(false);
        let record = uc.execute(Path::new("truck.jpg")).unwrap();
        assert_eq!(shapes.lock().unwrap()[0], vec![1, 3, 8, 8]);
        assert_eq!(record.dimension, 3);
        assert_eq!(record.path, PathBuf::from("truck.jpg"));
        // white pixel: (1 - 0.485) / 0.229
        assert_relative_eq!(record.values[0], (1.0 - 0.485) / 0.229, epsilon = 1e-4);
    }

    #[test]
    fn test_execute_normalizes_when_asked() {
        let (mut uc, _) = use_case(true);
        let record = uc.execute(Path::new("truck.jpg")).unwrap();
        let norm = record.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_execute_all_keeps_order() {
        let (mut uc, shapes) = use_case(false);
        let paths = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let records = uc.execute_all(&paths).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].path, PathBuf::from("b.png"));
        assert_eq!(shapes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_execute_all_stops_at_first_failure() {
        let (mut uc, shapes) = use_case(false);
        let paths = vec![
            PathBuf::from("a.png"),
            PathBuf::from("missing.png"),
            PathBuf::from("c.png"),
        ];
        assert!(uc.execute_all(&paths).is_err());
        assert_eq!(shapes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_record_serializes_to_json() {
        let record = EmbeddingRecord {
            path: PathBuf::from("a.png"),
            dimension: 2,
            values: vec![0.5, -0.25],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"path":"a.png","dimension":2,"values":[0.5,-0.25]}"#);
    }
}
