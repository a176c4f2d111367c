/// Image embedding model (DINOv2 and similar ViTs) run through ONNX Runtime via `ort`.
///
/// The model takes a single `(1, 3, S, S)` float tensor and produces a single
/// output whose values are returned flattened.
use std::path::Path;

use ndarray::Array4;

use super::execution_provider::{execution_providers, ExecutionTarget};
use crate::embedding::domain::image_embedder::ImageEmbedder;

pub struct OnnxEmbedder {
    session: ort::session::Session,
    input_name: String,
    output_name: String,
    input_size: Option<u32>,
    expected_dim: Option<usize>,
}

impl OnnxEmbedder {
    /// Load an ONNX embedding model on the requested execution target.
    ///
    /// `expected_dim`, when given, is checked against every output.
    pub fn new(
        model_path: &Path,
        target: ExecutionTarget,
        expected_dim: Option<usize>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(execution_providers(target)?)?
            .commit_from_file(model_path)?;

        let input = session.inputs().first().ok_or("Model declares no inputs")?;
        let input_name = input.name().to_string();
        // NCHW: [N, C, H, W]; dynamic axes are reported as -1
        let input_size = if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            spatial_size(shape)
        } else {
            None
        };
        let output_name = session
            .outputs()
            .first()
            .ok_or("Model declares no outputs")?
            .name()
            .to_string();

        log::info!(
            "Loaded {} on {target} (input '{input_name}', output '{output_name}')",
            model_path.display()
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            input_size,
            expected_dim,
        })
    }

    /// Fixed spatial input size declared by the model, if it has one.
    pub fn input_size(&self) -> Option<u32> {
        self.input_size
    }
}

impl ImageEmbedder for OnnxEmbedder {
    fn embed(&mut self, tensor: Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_value])?;
        let embedding = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| format!("Model produced no '{}' output", self.output_name))?
            .try_extract_array::<f32>()?;
        let values: Vec<f32> = embedding.iter().copied().collect();
        check_dimension(&values, self.expected_dim)?;
        Ok(values)
    }
}

/// Height of an NCHW shape when it is fixed and square.
fn spatial_size(shape: &[i64]) -> Option<u32> {
    if shape.len() >= 4 && shape[2] > 0 && shape[2] == shape[3] {
        Some(shape[2] as u32)
    } else {
        None
    }
}

fn check_dimension(values: &[f32], expected: Option<usize>) -> Result<(), String> {
    match expected {
        Some(dim) if values.len() != dim => Err(format!(
            "Embedding has {} values, expected {dim}",
            values.len()
        )),
        _ => Ok(()),
    }
}
