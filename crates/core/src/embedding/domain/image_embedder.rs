use ndarray::Array4;

/// Domain interface for models that map a preprocessed image to a feature vector.
///
/// Inference sessions are not reentrant, hence `&mut self`.
pub trait ImageEmbedder: Send {
    /// Run one `(1, 3, S, S)` tensor through the model and return the flat output.
    fn embed(&mut self, tensor: Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
