pub mod embedding_math;
pub mod image_embedder;
