pub mod embed_image_use_case;
pub mod preprocess_image_use_case;
