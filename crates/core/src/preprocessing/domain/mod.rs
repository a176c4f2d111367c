pub mod area_resize;
pub mod channel_stats;
pub mod image_preprocessor;
pub mod preprocess_config;
pub mod preprocess_error;
pub mod resize_geometry;
