pub mod image_collector;
pub mod image_file_reader;
