pub mod embedding;
pub mod imaging;
pub mod pipeline;
pub mod preprocessing;
pub mod shared;
