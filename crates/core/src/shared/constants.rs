/// Spatial input size of the DINOv2 ViT models (patch 14, 37x37 grid).
pub const DINOV2_INPUT_SIZE: u32 = 518;

/// Embedding width of DINOv2 ViT-B/14.
pub const DINOV2_EMBEDDING_DIM: usize = 768;

pub const DINOV2_MODEL_NAME: &str = "dinov2.onnx";

/// ImageNet per-channel statistics in RGB order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 20 GiB, the workspace budget handed to TensorRT.
pub const TENSORRT_MAX_WORKSPACE_SIZE: usize = 21_474_836_480;
pub const TENSORRT_MAX_PARTITION_ITERATIONS: u32 = 1000;
pub const TENSORRT_MIN_SUBGRAPH_SIZE: usize = 1;

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "pgm", "ppm",
];
