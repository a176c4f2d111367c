use ort::ep::ExecutionProviderDispatch;
use thiserror::Error;

#[cfg(feature = "tensorrt")]
use crate::shared::constants::{
    TENSORRT_MAX_PARTITION_ITERATIONS, TENSORRT_MAX_WORKSPACE_SIZE, TENSORRT_MIN_SUBGRAPH_SIZE,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionProviderError {
    #[error("{provider} support was not compiled in; rebuild with `--features {feature}`")]
    NotCompiled {
        provider: &'static str,
        feature: &'static str,
    },
}

/// Where ONNX Runtime should execute the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionTarget {
    /// Platform accelerator if one is bundled, CPU otherwise.
    #[default]
    Auto,
    Cpu,
    Cuda { device_id: i32 },
    TensorRt { device_id: i32 },
}

impl std::fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionTarget::Auto => write!(f, "auto"),
            ExecutionTarget::Cpu => write!(f, "cpu"),
            ExecutionTarget::Cuda { device_id } => write!(f, "cuda:{device_id}"),
            ExecutionTarget::TensorRt { device_id } => write!(f, "tensorrt:{device_id}"),
        }
    }
}

/// Execution providers to register for `target`, in priority order.
///
/// Explicitly requested GPU providers fail session creation instead of
/// silently falling back to CPU. An empty list means ONNX Runtime's default CPU
/// provider.
pub fn execution_providers(
    target: ExecutionTarget,
) -> Result<Vec<ExecutionProviderDispatch>, ExecutionProviderError> {
    match target {
        ExecutionTarget::Auto => Ok(preferred_execution_providers()),
        ExecutionTarget::Cpu => Ok(vec![
            ort::ep::CPU::default().build(),
        ]),
        ExecutionTarget::Cuda { device_id } => cuda_provider(device_id).map(|p| vec![p]),
        ExecutionTarget::TensorRt { device_id } => tensorrt_provider(device_id).map(|p| vec![p]),
    }
}

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::ep::CoreML::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::ep::DirectML::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

#[cfg(feature = "cuda")]
fn cuda_provider(device_id: i32) -> Result<ExecutionProviderDispatch, ExecutionProviderError> {
    Ok(ort::ep::CUDA::default()
        .with_device_id(device_id)
        .build()
        .error_on_failure())
}

#[cfg(not(feature = "cuda"))]
fn cuda_provider(_device_id: i32) -> Result<ExecutionProviderDispatch, ExecutionProviderError> {
    Err(ExecutionProviderError::NotCompiled {
        provider: "CUDA",
        feature: "cuda",
    })
}

#[cfg(feature = "tensorrt")]
fn tensorrt_provider(device_id: i32) -> Result<ExecutionProviderDispatch, ExecutionProviderError> {
    Ok(ort::ep::TensorRT::default()
        .with_device_id(device_id)
        .with_max_workspace_size(TENSORRT_MAX_WORKSPACE_SIZE)
        .with_max_partition_iterations(TENSORRT_MAX_PARTITION_ITERATIONS)
        .with_min_subgraph_size(TENSORRT_MIN_SUBGRAPH_SIZE)
        .build()
        .error_on_failure())
}

#[cfg(not(feature = "tensorrt"))]
fn tensorrt_provider(_device_id: i32) -> Result<ExecutionProviderDispatch, ExecutionProviderError> {
    Err(ExecutionProviderError::NotCompiled {
        provider: "TensorRT",
        feature: "tensorrt",
    })
}
