use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::preprocessing::domain::preprocess_config::PreprocessConfig;

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load a [`PreprocessConfig`] from a JSON file. Missing keys take their defaults.
pub fn load_config(path: &Path) -> Result<PreprocessConfig, ConfigFileError> {
    let json = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&json).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded preprocessing config from {}", path.display());
    Ok(config)
}
