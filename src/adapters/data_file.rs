//! JSON/YAML data files (seed examples, evaluation cases, corpora).
//!
//! The format is picked from the extension: `.json`, or `.yaml`/`.yml`.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum DataFileError {
    #[error("failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported data file extension for {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> Option<Format> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "json" => Some(Format::Json),
        "yaml" | "yml" => Some(Format::Yaml),
        _ => None,
    }
}

/// Reads and deserializes a data file.
pub async fn load_data_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DataFileError> {
    let path = path.as_ref();
    let format = format_of(path).ok_or_else(|| DataFileError::UnsupportedFormat(path.to_path_buf()))?;

    let text = fs::read_to_string(path).await.map_err(|e| DataFileError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let parsed = match format {
        Format::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| DataFileError::Parse {
        path: path.to_path_buf(),
        message,
    })
}
