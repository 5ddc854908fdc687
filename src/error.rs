use std::path::PathBuf;

use thiserror::Error;

/// Faults raised by the viewer. None of them are fatal: callers log and
/// degrade to "no transition".
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load image {path}: {source}")]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load detection model: {reason}")]
    DetectorLoad { reason: String },

    #[error("detection failed: {reason}")]
    Detection { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
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

impl ViewerError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
