//! Error types for the collaborator boundary
//!
//! None of these ever stop the simulation: the core logs them and takes a
//! degraded path.

use std::path::PathBuf;

use thiserror::Error;

/// Persistence failures (settings, rankings, autosave)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Configuration that could not be parsed at all
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unreadable config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Audio/video clip failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("missing asset: {0}")]
    MissingAsset(String),
}
