//! Error types shared across the library layer.

use std::path::PathBuf;

use thiserror::Error;

/// Reading or writing one of the JSON stores failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Errors that abort a whole update run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("City \"{0}\" not found")]
    CityNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    SeedData(#[from] crate::seed::SeedDataError),
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    Parse(#[from] crate::parse::ParseError),
}
