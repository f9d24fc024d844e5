//! Error types for IMF DataMapper operations.

use thiserror::Error;

use crate::error::StoreError;

/// Errors from fetching or merging inflation data.
#[derive(Error, Debug)]
pub enum InflationError {
    #[error("IMF API returned HTTP {0}")]
    Status(u16),
    #[error("No PCPIPCH series for {0}")]
    MissingSeries(String),
    #[error("Failed to parse response: {0}")]
    ParseFailed(String),
    #[error("Network error")]
    Network(#[from] reqwest::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}
