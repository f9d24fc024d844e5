//! Forward-looking inflation rates from the IMF DataMapper API.
//!
//! Runs once per invocation before the city batch. Only countries already
//! present in `inflation.json` are touched, and a failure here never stops
//! the batch.

pub mod client;
pub mod error;
pub mod merge;
pub mod types;

pub use client::ImfClient;
pub use error::InflationError;
pub use merge::{merge_inflation, update_inflation, InflationSummary};
pub use types::{InflationDocument, WrappedInflation, YearlyRates};
