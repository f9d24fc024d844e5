//! Library layer for the KABALA data updater: page parsing, derived metrics,
//! the resumable city batch, and the IMF inflation merge.
//!
//! Wraps the `kabala_http` fetcher with bounded retries and persists results
//! into the JSON stores the dashboard reads.

pub mod config;
pub mod derive;
pub mod error;
pub mod inflation;
pub mod parse;
pub mod pipeline;
pub mod retry;
pub mod seed;
pub mod slug;
pub mod store;
pub mod types;
pub mod updater;

pub use kabala_http;

pub use config::UpdaterConfig;
pub use error::{PipelineError, StoreError};
pub use inflation::{ImfClient, InflationDocument, InflationError, InflationSummary};
pub use parse::{parse_price_page, ExtractedFields, ParseError, PriceField};
pub use pipeline::{select_cities, CityOutcome, Pipeline, RunOptions, RunState, RunSummary};
pub use retry::{RetryPolicy, RetryTracker, Sleeper, TokioSleeper, TrackerSummary};
pub use seed::{load_imf_codes, load_slug_overrides, SeedDataError};
pub use store::{CityStore, InflationStore};
pub use types::{City, CityMetrics, MoneyAmount};
pub use updater::{apply_updates, UpdateReport};
