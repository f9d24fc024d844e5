//! Error types for the HTTP fetcher.

/// Errors that can occur while setting up the fetcher.
///
/// Fetching itself never fails: transport problems are reported through
/// [`crate::FetchOutcome::Network`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The underlying `reqwest::Client` could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}
