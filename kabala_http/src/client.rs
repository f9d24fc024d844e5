//! HTTP client for fetching cost-of-living pages.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER, USER_AGENT};

use crate::{outcome::FetchOutcome, user_agent::get_user_agent, Error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can turn a URL into a [`FetchOutcome`].
///
/// Implemented by [`Client`]; tests substitute scripted sources.
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send;
}

/// Page fetcher with browser-like headers.
///
/// The `User-Agent` is drawn from the pool on every request, so consecutive
/// requests do not share an identity.
pub struct Client {
    http: reqwest::Client,
}

impl Client {
    /// Creates a client with the default 30-second request timeout.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Performs one GET and classifies the response. Never fails.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let resp = match self
            .http
            .get(url)
            .header(USER_AGENT, get_user_agent())
            .header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            )
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("sec-fetch-dest", "document")
            .header("sec-fetch-mode", "navigate")
            .header("sec-fetch-site", "none")
            .header("sec-fetch-user", "?1")
            .header("cache-control", "max-age=0")
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!("Request to {} failed: {}", url, e);
                return FetchOutcome::Network {
                    reason: e.to_string(),
                };
            }
        };

        let status = resp.status().as_u16();
        let retry_after = retry_after_from_headers(resp.headers(), Utc::now());

        if FetchOutcome::RATE_LIMIT_STATUSES.contains(&status) {
            return FetchOutcome::RateLimited {
                status,
                retry_after,
            };
        }

        if !resp.status().is_success() {
            return FetchOutcome::Failed { status };
        }

        match resp.text().await {
            Ok(body) => FetchOutcome::Success { status, body },
            Err(e) => {
                tracing::debug!("Failed to read body from {}: {}", url, e);
                FetchOutcome::Network {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl PageSource for Client {
    async fn fetch_page(&self, url: &str) -> FetchOutcome {
        self.fetch(url).await
    }
}

fn retry_after_from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(raw, now)
}

/// Parses a `Retry-After` value: either delay-seconds or an HTTP date.
///
/// The seconds form is read from the leading digits, so `1.5` means one
/// second. Dates in the past yield a zero duration.
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw.trim();
    let digits_end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    if let Ok(secs) = raw[..digits_end].parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let date = DateTime::parse_from_rfc2822(raw).ok()?;
    let remaining_ms = (date.with_timezone(&Utc) - now).num_milliseconds();
    if remaining_ms <= 0 {
        return Some(Duration::ZERO);
    }
    let secs = (remaining_ms as u64).div_ceil(1000);
    Some(Duration::from_secs(secs))
}
