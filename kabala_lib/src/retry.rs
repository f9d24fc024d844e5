//! Bounded retries around page fetches.
//!
//! Rate-limited responses (429/403) are retried up to `max_retries` times,
//! waiting either for the server's `Retry-After` hint or for an exponential
//! backoff with ±20% jitter. Anything else is returned to the caller after a
//! single attempt.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kabala_http::{FetchOutcome, PageSource};
use rand::Rng;

/// Backoff parameters for rate-limited fetches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Relative jitter; `0.2` scales each computed wait by a factor in `[0.8, 1.2]`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(300),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Pre-jitter wait before retry number `attempt + 1`: 30s, 60s, 120s, ...
    /// capped at `max_backoff`.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(multiplier)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Wait before the next attempt.
    ///
    /// A non-zero server hint is honoured as-is up to `max_backoff`. Without a
    /// hint the exponential schedule is scaled by `jitter_factor`.
    pub fn compute_wait(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        jitter_factor: f64,
    ) -> Duration {
        match retry_after.filter(|hint| !hint.is_zero()) {
            Some(hint) => hint.min(self.max_backoff),
            None => self
                .base_backoff(attempt)
                .mul_f64(jitter_factor.max(0.0))
                .min(self.max_backoff),
        }
    }

    /// Uniform factor in `[1 - jitter, 1 + jitter]`.
    pub fn jitter_factor(&self) -> f64 {
        if self.jitter <= 0.0 {
            return 1.0;
        }
        rand::thread_rng().gen_range((1.0 - self.jitter)..=(1.0 + self.jitter))
    }
}

/// How the pipeline waits. Production code sleeps on the tokio timer; tests
/// record the requested durations and return immediately.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Atomic counters tracking fetch outcomes across a run.
#[derive(Debug, Default)]
pub struct RetryTracker {
    requests_made: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_rate_limited: AtomicU64,
    requests_failed: AtomicU64,
    /// Cumulative backoff time in milliseconds.
    total_backoff_ms: AtomicU64,
}

impl RetryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backoff(&self, duration: Duration) {
        self.total_backoff_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            requests_made: self.requests_made.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_rate_limited: self.requests_rate_limited.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            total_backoff_secs: self.total_backoff_ms.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }
}

/// Immutable snapshot of tracker counters for display.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TrackerSummary {
    pub requests_made: u64,
    pub requests_succeeded: u64,
    pub requests_rate_limited: u64,
    pub requests_failed: u64,
    pub total_backoff_secs: f64,
}

/// Result of a fetch after retries.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    Fetched { body: String, attempts: u32 },
    /// Non-rate-limited failure. `status` is 0 for transport errors.
    Failed { status: u16, attempts: u32 },
    /// Still rate-limited after the last allowed attempt.
    GaveUp {
        status: u16,
        retry_after: Option<Duration>,
        attempts: u32,
    },
}

impl RetryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Fetched { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::GaveUp { attempts, .. } => *attempts,
        }
    }
}

/// Fetches `url`, retrying rate-limited responses according to `policy`.
///
/// Makes at most `max_retries + 1` requests. Every request outcome and every
/// wait is recorded on `tracker`.
pub async fn fetch_with_retry<P, S>(
    source: &P,
    sleeper: &S,
    policy: &RetryPolicy,
    tracker: &RetryTracker,
    url: &str,
) -> RetryOutcome
where
    P: PageSource,
    S: Sleeper,
{
    let mut attempt = 0;
    loop {
        let attempts = attempt + 1;
        match source.fetch_page(url).await {
            FetchOutcome::Success { body, .. } => {
                tracker.record_success();
                return RetryOutcome::Fetched { body, attempts };
            }
            FetchOutcome::Failed { status } => {
                tracker.record_failure();
                return RetryOutcome::Failed { status, attempts };
            }
            FetchOutcome::Network { reason } => {
                tracker.record_failure();
                tracing::debug!("network error for {}: {}", url, reason);
                return RetryOutcome::Failed { status: 0, attempts };
            }
            FetchOutcome::RateLimited {
                status,
                retry_after,
            } => {
                tracker.record_rate_limited();

                if attempt >= policy.max_retries {
                    return RetryOutcome::GaveUp {
                        status,
                        retry_after,
                        attempts,
                    };
                }

                let wait = policy.compute_wait(attempt, retry_after, policy.jitter_factor());
                match retry_after {
                    Some(hint) if hint > policy.max_backoff => tracing::debug!(
                        "HTTP {} with Retry-After {}s (capped to {}s), retry {}/{}",
                        status,
                        hint.as_secs(),
                        policy.max_backoff.as_secs(),
                        attempt + 1,
                        policy.max_retries
                    ),
                    _ => tracing::debug!(
                        "HTTP {}, retry {}/{} in {:.1}s",
                        status,
                        attempt + 1,
                        policy.max_retries,
                        wait.as_secs_f64()
                    ),
                }

                tracker.record_backoff(wait);
                sleeper.sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
