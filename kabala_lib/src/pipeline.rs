//! Sequential, resumable batch update of the city store.
//!
//! Cities are processed one at a time. Each goes through fetch (with
//! retries), parse, derive and apply, ending in exactly one
//! [`CityOutcome`]. Counters live in [`RunState`] and are advanced only by
//! [`RunState::record`]; the loop reads them to decide on checkpoints and
//! cooldowns.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use kabala_http::PageSource;
use rand::Rng;
use serde::Serialize;

use crate::config::UpdaterConfig;
use crate::derive::plan_updates;
use crate::error::PipelineError;
use crate::parse::{has_insufficient_data, parse_price_page};
use crate::retry::{fetch_with_retry, RetryOutcome, RetryTracker, Sleeper, TrackerSummary};
use crate::seed::load_slug_overrides;
use crate::slug::{city_slug, city_url};
use crate::store::CityStore;
use crate::types::City;
use crate::updater::{apply_updates, UpdateReport};

/// Field labels shown in a city's log line before truncating.
const LOGGED_FIELDS: usize = 5;

/// Per-run flags.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Restrict the run to one city id.
    pub city: Option<String>,
    /// Skip cities already stamped with `today`.
    pub resume: bool,
    /// Never write the store.
    pub dry_run: bool,
    pub today: NaiveDate,
}

/// Terminal state of one city in a run.
#[derive(Debug, Clone, PartialEq)]
pub enum CityOutcome {
    /// Already updated today and `--resume` was given. Not fetched.
    ResumeSkipped,
    Updated { report: UpdateReport },
    /// Page parsed but nothing was written.
    NoChanges,
    /// The site reported too few data points for the city.
    NoData,
    /// The page yielded fewer fields than the configured minimum.
    UnderThreshold { found: usize },
    /// Non-rate-limited failure; `status` is 0 for transport errors.
    FetchFailed { status: u16 },
    /// Still rate-limited after all retries.
    RateLimitedExhausted { status: u16 },
}

impl CityOutcome {
    /// Whether a request was made for this city.
    pub fn was_fetched(&self) -> bool {
        !matches!(self, Self::ResumeSkipped)
    }
}

impl fmt::Display for CityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResumeSkipped => write!(f, "SKIP (already updated today)"),
            Self::Updated { report } => write!(
                f,
                "OK ({} fields: {})",
                report.fields.len(),
                report.summary(LOGGED_FIELDS)
            ),
            Self::NoChanges => write!(f, "NO CHANGES"),
            Self::NoData => write!(f, "SKIP (no data on Numbeo)"),
            Self::UnderThreshold { found } => write!(f, "SKIP (only {} fields parsed)", found),
            Self::FetchFailed { status: 0 } => write!(f, "NETWORK ERROR"),
            Self::FetchFailed { status } => write!(f, "HTTP {}", status),
            Self::RateLimitedExhausted { status } => {
                write!(f, "RATE LIMITED (HTTP {}), gave up after retries", status)
            }
        }
    }
}

/// Run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub processed: usize,
    pub success: usize,
    pub skipped: usize,
    pub rate_limited: usize,
    pub resume_skipped: usize,
    pub consecutive_rate_limits: usize,
    /// Fetched pages that produced no fields at all.
    pub empty_pages: usize,
}

impl RunState {
    /// Advances the counters for one finished city.
    pub fn record(&mut self, outcome: &CityOutcome) {
        self.processed += 1;
        match outcome {
            CityOutcome::ResumeSkipped => self.resume_skipped += 1,
            CityOutcome::RateLimitedExhausted { .. } => {
                self.rate_limited += 1;
                self.consecutive_rate_limits += 1;
            }
            CityOutcome::FetchFailed { .. } => self.skipped += 1,
            CityOutcome::Updated { .. } => {
                self.success += 1;
                self.consecutive_rate_limits = 0;
            }
            CityOutcome::UnderThreshold { found } => {
                self.skipped += 1;
                self.consecutive_rate_limits = 0;
                if *found == 0 {
                    self.empty_pages += 1;
                }
            }
            CityOutcome::NoChanges | CityOutcome::NoData => {
                self.skipped += 1;
                self.consecutive_rate_limits = 0;
            }
        }
    }

    /// Called after a cooldown.
    pub fn reset_burst(&mut self) {
        self.consecutive_rate_limits = 0;
    }

    /// `3 updated, 1 skipped, 2 rate-limited` style summary.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("{} updated", self.success)];
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.rate_limited > 0 {
            parts.push(format!("{} rate-limited", self.rate_limited));
        }
        if self.resume_skipped > 0 {
            parts.push(format!("{} already done today", self.resume_skipped));
        }
        parts.join(", ")
    }
}

/// What a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub state: RunState,
    pub total_cities: usize,
    pub elapsed_secs: f64,
    pub requests: TrackerSummary,
    pub checkpoints: usize,
    /// Whether the store file was written at least once.
    pub store_written: bool,
    pub dry_run: bool,
}

/// Indices of the cities a run covers.
///
/// An unknown `city_id` is an error so callers can stop before any network
/// activity.
pub fn select_cities(cities: &[City], city_id: Option<&str>) -> Result<Vec<usize>, PipelineError> {
    match city_id {
        None => Ok((0..cities.len()).collect()),
        Some(id) => {
            let selected: Vec<usize> = cities
                .iter()
                .enumerate()
                .filter(|(_, c)| c.id == id)
                .map(|(i, _)| i)
                .collect();
            if selected.is_empty() {
                Err(PipelineError::CityNotFound(id.to_string()))
            } else {
                Ok(selected)
            }
        }
    }
}

/// Drives the per-city update loop.
pub struct Pipeline<P, S> {
    source: P,
    sleeper: S,
    config: UpdaterConfig,
    slug_overrides: HashMap<String, String>,
    tracker: RetryTracker,
}

impl<P: PageSource, S: Sleeper> Pipeline<P, S> {
    pub fn new(source: P, sleeper: S, config: UpdaterConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            source,
            sleeper,
            config,
            slug_overrides: load_slug_overrides()?,
            tracker: RetryTracker::new(),
        })
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Page URL for a city.
    pub fn city_url(&self, city: &City) -> Result<String, PipelineError> {
        let slug = city_slug(&self.slug_overrides, &city.id, &city.name);
        Ok(city_url(&self.config.numbeo_base_url, &slug)?.to_string())
    }

    /// Fetches, parses and applies one city. Does not sleep between cities.
    pub async fn process_city(
        &self,
        city: &mut City,
        today: NaiveDate,
    ) -> Result<CityOutcome, PipelineError> {
        let url = self.city_url(city)?;

        let body = match fetch_with_retry(
            &self.source,
            &self.sleeper,
            &self.config.retry,
            &self.tracker,
            &url,
        )
        .await
        {
            RetryOutcome::Fetched { body, .. } => body,
            RetryOutcome::Failed { status, .. } => return Ok(CityOutcome::FetchFailed { status }),
            RetryOutcome::GaveUp {
                status,
                retry_after,
                attempts,
            } => {
                tracing::warn!(
                    "{}: rate limited (HTTP {}{}) after {} attempts",
                    city.name,
                    status,
                    retry_after
                        .map(|d| format!(", Retry-After {}s", d.as_secs()))
                        .unwrap_or_default(),
                    attempts
                );
                return Ok(CityOutcome::RateLimitedExhausted { status });
            }
        };

        if has_insufficient_data(&body) {
            return Ok(CityOutcome::NoData);
        }

        let fields = parse_price_page(&body)?;
        if fields.len() < self.config.min_fields {
            return Ok(CityOutcome::UnderThreshold {
                found: fields.len(),
            });
        }

        let report = apply_updates(city, &plan_updates(&fields), today);
        if report.updated {
            Ok(CityOutcome::Updated { report })
        } else {
            Ok(CityOutcome::NoChanges)
        }
    }

    /// Runs the batch over `cities`, persisting to `store` unless dry-run.
    pub async fn run(
        &self,
        cities: &mut [City],
        store: &CityStore,
        options: &RunOptions,
    ) -> Result<RunSummary, PipelineError> {
        let selected = select_cities(cities, options.city.as_deref())?;
        let total = selected.len();
        let started = Instant::now();

        let mut state = RunState::default();
        let mut checkpoints = 0;
        let mut store_written = false;

        for (position, &index) in selected.iter().enumerate() {
            let city = &mut cities[index];
            let outcome = if options.resume && city.metrics.updated_on(options.today) {
                CityOutcome::ResumeSkipped
            } else {
                self.process_city(city, options.today).await?
            };
            let name = city.name.clone();

            state.record(&outcome);
            tracing::info!("[{}/{}] {}: {}", position + 1, total, name, outcome);

            match &outcome {
                CityOutcome::UnderThreshold { found: 0 } => {
                    tracing::warn!(
                        "{}: page fetched but no fields matched ({} empty pages this run), labels may have changed",
                        name,
                        state.empty_pages
                    );
                }
                CityOutcome::Updated { .. }
                    if !options.dry_run && state.success % self.config.save_interval.max(1) == 0 =>
                {
                    store.save(cities)?;
                    checkpoints += 1;
                    store_written = true;
                    tracing::info!("Intermediate save ({} cities updated so far)", state.success);
                }
                CityOutcome::RateLimitedExhausted { .. }
                    if state.consecutive_rate_limits >= self.config.burst_threshold =>
                {
                    tracing::warn!(
                        "{} consecutive rate limits, pausing {}s",
                        state.consecutive_rate_limits,
                        self.config.cooldown.as_secs()
                    );
                    if !options.dry_run && state.success > 0 {
                        store.save(cities)?;
                        checkpoints += 1;
                        store_written = true;
                        tracing::info!("Saved progress ({} cities so far)", state.success);
                    }
                    self.sleeper.sleep(self.config.cooldown).await;
                    state.reset_burst();
                }
                _ => {}
            }

            if outcome.was_fetched() {
                let delay = self.random_delay();
                self.sleeper.sleep(delay).await;
            }
        }

        if !options.dry_run && state.success > 0 {
            store.save(cities)?;
            store_written = true;
        }

        let elapsed = started.elapsed();
        if options.dry_run {
            tracing::info!(
                "[DRY RUN] {} ({:.0}s)",
                state.describe(),
                elapsed.as_secs_f64()
            );
        } else if store_written {
            tracing::info!(
                "Done in {:.0}s: {}. Written to {}",
                elapsed.as_secs_f64(),
                state.describe(),
                store.path().display()
            );
        } else {
            tracing::info!("Done: {}. No changes written", state.describe());
        }
        if state.rate_limited > 0 {
            tracing::info!(
                "{} cities were rate-limited. Rerun with --resume to continue where this run left off",
                state.rate_limited
            );
        }

        Ok(RunSummary {
            state,
            total_cities: total,
            elapsed_secs: elapsed.as_secs_f64(),
            requests: self.tracker.summary(),
            checkpoints,
            store_written,
            dry_run: options.dry_run,
        })
    }

    /// Uniform pause in `[min_delay, max_delay)`.
    fn random_delay(&self) -> Duration {
        let (min, max) = (self.config.min_delay, self.config.max_delay);
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..max)
    }
}
