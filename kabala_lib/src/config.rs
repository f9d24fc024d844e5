//! Run configuration with environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_CITIES_PATH: &str = "src/data/cities.json";
pub const DEFAULT_INFLATION_PATH: &str = "src/data/inflation.json";
pub const DEFAULT_NUMBEO_BASE_URL: &str = "https://www.numbeo.com";
pub const DEFAULT_IMF_BASE_URL: &str = "https://www.imf.org";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything the updater needs besides the per-run flags.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterConfig {
    pub cities_path: PathBuf,
    pub inflation_path: PathBuf,
    pub numbeo_base_url: String,
    pub imf_base_url: String,
    pub request_timeout: Duration,
    /// Pause after every fetched city, drawn uniformly from `[min, max)`.
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub retry: RetryPolicy,
    /// Checkpoint the store after this many successful cities.
    pub save_interval: usize,
    /// Consecutive give-ups that trigger a cooldown.
    pub burst_threshold: usize,
    pub cooldown: Duration,
    /// Pages yielding fewer fields than this are not applied.
    pub min_fields: usize,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            cities_path: PathBuf::from(DEFAULT_CITIES_PATH),
            inflation_path: PathBuf::from(DEFAULT_INFLATION_PATH),
            numbeo_base_url: DEFAULT_NUMBEO_BASE_URL.to_string(),
            imf_base_url: DEFAULT_IMF_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(8),
            retry: RetryPolicy::default(),
            save_interval: 10,
            burst_threshold: 5,
            cooldown: Duration::from_secs(120),
            min_fields: 3,
        }
    }
}

impl UpdaterConfig {
    /// Defaults overridden by `KABALA_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    /// Empty or unparseable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            cities_path: var("KABALA_CITIES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cities_path),
            inflation_path: var("KABALA_INFLATION_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.inflation_path),
            numbeo_base_url: var("KABALA_NUMBEO_BASE_URL").unwrap_or(defaults.numbeo_base_url),
            imf_base_url: var("KABALA_IMF_BASE_URL").unwrap_or(defaults.imf_base_url),
            request_timeout: var("KABALA_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = UpdaterConfig::from_lookup(lookup(&[]));
        assert_eq!(config, UpdaterConfig::default());
        assert_eq!(config.cities_path, PathBuf::from("src/data/cities.json"));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.save_interval, 10);
    }

    #[test]
    fn env_overrides_paths_and_urls() {
        let config = UpdaterConfig::from_lookup(lookup(&[
            ("KABALA_CITIES_PATH", "/tmp/cities.json"),
            ("KABALA_NUMBEO_BASE_URL", "http://127.0.0.1:9000"),
            ("KABALA_REQUEST_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.cities_path, PathBuf::from("/tmp/cities.json"));
        assert_eq!(config.numbeo_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.imf_base_url, DEFAULT_IMF_BASE_URL);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = UpdaterConfig::from_lookup(lookup(&[
            ("KABALA_REQUEST_TIMEOUT_SECS", "soon"),
            ("KABALA_INFLATION_PATH", "  "),
        ]));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.inflation_path, PathBuf::from(DEFAULT_INFLATION_PATH));
    }
}
