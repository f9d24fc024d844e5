//! IMF DataMapper client for annual inflation series.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::error::InflationError;
use super::types::{DataMapperResponse, YearlyRates, PCPIPCH};
use crate::types::round2;

/// Request timeout for IMF API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Years kept from each series.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2020..=2030;

/// IMF DataMapper REST client.
pub struct ImfClient {
    client: reqwest::Client,
    base_url: String,
}

impl ImfClient {
    /// Create a client against the public IMF host.
    pub fn new() -> Result<Self, InflationError> {
        Self::with_base_url("https://www.imf.org", REQUEST_TIMEOUT)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, InflationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// PCPIPCH series for one IMF country code, limited to [`YEAR_RANGE`].
    pub async fn inflation_series(&self, imf_code: &str) -> Result<YearlyRates, InflationError> {
        let url = format!(
            "{}/external/datamapper/api/v1/{}/{}",
            self.base_url, PCPIPCH, imf_code
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InflationError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: DataMapperResponse = serde_json::from_str(&body).map_err(|e| {
            InflationError::ParseFailed(format!("{} | body: {}", e, body_snippet(&body, 200)))
        })?;

        let series = parsed
            .series(imf_code)
            .ok_or_else(|| InflationError::MissingSeries(imf_code.to_string()))?;

        Ok(series
            .iter()
            .filter_map(|(year, rate)| {
                let year: i32 = year.parse().ok()?;
                let rate = (*rate)?;
                YEAR_RANGE.contains(&year).then(|| (year, round2(rate)))
            })
            .collect())
    }

    /// Series for every mapped country in `country_codes`, keyed by ISO
    /// alpha-2 code. Countries whose request fails are left out.
    pub async fn fetch_inflation(
        &self,
        imf_codes: &[(String, String)],
        country_codes: &BTreeSet<String>,
    ) -> BTreeMap<String, YearlyRates> {
        let mut results = BTreeMap::new();

        for (iso2, imf3) in imf_codes {
            if !country_codes.contains(iso2) {
                continue;
            }
            match self.inflation_series(imf3).await {
                Ok(series) => {
                    results.insert(iso2.clone(), series);
                }
                Err(e) => {
                    tracing::debug!("Skipping inflation for {} ({}): {}", iso2, imf3, e);
                }
            }
        }

        tracing::info!("Got inflation data for {} countries", results.len());
        results
    }
}

/// At most `max_chars` characters of `body`, cut on a char boundary.
fn body_snippet(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
