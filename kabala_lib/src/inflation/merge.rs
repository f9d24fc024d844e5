//! Merging fetched series into `inflation.json`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::client::ImfClient;
use super::error::InflationError;
use super::types::{InflationDocument, YearlyRates};
use crate::store::InflationStore;
use crate::types::{number_value, round2};

/// Multiplier applied to average inflation to project property growth.
const PROPERTY_GROWTH_FACTOR: f64 = 1.3;

/// Rate fields copied straight from the series.
const RATE_FIELDS: [(i32, &str); 3] = [
    (2025, "inflation2025"),
    (2026, "inflation2026"),
    (2027, "inflation2027"),
];

/// `round2(avg(2024, 2025, 2026) × 1.3)`, when all three years are present.
pub fn property_growth_2026(series: &YearlyRates) -> Option<f64> {
    let years = [2024, 2025, 2026].map(|year| series.get(&year).copied());
    let [Some(a), Some(b), Some(c)] = years else {
        return None;
    };
    Some(round2((a + b + c) / 3.0 * PROPERTY_GROWTH_FACTOR))
}

/// Copies rates into countries that already exist in `document`.
///
/// Codes missing from the document are never inserted. Returns the number of
/// countries that received at least one value; when that is non-zero and the
/// document is wrapped, `lastUpdated` is set to `today`.
pub fn merge_inflation(
    document: &mut InflationDocument,
    series: &BTreeMap<String, YearlyRates>,
    today: NaiveDate,
) -> usize {
    let mut updated = 0;

    for (code, rates) in series {
        let Some(Value::Object(entry)) = document.countries_mut().get_mut(code) else {
            continue;
        };

        let mut touched = false;
        for (year, key) in RATE_FIELDS {
            if let Some(rate) = rates.get(&year) {
                entry.insert(key.to_string(), number_value(*rate));
                touched = true;
            }
        }
        if let Some(growth) = property_growth_2026(rates) {
            entry.insert("propertyGrowth2026".to_string(), number_value(growth));
            touched = true;
        }

        if touched {
            updated += 1;
        }
    }

    if updated > 0 {
        if let InflationDocument::Wrapped(doc) = document {
            doc.last_updated = Some(today.format("%Y-%m-%d").to_string());
        }
    }

    updated
}

/// Outcome of the inflation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InflationSummary {
    pub countries_fetched: usize,
    pub countries_updated: usize,
    pub written: bool,
}

/// Fetches series for `country_codes` and merges them into the store.
///
/// Nothing is read or written when no series came back. Dry runs report
/// what would change without writing.
pub async fn update_inflation(
    client: &ImfClient,
    store: &InflationStore,
    imf_codes: &[(String, String)],
    country_codes: &BTreeSet<String>,
    dry_run: bool,
    today: NaiveDate,
) -> Result<InflationSummary, InflationError> {
    let series = client.fetch_inflation(imf_codes, country_codes).await;
    let mut summary = InflationSummary {
        countries_fetched: series.len(),
        ..InflationSummary::default()
    };
    if series.is_empty() {
        return Ok(summary);
    }

    let mut document = store.load()?;
    summary.countries_updated = merge_inflation(&mut document, &series, today);

    if dry_run {
        tracing::info!(
            "[DRY RUN] Would update inflation for {} countries",
            summary.countries_updated
        );
    } else if summary.countries_updated > 0 {
        store.save(&document)?;
        summary.written = true;
        tracing::info!(
            "Updated inflation for {} countries -> {}",
            summary.countries_updated,
            store.path().display()
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn rates(pairs: &[(i32, f64)]) -> YearlyRates {
        pairs.iter().copied().collect()
    }

    fn wrapped() -> InflationDocument {
        serde_json::from_value(json!({
            "lastUpdated": "2025-01-01",
            "source": "IMF WEO",
            "countries": {
                "DE": {
                    "name": "Germany",
                    "inflation2025": 2.0,
                    "inflation2026": 2.0,
                    "inflation2027": 2.0,
                    "propertyGrowth2026": 2.5,
                    "notes": "ECB target"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn property_growth_needs_three_years() {
        assert_eq!(
            property_growth_2026(&rates(&[(2024, 2.0), (2025, 3.0), (2026, 4.0)])),
            Some(3.9)
        );
        assert_eq!(property_growth_2026(&rates(&[(2025, 3.0), (2026, 4.0)])), None);
    }

    #[test]
    fn merge_updates_existing_country() {
        let mut doc = wrapped();
        let series: BTreeMap<_, _> = [(
            "DE".to_string(),
            rates(&[(2024, 2.5), (2025, 2.1), (2026, 1.9), (2027, 2.0)]),
        )]
        .into_iter()
        .collect();

        let updated = merge_inflation(&mut doc, &series, today());

        assert_eq!(updated, 1);
        let value = serde_json::to_value(&doc).unwrap();
        let de = &value["countries"]["DE"];
        assert_eq!(de["inflation2025"], 2.1);
        assert_eq!(de["inflation2026"], 1.9);
        assert_eq!(de["inflation2027"], 2);
        assert_eq!(de["propertyGrowth2026"], 2.82);
        assert_eq!(de["notes"], "ECB target");
        assert_eq!(value["lastUpdated"], "2026-03-14");
        assert_eq!(value["source"], "IMF WEO");
    }

    #[test]
    fn merge_never_inserts_countries() {
        let mut doc = wrapped();
        let before = serde_json::to_value(&doc).unwrap();
        let series: BTreeMap<_, _> = [("FR".to_string(), rates(&[(2025, 1.8)]))]
            .into_iter()
            .collect();

        let updated = merge_inflation(&mut doc, &series, today());

        assert_eq!(updated, 0);
        assert!(!doc.countries().contains_key("FR"));
        assert_eq!(serde_json::to_value(&doc).unwrap(), before);
    }

    #[test]
    fn zero_rate_is_copied() {
        let mut doc = wrapped();
        let series: BTreeMap<_, _> = [("DE".to_string(), rates(&[(2026, 0.0)]))]
            .into_iter()
            .collect();

        merge_inflation(&mut doc, &series, today());

        assert_eq!(doc.countries()["DE"]["inflation2026"], 0);
        assert_eq!(doc.countries()["DE"]["inflation2025"], 2.0);
    }

    #[test]
    fn bare_document_stays_bare() {
        let mut doc: InflationDocument =
            serde_json::from_value(json!({"DE": {"name": "Germany"}})).unwrap();
        let series: BTreeMap<_, _> = [("DE".to_string(), rates(&[(2025, 2.2)]))]
            .into_iter()
            .collect();

        assert_eq!(merge_inflation(&mut doc, &series, today()), 1);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({"DE": {"name": "Germany", "inflation2025": 2.2}}));
    }

    #[test]
    fn existing_key_order_is_kept() {
        let mut doc = wrapped();
        let series: BTreeMap<_, _> = [("DE".to_string(), rates(&[(2027, 3.3)]))]
            .into_iter()
            .collect();

        merge_inflation(&mut doc, &series, today());

        let keys: Vec<_> = doc.countries()["DE"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "inflation2025",
                "inflation2026",
                "inflation2027",
                "propertyGrowth2026",
                "notes"
            ]
        );
    }
}
