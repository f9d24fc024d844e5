//! Merging derived metrics into a city record.

use chrono::NaiveDate;

use crate::derive::{ExchangeAnchor, MetricUpdate};
use crate::types::{City, NUMBEO_SOURCE};

const SALARY_AVERAGE: &[&str] = &["salary", "average"];

/// What an update did to one city.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub updated: bool,
    /// Labels of the metrics that were written, in write order.
    pub fields: Vec<&'static str>,
}

impl UpdateReport {
    /// `a, b, c, d, e...` for the per-city log line.
    pub fn summary(&self, max: usize) -> String {
        let shown: Vec<_> = self.fields.iter().take(max).copied().collect();
        let mut text = shown.join(", ");
        if self.fields.len() > max {
            text.push_str("...");
        }
        text
    }
}

/// Writes every positive update into `city`.
///
/// Local amounts are converted with the rate implied by the stored salary.
/// The salary itself is converted with the previous rate; once written, it
/// anchors every later field.
/// When anything was written, `metrics.updatedAt` is set to `today` and the
/// Numbeo source tag is recorded.
pub fn apply_updates(city: &mut City, updates: &[MetricUpdate], today: NaiveDate) -> UpdateReport {
    let mut anchor = ExchangeAnchor::from_salary(city.metrics.salary_average());
    let mut report = UpdateReport::default();

    for update in updates {
        if !update.usd.is_finite() || update.usd <= 0.0 {
            continue;
        }
        let amount = anchor.amount(update.usd);
        city.metrics.set_amount(update.path, amount);
        if update.path == SALARY_AVERAGE {
            anchor = ExchangeAnchor::from_salary(Some(amount));
        }
        report.fields.push(update.label);
    }

    if !report.fields.is_empty() {
        report.updated = true;
        city.metrics.stamp_updated(today);
        city.metrics.add_source(NUMBEO_SOURCE);
    }

    report
}
