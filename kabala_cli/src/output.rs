use kabala_lib::{InflationSummary, RunSummary};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Everything a run reports on exit.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// `None` when the inflation step failed.
    pub inflation: Option<InflationSummary>,
    /// `None` for inflation-only runs.
    pub cities: Option<RunSummary>,
}

#[derive(Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(metric: &'static str, value: impl ToString) -> SummaryRow {
    SummaryRow {
        metric,
        value: value.to_string(),
    }
}

fn build_summary_rows(report: &RunReport) -> Vec<SummaryRow> {
    let mut rows = Vec::new();

    match &report.inflation {
        Some(inflation) => {
            rows.push(row("Inflation countries fetched", inflation.countries_fetched));
            rows.push(row("Inflation countries updated", inflation.countries_updated));
            rows.push(row("Inflation written", yes_no(inflation.written)));
        }
        None => rows.push(row("Inflation", "failed")),
    }

    if let Some(summary) = &report.cities {
        let state = &summary.state;
        rows.push(row("Cities", summary.total_cities));
        rows.push(row("Updated", state.success));
        rows.push(row("Skipped", state.skipped));
        rows.push(row("Rate-limited", state.rate_limited));
        rows.push(row("Already done today", state.resume_skipped));
        if state.empty_pages > 0 {
            rows.push(row("Empty pages", state.empty_pages));
        }
        rows.push(row("Requests", summary.requests.requests_made));
        rows.push(row(
            "Backoff",
            format_duration(summary.requests.total_backoff_secs),
        ));
        rows.push(row("Checkpoints", summary.checkpoints));
        rows.push(row(
            "Store written",
            if summary.dry_run {
                "no (dry run)"
            } else {
                yes_no(summary.store_written)
            },
        ));
        rows.push(row("Elapsed", format_duration(summary.elapsed_secs)));
    }

    rows
}

pub fn print_run_table(report: &RunReport) {
    let mut table = Table::new(build_summary_rows(report));
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// `42s`, `3m 05s` or `1h 02m`.
fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    if total >= 3600 {
        format!("{}h {:02}m", total / 3600, (total % 3600) / 60)
    } else if total >= 60 {
        format!("{}m {:02}s", total / 60, total % 60)
    } else {
        format!("{}s", total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kabala_lib::{RunState, TrackerSummary};

    fn summary() -> RunSummary {
        RunSummary {
            state: RunState {
                processed: 4,
                success: 2,
                skipped: 1,
                rate_limited: 1,
                resume_skipped: 0,
                consecutive_rate_limits: 1,
                empty_pages: 0,
            },
            total_cities: 4,
            elapsed_secs: 185.2,
            requests: TrackerSummary {
                requests_made: 7,
                requests_succeeded: 3,
                requests_rate_limited: 4,
                requests_failed: 0,
                total_backoff_secs: 150.0,
            },
            checkpoints: 0,
            store_written: true,
            dry_run: false,
        }
    }

    fn value_of<'a>(rows: &'a [SummaryRow], metric: &str) -> Option<&'a str> {
        rows.iter()
            .find(|r| r.metric == metric)
            .map(|r| r.value.as_str())
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(42.4), "42s");
        assert_eq!(format_duration(185.2), "3m 05s");
        assert_eq!(format_duration(3720.0), "1h 02m");
    }

    #[test]
    fn rows_cover_inflation_and_cities() {
        let report = RunReport {
            inflation: Some(InflationSummary {
                countries_fetched: 40,
                countries_updated: 38,
                written: true,
            }),
            cities: Some(summary()),
        };
        let rows = build_summary_rows(&report);

        assert_eq!(value_of(&rows, "Inflation countries updated"), Some("38"));
        assert_eq!(value_of(&rows, "Updated"), Some("2"));
        assert_eq!(value_of(&rows, "Rate-limited"), Some("1"));
        assert_eq!(value_of(&rows, "Backoff"), Some("2m 30s"));
        assert_eq!(value_of(&rows, "Store written"), Some("yes"));
        assert_eq!(value_of(&rows, "Empty pages"), None);
    }

    #[test]
    fn inflation_only_run_has_no_city_rows() {
        let report = RunReport {
            inflation: None,
            cities: None,
        };
        let rows = build_summary_rows(&report);
        assert_eq!(rows.len(), 1);
        assert_eq!(value_of(&rows, "Inflation"), Some("failed"));
    }

    #[test]
    fn dry_run_is_labelled() {
        let mut cities = summary();
        cities.dry_run = true;
        cities.store_written = false;
        let rows = build_summary_rows(&RunReport {
            inflation: None,
            cities: Some(cities),
        });
        assert_eq!(value_of(&rows, "Store written"), Some("no (dry run)"));
    }

    #[test]
    fn json_report_shape() {
        let report = RunReport {
            inflation: None,
            cities: Some(summary()),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["inflation"].is_null());
        assert_eq!(value["cities"]["state"]["success"], 2);
        assert_eq!(value["cities"]["requests"]["requests_made"], 7);
    }
}
