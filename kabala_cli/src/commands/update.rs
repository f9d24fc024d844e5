//! The update run: inflation first, then the city batch.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use kabala_lib::inflation::{update_inflation, ImfClient};
use kabala_lib::kabala_http::{Client, USER_AGENTS};
use kabala_lib::types::City;
use kabala_lib::{
    load_imf_codes, select_cities, CityStore, InflationStore, InflationSummary, Pipeline,
    RunOptions, TokioSleeper, UpdaterConfig,
};

use crate::output::{print_json, print_run_table, OutputFormat, RunReport};

/// Flags for an update run.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Update a single city by id (e.g. berlin)
    #[arg(long)]
    pub city: Option<String>,

    /// Only refresh inflation rates, skip the city batch
    #[arg(long)]
    pub inflation: bool,

    /// Fetch and compute everything but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip cities already updated today
    #[arg(long)]
    pub resume: bool,

    /// City store path (overrides KABALA_CITIES_PATH)
    #[arg(long)]
    pub cities_path: Option<PathBuf>,

    /// Inflation store path (overrides KABALA_INFLATION_PATH)
    #[arg(long)]
    pub inflation_path: Option<PathBuf>,
}

pub async fn run(args: &UpdateArgs, format: &OutputFormat) -> Result<()> {
    let mut config = UpdaterConfig::from_env();
    if let Some(path) = &args.cities_path {
        config.cities_path = path.clone();
    }
    if let Some(path) = &args.inflation_path {
        config.inflation_path = path.clone();
    }
    let today = Utc::now().date_naive();

    log_header(args, &config, today);

    let city_store = CityStore::new(&config.cities_path);
    let mut cities = city_store.load()?;

    // Fail on an unknown id before any request goes out.
    if let Some(id) = &args.city {
        select_cities(&cities, Some(id.as_str()))?;
    }

    let inflation = refresh_inflation(&config, &cities, args.dry_run, today).await;

    if args.inflation {
        tracing::info!("Done (inflation only)");
        emit(
            &RunReport {
                inflation,
                cities: None,
            },
            format,
        );
        return Ok(());
    }

    let client = Client::with_timeout(config.request_timeout)?;
    let pipeline = Pipeline::new(client, TokioSleeper, config)?;
    let options = RunOptions {
        city: args.city.clone(),
        resume: args.resume,
        dry_run: args.dry_run,
        today,
    };
    let summary = pipeline.run(&mut cities, &city_store, &options).await?;

    emit(
        &RunReport {
            inflation,
            cities: Some(summary),
        },
        format,
    );
    Ok(())
}

fn log_header(args: &UpdateArgs, config: &UpdaterConfig, today: NaiveDate) {
    tracing::info!(
        "KABALA data updater, mode: {}",
        if args.dry_run { "DRY RUN" } else { "LIVE" }
    );
    if let Some(city) = &args.city {
        tracing::info!("Target city: {}", city);
    }
    if args.resume {
        tracing::info!("Resume: skipping cities updated today ({})", today);
    }
    if args.inflation {
        tracing::info!("Inflation only");
    }
    tracing::info!(
        "Rate limit: {}-{}s delay, {} retries, {}s initial backoff",
        config.min_delay.as_secs(),
        config.max_delay.as_secs(),
        config.retry.max_retries,
        config.retry.initial_backoff.as_secs()
    );
    tracing::info!("User-Agent pool: {} variants", USER_AGENTS.len());
}

/// Inflation failures are logged and never stop the city batch.
async fn refresh_inflation(
    config: &UpdaterConfig,
    cities: &[City],
    dry_run: bool,
    today: NaiveDate,
) -> Option<InflationSummary> {
    let country_codes: BTreeSet<String> = cities
        .iter()
        .map(|c| c.country_code.clone())
        .filter(|code| !code.is_empty())
        .collect();

    let result = async {
        let imf_codes = load_imf_codes()?;
        let client = ImfClient::with_base_url(&config.imf_base_url, config.request_timeout)?;
        let store = InflationStore::new(&config.inflation_path);
        let summary =
            update_inflation(&client, &store, &imf_codes, &country_codes, dry_run, today).await?;
        anyhow::Ok(summary)
    }
    .await;

    match result {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::warn!("Inflation update failed: {:#}", e);
            None
        }
    }
}

fn emit(report: &RunReport, format: &OutputFormat) {
    match format {
        OutputFormat::Table => print_run_table(report),
        OutputFormat::Json => print_json(report),
    }
}
