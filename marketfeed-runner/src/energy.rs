//! Spot price run: for each configured zone, find the earliest data, fetch
//! forward to now, aggregate by month and save both tables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use marketfeed_core::config::API_TIME_FORMAT;
use marketfeed_core::domain::MarketZone;
use marketfeed_core::energy::{
    convert_timestamps, monthly_averages, ChunkedFetcher, EarliestData, PriceSource, RangeFinder,
};
use marketfeed_core::EnergyConfig;
use tracing::{error, info};

use crate::export::{save_table, PRICE_FORMATS};

/// What happened for one zone.
#[derive(Debug, Clone)]
pub struct ZoneOutcome {
    pub zone: MarketZone,
    pub earliest: EarliestData,
    /// Samples fetched across all chunks.
    pub samples: usize,
    /// Months with at least one non-null price.
    pub months: usize,
    /// Empty when the zone was skipped.
    pub files: Vec<PathBuf>,
}

impl ZoneOutcome {
    pub fn is_saved(&self) -> bool {
        !self.files.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnergyRunSummary {
    pub zones: Vec<ZoneOutcome>,
}

impl EnergyRunSummary {
    pub fn saved(&self) -> usize {
        self.zones.iter().filter(|z| z.is_saved()).count()
    }

    pub fn skipped(&self) -> usize {
        self.zones.len() - self.saved()
    }
}

/// Run the spot price pipeline for every zone in `config`, fetching up to
/// `now`. Fetch problems are absorbed by the components; only persistence
/// failures abort the run.
pub fn run_energy(
    config: &EnergyConfig,
    source: &dyn PriceSource,
    now: DateTime<Utc>,
) -> Result<EnergyRunSummary> {
    let finder = RangeFinder::new(source, config).context("invalid energy configuration")?;
    let fetcher = ChunkedFetcher::new(source, config);
    let mut summary = EnergyRunSummary::default();

    for zone in &config.zones {
        let outcome = run_zone(config, &finder, &fetcher, zone, now)
            .with_context(|| format!("failed to save data for {} ({})", zone.country, zone.code))?;
        summary.zones.push(outcome);
    }

    info!(
        saved = summary.saved(),
        skipped = summary.skipped(),
        "energy run complete"
    );
    Ok(summary)
}

fn run_zone(
    config: &EnergyConfig,
    finder: &RangeFinder,
    fetcher: &ChunkedFetcher,
    zone: &MarketZone,
    now: DateTime<Utc>,
) -> Result<ZoneOutcome> {
    info!(zone = %zone.code, country = %zone.country, "starting data fetch");

    let earliest = finder.find_earliest(&zone.code, now);
    info!(
        zone = %zone.code,
        start = %earliest.start.format(API_TIME_FORMAT),
        origin = ?earliest.origin,
        "fetching from start date"
    );

    let series = fetcher.fetch(&zone.code, earliest.start, now);
    let mut outcome = ZoneOutcome {
        zone: zone.clone(),
        earliest,
        samples: series.len(),
        months: 0,
        files: Vec::new(),
    };

    if series.is_empty() {
        error!(
            zone = %zone.code,
            country = %zone.country,
            "no data was fetched, skipping save"
        );
        return Ok(outcome);
    }

    info!(zone = %zone.code, samples = series.len(), "processing data");
    let rows = convert_timestamps(&series).context("failed to convert timestamps")?;
    let monthly = monthly_averages(&rows);
    outcome.months = monthly.len();

    let dir = &config.output_dir;
    outcome.files.extend(save_table(
        dir,
        &format!("spot_prices_{}", zone.country),
        &rows,
        PRICE_FORMATS,
    )?);
    outcome.files.extend(save_table(
        dir,
        &format!("monthly_avg_spot_prices_{}", zone.country),
        &monthly,
        PRICE_FORMATS,
    )?);

    info!(
        zone = %zone.code,
        country = %zone.country,
        files = outcome.files.len(),
        "data saved"
    );
    Ok(outcome)
}
