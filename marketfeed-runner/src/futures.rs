//! Futures run: scrape the listing, save it, then scrape and save details
//! for the first `count` instruments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use marketfeed_core::domain::DetailField;
use marketfeed_core::futures::{DetailScraper, ListScraper};
use marketfeed_core::http::PageFetcher;
use marketfeed_core::pacing::Pacer;
use marketfeed_core::FuturesConfig;
use tracing::info;

use crate::export::{save_table, FUTURES_FORMATS};

#[derive(Debug, Clone, Default)]
pub struct FuturesRunSummary {
    /// Unique listing rows.
    pub listings: usize,
    /// Detail records written.
    pub details: usize,
    pub files: Vec<PathBuf>,
}

pub fn run_futures(
    config: &FuturesConfig,
    fetcher: &dyn PageFetcher,
    pacer: &dyn Pacer,
    count: usize,
) -> Result<FuturesRunSummary> {
    let mut summary = FuturesRunSummary::default();

    let listings = ListScraper::new(fetcher, pacer, config).scrape_all();
    summary.listings = listings.len();
    summary.files.extend(
        save_table(&config.list_output_dir, "futures_list", &listings, FUTURES_FORMATS)
            .context("failed to save futures list")?,
    );
    info!(count = listings.len(), "futures list saved");

    let selected = &listings[..count.min(listings.len())];
    let scraper = DetailScraper::new(fetcher, pacer, config).context("invalid futures configuration")?;
    let details = scraper.scrape(selected);
    summary.details = details.len();

    let dir = &config.detail_output_dir;
    summary.files.extend(
        save_table(dir, "futures_details", &details, FUTURES_FORMATS)
            .context("failed to save futures details")?,
    );

    if config.per_instrument_files {
        for detail in &details {
            let slug = instrument_slug(detail.get(DetailField::FuturesName));
            summary.files.extend(
                save_table(dir, &slug, std::slice::from_ref(detail), FUTURES_FORMATS)
                    .with_context(|| format!("failed to save details for {slug}"))?,
            );
        }
    }

    info!(
        listings = summary.listings,
        details = summary.details,
        files = summary.files.len(),
        "futures run complete"
    );
    Ok(summary)
}

/// File stem for one instrument: lowercase ASCII alphanumerics, every other
/// run of characters collapsed to `_`.
pub fn instrument_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "instrument".to_string()
    } else {
        slug.to_string()
    }
}
