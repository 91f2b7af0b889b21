//! Forward walk over fixed-size windows, concatenating every chunk.

use super::api::PriceSource;
use crate::config::EnergyConfig;
use crate::domain::PriceSeries;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

pub struct ChunkedFetcher<'a> {
    source: &'a dyn PriceSource,
    chunk: Duration,
}

impl<'a> ChunkedFetcher<'a> {
    pub fn new(source: &'a dyn PriceSource, config: &EnergyConfig) -> Self {
        Self {
            source,
            chunk: config.chunk(),
        }
    }

    /// Fetch `[start, end)` window by window. Empty or failed windows leave a
    /// gap in the series instead of aborting.
    pub fn fetch(&self, zone: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> PriceSeries {
        let mut series = PriceSeries::new(zone);
        let mut cursor = start;

        while cursor < end {
            let next_end = (cursor + self.chunk).min(end);
            let range = format!(
                "{} - {}",
                cursor.format("%Y-%m-%d"),
                next_end.format("%Y-%m-%d")
            );

            match self.source.fetch_window(zone, cursor, next_end) {
                Ok(chunk) if !chunk.is_empty() => {
                    info!(zone, %range, samples = chunk.len(), "data retrieved");
                    series.extend_chunk(chunk);
                }
                Ok(_) => warn!(zone, %range, "no data available in this range"),
                Err(e) => warn!(zone, %range, error = %e, "no data available in this range"),
            }

            cursor = next_end;
        }

        series
    }
}
