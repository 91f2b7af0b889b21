//! Timestamp conversion and monthly averaging.

use crate::domain::{MonthlyAverage, PriceSeries, TimestampedPrice};
use crate::error::DataError;
use chrono::DateTime;
use std::collections::BTreeMap;

/// Convert every sample's epoch seconds to a UTC calendar timestamp.
pub fn convert_timestamps(series: &PriceSeries) -> Result<Vec<TimestampedPrice>, DataError> {
    series
        .samples
        .iter()
        .map(|s| {
            let timestamp = DateTime::from_timestamp(s.unix_seconds, 0)
                .ok_or_else(|| {
                    DataError::Parse(format!("timestamp out of range: {}", s.unix_seconds))
                })?
                .naive_utc();
            Ok(TimestampedPrice {
                timestamp,
                price: s.price,
            })
        })
        .collect()
}

/// Mean price per calendar month, ordered by month.
///
/// Null prices are ignored; a month with no non-null price has a null mean
/// and is dropped.
pub fn monthly_averages(rows: &[TimestampedPrice]) -> Vec<MonthlyAverage> {
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for row in rows {
        let entry = groups
            .entry(row.timestamp.format("%Y-%m").to_string())
            .or_insert((0.0, 0));
        if let Some(price) = row.price {
            entry.0 += price;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(month, (sum, count))| MonthlyAverage {
            month,
            mean_price: sum / count as f64,
        })
        .collect()
}
