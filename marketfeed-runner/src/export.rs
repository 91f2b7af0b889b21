//! Table export: CSV, JSON and Parquet.
//!
//! CSV and JSON are rendered in memory and written through a `.tmp` sibling
//! that is renamed into place; Parquet goes through the core frame writer,
//! which does the same. Existing files are always overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use marketfeed_core::storage::{self, ToFrame};
use serde::Serialize;

/// Output formats for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Parquet,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Parquet => "parquet",
        }
    }
}

/// Spot price tables go out in every format.
pub const PRICE_FORMATS: &[Format] = &[Format::Csv, Format::Json, Format::Parquet];

/// Futures tables are CSV and Parquet only.
pub const FUTURES_FORMATS: &[Format] = &[Format::Csv, Format::Parquet];

// ─── CSV export ─────────────────────────────────────────────────────

/// Render rows as CSV with a header line.
///
/// An empty table still gets its header, taken from the frame layout.
pub fn export_csv<T: Serialize + ToFrame>(rows: &[T]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    if rows.is_empty() {
        let frame = T::to_frame(&[]).context("failed to build empty frame for CSV header")?;
        let header: Vec<&str> = frame
            .get_column_names()
            .iter()
            .map(|name| name.as_str())
            .collect();
        wtr.write_record(&header)?;
    }

    for row in rows {
        wtr.serialize(row).context("failed to serialize CSV row")?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// Render rows as a pretty-printed JSON array of objects.
pub fn export_json<T: Serialize>(rows: &[T]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("failed to serialize rows to JSON")
}

// ─── Bundle ─────────────────────────────────────────────────────────

/// Write `rows` as `{dir}/{stem}.{ext}` for each format, creating `dir` when
/// absent. Returns the written paths in format order.
pub fn save_table<T: Serialize + ToFrame>(
    dir: &Path,
    stem: &str,
    rows: &[T],
    formats: &[Format],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        match format {
            Format::Csv => write_atomic(&path, export_csv(rows)?.as_bytes())?,
            Format::Json => write_atomic(&path, export_json(rows)?.as_bytes())?,
            Format::Parquet => storage::write_parquet(&path, rows)
                .with_context(|| format!("failed to write {}", path.display()))?,
        }
        written.push(path);
    }
    Ok(written)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| {
        let _ = fs::remove_file(&tmp);
        format!("failed to move {} into place", path.display())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use marketfeed_core::domain::{
        DetailField, FuturesDetail, FuturesListing, MonthlyAverage, TimestampedPrice,
    };

    fn price(day: u32, hour: u32, value: Option<f64>) -> TimestampedPrice {
        TimestampedPrice {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            price: value,
        }
    }

    #[test]
    fn price_csv_has_named_columns_and_blank_gaps() {
        let csv = export_csv(&[price(1, 0, Some(42.5)), price(1, 1, None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Timestamp,Price (EUR/MWh)");
        assert_eq!(lines[1], "2024-01-01T00:00:00,42.5");
        assert_eq!(lines[2], "2024-01-01T01:00:00,");
    }

    #[test]
    fn price_json_is_array_of_records() {
        let json = export_json(&[price(2, 0, Some(10.0)), price(2, 1, None)]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Price (EUR/MWh)"], 10.0);
        assert!(rows[1]["Price (EUR/MWh)"].is_null());
    }

    #[test]
    fn monthly_csv() {
        let rows = vec![
            MonthlyAverage {
                month: "2024-01".into(),
                mean_price: 15.0,
            },
            MonthlyAverage {
                month: "2024-02".into(),
                mean_price: 30.0,
            },
        ];
        let csv = export_csv(&rows).unwrap();
        assert_eq!(csv, "Month,Price (EUR/MWh)\n2024-01,15.0\n2024-02,30.0\n");
    }

    #[test]
    fn empty_table_still_has_header() {
        let csv = export_csv::<FuturesListing>(&[]).unwrap();
        assert_eq!(csv, "Page,Name,Link,Exchange,Country,Sector\n");
    }

    #[test]
    fn detail_csv_columns_follow_field_order() {
        let mut detail = FuturesDetail::new();
        detail.set(DetailField::FuturesName, "Gold, Continuous");
        let csv = export_csv(&[detail]).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("Futures Name,Ticker,Price,"));
        assert_eq!(header.split(',').count(), DetailField::COUNT);
        // Values containing commas are quoted.
        assert!(lines.next().unwrap().starts_with("\"Gold, Continuous\",N/A,"));
    }

    #[test]
    fn save_table_writes_each_format_and_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("data");

        let paths = save_table(&out, "spot_prices_Germany", &[price(3, 0, Some(1.0))], PRICE_FORMATS)
            .unwrap();

        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!(path.exists(), "{} missing", path.display());
        }
        assert!(out.join("spot_prices_Germany.parquet").exists());
        let leftovers = fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
