//! Parquet output.
//!
//! Each record type knows how to lay itself out as a Polars DataFrame. Files
//! are written atomically (write to `.tmp`, rename into place) and always
//! overwrite what was there.

use crate::domain::{DetailField, FuturesDetail, FuturesListing, MonthlyAverage, TimestampedPrice};
use crate::error::DataError;
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Record types that can be written as a Parquet table.
pub trait ToFrame: Sized {
    fn to_frame(rows: &[Self]) -> Result<DataFrame, DataError>;
}

const PRICE_COLUMN: &str = "Price (EUR/MWh)";

impl ToFrame for TimestampedPrice {
    fn to_frame(rows: &[Self]) -> Result<DataFrame, DataError> {
        let millis: Vec<i64> = rows
            .iter()
            .map(|r| r.timestamp.and_utc().timestamp_millis())
            .collect();
        let prices: Vec<Option<f64>> = rows.iter().map(|r| r.price).collect();

        DataFrame::new(vec![
            Column::new("Timestamp".into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| DataError::ParquetError(format!("timestamp cast: {e}")))?,
            Column::new(PRICE_COLUMN.into(), prices),
        ])
        .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
    }
}

impl ToFrame for MonthlyAverage {
    fn to_frame(rows: &[Self]) -> Result<DataFrame, DataError> {
        let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
        let means: Vec<f64> = rows.iter().map(|r| r.mean_price).collect();

        DataFrame::new(vec![
            Column::new("Month".into(), months),
            Column::new(PRICE_COLUMN.into(), means),
        ])
        .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
    }
}

impl ToFrame for FuturesListing {
    fn to_frame(rows: &[Self]) -> Result<DataFrame, DataError> {
        let pages: Vec<u32> = rows.iter().map(|r| r.page).collect();

        DataFrame::new(vec![
            Column::new("Page".into(), pages),
            text_column("Name", rows, |r| r.name.as_str()),
            text_column("Link", rows, |r| r.link.as_str()),
            text_column("Exchange", rows, |r| r.exchange.as_str()),
            text_column("Country", rows, |r| r.country.as_str()),
            text_column("Sector", rows, |r| r.sector.as_str()),
        ])
        .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
    }
}

fn text_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> &str) -> Column {
    let values: Vec<&str> = rows.iter().map(value).collect();
    Column::new(name.into(), values)
}

impl ToFrame for FuturesDetail {
    fn to_frame(rows: &[Self]) -> Result<DataFrame, DataError> {
        let columns = DetailField::ALL
            .iter()
            .map(|field| text_column(field.label(), rows, |r| r.get(*field)))
            .collect();

        DataFrame::new(columns)
            .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
    }
}

/// Write `rows` to `path` as Parquet, replacing any existing file.
pub fn write_parquet<T: ToFrame>(path: &Path, rows: &[T]) -> Result<(), DataError> {
    let mut df = T::to_frame(rows)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp_path)
        .map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::ParquetError(format!("atomic rename failed: {e}"))
    })?;
    Ok(())
}

/// Read a Parquet file back. Used to verify written output.
pub fn read_parquet(path: &Path) -> Result<DataFrame, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))
}
