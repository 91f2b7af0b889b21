//! Spot-price domain types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One price point as delivered by the energy API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub unix_seconds: i64,
    /// EUR/MWh. The API reports gaps as `null`.
    pub price: Option<f64>,
}

/// Chronologically concatenated samples for one market zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub zone: String,
    pub samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            samples: Vec::new(),
        }
    }

    /// Append one fetched chunk. Chunks must arrive in request order.
    pub fn extend_chunk(&mut self, chunk: Vec<PriceSample>) {
        self.samples.extend(chunk);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A sample with its timestamp converted to a UTC calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimestampedPrice {
    #[serde(rename = "Timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Price (EUR/MWh)")]
    pub price: Option<f64>,
}

/// Mean price for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverage {
    /// `YYYY-MM`
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Price (EUR/MWh)")]
    pub mean_price: f64,
}

/// A bidding zone and the country label used in output file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketZone {
    pub code: String,
    pub country: String,
}

impl MarketZone {
    pub fn new(code: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            country: country.into(),
        }
    }
}
