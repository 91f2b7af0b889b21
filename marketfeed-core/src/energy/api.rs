//! energy-charts.info price endpoint.
//!
//! `GET {base}/price?bzn={zone}&start={start}&end={end}` returns parallel
//! `unix_seconds` and `price` arrays.

use crate::config::API_TIME_FORMAT;
use crate::domain::PriceSample;
use crate::error::DataError;
use crate::http::HttpClient;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Source of price windows. Implemented by the HTTP client and by test fakes.
pub trait PriceSource: Send + Sync {
    /// Fetch all samples for `zone` in `[start, end)`.
    ///
    /// A response without prices is `Err(MissingData)`; callers treat every
    /// error as "no data for this window".
    fn fetch_window(
        &self,
        zone: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, DataError>;
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    unix_seconds: Vec<i64>,
    #[serde(default)]
    price: Vec<Option<f64>>,
}

pub struct EnergyChartsClient {
    http: HttpClient,
    base_url: String,
}

impl EnergyChartsClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn price_url(&self, zone: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        format!(
            "{}/price?bzn={zone}&start={}&end={}",
            self.base_url.trim_end_matches('/'),
            start.format(API_TIME_FORMAT),
            end.format(API_TIME_FORMAT),
        )
    }
}

impl PriceSource for EnergyChartsClient {
    fn fetch_window(
        &self,
        zone: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>, DataError> {
        let url = self.price_url(zone, start, end);
        let body: PriceResponse = self.http.get_json(&url)?;
        parse_prices(zone, body)
    }
}

/// Zip the parallel arrays into samples.
fn parse_prices(zone: &str, body: PriceResponse) -> Result<Vec<PriceSample>, DataError> {
    if body.price.is_empty() {
        return Err(DataError::MissingData(format!("no prices for {zone}")));
    }
    if body.unix_seconds.len() != body.price.len() {
        return Err(DataError::MalformedResponse(format!(
            "{zone}: {} timestamps vs {} prices",
            body.unix_seconds.len(),
            body.price.len()
        )));
    }

    Ok(body
        .unix_seconds
        .into_iter()
        .zip(body.price)
        .map(|(unix_seconds, price)| PriceSample {
            unix_seconds,
            price,
        })
        .collect())
}
