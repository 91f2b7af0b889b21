//! Electricity spot prices: range discovery, chunked fetch, monthly aggregation.

pub mod aggregate;
pub mod api;
pub mod chunked;
pub mod range;

pub use aggregate::{convert_timestamps, monthly_averages};
pub use api::{EnergyChartsClient, PriceSource};
pub use chunked::ChunkedFetcher;
pub use range::{EarliestData, RangeFinder, StartOrigin};
