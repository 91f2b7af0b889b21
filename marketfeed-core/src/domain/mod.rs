//! Domain types shared by both pipelines.

pub mod futures;
pub mod price;

pub use futures::{DetailField, FuturesDetail, FuturesListing, NOT_AVAILABLE};
pub use price::{MarketZone, MonthlyAverage, PriceSample, PriceSeries, TimestampedPrice};
