//! marketfeed core: the building blocks of both collection pipelines.
//!
//! - Domain types (price samples and series, monthly averages, futures
//!   listings and detail records)
//! - Energy spot prices: earliest-date probe, chunked fetch, aggregation
//! - Futures: listing table scraper, detail page scraper, timestamp normalisation
//! - HTTP and pacing seams so every component can run against in-memory fakes
//! - Parquet frame conversion and atomic writes

pub mod config;
pub mod domain;
pub mod energy;
pub mod error;
pub mod futures;
pub mod http;
pub mod pacing;
pub mod storage;

pub use config::{EnergyConfig, FuturesConfig, HarvestConfig};
pub use error::DataError;
