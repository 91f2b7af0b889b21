//! marketfeed runner: drives the collection pipelines and persists results.
//!
//! Wires core components together (probe, chunked fetch, aggregation for
//! energy; listing and detail scrapers for futures) and writes every table
//! as CSV, JSON and/or Parquet.

pub mod energy;
pub mod export;
pub mod futures;

pub use energy::{run_energy, EnergyRunSummary, ZoneOutcome};
pub use export::{save_table, Format};
pub use futures::{instrument_slug, run_futures, FuturesRunSummary};
