//! Structured error type shared by the core components.
//!
//! Fetch-side variants are mostly swallowed by the components (an error and
//! "no data" are treated alike); storage and config variants propagate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("missing data: {0}")]
    MissingData(String),

    #[error("response format changed: {0}")]
    MalformedResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

