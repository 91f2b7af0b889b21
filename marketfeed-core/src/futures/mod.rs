//! Futures listings and detail pages.

pub mod detail;
pub mod listing;
pub mod timestamp;

pub use detail::DetailScraper;
pub use listing::{dedup_sorted, ListScraper};
pub use timestamp::{normalize_to_utc, parse_localized, TimezoneTable};
