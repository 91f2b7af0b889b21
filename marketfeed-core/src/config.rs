//! Run configuration for both pipelines.
//!
//! Everything the collectors used to keep as module constants lives here and
//! is handed to each component at construction. A TOML file may override any
//! key; missing keys fall back to the defaults below.

use crate::domain::MarketZone;
use crate::error::DataError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timestamp format used by the energy API for window bounds.
pub const API_TIME_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub energy: EnergyConfig,
    #[serde(default)]
    pub futures: FuturesConfig,
}

impl HarvestConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        let config: Self =
            toml::from_str(content).map_err(|e| DataError::Config(format!("parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        self.energy.validate()?;
        self.futures.validate()
    }
}

// ── Energy ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    #[serde(default = "default_energy_base_url")]
    pub base_url: String,
    #[serde(default = "default_zones")]
    pub zones: Vec<MarketZone>,
    /// Size of each forward fetch window.
    #[serde(default = "default_window_days")]
    pub chunk_days: u32,
    /// Size of each backward probe window.
    #[serde(default = "default_window_days")]
    pub probe_days: u32,
    /// Probing stops once the probe year is no longer above this.
    #[serde(default = "default_floor_year")]
    pub floor_year: i32,
    /// Start used when no probe found data, in `API_TIME_FORMAT`.
    #[serde(default = "default_fallback_start")]
    pub fallback_start: String,
    #[serde(default = "default_energy_output_dir")]
    pub output_dir: PathBuf,
}

impl EnergyConfig {
    pub fn chunk(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.chunk_days))
    }

    pub fn probe_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.probe_days))
    }

    pub fn fallback_start(&self) -> Result<DateTime<Utc>, DataError> {
        parse_api_time(&self.fallback_start)
    }

    fn validate(&self) -> Result<(), DataError> {
        if self.chunk_days == 0 || self.probe_days == 0 {
            return Err(DataError::Config(
                "energy window sizes must be at least one day".into(),
            ));
        }
        if self.zones.is_empty() {
            return Err(DataError::Config("no market zones configured".into()));
        }
        self.fallback_start()?;
        Ok(())
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            base_url: default_energy_base_url(),
            zones: default_zones(),
            chunk_days: default_window_days(),
            probe_days: default_window_days(),
            floor_year: default_floor_year(),
            fallback_start: default_fallback_start(),
            output_dir: default_energy_output_dir(),
        }
    }
}

/// Parse a `%Y-%m-%dT%H:%MZ` instant.
pub fn parse_api_time(s: &str) -> Result<DateTime<Utc>, DataError> {
    NaiveDateTime::parse_from_str(s, API_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DataError::Config(format!("invalid timestamp '{s}': {e}")))
}

fn default_energy_base_url() -> String {
    "https://api.energy-charts.info".to_string()
}

fn default_zones() -> Vec<MarketZone> {
    vec![
        MarketZone::new("DE-LU", "Germany"),
        MarketZone::new("FR", "France"),
        MarketZone::new("BE", "Belgium"),
    ]
}

fn default_window_days() -> u32 {
    365
}

fn default_floor_year() -> i32 {
    2000
}

fn default_fallback_start() -> String {
    "2008-01-01T00:00Z".to_string()
}

fn default_energy_output_dir() -> PathBuf {
    PathBuf::from("data")
}

// ── Futures ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuturesConfig {
    #[serde(default = "default_futures_base_url")]
    pub base_url: String,
    /// Prefix for relative detail links.
    #[serde(default = "default_site_root")]
    pub site_root: String,
    #[serde(default = "default_total_pages")]
    pub total_pages: u32,
    /// Attempts per listing page (detail pages get exactly one).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pause after every page or detail fetch.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_num_futures_to_fetch")]
    pub num_futures_to_fetch: usize,
    #[serde(default = "default_list_output_dir")]
    pub list_output_dir: PathBuf,
    #[serde(default = "default_detail_output_dir")]
    pub detail_output_dir: PathBuf,
    /// Also write one file pair per instrument next to the combined file.
    #[serde(default = "default_per_instrument_files")]
    pub per_instrument_files: bool,
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
    /// Timezone abbreviation → IANA zone name.
    #[serde(default = "default_timezones")]
    pub timezones: BTreeMap<String, String>,
}

impl FuturesConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// URL of listing page `page` (1-based).
    pub fn page_url(&self, page: u32) -> String {
        if page > 1 {
            format!("{}/{page}", self.base_url.trim_end_matches('/'))
        } else {
            self.base_url.clone()
        }
    }

    fn validate(&self) -> Result<(), DataError> {
        if self.max_attempts == 0 {
            return Err(DataError::Config("max_attempts must be at least 1".into()));
        }
        crate::futures::TimezoneTable::from_names(&self.timezones)?;
        Ok(())
    }
}

impl Default for FuturesConfig {
    fn default() -> Self {
        Self {
            base_url: default_futures_base_url(),
            site_root: default_site_root(),
            total_pages: default_total_pages(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_delay_ms: default_request_delay_ms(),
            num_futures_to_fetch: default_num_futures_to_fetch(),
            list_output_dir: default_list_output_dir(),
            detail_output_dir: default_detail_output_dir(),
            per_instrument_files: default_per_instrument_files(),
            headers: default_headers(),
            timezones: default_timezones(),
        }
    }
}

fn default_futures_base_url() -> String {
    "https://www.marketwatch.com/tools/markets/futures".to_string()
}

fn default_site_root() -> String {
    "https://www.marketwatch.com".to_string()
}

fn default_total_pages() -> u32 {
    35
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_request_delay_ms() -> u64 {
    1_000
}

fn default_num_futures_to_fetch() -> usize {
    5
}

fn default_list_output_dir() -> PathBuf {
    PathBuf::from("marketwatch_futures")
}

fn default_detail_output_dir() -> PathBuf {
    PathBuf::from("marketwatch_futures_details")
}

fn default_per_instrument_files() -> bool {
    true
}

fn default_headers() -> BTreeMap<String, String> {
    [
        (
            "User-Agent",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        ),
        ("Referer", "https://www.google.com/"),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Cache-Control", "max-age=0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_timezones() -> BTreeMap<String, String> {
    [
        ("CEST", "Europe/Berlin"),
        ("CET", "Europe/Berlin"),
        ("EST", "America/New_York"),
        ("EDT", "America/New_York"),
        ("CST", "America/Chicago"),
        ("CDT", "America/Chicago"),
        ("GMT", "GMT"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
