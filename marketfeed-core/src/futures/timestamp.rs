//! "Last updated" normalisation.
//!
//! Detail pages stamp quotes like `Mar 3, 2025 10:15 a.m. EST`: a local wall
//! clock time followed by a timezone abbreviation. The abbreviation is mapped
//! to a full zone, the time localised, then converted to UTC.

use crate::domain::NOT_AVAILABLE;
use crate::error::DataError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::{BTreeMap, HashMap};
use tracing::error;

const LOCAL_FORMAT: &str = "%b %d, %Y %I:%M %p";
const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Abbreviation → zone lookup. Unknown abbreviations resolve to UTC.
#[derive(Debug, Clone)]
pub struct TimezoneTable {
    zones: HashMap<String, Tz>,
}

impl TimezoneTable {
    /// Build from abbreviation → IANA name pairs, rejecting unknown names.
    pub fn from_names(names: &BTreeMap<String, String>) -> Result<Self, DataError> {
        let zones = names
            .iter()
            .map(|(abbr, name)| {
                name.parse::<Tz>()
                    .map(|tz| (abbr.clone(), tz))
                    .map_err(|e| DataError::Config(format!("timezone '{name}' for {abbr}: {e}")))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { zones })
    }

    pub fn resolve(&self, abbreviation: &str) -> Tz {
        self.zones.get(abbreviation).copied().unwrap_or(Tz::UTC)
    }
}

/// Parse a localized, abbreviation-suffixed timestamp into UTC.
pub fn parse_localized(raw: &str, table: &TimezoneTable) -> Result<DateTime<Utc>, DataError> {
    let mut parts: Vec<&str> = raw.split_whitespace().collect();
    let abbreviation = parts
        .pop()
        .ok_or_else(|| DataError::Parse("empty timestamp".into()))?;

    let wall_clock = parts
        .iter()
        .map(|part| match *part {
            "a.m." => "AM",
            "p.m." => "PM",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ");

    let naive = NaiveDateTime::parse_from_str(&wall_clock, LOCAL_FORMAT)
        .map_err(|e| DataError::Parse(format!("'{raw}': {e}")))?;

    let tz = table.resolve(abbreviation);
    // Ambiguous fall-back times resolve to the standard-time reading, which
    // is the later instant.
    let local = tz
        .from_local_datetime(&naive)
        .latest()
        .ok_or_else(|| DataError::Parse(format!("'{raw}' does not exist in {tz}")))?;

    Ok(local.with_timezone(&Utc))
}

/// Normalise to `YYYY-MM-DDTHH:MM:SS.ffffffZ`, or the sentinel.
///
/// Empty and already-sentinel input maps to the sentinel quietly; anything
/// unparseable is logged.
pub fn normalize_to_utc(raw: &str, table: &TimezoneTable) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains(NOT_AVAILABLE) {
        return NOT_AVAILABLE.to_string();
    }

    match parse_localized(raw, table) {
        Ok(utc) => utc.format(UTC_FORMAT).to_string(),
        Err(e) => {
            error!(timestamp = raw, error = %e, "failed to parse timestamp");
            NOT_AVAILABLE.to_string()
        }
    }
}
