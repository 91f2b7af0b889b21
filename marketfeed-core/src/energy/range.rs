//! Backward probe for the earliest date a zone has price data.

use super::api::PriceSource;
use crate::config::{EnergyConfig, API_TIME_FORMAT};
use crate::error::DataError;
use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{debug, info};

/// Where the start date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOrigin {
    Probed,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarliestData {
    pub start: DateTime<Utc>,
    pub origin: StartOrigin,
    /// Number of probe requests issued.
    pub probes: u32,
}

pub struct RangeFinder<'a> {
    source: &'a dyn PriceSource,
    window: Duration,
    floor_year: i32,
    fallback: DateTime<Utc>,
}

impl<'a> RangeFinder<'a> {
    pub fn new(source: &'a dyn PriceSource, config: &EnergyConfig) -> Result<Self, DataError> {
        Ok(Self {
            source,
            window: config.probe_window(),
            floor_year: config.floor_year,
            fallback: config.fallback_start()?,
        })
    }

    /// Walk back from `now` one window at a time until a window is empty.
    ///
    /// Fetch errors end the search just like an empty window does.
    pub fn find_earliest(&self, zone: &str, now: DateTime<Utc>) -> EarliestData {
        let mut probe = midnight(now);
        let mut earliest = None;
        let mut probes = 0;

        while probe.year() > self.floor_year {
            let window_start = midnight(probe - self.window);
            probes += 1;

            match self.source.fetch_window(zone, window_start, probe) {
                Ok(samples) if !samples.is_empty() => {
                    debug!(
                        zone,
                        from = %window_start.format(API_TIME_FORMAT),
                        "data available, continuing search for earlier data"
                    );
                    earliest = Some(window_start);
                    probe = window_start;
                }
                Ok(_) => break,
                Err(e) => {
                    debug!(zone, error = %e, "probe returned no data");
                    break;
                }
            }
        }

        match earliest {
            Some(start) => {
                info!(
                    zone,
                    start = %start.format(API_TIME_FORMAT),
                    "earliest confirmed data"
                );
                EarliestData {
                    start,
                    origin: StartOrigin::Probed,
                    probes,
                }
            }
            None => {
                info!(
                    zone,
                    fallback = %self.fallback.format(API_TIME_FORMAT),
                    "no data found, using fallback start"
                );
                EarliestData {
                    start: self.fallback,
                    origin: StartOrigin::Fallback,
                    probes,
                }
            }
        }
    }
}

fn midnight(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_api_time;
    use crate::domain::PriceSample;
    use std::sync::Mutex;

    /// Serves one sample per window overlapping `[first_data, ∞)`.
    struct DataSince {
        first_data: Option<DateTime<Utc>>,
        calls: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
    }

    impl DataSince {
        fn new(first_data: Option<&str>) -> Self {
            Self {
                first_data: first_data.map(|s| parse_api_time(s).unwrap()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PriceSource for DataSince {
        fn fetch_window(
            &self,
            _zone: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PriceSample>, DataError> {
            self.calls.lock().unwrap().push((start, end));
            match self.first_data {
                Some(first) if end > first => Ok(vec![PriceSample {
                    unix_seconds: start.max(first).timestamp(),
                    price: Some(50.0),
                }]),
                _ => Err(DataError::MissingData("nothing".into())),
            }
        }
    }

    fn now() -> DateTime<Utc> {
        parse_api_time("2025-01-01T12:34Z").unwrap()
    }

    #[test]
    fn finds_window_aligned_start_for_data_since_2015() {
        let source = DataSince::new(Some("2015-01-01T00:00Z"));
        let finder = RangeFinder::new(&source, &EnergyConfig::default()).unwrap();

        let found = finder.find_earliest("DE-LU", now());
        let first = parse_api_time("2015-01-01T00:00Z").unwrap();

        assert_eq!(found.origin, StartOrigin::Probed);
        assert!(found.start <= first);
        assert!(found.start + Duration::days(365) > first);
        assert_eq!(found.start, midnight(found.start));
    }

    #[test]
    fn falls_back_when_zone_never_had_data() {
        let source = DataSince::new(None);
        let finder = RangeFinder::new(&source, &EnergyConfig::default()).unwrap();

        let found = finder.find_earliest("XX", now());

        assert_eq!(found.origin, StartOrigin::Fallback);
        assert_eq!(
            found.start.format(API_TIME_FORMAT).to_string(),
            "2008-01-01T00:00Z"
        );
        assert_eq!(found.probes, 1);
    }

    #[test]
    fn stops_at_floor_year_when_data_never_runs_out() {
        let source = DataSince::new(Some("1900-01-01T00:00Z"));
        let finder = RangeFinder::new(&source, &EnergyConfig::default()).unwrap();

        let found = finder.find_earliest("DE-LU", now());

        assert_eq!(found.origin, StartOrigin::Probed);
        assert!(found.start.year() <= 2000);
        assert!(found.start.year() >= 1999);
        assert_eq!(found.probes as usize, source.calls.lock().unwrap().len());
    }

    #[test]
    fn probes_are_contiguous_and_end_at_now() {
        let source = DataSince::new(Some("2022-06-01T00:00Z"));
        let finder = RangeFinder::new(&source, &EnergyConfig::default()).unwrap();
        finder.find_earliest("FR", now());

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls[0].1, midnight(now()));
        for pair in calls.windows(2) {
            assert_eq!(pair[1].1, pair[0].0);
        }
    }
}
