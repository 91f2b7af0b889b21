//! Futures listing and detail records.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Placeholder for any field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// One row of the futures listing table.
///
/// Field order matters: the derived `Ord` sorts by page, then name, then the
/// remaining columns, which is the order the listing is written in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FuturesListing {
    #[serde(rename = "Page")]
    pub page: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Exchange")]
    pub exchange: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Sector")]
    pub sector: String,
}

/// The fixed schema of a futures detail record, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    FuturesName,
    Ticker,
    Price,
    ChangePoints,
    ChangePercent,
    OpenPrice,
    OpenInterest,
    SettlementPrice,
    DayRange,
    WeekRange52,
    Volume,
    AvgVolume65Day,
    LastUpdated,
    Performance5Day,
    Performance1Month,
    Performance3Month,
    PerformanceYtd,
    Performance1Year,
}

impl DetailField {
    pub const COUNT: usize = 18;

    pub const ALL: [DetailField; Self::COUNT] = [
        DetailField::FuturesName,
        DetailField::Ticker,
        DetailField::Price,
        DetailField::ChangePoints,
        DetailField::ChangePercent,
        DetailField::OpenPrice,
        DetailField::OpenInterest,
        DetailField::SettlementPrice,
        DetailField::DayRange,
        DetailField::WeekRange52,
        DetailField::Volume,
        DetailField::AvgVolume65Day,
        DetailField::LastUpdated,
        DetailField::Performance5Day,
        DetailField::Performance1Month,
        DetailField::Performance3Month,
        DetailField::PerformanceYtd,
        DetailField::Performance1Year,
    ];

    /// Column label used in every output format.
    pub fn label(self) -> &'static str {
        match self {
            DetailField::FuturesName => "Futures Name",
            DetailField::Ticker => "Ticker",
            DetailField::Price => "Price",
            DetailField::ChangePoints => "Change (€)",
            DetailField::ChangePercent => "Change (%)",
            DetailField::OpenPrice => "Open Price",
            DetailField::OpenInterest => "Open Interest",
            DetailField::SettlementPrice => "Settlement Price",
            DetailField::DayRange => "Day Range",
            DetailField::WeekRange52 => "52-Week Range",
            DetailField::Volume => "Volume",
            DetailField::AvgVolume65Day => "65-Day Avg Volume",
            DetailField::LastUpdated => "Last Updated",
            DetailField::Performance5Day => "Performance 5 Day",
            DetailField::Performance1Month => "Performance 1 Month",
            DetailField::Performance3Month => "Performance 3 Month",
            DetailField::PerformanceYtd => "Performance YTD",
            DetailField::Performance1Year => "Performance 1 Year",
        }
    }

    /// Map a performance-table period label ("5 Day", "YTD", ...) to its field.
    pub fn from_performance_period(period: &str) -> Option<Self> {
        match period {
            "5 Day" => Some(DetailField::Performance5Day),
            "1 Month" => Some(DetailField::Performance1Month),
            "3 Month" => Some(DetailField::Performance3Month),
            "YTD" => Some(DetailField::PerformanceYtd),
            "1 Year" => Some(DetailField::Performance1Year),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Flat label → value record scraped from one detail page.
///
/// Every field is always present; unextracted fields hold [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuturesDetail {
    values: [String; DetailField::COUNT],
}

impl FuturesDetail {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| NOT_AVAILABLE.to_string()),
        }
    }

    pub fn get(&self, field: DetailField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: DetailField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// Look a value up by its column label.
    pub fn by_label(&self, label: &str) -> Option<&str> {
        DetailField::ALL
            .iter()
            .find(|f| f.label() == label)
            .map(|f| self.get(*f))
    }

    /// `(label, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        DetailField::ALL
            .iter()
            .map(move |f| (f.label(), self.get(*f)))
    }

    /// Number of fields that were actually extracted.
    pub fn extracted_count(&self) -> usize {
        self.values.iter().filter(|v| *v != NOT_AVAILABLE).count()
    }
}

impl Default for FuturesDetail {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for FuturesDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FuturesDetail", DetailField::COUNT)?;
        for (label, value) in self.iter() {
            state.serialize_field(label, value)?;
        }
        state.end()
    }
}
