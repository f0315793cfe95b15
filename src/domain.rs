use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What one provider fetch produced for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchOutcome {
    Ok { percent_change: f64, price: f64 },
    /// Provider answered with no bar for the day (non-trading day).
    NoData,
    /// Transport error, timeout, rate limit or malformed payload.
    Failed,
}

/// Per-symbol fetch result for a single invocation. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerObservation {
    pub symbol: String,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionResult {
    Recorded {
        symbol: String,
        percent_change: f64,
        price: f64,
    },
    MarketClosed,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    Recorded,
    MarketClosed,
    NoData,
}

/// One aggregate row per calendar day: either fully populated
/// (`recorded`) or a sentinel with no symbol/percent change.
///
/// Field names are the wire contract; the frontend matches on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMoverRecord {
    pub date: NaiveDate,
    pub symbol: Option<String>,
    #[serde(rename = "percentChange")]
    pub percent_change: Option<f64>,
    pub status: RecordStatus,
    #[serde(rename = "closingPrice")]
    pub closing_price: Option<f64>,
    #[serde(rename = "ingestedAt")]
    pub ingested_at: DateTime<Utc>,
}

impl DailyMoverRecord {
    pub fn recorded(date: NaiveDate, symbol: String, percent_change: f64, price: f64) -> Self {
        Self {
            date,
            symbol: Some(symbol),
            percent_change: Some(percent_change),
            status: RecordStatus::Recorded,
            closing_price: Some(price),
            ingested_at: Utc::now(),
        }
    }

    pub fn market_closed(date: NaiveDate) -> Self {
        Self::sentinel(date, RecordStatus::MarketClosed)
    }

    pub fn no_data(date: NaiveDate) -> Self {
        Self::sentinel(date, RecordStatus::NoData)
    }

    fn sentinel(date: NaiveDate, status: RecordStatus) -> Self {
        Self {
            date,
            symbol: None,
            percent_change: None,
            status,
            closing_price: None,
            ingested_at: Utc::now(),
        }
    }

    pub fn from_selection(date: NaiveDate, selection: SelectionResult) -> Self {
        match selection {
            SelectionResult::Recorded {
                symbol,
                percent_change,
                price,
            } => Self::recorded(date, symbol, percent_change, price),
            SelectionResult::MarketClosed => Self::market_closed(date),
            SelectionResult::NoData => Self::no_data(date),
        }
    }
}
