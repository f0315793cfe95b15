use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{DailyMoverRecord, FetchOutcome, RecordStatus, TickerObservation};
use crate::massive::MarketData;
use crate::selector::select_top_mover;
use crate::store::RecordStore;

/// Invocation summary, handed back to the trigger as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub date: NaiveDate,
    pub status: RecordStatus,
    pub symbol: Option<String>,
    #[serde(rename = "percentChange")]
    pub percent_change: Option<f64>,
    #[serde(rename = "closingPrice")]
    pub closing_price: Option<f64>,
    #[serde(rename = "tickersOk")]
    pub tickers_ok: usize,
    #[serde(rename = "tickersFailed")]
    pub tickers_failed: Vec<String>,
}

/// One terminal ingestion pass for `trade_date`.
///
/// Fans out one fetch task per watchlist symbol, selects the top mover
/// over the full observation set and upserts the day's record. The
/// pass succeeds on market-closed and no-data days too; only a store
/// failure fails the invocation.
pub async fn run<M>(
    market: &M,
    store: &RecordStore,
    watchlist: &[String],
    trade_date: NaiveDate,
) -> Result<IngestionReport>
where
    M: MarketData + Clone + Send + Sync + 'static,
{
    info!(%trade_date, tickers = watchlist.len(), "ingest.start");

    let handles: Vec<_> = watchlist
        .iter()
        .map(|symbol| {
            let market = market.clone();
            let symbol = symbol.clone();
            tokio::spawn(async move { market.fetch_daily_change(&symbol, trade_date).await })
        })
        .collect();

    // Collect in watchlist order, not completion order, so the
    // selector tie-break stays deterministic under concurrency.
    let mut observations = Vec::with_capacity(handles.len());
    for (symbol, handle) in watchlist.iter().zip(handles) {
        let obs = match handle.await {
            Ok(obs) => obs,
            // A panicked fetch task degrades to a failed observation
            // for its symbol; siblings are unaffected.
            Err(err) => {
                warn!(symbol = %symbol, error = %err, "ingest.fetch_task_died");
                TickerObservation {
                    symbol: symbol.clone(),
                    outcome: FetchOutcome::Failed,
                }
            }
        };
        observations.push(obs);
    }

    let tickers_ok = observations
        .iter()
        .filter(|o| matches!(o.outcome, FetchOutcome::Ok { .. }))
        .count();
    let tickers_failed: Vec<String> = observations
        .iter()
        .filter(|o| o.outcome == FetchOutcome::Failed)
        .map(|o| o.symbol.clone())
        .collect();
    if !tickers_failed.is_empty() {
        warn!(failed = ?tickers_failed, "ingest.partial_failures");
    }

    let selection = select_top_mover(&observations);
    let record = DailyMoverRecord::from_selection(trade_date, selection);
    store.upsert(record.clone())?;

    info!(
        %trade_date,
        status = ?record.status,
        symbol = record.symbol.as_deref().unwrap_or("-"),
        "ingest.done"
    );

    Ok(IngestionReport {
        date: trade_date,
        status: record.status,
        symbol: record.symbol,
        percent_change: record.percent_change,
        closing_price: record.closing_price,
        tickers_ok,
        tickers_failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::time::Duration;

    /// Canned per-symbol outcomes, with optional per-symbol delays to
    /// shuffle completion order.
    #[derive(Clone, Default)]
    struct StubMarket {
        outcomes: HashMap<String, FetchOutcome>,
        delays_ms: HashMap<String, u64>,
    }

    impl StubMarket {
        fn with(mut self, symbol: &str, outcome: FetchOutcome) -> Self {
            self.outcomes.insert(symbol.into(), outcome);
            self
        }

        fn delayed(mut self, symbol: &str, ms: u64) -> Self {
            self.delays_ms.insert(symbol.into(), ms);
            self
        }
    }

    impl MarketData for StubMarket {
        fn fetch_daily_change(
            &self,
            symbol: &str,
            _trade_date: NaiveDate,
        ) -> impl Future<Output = TickerObservation> + Send {
            let outcome = self
                .outcomes
                .get(symbol)
                .copied()
                .unwrap_or(FetchOutcome::Failed);
            let delay = self.delays_ms.get(symbol).copied().unwrap_or(0);
            let symbol = symbol.to_string();
            async move {
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                TickerObservation { symbol, outcome }
            }
        }
    }

    fn ok(percent_change: f64) -> FetchOutcome {
        FetchOutcome::Ok {
            percent_change,
            price: 100.0,
        }
    }

    fn watchlist(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("movers.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn records_the_top_mover() {
        let market = StubMarket::default()
            .with("AAPL", ok(1.5))
            .with("MSFT", ok(-4.0))
            .with("GOOGL", ok(2.0));
        let (_dir, store) = store();

        let report = run(&market, &store, &watchlist(&["AAPL", "MSFT", "GOOGL"]), day())
            .await
            .unwrap();

        assert_eq!(report.status, RecordStatus::Recorded);
        assert_eq!(report.symbol.as_deref(), Some("MSFT"));
        assert_eq!(report.percent_change, Some(-4.0));
        assert_eq!(report.tickers_ok, 3);
        assert!(report.tickers_failed.is_empty());

        let stored = store.read_range(day(), day()).unwrap();
        assert_eq!(stored[0].symbol.as_deref(), Some("MSFT"));
    }

    #[tokio::test]
    async fn market_closed_day_writes_a_sentinel() {
        let market = StubMarket::default()
            .with("AAPL", FetchOutcome::NoData)
            .with("MSFT", FetchOutcome::NoData)
            .with("GOOGL", FetchOutcome::NoData);
        let (_dir, store) = store();

        let report = run(&market, &store, &watchlist(&["AAPL", "MSFT", "GOOGL"]), day())
            .await
            .unwrap();

        assert_eq!(report.status, RecordStatus::MarketClosed);
        assert_eq!(report.symbol, None);

        let stored = store.read_range(day(), day()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, RecordStatus::MarketClosed);
        assert_eq!(stored[0].symbol, None);
    }

    #[tokio::test]
    async fn all_failures_write_the_no_data_sentinel() {
        let market = StubMarket::default()
            .with("AAPL", FetchOutcome::Failed)
            .with("MSFT", FetchOutcome::Failed)
            .with("GOOGL", FetchOutcome::Failed);
        let (_dir, store) = store();

        let report = run(&market, &store, &watchlist(&["AAPL", "MSFT", "GOOGL"]), day())
            .await
            .unwrap();

        assert_eq!(report.status, RecordStatus::NoData);
        assert_eq!(report.tickers_failed, vec!["AAPL", "MSFT", "GOOGL"]);

        let stored = store.read_range(day(), day()).unwrap();
        assert_eq!(stored[0].status, RecordStatus::NoData);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_rest() {
        let market = StubMarket::default()
            .with("AAPL", FetchOutcome::Failed)
            .with("MSFT", ok(0.4));
        let (_dir, store) = store();

        let report = run(&market, &store, &watchlist(&["AAPL", "MSFT"]), day())
            .await
            .unwrap();

        assert_eq!(report.status, RecordStatus::Recorded);
        assert_eq!(report.symbol.as_deref(), Some("MSFT"));
        assert_eq!(report.tickers_ok, 1);
        assert_eq!(report.tickers_failed, vec!["AAPL"]);
    }

    #[tokio::test]
    async fn tie_break_follows_watchlist_order_not_completion_order() {
        // AAPL finishes last but sits first in the watchlist; on equal
        // magnitude it must still win.
        let market = StubMarket::default()
            .with("AAPL", ok(5.0))
            .delayed("AAPL", 50)
            .with("MSFT", ok(-5.0));
        let (_dir, store) = store();

        let report = run(&market, &store, &watchlist(&["AAPL", "MSFT"]), day())
            .await
            .unwrap();

        assert_eq!(report.symbol.as_deref(), Some("AAPL"));
        assert_eq!(report.percent_change, Some(5.0));
    }

    #[tokio::test]
    async fn rerun_replaces_the_days_record() {
        let symbols = watchlist(&["AAPL", "MSFT"]);
        let (_dir, store) = store();

        let first = StubMarket::default()
            .with("AAPL", FetchOutcome::Failed)
            .with("MSFT", FetchOutcome::Failed);
        run(&first, &store, &symbols, day()).await.unwrap();

        // Manual retry after the provider recovered.
        let second = StubMarket::default()
            .with("AAPL", ok(1.0))
            .with("MSFT", ok(3.0));
        run(&second, &store, &symbols, day()).await.unwrap();

        let stored = store.read_range(day(), day()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, RecordStatus::Recorded);
        assert_eq!(stored[0].symbol.as_deref(), Some("MSFT"));
    }
}
