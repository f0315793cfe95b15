use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{FetchOutcome, TickerObservation};

/// Per-symbol price source. The orchestrator only ever sees this seam,
/// so tests can substitute a canned implementation.
pub trait MarketData {
    /// Never fails: every failure mode is folded into the returned
    /// observation's outcome, which is what lets one symbol's outage
    /// leave the rest of the watchlist untouched.
    fn fetch_daily_change(
        &self,
        symbol: &str,
        trade_date: NaiveDate,
    ) -> impl Future<Output = TickerObservation> + Send;
}

/// Massive daily-aggregates API client.
#[derive(Clone)]
pub struct MassiveClient {
    base_url: String,
    api_key: String,
    max_retries: u32,
    retry_delay: Duration,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    results: Vec<DailyBar>,
}

/// One daily aggregate bar. Massive has been seen emitting both lower-
/// and upper-case field keys.
#[derive(Debug, Clone, Copy, Deserialize)]
struct DailyBar {
    #[serde(default, alias = "O")]
    o: Option<f64>,
    #[serde(default, alias = "C")]
    c: Option<f64>,
}

impl DailyBar {
    /// `(open-to-close change in percent, closing price)`, or None for
    /// an unusable bar (missing fields, zero open).
    fn daily_change(&self) -> Option<(f64, f64)> {
        let (open, close) = (self.o?, self.c?);
        if open == 0.0 {
            return None;
        }
        Some(((close - open) / open * 100.0, close))
    }
}

impl MassiveClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: cfg.massive_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.massive_api_key.clone(),
            max_retries: cfg.max_retries,
            retry_delay: Duration::from_millis(cfg.retry_delay_ms),
            http,
        })
    }

    /// One bar for one symbol on one day. `Ok(None)` is the provider's
    /// market-closed signal (empty results array).
    ///
    /// Transient failures (429, 5xx, timeout) are retried up to
    /// `max_retries` extra times; everything else gives up immediately.
    async fn daily_bar(&self, symbol: &str, trade_date: NaiveDate) -> Result<Option<DailyBar>> {
        let url = format!(
            "{}/aggs/ticker/{}/range/1/day/{}/{}",
            self.base_url, symbol, trade_date, trade_date
        );

        for attempt in 1..=self.max_retries + 1 {
            let resp = match self.http.get(&url).bearer_auth(&self.api_key).send().await {
                Ok(resp) => resp,
                Err(err) if err.is_timeout() => {
                    warn!(symbol, attempt, "massive.timeout");
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
                Err(err) => return Err(err).context("massive request"),
            };

            match resp.status() {
                StatusCode::OK => {
                    let body: AggsResponse =
                        resp.json().await.context("massive response body")?;
                    return Ok(body.results.into_iter().next());
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let wait = self.retry_delay * 2u32.pow(attempt - 1);
                    warn!(symbol, attempt, wait_ms = wait.as_millis() as u64, "massive.rate_limited");
                    tokio::time::sleep(wait).await;
                }
                status if status.is_server_error() => {
                    warn!(symbol, attempt, %status, "massive.server_error");
                    tokio::time::sleep(self.retry_delay).await;
                }
                status => {
                    return Err(anyhow!("massive returned {status} for {symbol}"));
                }
            }
        }

        Err(anyhow!(
            "massive: {symbol}: all {} attempts failed",
            self.max_retries + 1
        ))
    }
}

impl MarketData for MassiveClient {
    fn fetch_daily_change(
        &self,
        symbol: &str,
        trade_date: NaiveDate,
    ) -> impl Future<Output = TickerObservation> + Send {
        async move {
            let outcome = match self.daily_bar(symbol, trade_date).await {
                Ok(Some(bar)) => match bar.daily_change() {
                    Some((percent_change, price)) => {
                        info!(symbol, percent_change, price, "massive.ok");
                        FetchOutcome::Ok {
                            percent_change,
                            price,
                        }
                    }
                    None => {
                        warn!(symbol, ?bar, "massive.malformed_bar");
                        FetchOutcome::Failed
                    }
                },
                Ok(None) => {
                    info!(symbol, %trade_date, "massive.no_data");
                    FetchOutcome::NoData
                }
                Err(err) => {
                    warn!(symbol, error = %err, "massive.fetch_failed");
                    FetchOutcome::Failed
                }
            };
            TickerObservation {
                symbol: symbol.to_string(),
                outcome,
            }
        }
    }
}
