use anyhow::{anyhow, Result};
use chrono::NaiveDate;

/// Today's calendar date in the given timezone.
///
/// The scheduler fires after market close, so "today" in the exchange
/// timezone is the trading day being recorded.
pub fn trade_date(tz: &str) -> Result<NaiveDate> {
    let tz: chrono_tz::Tz = tz.parse().map_err(|_| anyhow!("invalid tz: {tz}"))?;
    Ok(chrono::Utc::now().with_timezone(&tz).date_naive())
}
