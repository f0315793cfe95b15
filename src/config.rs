use anyhow::{anyhow, Result};

pub const DEFAULT_WATCHLIST: &str = "AAPL,MSFT,GOOGL,AMZN,TSLA,NVDA";

#[derive(Clone)]
pub struct Config {
    // Provider
    pub massive_base_url: String,
    pub massive_api_key: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,

    // Watchlist (fixed at startup; order is fetch + tie-break order)
    pub watchlist: Vec<String>,

    // Runtime
    pub tz: String,

    // Persistence
    pub store_path: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|x| x.parse().ok())
}

/// Comma-separated symbols, trimmed and uppercased, empties dropped.
pub fn parse_watchlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Provider
        let massive_api_key =
            std::env::var("MASSIVE_API_KEY").map_err(|_| anyhow!("MASSIVE_API_KEY is required"))?;
        let massive_base_url = std::env::var("MASSIVE_BASE_URL")
            .unwrap_or_else(|_| "https://api.massive.com/v1".to_string());

        let request_timeout_secs = env_parse::<u64>("MOVERS_REQUEST_TIMEOUT_SECS").unwrap_or(10);
        if request_timeout_secs == 0 {
            return Err(anyhow!("MOVERS_REQUEST_TIMEOUT_SECS must be > 0"));
        }
        let max_retries = env_parse::<u32>("MOVERS_MAX_RETRIES").unwrap_or(2);
        let retry_delay_ms = env_parse::<u64>("MOVERS_RETRY_DELAY_MS").unwrap_or(1000);

        // Watchlist
        let watchlist = parse_watchlist(
            &std::env::var("MOVERS_WATCHLIST").unwrap_or_else(|_| DEFAULT_WATCHLIST.to_string()),
        );
        if watchlist.is_empty() {
            return Err(anyhow!("MOVERS_WATCHLIST resolved to an empty list"));
        }

        // Runtime
        let tz = std::env::var("MOVERS_TZ").unwrap_or_else(|_| "America/New_York".to_string());

        // Persistence
        let store_path =
            std::env::var("MOVERS_STORE_PATH").unwrap_or_else(|_| "./movers.json".to_string());

        Ok(Self {
            massive_base_url,
            massive_api_key,
            request_timeout_secs,
            max_retries,
            retry_delay_ms,
            watchlist,
            tz,
            store_path,
        })
    }
}

// Manual Debug so the API key never lands in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("massive_base_url", &self.massive_base_url)
            .field("massive_api_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("watchlist", &self.watchlist)
            .field("tz", &self.tz)
            .field("store_path", &self.store_path)
            .finish()
    }
}
