mod config;
mod domain;
mod ingest;
mod massive;
mod monitoring;
mod query;
mod selector;
mod store;
mod time;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::massive::MassiveClient;
use crate::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load local .env if present (no-op in prod/systemd envs)
    let _ = dotenvy::dotenv();

    monitoring::init_tracing();

    let cfg = config::Config::from_env()?;
    info!(?cfg, "boot");

    let store = RecordStore::new(&cfg.store_path);
    let trade_date = time::trade_date(&cfg.tz)?;

    match std::env::args().nth(1).as_deref() {
        // Daily scheduler trigger: one ingestion pass for today.
        Some("ingest") => {
            let client = MassiveClient::new(&cfg)?;
            let report = ingest::run(&client, &store, &cfg.watchlist, trade_date).await?;
            println!("{}", serde_json::to_string(&report)?);
        }
        // Read path: trailing 7-day window for the HTTP front door.
        Some("query") => {
            let movers = query::recent_movers(&store, trade_date)?;
            println!("{}", serde_json::to_string(&movers)?);
        }
        other => {
            return Err(anyhow!(
                "usage: stocks-movers <ingest|query> (got {:?})",
                other.unwrap_or("nothing")
            ));
        }
    }

    Ok(())
}
