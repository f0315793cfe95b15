use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default
/// `info` filter; `MOVERS_LOG_JSON=1` switches to JSON lines for log
/// shippers.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = matches!(
        std::env::var("MOVERS_LOG_JSON").ok().as_deref(),
        Some("1") | Some("true")
    );
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
