use crate::domain::{FetchOutcome, SelectionResult, TickerObservation};

/// Picks the biggest absolute daily mover among the `ok` observations.
///
/// Ties keep the earlier observation, so the result is stable as long
/// as callers pass observations in watchlist order. With zero `ok`
/// observations the day is either a non-trading day (every symbol
/// reported no-data) or unreliable (at least one fetch failed) — the
/// two are never conflated.
pub fn select_top_mover(observations: &[TickerObservation]) -> SelectionResult {
    let mut winner: Option<(&str, f64, f64)> = None;
    let mut any_failed = false;

    for obs in observations {
        match obs.outcome {
            FetchOutcome::Ok {
                percent_change,
                price,
            } => {
                // Strict > keeps the first-seen symbol on equal magnitude.
                let beats = winner.map_or(true, |(_, top, _)| percent_change.abs() > top.abs());
                if beats {
                    winner = Some((&obs.symbol, percent_change, price));
                }
            }
            FetchOutcome::NoData => {}
            FetchOutcome::Failed => any_failed = true,
        }
    }

    match winner {
        Some((symbol, percent_change, price)) => SelectionResult::Recorded {
            symbol: symbol.to_string(),
            percent_change,
            price,
        },
        None if any_failed => SelectionResult::NoData,
        None => SelectionResult::MarketClosed,
    }
}
