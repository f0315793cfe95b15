use anyhow::Result;
use chrono::{Days, NaiveDate};

use crate::domain::DailyMoverRecord;
use crate::store::RecordStore;

/// Window served to the frontend, in calendar days, today inclusive.
pub const WINDOW_DAYS: u64 = 7;

/// Records for the trailing week, ascending by date.
///
/// Days with no record are simply absent from the result; the
/// frontend renders gaps as gaps. A store failure propagates instead
/// of masquerading as an empty history.
pub fn recent_movers(store: &RecordStore, today: NaiveDate) -> Result<Vec<DailyMoverRecord>> {
    let from = today
        .checked_sub_days(Days::new(WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);
    store.read_range(from, today)
}
