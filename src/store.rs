use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::domain::DailyMoverRecord;

/// Date-keyed record store over a JSON file.
///
/// One record per calendar day. Load and save always move the whole
/// map, so an upsert for a date is a full-record replace and two runs
/// for the same date can never produce duplicates.
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Result<BTreeMap<NaiveDate, DailyMoverRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read record store {}", self.path.display()))?;
        // A corrupt store is an error, not an empty history: the query
        // path must be able to tell "no data yet" from a broken store.
        serde_json::from_str(&raw)
            .with_context(|| format!("parse record store {}", self.path.display()))
    }

    fn save(&self, records: &BTreeMap<NaiveDate, DailyMoverRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("write record store {}", self.path.display()))
    }

    /// Insert-or-replace the record for its date.
    pub fn upsert(&self, record: DailyMoverRecord) -> Result<()> {
        let mut records = self.load()?;
        records.insert(record.date, record);
        self.save(&records)
    }

    /// All records with `from <= date <= to`, ascending by date.
    pub fn read_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyMoverRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        let records = self.load()?;
        Ok(records.range(from..=to).map(|(_, r)| r.clone()).collect())
    }
}
