//! The loaded, immutable usage dataset.

use crate::models::UsageRecord;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Usage records loaded once per run and shared read-only by every
/// aggregation.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    records: Vec<UsageRecord>,
}

impl Dataset {
    /// Wraps records read from `source`.
    pub fn new(source: impl Into<PathBuf>, records: Vec<UsageRecord>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    /// Wraps records that did not come from a file.
    #[allow(dead_code)] // Used by tests and library-style callers
    pub fn from_records(records: Vec<UsageRecord>) -> Self {
        Self::new("<memory>", records)
    }

    /// Path the records were loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// All records, in file order.
    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest date, or `None` for an empty dataset.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }
}
