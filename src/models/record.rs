use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Column names, stable across reads and writes.
pub const COL_DATE: &str = "Date";
pub const COL_SUCCESS: &str = "Success";
pub const COL_XP: &str = "XP";
/// Legacy single-event schema marker (one row per logged exercise).
pub const COL_EXERCISE: &str = "Exercise";

/// Timestamp format written to the store.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A row exactly as the store returned it, keyed by column name. No typing
/// or validation happens here; that is the validator's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub values: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.values.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.as_str())
    }
}

/// One validated log entry: a calendar day's checklist state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// One entry per tracked task.
    pub completion: BTreeMap<String, bool>,
    /// True iff every tracked task was completed.
    pub success: bool,
    pub xp: i64,
}

impl WorkoutRecord {
    /// Calendar day this record belongs to; day-level aggregation ignores
    /// the time component.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Serializes back into the checklist row schema.
    pub fn to_raw(&self) -> RawRecord {
        let mut row = RawRecord::new();
        row.set(COL_DATE, self.timestamp.format(DATE_FORMAT).to_string());
        for (task, &done) in &self.completion {
            row.set(task, if done { "true" } else { "false" });
        }
        row.set(COL_SUCCESS, if self.success { "true" } else { "false" });
        row.set(COL_XP, self.xp.to_string());
        row
    }
}
