use crate::config::Config;
use crate::models::{RawRecord, WorkoutRecord, COL_DATE, COL_EXERCISE, COL_SUCCESS, COL_XP};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Normalizes raw store rows into typed records. Never fails the pipeline:
/// missing columns get neutral defaults, unparsable XP coerces to 0, and a
/// row without a usable date is dropped with a warning. The output is
/// always a valid (possibly empty) sequence sorted by timestamp.
pub fn normalize_history(config: &Config, rows: &[RawRecord]) -> Vec<WorkoutRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match normalize_row(config, row) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} malformed rows from history", dropped);
    }

    records.sort_by_key(|r| r.timestamp);
    records
}

fn normalize_row(config: &Config, row: &RawRecord) -> Option<WorkoutRecord> {
    let timestamp = parse_timestamp(row.get(COL_DATE).unwrap_or(""))?;

    let mut completion = config.empty_completion();

    if let Some(exercise) = row.get(COL_EXERCISE) {
        // Legacy single-event row: one logged exercise per row. The old
        // sheet labels carry the target, e.g. "Pushups (20 reps)", so match
        // on the task-name prefix.
        let label = exercise.trim();
        let matched = config
            .task_names()
            .find(|name| label.starts_with(*name))
            .map(str::to_string);
        if let Some(task) = matched {
            completion.insert(task, true);
        } else if !label.is_empty() {
            tracing::debug!("Ignoring unknown exercise label: {}", label);
        }
    } else {
        for exercise in &config.catalog {
            if let Some(value) = row.get(&exercise.name) {
                completion.insert(exercise.name.clone(), parse_bool(value));
            }
        }
    }

    let success = match row.get(COL_SUCCESS) {
        Some(value) if !value.trim().is_empty() => parse_bool(value),
        _ => !completion.is_empty() && completion.values().all(|&done| done),
    };

    let xp = row.get(COL_XP).map(parse_xp).unwrap_or(0);

    Some(WorkoutRecord {
        id: Uuid::new_v4(),
        timestamp,
        completion,
        success,
        xp,
    })
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "x"
    )
}

fn parse_xp(value: &str) -> i64 {
    let value = value.trim();
    let parsed = value
        .parse::<i64>()
        .ok()
        // Sheet exports sometimes render integers as floats ("15.0").
        .or_else(|| value.parse::<f64>().ok().map(|f| f as i64))
        .unwrap_or(0);
    parsed.max(0)
}
