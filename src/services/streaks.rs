use crate::config::Config;
use crate::models::{QuestStats, WorkoutRecord};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Lifetime XP, current-week XP, and the consecutive perfect-day streak
/// ending at `as_of`. Pure over the history snapshot; empty history yields
/// all zeros.
pub fn compute_stats(config: &Config, history: &[WorkoutRecord], as_of: NaiveDate) -> QuestStats {
    let lifetime_xp = history.iter().map(|r| r.xp).sum();

    let week_start = start_of_week(as_of);
    let weekly_xp = history
        .iter()
        .filter(|r| r.day() >= week_start)
        .map(|r| r.xp)
        .sum();

    let perfect = perfect_days(config, history);
    let mut streak = 0u32;
    let mut day = as_of;
    while perfect.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }

    QuestStats {
        lifetime_xp,
        weekly_xp,
        streak,
    }
}

/// Most recent Monday at midnight relative to `as_of`; `as_of` itself when
/// it is a Monday.
pub fn start_of_week(as_of: NaiveDate) -> NaiveDate {
    as_of - Days::new(as_of.weekday().num_days_from_monday() as u64)
}

/// The set of calendar days that count as perfect. A day qualifies when any
/// of its records carries an explicit success, or the union of completions
/// logged that day covers every tracked task (how legacy one-row-per-
/// exercise history earns streaks). Multiple records per day collapse into
/// one day.
pub(crate) fn perfect_days(config: &Config, history: &[WorkoutRecord]) -> BTreeSet<NaiveDate> {
    let total_tasks = config.catalog.len();
    let mut by_day: BTreeMap<NaiveDate, (bool, BTreeSet<&str>)> = BTreeMap::new();

    for record in history {
        let entry = by_day.entry(record.day()).or_default();
        entry.0 |= record.success;
        for (task, &done) in &record.completion {
            if done {
                entry.1.insert(task.as_str());
            }
        }
    }

    by_day
        .into_iter()
        .filter(|(_, (success, done))| *success || (total_tasks > 0 && done.len() >= total_tasks))
        .map(|(day, _)| day)
        .collect()
}
