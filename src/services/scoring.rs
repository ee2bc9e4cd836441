use crate::config::Config;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// XP for one day's task completions. Pure and deterministic: the sum of
/// each completed task's catalog value, plus the weekend bonus when the
/// bonus task is completed on the bonus weekday. Zero completions score 0;
/// the result is never negative.
pub fn compute_xp(config: &Config, completion: &BTreeMap<String, bool>, date: NaiveDate) -> i64 {
    let base: i64 = config
        .catalog
        .iter()
        .filter(|e| completion.get(&e.name).copied().unwrap_or(false))
        .map(|e| e.xp)
        .sum();

    let bonus = &config.bonus;
    let bonus_xp = if date.weekday() == bonus.weekday()
        && completion.get(&bonus.task).copied().unwrap_or(false)
    {
        bonus.xp
    } else {
        0
    };

    base + bonus_xp
}
