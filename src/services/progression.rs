use super::streaks::perfect_days;
use crate::config::Config;
use crate::models::{TargetSet, WorkoutRecord};

/// Distinct perfect calendar days in the history.
pub fn perfect_day_count(config: &Config, history: &[WorkoutRecord]) -> u32 {
    perfect_days(config, history).len() as u32
}

/// Currently active difficulty targets. Recomputed from scratch on every
/// read: base targets from the catalog, plus one increment per earned level,
/// cycling through the configured task subset in order. Idempotent and
/// reproducible from history alone.
pub fn compute_targets(config: &Config, history: &[WorkoutRecord]) -> TargetSet {
    let mut targets = config.base_targets();

    let period = config.progression.days_per_level.max(1);
    let levels = perfect_day_count(config, history) / period;

    let cycle = &config.progression.cycle;
    if cycle.is_empty() {
        return targets;
    }

    for level in 0..levels {
        let task = &cycle[level as usize % cycle.len()];
        if let Some(exercise) = config.exercise(task) {
            if let Some(target) = targets.get_mut(task) {
                *target += exercise.step;
            }
        }
    }

    targets
}

/// Perfect days remaining until the next progression step lands.
pub fn days_to_next_level(config: &Config, history: &[WorkoutRecord]) -> u32 {
    let period = config.progression.days_per_level.max(1);
    period - (perfect_day_count(config, history) % period)
}
