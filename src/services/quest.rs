use crate::config::Config;
use crate::error::Result;
use crate::models::{QuestSnapshot, RawRecord, WorkoutRecord, COL_DATE};
use crate::services::{progression, scoring, streaks, validator};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// XP per display level on the dashboard progress bar.
pub const XP_PER_LEVEL: i64 = 100;

/// Orchestrates the validator and the scoring, streak, and progression
/// engines over a record store. All derived values are recomputed from a
/// fresh history snapshot on every read; the only mutation point is the
/// single append/replace a submission produces.
pub struct QuestService<S: RecordStore> {
    store: S,
    config: Config,
}

impl<S: RecordStore> QuestService<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads and normalizes the full history. A failed read degrades to
    /// empty history so the dashboard can still render all-zero stats.
    async fn load_history(&self) -> Vec<WorkoutRecord> {
        let rows = match self.store.read_all().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Record store read failed, treating history as empty: {}", e);
                Vec::new()
            }
        };
        validator::normalize_history(&self.config, &rows)
    }

    /// The read-side snapshot the presentation layer renders.
    pub async fn snapshot(&self, as_of: DateTime<Utc>) -> QuestSnapshot {
        let history = self.load_history().await;
        let stats = streaks::compute_stats(&self.config, &history, as_of.date_naive());
        let targets = progression::compute_targets(&self.config, &history);
        let days_to_next_level = progression::days_to_next_level(&self.config, &history);

        tracing::debug!(
            lifetime_xp = stats.lifetime_xp,
            streak = stats.streak,
            "Assembled quest snapshot"
        );

        QuestSnapshot {
            lifetime_xp: stats.lifetime_xp,
            weekly_xp: stats.weekly_xp,
            streak: stats.streak,
            targets,
            days_to_next_level,
            level: (stats.lifetime_xp / XP_PER_LEVEL) as u32 + 1,
            xp_into_level: stats.lifetime_xp % XP_PER_LEVEL,
        }
    }

    /// Records a day's submission. If a record already exists for `now`'s
    /// calendar day it is amended in place: completions are OR-merged, XP
    /// recomputed over the merged map, success re-derived. The amendment
    /// rewrite touches only today's rows; every other stored row, including
    /// rows the validator cannot parse, passes through unmodified. Store
    /// failures surface unchanged; nothing in memory is mutated on failure.
    pub async fn submit(
        &self,
        completion: BTreeMap<String, bool>,
        now: DateTime<Utc>,
    ) -> Result<WorkoutRecord> {
        let rows = match self.store.read_all().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Record store read failed, treating history as empty: {}", e);
                Vec::new()
            }
        };
        let history = validator::normalize_history(&self.config, &rows);
        let today = now.date_naive();

        let mut merged = self.config.empty_completion();
        for existing in history.iter().filter(|r| r.day() == today) {
            for (task, &done) in &existing.completion {
                if done {
                    merged.insert(task.clone(), true);
                }
            }
        }
        for (task, done) in completion {
            if done && merged.contains_key(&task) {
                merged.insert(task, true);
            }
        }

        let xp = scoring::compute_xp(&self.config, &merged, today);
        let success = !merged.is_empty() && merged.values().all(|&done| done);
        let record = WorkoutRecord {
            id: Uuid::new_v4(),
            timestamp: now,
            completion: merged,
            success,
            xp,
        };

        let amending = history.iter().any(|r| r.day() == today);
        if amending {
            let mut updated: Vec<RawRecord> = Vec::with_capacity(rows.len());
            let mut replaced = false;
            for row in &rows {
                let day = row
                    .get(COL_DATE)
                    .and_then(validator::parse_timestamp)
                    .map(|ts| ts.date_naive());
                if day == Some(today) {
                    if !replaced {
                        updated.push(record.to_raw());
                        replaced = true;
                    }
                } else {
                    // Rows from other days, and rows without a parseable
                    // date, are never rewritten.
                    updated.push(row.clone());
                }
            }
            self.store.replace(updated).await?;
        } else {
            self.store.append(record.to_raw()).await?;
        }

        tracing::info!(
            xp = record.xp,
            success = record.success,
            amended = amending,
            "Logged workout submission"
        );
        Ok(record)
    }

    /// One-tap logging of a single exercise, the original button flow:
    /// merges that task into today's record.
    pub async fn log_event(&self, task: &str, now: DateTime<Utc>) -> Result<WorkoutRecord> {
        let mut completion = BTreeMap::new();
        completion.insert(task.to_string(), true);
        self.submit(completion, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn service() -> QuestService<MemoryStore> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        QuestService::new(MemoryStore::new(), Config::default())
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn checked(tasks: &[&str]) -> BTreeMap<String, bool> {
        tasks.iter().map(|t| (t.to_string(), true)).collect()
    }

    #[tokio::test]
    async fn empty_store_renders_all_zero_snapshot() {
        let service = service();
        let snapshot = service.snapshot(at(2026, 3, 7, 9)).await;
        assert_eq!(snapshot.lifetime_xp, 0);
        assert_eq!(snapshot.weekly_xp, 0);
        assert_eq!(snapshot.streak, 0);
        assert_eq!(snapshot.targets, service.config().base_targets());
        assert_eq!(snapshot.days_to_next_level, 14);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.xp_into_level, 0);
    }

    #[tokio::test]
    async fn submission_appears_in_next_snapshot() {
        let service = service();
        let now = at(2026, 3, 2, 9); // Monday

        let record = service
            .submit(checked(&["Pushups", "Squats"]), now)
            .await
            .unwrap();
        assert_eq!(record.xp, 30);
        assert!(!record.success);

        let snapshot = service.snapshot(now).await;
        assert_eq!(snapshot.lifetime_xp, 30);
        assert_eq!(snapshot.weekly_xp, 30);
        assert_eq!(snapshot.streak, 0);
    }

    #[tokio::test]
    async fn full_saturday_submission_earns_bonus_and_streak() {
        let service = service();
        let now = at(2026, 3, 7, 9); // Saturday

        let record = service
            .submit(
                checked(&["Pushups", "Squats", "Plank", "Walking", "Ropeflow"]),
                now,
            )
            .await
            .unwrap();
        assert_eq!(record.xp, 90);
        assert!(record.success);

        let snapshot = service.snapshot(now).await;
        assert_eq!(snapshot.streak, 1);
        assert_eq!(snapshot.lifetime_xp, 90);
    }

    #[tokio::test]
    async fn same_day_submissions_amend_one_record() {
        let service = service();
        let morning = at(2026, 3, 2, 7);
        let evening = at(2026, 3, 2, 20);

        service.submit(checked(&["Pushups"]), morning).await.unwrap();
        let amended = service
            .submit(checked(&["Squats", "Plank"]), evening)
            .await
            .unwrap();

        // Morning completion survives the merge; XP covers the whole day.
        assert!(amended.completion["Pushups"]);
        assert_eq!(amended.xp, 50);

        let rows = service.store().read_all().await.unwrap();
        assert_eq!(rows.len(), 1);

        let snapshot = service.snapshot(evening).await;
        assert_eq!(snapshot.lifetime_xp, 50);
    }

    #[tokio::test]
    async fn resubmitting_false_does_not_erase_earlier_completion() {
        let service = service();
        let now = at(2026, 3, 2, 9);
        service.submit(checked(&["Pushups"]), now).await.unwrap();

        let mut map = BTreeMap::new();
        map.insert("Pushups".to_string(), false);
        map.insert("Squats".to_string(), true);
        let amended = service.submit(map, at(2026, 3, 2, 10)).await.unwrap();

        assert!(amended.completion["Pushups"]);
        assert!(amended.completion["Squats"]);
    }

    #[tokio::test]
    async fn one_tap_event_logging_builds_up_the_day() {
        let service = service();
        let now = at(2026, 3, 7, 9); // Saturday
        for task in ["Pushups", "Squats", "Plank", "Walking"] {
            service.log_event(task, now).await.unwrap();
        }
        let record = service.log_event("Ropeflow", now).await.unwrap();
        assert!(record.success);
        assert_eq!(record.xp, 90);

        let snapshot = service.snapshot(now).await;
        assert_eq!(snapshot.streak, 1);
        assert_eq!(snapshot.lifetime_xp, 90);
    }

    #[tokio::test]
    async fn legacy_event_rows_for_today_all_merge_into_amendment() {
        // History in the old one-row-per-exercise schema, four rows today.
        let rows: Vec<RawRecord> = ["Pushups", "Squats", "Plank", "Walking"]
            .iter()
            .map(|task| {
                let mut row = RawRecord::new();
                row.set("Date", "2026-03-07 08:00");
                row.set("Exercise", *task);
                row.set("XP", "15");
                row
            })
            .collect();
        let service = QuestService::new(MemoryStore::with_rows(rows), Config::default());

        let record = service
            .submit(checked(&["Ropeflow"]), at(2026, 3, 7, 9))
            .await
            .unwrap();
        assert!(record.success);
        assert_eq!(record.xp, 90); // Saturday, bonus task completed.

        // The four legacy rows collapse into one canonical checklist row.
        let rows = service.store().read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn amendment_leaves_unparsable_and_other_day_rows_untouched() {
        let mut malformed = RawRecord::new();
        malformed.set("Date", "not a date");
        malformed.set("XP", "15");

        let mut yesterday = RawRecord::new();
        yesterday.set("Date", "2026-03-01 08:00");
        yesterday.set("Exercise", "Pushups (20 reps)");
        yesterday.set("XP", "15");

        let mut today = RawRecord::new();
        today.set("Date", "2026-03-02 07:00");
        today.set("Pushups", "true");
        today.set("XP", "15");

        let service = QuestService::new(
            MemoryStore::with_rows(vec![malformed.clone(), yesterday.clone(), today]),
            Config::default(),
        );

        service
            .submit(checked(&["Squats"]), at(2026, 3, 2, 9))
            .await
            .unwrap();

        let rows = service.store().read_all().await.unwrap();
        assert_eq!(rows.len(), 3);
        // The row without a usable date survives the rewrite as-is.
        assert!(rows.iter().any(|r| r == &malformed));
        // Yesterday's legacy row is not re-canonicalized.
        assert!(rows.iter().any(|r| r == &yesterday));
        // Today's row was amended with the merged completion.
        let amended = rows
            .iter()
            .find(|r| r.get("Date") == Some("2026-03-02 09:00"))
            .unwrap();
        assert_eq!(amended.get("Pushups"), Some("true"));
        assert_eq!(amended.get("Squats"), Some("true"));
    }

    #[tokio::test]
    async fn empty_submission_is_not_an_error() {
        let service = service();
        let record = service
            .submit(BTreeMap::new(), at(2026, 3, 2, 9))
            .await
            .unwrap();
        assert_eq!(record.xp, 0);
        assert!(!record.success);
    }

    #[tokio::test]
    async fn streak_accumulates_across_days_and_levels_land() {
        let service = service();
        let all = ["Pushups", "Squats", "Plank", "Walking", "Ropeflow"];
        // 14 consecutive perfect days ending 2026-03-14.
        for offset in 0..14 {
            let day = at(2026, 3, 1 + offset, 19);
            service.submit(checked(&all), day).await.unwrap();
        }

        let snapshot = service.snapshot(at(2026, 3, 14, 20)).await;
        assert_eq!(snapshot.streak, 14);
        assert_eq!(snapshot.days_to_next_level, 14);
        assert_eq!(snapshot.targets["Pushups"], 22);
        assert_eq!(snapshot.targets["Squats"], 30);
    }

    #[tokio::test]
    async fn lifetime_level_bar_tracks_xp() {
        let service = service();
        let now = at(2026, 3, 2, 9);
        service
            .submit(checked(&["Pushups", "Squats", "Plank", "Walking", "Ropeflow"]), now)
            .await
            .unwrap();
        service
            .submit(checked(&["Pushups", "Squats"]), at(2026, 3, 3, 9))
            .await
            .unwrap();

        let snapshot = service.snapshot(at(2026, 3, 3, 10)).await;
        // 80 + 30 = 110 XP -> level 2, 10 into the bar.
        assert_eq!(snapshot.lifetime_xp, 110);
        assert_eq!(snapshot.level, 2);
        assert_eq!(snapshot.xp_into_level, 10);
    }

    struct FailingStore;

    impl RecordStore for FailingStore {
        async fn read_all(&self) -> Result<Vec<RawRecord>> {
            Err(AppError::Store("connection refused".to_string()))
        }

        async fn append(&self, _row: RawRecord) -> Result<()> {
            Err(AppError::Store("connection refused".to_string()))
        }

        async fn replace(&self, _rows: Vec<RawRecord>) -> Result<()> {
            Err(AppError::Store("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn unreadable_store_degrades_to_empty_history() {
        let service = QuestService::new(FailingStore, Config::default());
        let snapshot = service.snapshot(at(2026, 3, 7, 9)).await;
        assert_eq!(snapshot.lifetime_xp, 0);
        assert_eq!(snapshot.streak, 0);
        assert_eq!(snapshot.targets, service.config().base_targets());
    }

    #[tokio::test]
    async fn failed_write_surfaces_to_caller() {
        let service = QuestService::new(FailingStore, Config::default());
        let result = service
            .submit(checked(&["Pushups"]), at(2026, 3, 2, 9))
            .await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }
}
