use super::RecordStore;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{RawRecord, COL_DATE, COL_SUCCESS, COL_XP};
use dirs::data_dir;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Column, Row, SqlitePool};
use std::path::PathBuf;

/// SQLite-backed record store. One `workout_log` table whose columns are
/// built from the catalog's task names at startup, so the stored schema
/// mirrors the tabular row schema (`Date`, one column per task, `Success`,
/// `XP`). Everything is stored as text and handed back as raw rows; the
/// validator stays the single normalization point.
pub struct SqliteStore {
    pool: SqlitePool,
    columns: Vec<String>,
}

impl SqliteStore {
    pub async fn new(config: &Config) -> Result<Self> {
        let db_path = Self::db_path(config)?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Store(format!("Failed to create data directory: {}", e))
            })?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        Self::connect(config, &db_url, 5).await
    }

    /// In-memory database, used by tests.
    pub async fn in_memory(config: &Config) -> Result<Self> {
        Self::connect(config, "sqlite::memory:", 1).await
    }

    async fn connect(config: &Config, db_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to database: {}", e)))?;

        let mut columns = vec![COL_DATE.to_string()];
        columns.extend(config.catalog.iter().map(|e| e.name.clone()));
        columns.push(COL_SUCCESS.to_string());
        columns.push(COL_XP.to_string());

        let store = Self { pool, columns };
        store.create_table().await?;

        tracing::info!("Workout log store initialized");
        Ok(store)
    }

    fn db_path(config: &Config) -> Result<PathBuf> {
        let data_dir = data_dir()
            .ok_or_else(|| AppError::Store("Could not find data directory".to_string()))?;
        Ok(data_dir.join("fitness-quest").join(&config.database.db_name))
    }

    async fn create_table(&self) -> Result<()> {
        let mut ddl =
            String::from("CREATE TABLE IF NOT EXISTS workout_log (id INTEGER PRIMARY KEY AUTOINCREMENT");
        for column in &self.columns {
            ddl.push_str(&format!(", \"{}\" TEXT", column));
        }
        ddl.push(')');

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("Failed to create workout_log table: {}", e)))?;
        Ok(())
    }

    fn insert_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| format!("\"{}\"", c)).collect();
        let placeholders: Vec<&str> = self.columns.iter().map(|_| "?").collect();
        format!(
            "INSERT INTO workout_log ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}

impl RecordStore for SqliteStore {
    async fn read_all(&self) -> Result<Vec<RawRecord>> {
        let rows = sqlx::query("SELECT * FROM workout_log ORDER BY \"Date\", id")
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = RawRecord::new();
            for column in row.columns() {
                let name = column.name();
                if name == "id" {
                    continue;
                }
                if let Ok(Some(value)) = row.try_get::<Option<String>, _>(name) {
                    record.set(name, value);
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    async fn append(&self, row: RawRecord) -> Result<()> {
        let sql = self.insert_sql();
        let mut query = sqlx::query(&sql);
        for column in &self.columns {
            query = query.bind(row.get(column).unwrap_or("").to_string());
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn replace(&self, rows: Vec<RawRecord>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM workout_log")
            .execute(&mut *tx)
            .await?;

        let sql = self.insert_sql();
        for row in &rows {
            let mut query = sqlx::query(&sql);
            for column in &self.columns {
                query = query.bind(row.get(column).unwrap_or("").to_string());
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checklist_row(date: &str, pushups: &str, xp: &str) -> RawRecord {
        let mut row = RawRecord::new();
        row.set(COL_DATE, date);
        row.set("Pushups", pushups);
        row.set(COL_SUCCESS, "false");
        row.set(COL_XP, xp);
        row
    }

    #[tokio::test]
    async fn append_and_read_round_trip() {
        let config = Config::default();
        let store = SqliteStore::in_memory(&config).await.unwrap();

        store
            .append(checklist_row("2026-03-02 08:00", "true", "15"))
            .await
            .unwrap();
        store
            .append(checklist_row("2026-03-03 08:00", "false", "0"))
            .await
            .unwrap();

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(COL_DATE), Some("2026-03-02 08:00"));
        assert_eq!(rows[0].get("Pushups"), Some("true"));
        assert_eq!(rows[0].get(COL_XP), Some("15"));
        // Column not set on insert comes back empty, not missing the row.
        assert_eq!(rows[0].get("Squats"), Some(""));
    }

    #[tokio::test]
    async fn replace_rewrites_the_full_history() {
        let config = Config::default();
        let store = SqliteStore::in_memory(&config).await.unwrap();

        store
            .append(checklist_row("2026-03-02 08:00", "true", "15"))
            .await
            .unwrap();
        store
            .append(checklist_row("2026-03-03 08:00", "true", "15"))
            .await
            .unwrap();

        store
            .replace(vec![checklist_row("2026-03-03 20:00", "true", "30")])
            .await
            .unwrap();

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(COL_XP), Some("30"));
    }

    #[tokio::test]
    async fn reads_sort_by_date() {
        let config = Config::default();
        let store = SqliteStore::in_memory(&config).await.unwrap();

        store
            .append(checklist_row("2026-03-05 08:00", "true", "15"))
            .await
            .unwrap();
        store
            .append(checklist_row("2026-03-02 08:00", "true", "15"))
            .await
            .unwrap();

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows[0].get(COL_DATE), Some("2026-03-02 08:00"));
    }
}
