use super::RecordStore;
use crate::error::Result;
use crate::models::RawRecord;
use tokio::sync::Mutex;

/// In-memory record store, used by tests and as an offline fallback.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<RawRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<RawRecord>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

impl RecordStore for MemoryStore {
    async fn read_all(&self) -> Result<Vec<RawRecord>> {
        Ok(self.rows.lock().await.clone())
    }

    async fn append(&self, row: RawRecord) -> Result<()> {
        self.rows.lock().await.push(row);
        Ok(())
    }

    async fn replace(&self, rows: Vec<RawRecord>) -> Result<()> {
        *self.rows.lock().await = rows;
        Ok(())
    }
}
