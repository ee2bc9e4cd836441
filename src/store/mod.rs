mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::models::RawRecord;

/// Narrow persistence boundary the engine reads and writes through. The
/// engine treats each call as a single atomic operation and never retries;
/// read failures degrade to empty history, write failures surface to the
/// caller.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// The entire history, oldest first. May be empty.
    async fn read_all(&self) -> Result<Vec<RawRecord>>;

    /// Persists one new row.
    async fn append(&self, row: RawRecord) -> Result<()>;

    /// Rewrites the full history, used for same-day amendments.
    async fn replace(&self, rows: Vec<RawRecord>) -> Result<()>;
}
