use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Currently active difficulty target per task. Derived on every read,
/// never persisted.
pub type TargetSet = BTreeMap<String, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStats {
    pub lifetime_xp: i64,
    /// XP earned since the most recent Monday 00:00.
    pub weekly_xp: i64,
    /// Consecutive perfect days ending at the reference date.
    pub streak: u32,
}

/// Everything the dashboard renders, assembled in one read pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestSnapshot {
    pub lifetime_xp: i64,
    pub weekly_xp: i64,
    pub streak: u32,
    pub targets: TargetSet,
    pub days_to_next_level: u32,
    /// XP-based display level for the progress bar.
    pub level: u32,
    pub xp_into_level: i64,
}
