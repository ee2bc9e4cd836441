//! Habit-gamification engine: converts daily exercise completions into XP,
//! tracks consecutive perfect-day streaks, and adaptively raises difficulty
//! targets as the user improves.
//!
//! The scoring, streak, and progression engines are pure functions over an
//! immutable history snapshot; [`QuestService`] orchestrates them over a
//! [`store::RecordStore`] and is the only place a mutation (one append or
//! replace per submission) leaves the crate.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::{QuestSnapshot, QuestStats, RawRecord, TargetSet, WorkoutRecord};
pub use services::quest::QuestService;
pub use store::{MemoryStore, RecordStore, SqliteStore};
