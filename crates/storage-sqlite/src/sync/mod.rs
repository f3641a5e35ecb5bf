//! SQLite persistence for sync bookkeeping: attempts, per-incident stats,
//! and the worksite change outbox.

mod model;
mod repository;

pub use model::{SyncAttemptDB, WorksiteChangeDB, WorksiteSyncStatsDB};
pub use repository::{write_worksite_change, ChangeWriteRequest, SyncStateRepository};
