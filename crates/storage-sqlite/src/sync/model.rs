//! Database models for sync bookkeeping tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crisiscleanup_core::sync::{SyncAttempt, WorksiteSyncStats};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(primary_key(sync_key))]
#[diesel(treat_none_as_null = true)]
#[diesel(table_name = crate::schema::sync_attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncAttemptDB {
    pub sync_key: String,
    pub last_success_time: i64,
    pub last_attempt_time: i64,
    pub attempt_count: i32,
}

impl From<SyncAttemptDB> for SyncAttempt {
    fn from(row: SyncAttemptDB) -> Self {
        SyncAttempt {
            last_success_time: row.last_success_time,
            last_attempt_time: row.last_attempt_time,
            attempt_count: row.attempt_count,
        }
    }
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(primary_key(incident_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(table_name = crate::schema::worksite_sync_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorksiteSyncStatsDB {
    pub incident_id: i64,
    pub sync_started_at: String,
    pub data_count: i64,
    pub paged_count: i64,
    pub successful_sync_at: Option<String>,
    pub full_synced_at: Option<String>,
    pub attempted_sync_at: Option<String>,
    pub attempted_counter: i32,
    pub app_build_version_code: i64,
}

impl From<WorksiteSyncStatsDB> for WorksiteSyncStats {
    fn from(row: WorksiteSyncStatsDB) -> Self {
        WorksiteSyncStats {
            incident_id: row.incident_id,
            sync_started_at: row.sync_started_at,
            data_count: row.data_count,
            paged_count: row.paged_count,
            successful_sync_at: row.successful_sync_at,
            full_synced_at: row.full_synced_at,
            attempted_sync_at: row.attempted_sync_at,
            attempted_counter: row.attempted_counter,
            app_build_version_code: row.app_build_version_code,
        }
    }
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(primary_key(change_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(table_name = crate::schema::worksite_changes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorksiteChangeDB {
    pub change_id: String,
    pub worksite_id: String,
    pub incident_id: i64,
    pub payload: String,
    pub status: String,
    pub save_attempts: i32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub last_error_code: Option<String>,
    pub created_at: String,
}
