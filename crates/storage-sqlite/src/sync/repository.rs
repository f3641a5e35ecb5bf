//! Repository for sync bookkeeping tables.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crisiscleanup_core::errors::Result;
use crisiscleanup_core::sync::{
    backoff_interval_seconds, SyncAttempt, WorksiteChange, WorksiteChangeStatus,
    WorksiteSyncStats, WORKSITE_CHANGE_MAX_SAVE_ATTEMPTS,
};

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{sync_attempts, worksite_changes, worksite_sync_stats};

use super::model::{SyncAttemptDB, WorksiteChangeDB, WorksiteSyncStatsDB};

fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}

/// Request to enqueue a worksite change in the outbox.
#[derive(Debug, Clone)]
pub struct ChangeWriteRequest {
    pub change_id: Option<String>,
    pub worksite_id: String,
    pub incident_id: i64,
    pub payload: serde_json::Value,
}

impl ChangeWriteRequest {
    pub fn new(
        worksite_id: impl Into<String>,
        incident_id: i64,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            change_id: None,
            worksite_id: worksite_id.into(),
            incident_id,
            payload,
        }
    }
}

/// Insert a pending change row on the caller's connection.
///
/// Runs inside the caller's transaction so the worksite write and its outbox
/// entry commit or roll back together.
pub fn write_worksite_change(
    conn: &mut SqliteConnection,
    request: ChangeWriteRequest,
) -> Result<String> {
    let change_id = request
        .change_id
        .unwrap_or_else(|| Uuid::now_v7().to_string());
    let row = WorksiteChangeDB {
        change_id: change_id.clone(),
        worksite_id: request.worksite_id,
        incident_id: request.incident_id,
        payload: serde_json::to_string(&request.payload)?,
        status: enum_to_db(&WorksiteChangeStatus::Pending)?,
        save_attempts: 0,
        next_retry_at: None,
        last_error: None,
        last_error_code: None,
        created_at: Utc::now().to_rfc3339(),
    };

    diesel::insert_into(worksite_changes::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;

    Ok(change_id)
}

fn to_worksite_change(row: WorksiteChangeDB) -> Result<WorksiteChange> {
    Ok(WorksiteChange {
        change_id: row.change_id,
        worksite_id: row.worksite_id,
        incident_id: row.incident_id,
        payload: row.payload,
        status: enum_from_db(&row.status)?,
        save_attempts: row.save_attempts,
        next_retry_at: row.next_retry_at,
        last_error: row.last_error,
        last_error_code: row.last_error_code,
        created_at: row.created_at,
    })
}

pub struct SyncStateRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SyncStateRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sync attempts
    // ─────────────────────────────────────────────────────────────────────

    pub fn get_attempt(&self, key: &str) -> Result<Option<SyncAttempt>> {
        let mut conn = get_connection(&self.pool)?;
        let row = sync_attempts::table
            .find(key)
            .first::<SyncAttemptDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(SyncAttempt::from))
    }

    pub async fn record_attempt_success(&self, key: String, now: i64) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let attempt = SyncAttempt::success(now);
                let row = SyncAttemptDB {
                    sync_key: key,
                    last_success_time: attempt.last_success_time,
                    last_attempt_time: attempt.last_attempt_time,
                    attempt_count: attempt.attempt_count,
                };
                diesel::insert_into(sync_attempts::table)
                    .values(&row)
                    .on_conflict(sync_attempts::sync_key)
                    .do_update()
                    .set((
                        sync_attempts::last_success_time.eq(row.last_success_time),
                        sync_attempts::last_attempt_time.eq(row.last_attempt_time),
                        sync_attempts::attempt_count.eq(row.attempt_count),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    /// Record a failed attempt and return the updated attempt state.
    pub async fn record_attempt_failure(&self, key: String, now: i64) -> Result<SyncAttempt> {
        self.writer
            .exec(move |conn| {
                let previous = sync_attempts::table
                    .find(&key)
                    .first::<SyncAttemptDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .map(SyncAttempt::from)
                    .unwrap_or_default();
                let updated = previous.with_failure(now);

                let row = SyncAttemptDB {
                    sync_key: key,
                    last_success_time: updated.last_success_time,
                    last_attempt_time: updated.last_attempt_time,
                    attempt_count: updated.attempt_count,
                };
                diesel::insert_into(sync_attempts::table)
                    .values(&row)
                    .on_conflict(sync_attempts::sync_key)
                    .do_update()
                    .set((
                        sync_attempts::last_success_time.eq(row.last_success_time),
                        sync_attempts::last_attempt_time.eq(row.last_attempt_time),
                        sync_attempts::attempt_count.eq(row.attempt_count),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(updated)
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Per-incident worksite sync stats
    // ─────────────────────────────────────────────────────────────────────

    pub fn get_worksite_sync_stats(&self, incident_id: i64) -> Result<Option<WorksiteSyncStats>> {
        let mut conn = get_connection(&self.pool)?;
        let row = worksite_sync_stats::table
            .find(incident_id)
            .first::<WorksiteSyncStatsDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(WorksiteSyncStats::from))
    }

    /// Open a caching pass for an incident.
    ///
    /// `paged_count` seeds the resume offset; a pass restarted under a new
    /// app build also clears previous success markers.
    pub async fn begin_worksite_sync(
        &self,
        incident_id: i64,
        data_count: i64,
        paged_count: i64,
        app_build_version_code: i64,
        started_at: String,
    ) -> Result<WorksiteSyncStats> {
        self.writer
            .exec(move |conn| {
                let previous = worksite_sync_stats::table
                    .find(incident_id)
                    .first::<WorksiteSyncStatsDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let same_build = previous
                    .as_ref()
                    .map(|row| row.app_build_version_code == app_build_version_code)
                    .unwrap_or(false);
                let (successful_sync_at, full_synced_at, attempted_counter) = match previous {
                    Some(row) if same_build => (
                        row.successful_sync_at,
                        row.full_synced_at,
                        row.attempted_counter.saturating_add(1),
                    ),
                    _ => (None, None, 1),
                };

                let row = WorksiteSyncStatsDB {
                    incident_id,
                    sync_started_at: started_at.clone(),
                    data_count,
                    paged_count,
                    successful_sync_at,
                    full_synced_at,
                    attempted_sync_at: Some(started_at),
                    attempted_counter,
                    app_build_version_code,
                };
                diesel::insert_into(worksite_sync_stats::table)
                    .values(&row)
                    .on_conflict(worksite_sync_stats::incident_id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(WorksiteSyncStats::from(row))
            })
            .await
    }

    pub async fn record_paged_progress(&self, incident_id: i64, paged_count: i64) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(worksite_sync_stats::table.find(incident_id))
                    .set(worksite_sync_stats::paged_count.eq(paged_count))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    pub async fn mark_worksites_synced(&self, incident_id: i64, synced_at: String) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(worksite_sync_stats::table.find(incident_id))
                    .set((
                        worksite_sync_stats::successful_sync_at.eq(Some(synced_at)),
                        worksite_sync_stats::attempted_counter.eq(0),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    pub async fn mark_worksites_full_synced(
        &self,
        incident_id: i64,
        synced_at: String,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(worksite_sync_stats::table.find(incident_id))
                    .set(worksite_sync_stats::full_synced_at.eq(Some(synced_at)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Worksite change outbox
    // ─────────────────────────────────────────────────────────────────────

    /// Pending changes whose retry window has passed, oldest first.
    pub fn list_pending_changes(&self, limit: i64) -> Result<Vec<WorksiteChange>> {
        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now().to_rfc3339();

        let rows = worksite_changes::table
            .filter(worksite_changes::status.eq(enum_to_db(&WorksiteChangeStatus::Pending)?))
            .filter(
                worksite_changes::next_retry_at
                    .is_null()
                    .or(worksite_changes::next_retry_at.le(now)),
            )
            .order(worksite_changes::created_at.asc())
            .limit(limit)
            .load::<WorksiteChangeDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(to_worksite_change).collect()
    }

    pub fn count_pending_changes(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = worksite_changes::table
            .filter(worksite_changes::status.eq(enum_to_db(&WorksiteChangeStatus::Pending)?))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    pub async fn mark_changes_sent(&self, change_ids: Vec<String>) -> Result<()> {
        if change_ids.is_empty() {
            return Ok(());
        }

        self.writer
            .exec(move |conn| {
                diesel::update(
                    worksite_changes::table.filter(worksite_changes::change_id.eq_any(change_ids)),
                )
                .set((
                    worksite_changes::status.eq(enum_to_db(&WorksiteChangeStatus::Sent)?),
                    worksite_changes::next_retry_at.eq::<Option<String>>(None),
                    worksite_changes::last_error.eq::<Option<String>>(None),
                    worksite_changes::last_error_code.eq::<Option<String>>(None),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    /// Schedule a retry for a failed change.
    ///
    /// Uses exponential backoff on the change's attempt count unless an
    /// explicit delay is given. Changes at the attempt ceiling go dead; the
    /// resulting status is returned.
    pub async fn schedule_change_retry(
        &self,
        change_id: String,
        delay_secs: Option<i64>,
        last_error: Option<String>,
        last_error_code: Option<String>,
    ) -> Result<WorksiteChangeStatus> {
        self.writer
            .exec(move |conn| {
                let row = worksite_changes::table
                    .find(&change_id)
                    .first::<WorksiteChangeDB>(conn)
                    .map_err(StorageError::from)?;
                let save_attempts = row.save_attempts.saturating_add(1);

                let status = if save_attempts >= WORKSITE_CHANGE_MAX_SAVE_ATTEMPTS {
                    WorksiteChangeStatus::Dead
                } else {
                    WorksiteChangeStatus::Pending
                };
                let next_retry_at = match status {
                    WorksiteChangeStatus::Pending => {
                        let backoff =
                            delay_secs.unwrap_or_else(|| backoff_interval_seconds(save_attempts));
                        Some((Utc::now() + Duration::seconds(backoff)).to_rfc3339())
                    }
                    _ => None,
                };

                diesel::update(worksite_changes::table.find(&change_id))
                    .set((
                        worksite_changes::save_attempts.eq(save_attempts),
                        worksite_changes::status.eq(enum_to_db(&status)?),
                        worksite_changes::next_retry_at.eq(next_retry_at),
                        worksite_changes::last_error.eq(last_error),
                        worksite_changes::last_error_code.eq(last_error_code),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(status)
            })
            .await
    }

    pub async fn mark_change_dead(
        &self,
        change_id: String,
        last_error: Option<String>,
        last_error_code: Option<String>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(worksite_changes::table.find(change_id))
                    .set((
                        worksite_changes::status.eq(enum_to_db(&WorksiteChangeStatus::Dead)?),
                        worksite_changes::last_error.eq(last_error),
                        worksite_changes::last_error_code.eq(last_error_code),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    pub fn get_change(&self, change_id: &str) -> Result<Option<WorksiteChange>> {
        let mut conn = get_connection(&self.pool)?;
        let row = worksite_changes::table
            .find(change_id)
            .first::<WorksiteChangeDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(to_worksite_change).transpose()
    }
}
