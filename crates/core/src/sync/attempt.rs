//! Sync attempt bookkeeping and backoff predicates.

use serde::{Deserialize, Serialize};

use super::scheduler::{
    SYNC_BACKOFF_BASE_INTERVAL_SECS, SYNC_BACKOFF_MAX_EXPONENT, SYNC_BACKOFF_MIN_INTERVAL_SECS,
    SYNC_RECENT_INTERVAL_SECS,
};

/// Key under which the incidents-list attempt is persisted.
pub const INCIDENTS_SYNC_KEY: &str = "incidents";

/// Key under which one incident's worksites attempt is persisted.
pub fn incident_worksites_sync_key(incident_id: i64) -> String {
    format!("incident-worksites-{incident_id}")
}

/// Bookkeeping of the last time a sync was tried and succeeded.
///
/// Times are epoch seconds. A zero value means "never".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAttempt {
    pub last_success_time: i64,
    pub last_attempt_time: i64,
    pub attempt_count: i32,
}

impl SyncAttempt {
    /// Attempt state after a successful sync at `now`.
    pub fn success(now: i64) -> Self {
        Self {
            last_success_time: now,
            last_attempt_time: now,
            attempt_count: 0,
        }
    }

    /// Attempt state after a failed try at `now`.
    pub fn with_failure(self, now: i64) -> Self {
        Self {
            last_success_time: self.last_success_time,
            last_attempt_time: now,
            attempt_count: self.attempt_count.saturating_add(1),
        }
    }

    /// Backoff window (seconds) for the current failure streak.
    pub fn backoff_interval_seconds(&self) -> i64 {
        backoff_interval_seconds(self.attempt_count)
    }

    /// True when the last success is within the recency window.
    pub fn is_recent(&self, recent_interval_secs: i64, now: i64) -> bool {
        let elapsed = now - self.last_success_time;
        elapsed >= 0 && elapsed < recent_interval_secs
    }

    /// True while a failure streak's backoff window is still open.
    pub fn is_backing_off(&self, now: i64) -> bool {
        if self.attempt_count < 1 {
            return false;
        }
        let elapsed = now - self.last_attempt_time;
        elapsed >= 0 && elapsed < self.backoff_interval_seconds()
    }

    /// Passive sync qualifies when the last success is stale and no backoff
    /// window is open.
    pub fn should_sync_passively(&self, now: i64) -> bool {
        !self.is_recent(SYNC_RECENT_INTERVAL_SECS, now) && !self.is_backing_off(now)
    }
}

/// Exponential backoff in seconds with a floor and capped exponent.
pub fn backoff_interval_seconds(attempt_count: i32) -> i64 {
    if attempt_count < 1 {
        return 0;
    }
    let exponent = (attempt_count - 1).clamp(0, SYNC_BACKOFF_MAX_EXPONENT) as u32;
    let windowed = SYNC_BACKOFF_BASE_INTERVAL_SECS.saturating_mul(1_i64 << exponent);
    windowed.max(SYNC_BACKOFF_MIN_INTERVAL_SECS)
}
