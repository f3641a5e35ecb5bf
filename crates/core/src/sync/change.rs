//! Local worksite change outbox models.

use serde::{Deserialize, Serialize};

/// Lifecycle of a locally recorded worksite change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorksiteChangeStatus {
    Pending,
    Sent,
    Dead,
}

/// A local worksite edit queued for push to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksiteChange {
    pub change_id: String,
    pub worksite_id: String,
    pub incident_id: i64,
    /// Serialized worksite snapshot at edit time.
    pub payload: String,
    pub status: WorksiteChangeStatus,
    pub save_attempts: i32,
    pub next_retry_at: Option<String>,
    pub last_error: Option<String>,
    pub last_error_code: Option<String>,
    pub created_at: String,
}
