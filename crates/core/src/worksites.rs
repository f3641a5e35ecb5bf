//! Worksite domain models.

use serde::{Deserialize, Serialize};

/// Network id of a worksite that has never been pushed to the server.
pub const UNSYNCED_NETWORK_ID: i64 = -1;

/// A unit of work claimed/performed at a worksite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkType {
    pub id: i64,
    pub work_type: String,
    pub status: String,
    pub claimed_by: Option<i64>,
}

/// An annotation flag attached to a worksite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksiteFlag {
    pub reason_t: String,
    pub is_high_priority: bool,
    pub notes: Option<String>,
}

/// A free-form note attached to a worksite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksiteNote {
    pub created_at: String,
    pub note: String,
}

/// A case record representing a disaster-relief work site.
///
/// `id` is the local identity; `network_id` is the server identity and stays
/// [`UNSYNCED_NETWORK_ID`] until the first successful push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksite {
    pub id: String,
    pub network_id: i64,
    pub incident_id: i64,
    pub name: String,
    pub case_number: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone1: String,
    pub email: Option<String>,
    pub reported_by: Option<i64>,
    pub svi: Option<f64>,
    pub what3words: Option<String>,
    pub updated_at: String,
    pub work_types: Vec<WorkType>,
    pub flags: Vec<WorksiteFlag>,
    pub notes: Vec<WorksiteNote>,
    pub has_full_data: bool,
    pub is_local_modified: bool,
    pub local_modified_at: Option<String>,
}

impl Worksite {
    /// Whether the server has assigned this worksite an identity.
    pub fn is_synced(&self) -> bool {
        self.network_id > 0
    }
}
