//! Wire types for the Crisis Cleanup API.
//!
//! The API speaks snake_case JSON, which maps onto Rust field names directly.

use serde::{Deserialize, Serialize};

/// Error body returned by the API on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkIncident {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub incident_type: String,
    pub start_at: String,
    #[serde(default)]
    pub active_phone_number: Option<String>,
    #[serde(default)]
    pub turn_on_release: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkIncidentsResult {
    pub count: i64,
    pub results: Vec<NetworkIncident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWorkType {
    pub id: i64,
    pub work_type: String,
    pub status: String,
    #[serde(default)]
    pub claimed_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWorksiteFlag {
    pub reason_t: String,
    #[serde(default)]
    pub is_high_priority: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWorksiteNote {
    pub created_at: String,
    pub note: String,
}

/// Core worksite fields used for list caching and map rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWorksiteShort {
    pub id: i64,
    pub incident: i64,
    pub name: String,
    pub case_number: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub county: String,
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone1: String,
    #[serde(default)]
    pub svi: Option<f64>,
    pub updated_at: String,
    #[serde(default)]
    pub work_types: Vec<NetworkWorkType>,
}

/// Complete worksite record including flags and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWorksiteFull {
    pub id: i64,
    pub incident: i64,
    pub name: String,
    pub case_number: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub county: String,
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone1: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reported_by: Option<i64>,
    #[serde(default)]
    pub svi: Option<f64>,
    #[serde(default)]
    pub what3words: Option<String>,
    pub updated_at: String,
    #[serde(default)]
    pub work_types: Vec<NetworkWorkType>,
    #[serde(default)]
    pub flags: Vec<NetworkWorksiteFlag>,
    #[serde(default)]
    pub notes: Vec<NetworkWorksiteNote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkWorksitePage {
    pub count: i64,
    pub results: Vec<NetworkWorksiteShort>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkWorksiteFullPage {
    pub count: i64,
    pub results: Vec<NetworkWorksiteFull>,
}

/// Payload for creating or updating a worksite on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksitePushPayload {
    pub incident: i64,
    pub name: String,
    /// Absent on create; the server assigns case numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    pub address: String,
    pub city: String,
    pub county: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what3words: Option<String>,
    pub work_types: Vec<NetworkWorkType>,
}
