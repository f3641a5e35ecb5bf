//! Incident domain model.

use serde::{Deserialize, Serialize};

/// A named disaster event scoping a set of worksites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub incident_type: String,
    /// RFC3339 instant the incident started.
    pub start_at: String,
    pub active_phone_number: Option<String>,
    pub turn_on_release: bool,
    pub is_archived: bool,
    pub updated_at: String,
}

impl Incident {
    /// Label preferred for user-visible progress messages.
    pub fn display_label(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }
}
