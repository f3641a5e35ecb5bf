//! App preferences consulted by the sync planner.

use serde::{Deserialize, Serialize};

/// Persisted app-level preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPreferences {
    /// The incident whose worksites passive sync keeps warm.
    pub selected_incident_id: Option<i64>,
    /// Suspends passive sync; forced syncs ignore this.
    pub sync_paused: bool,
    pub app_build_version_code: i64,
}
