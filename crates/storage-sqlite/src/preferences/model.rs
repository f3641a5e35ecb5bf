//! Database model for the single-row app preferences table.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crisiscleanup_core::preferences::AppPreferences;

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
#[diesel(treat_none_as_null = true)]
#[diesel(table_name = crate::schema::app_preferences)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AppPreferencesDB {
    pub id: i32,
    pub selected_incident_id: Option<i64>,
    pub sync_paused: i32,
    pub app_build_version_code: i64,
    pub updated_at: String,
}

impl From<AppPreferencesDB> for AppPreferences {
    fn from(row: AppPreferencesDB) -> Self {
        AppPreferences {
            selected_incident_id: row.selected_incident_id,
            sync_paused: row.sync_paused != 0,
            app_build_version_code: row.app_build_version_code,
        }
    }
}
