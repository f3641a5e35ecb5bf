//! Database models for incidents.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crisiscleanup_core::incidents::Incident;

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
#[diesel(table_name = crate::schema::incidents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IncidentDB {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub incident_type: String,
    pub start_at: String,
    pub active_phone_number: Option<String>,
    pub turn_on_release: i32,
    pub is_archived: i32,
    pub updated_at: String,
}

impl From<IncidentDB> for Incident {
    fn from(row: IncidentDB) -> Self {
        Incident {
            id: row.id,
            name: row.name,
            short_name: row.short_name,
            incident_type: row.incident_type,
            start_at: row.start_at,
            active_phone_number: row.active_phone_number,
            turn_on_release: row.turn_on_release != 0,
            is_archived: row.is_archived != 0,
            updated_at: row.updated_at,
        }
    }
}

impl From<Incident> for IncidentDB {
    fn from(incident: Incident) -> Self {
        IncidentDB {
            id: incident.id,
            name: incident.name,
            short_name: incident.short_name,
            incident_type: incident.incident_type,
            start_at: incident.start_at,
            active_phone_number: incident.active_phone_number,
            turn_on_release: i32::from(incident.turn_on_release),
            is_archived: i32::from(incident.is_archived),
            updated_at: incident.updated_at,
        }
    }
}
