//! Database models for worksites.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

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
#[diesel(table_name = crate::schema::worksites)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorksiteDB {
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
    /// JSON-encoded `Vec<WorkType>`.
    pub work_types: Option<String>,
    /// JSON-encoded `Vec<WorksiteFlag>`.
    pub flags: Option<String>,
    /// JSON-encoded `Vec<WorksiteNote>`.
    pub notes: Option<String>,
    pub has_full_data: i32,
    pub is_local_modified: i32,
    pub local_modified_at: Option<String>,
}
