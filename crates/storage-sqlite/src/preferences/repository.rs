//! Repository for the single-row app preferences table.

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crisiscleanup_core::errors::Result;
use crisiscleanup_core::preferences::AppPreferences;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_preferences;

use super::model::AppPreferencesDB;

const PREFERENCES_ROW_ID: i32 = 1;

pub struct AppPreferencesRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AppPreferencesRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    pub fn get(&self) -> Result<AppPreferences> {
        let mut conn = get_connection(&self.pool)?;
        let row = app_preferences::table
            .find(PREFERENCES_ROW_ID)
            .first::<AppPreferencesDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(AppPreferences::from).unwrap_or_default())
    }

    async fn upsert(&self, preferences: AppPreferences) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = AppPreferencesDB {
                    id: PREFERENCES_ROW_ID,
                    selected_incident_id: preferences.selected_incident_id,
                    sync_paused: i32::from(preferences.sync_paused),
                    app_build_version_code: preferences.app_build_version_code,
                    updated_at: Utc::now().to_rfc3339(),
                };
                diesel::insert_into(app_preferences::table)
                    .values(&row)
                    .on_conflict(app_preferences::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    pub async fn set_selected_incident(&self, incident_id: Option<i64>) -> Result<()> {
        let mut preferences = self.get()?;
        preferences.selected_incident_id = incident_id;
        self.upsert(preferences).await
    }

    pub async fn set_sync_paused(&self, paused: bool) -> Result<()> {
        let mut preferences = self.get()?;
        preferences.sync_paused = paused;
        self.upsert(preferences).await
    }

    pub async fn set_app_build_version(&self, app_build_version_code: i64) -> Result<()> {
        let mut preferences = self.get()?;
        preferences.app_build_version_code = app_build_version_code;
        self.upsert(preferences).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, write_actor::spawn_writer};
    use tempfile::tempdir;

    fn setup_repo() -> AppPreferencesRepository {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        AppPreferencesRepository::new(pool, writer)
    }

    #[tokio::test]
    async fn defaults_before_first_write() {
        let repo = setup_repo();
        let preferences = repo.get().expect("get");
        assert_eq!(preferences.selected_incident_id, None);
        assert!(!preferences.sync_paused);
    }

    #[tokio::test]
    async fn updates_keep_unrelated_fields() {
        let repo = setup_repo();
        repo.set_selected_incident(Some(255)).await.expect("select");
        repo.set_sync_paused(true).await.expect("pause");
        repo.set_app_build_version(190).await.expect("build");

        let preferences = repo.get().expect("get");
        assert_eq!(preferences.selected_incident_id, Some(255));
        assert!(preferences.sync_paused);
        assert_eq!(preferences.app_build_version_code, 190);
    }
}
