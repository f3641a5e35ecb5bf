//! Repository for locally cached incidents.

use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crisiscleanup_core::errors::Result;
use crisiscleanup_core::incidents::Incident;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::incidents;

use super::model::IncidentDB;

pub struct IncidentRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl IncidentRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    pub fn count_incidents(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = incidents::table
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    /// Non-archived incidents, newest first.
    pub fn list_incidents(&self) -> Result<Vec<Incident>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = incidents::table
            .filter(incidents::is_archived.eq(0))
            .order(incidents::start_at.desc())
            .load::<IncidentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Incident::from).collect())
    }

    pub fn get_incident(&self, incident_id: i64) -> Result<Option<Incident>> {
        let mut conn = get_connection(&self.pool)?;
        let row = incidents::table
            .find(incident_id)
            .first::<IncidentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Incident::from))
    }

    /// Reconcile a pulled incident list into the local cache.
    pub async fn upsert_incidents(&self, pulled: Vec<Incident>) -> Result<usize> {
        if pulled.is_empty() {
            return Ok(0);
        }

        self.writer
            .exec(move |conn| {
                let mut upserted = 0usize;
                for incident in pulled {
                    let row = IncidentDB::from(incident);
                    diesel::insert_into(incidents::table)
                        .values(&row)
                        .on_conflict(incidents::id)
                        .do_update()
                        .set(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    upserted += 1;
                }
                Ok(upserted)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, write_actor::spawn_writer};
    use tempfile::tempdir;

    fn setup_repo() -> IncidentRepository {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        IncidentRepository::new(pool, writer)
    }

    fn incident(id: i64, name: &str, start_at: &str) -> Incident {
        Incident {
            id,
            name: name.to_string(),
            short_name: name.to_lowercase().replace(' ', "_"),
            incident_type: "hurricane".to_string(),
            start_at: start_at.to_string(),
            active_phone_number: None,
            turn_on_release: false,
            is_archived: false,
            updated_at: start_at.to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_then_count_and_get() {
        let repo = setup_repo();
        assert_eq!(repo.count_incidents().expect("count"), 0);

        let upserted = repo
            .upsert_incidents(vec![
                incident(255, "Medium Storm", "2026-02-01T00:00:00Z"),
                incident(256, "Big Flood", "2026-03-01T00:00:00Z"),
            ])
            .await
            .expect("upsert");
        assert_eq!(upserted, 2);
        assert_eq!(repo.count_incidents().expect("count"), 2);

        let stored = repo.get_incident(255).expect("get").expect("exists");
        assert_eq!(stored.name, "Medium Storm");
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_updates_fields() {
        let repo = setup_repo();
        repo.upsert_incidents(vec![incident(255, "Medium Storm", "2026-02-01T00:00:00Z")])
            .await
            .expect("first upsert");

        let mut renamed = incident(255, "Medium Storm Renamed", "2026-02-01T00:00:00Z");
        renamed.is_archived = true;
        repo.upsert_incidents(vec![renamed])
            .await
            .expect("second upsert");

        assert_eq!(repo.count_incidents().expect("count"), 1);
        let stored = repo.get_incident(255).expect("get").expect("exists");
        assert_eq!(stored.name, "Medium Storm Renamed");
        assert!(stored.is_archived);
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_hides_archived() {
        let repo = setup_repo();
        let mut archived = incident(250, "Old Fire", "2025-01-01T00:00:00Z");
        archived.is_archived = true;
        repo.upsert_incidents(vec![
            incident(255, "Medium Storm", "2026-02-01T00:00:00Z"),
            incident(256, "Big Flood", "2026-03-01T00:00:00Z"),
            archived,
        ])
        .await
        .expect("upsert");

        let listed = repo.list_incidents().expect("list");
        assert_eq!(
            listed.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![256, 255]
        );
    }
}
