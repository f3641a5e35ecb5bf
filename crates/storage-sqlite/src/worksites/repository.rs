//! Repository for cached and locally edited worksites.

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use crisiscleanup_core::errors::Result;
use crisiscleanup_core::worksites::{WorkType, Worksite, WorksiteFlag, WorksiteNote};

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::worksites;
use crate::sync::{write_worksite_change, ChangeWriteRequest};

use super::model::WorksiteDB;

fn encode_list<T: serde::Serialize>(values: &[T]) -> Result<Option<String>> {
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(values)?))
}

fn decode_list<T: serde::de::DeserializeOwned>(value: Option<&str>) -> Result<Vec<T>> {
    match value {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(Vec::new()),
    }
}

fn to_worksite(row: WorksiteDB) -> Result<Worksite> {
    Ok(Worksite {
        id: row.id,
        network_id: row.network_id,
        incident_id: row.incident_id,
        name: row.name,
        case_number: row.case_number,
        address: row.address,
        city: row.city,
        county: row.county,
        state: row.state,
        postal_code: row.postal_code,
        latitude: row.latitude,
        longitude: row.longitude,
        phone1: row.phone1,
        email: row.email,
        reported_by: row.reported_by,
        svi: row.svi,
        what3words: row.what3words,
        updated_at: row.updated_at,
        work_types: decode_list::<WorkType>(row.work_types.as_deref())?,
        flags: decode_list::<WorksiteFlag>(row.flags.as_deref())?,
        notes: decode_list::<WorksiteNote>(row.notes.as_deref())?,
        has_full_data: row.has_full_data != 0,
        is_local_modified: row.is_local_modified != 0,
        local_modified_at: row.local_modified_at,
    })
}

fn from_worksite(worksite: &Worksite) -> Result<WorksiteDB> {
    Ok(WorksiteDB {
        id: worksite.id.clone(),
        network_id: worksite.network_id,
        incident_id: worksite.incident_id,
        name: worksite.name.clone(),
        case_number: worksite.case_number.clone(),
        address: worksite.address.clone(),
        city: worksite.city.clone(),
        county: worksite.county.clone(),
        state: worksite.state.clone(),
        postal_code: worksite.postal_code.clone(),
        latitude: worksite.latitude,
        longitude: worksite.longitude,
        phone1: worksite.phone1.clone(),
        email: worksite.email.clone(),
        reported_by: worksite.reported_by,
        svi: worksite.svi,
        what3words: worksite.what3words.clone(),
        updated_at: worksite.updated_at.clone(),
        work_types: encode_list(&worksite.work_types)?,
        flags: encode_list(&worksite.flags)?,
        notes: encode_list(&worksite.notes)?,
        has_full_data: i32::from(worksite.has_full_data),
        is_local_modified: i32::from(worksite.is_local_modified),
        local_modified_at: worksite.local_modified_at.clone(),
    })
}

/// Counts from reconciling one page of pulled worksites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_local_modified: usize,
}

pub struct WorksiteRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl WorksiteRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    pub fn get_worksite(&self, worksite_id: &str) -> Result<Option<Worksite>> {
        let mut conn = get_connection(&self.pool)?;
        let row = worksites::table
            .find(worksite_id)
            .first::<WorksiteDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(to_worksite).transpose()
    }

    pub fn get_worksite_by_network_id(&self, network_id: i64) -> Result<Option<Worksite>> {
        let mut conn = get_connection(&self.pool)?;
        let row = worksites::table
            .filter(worksites::network_id.eq(network_id))
            .first::<WorksiteDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(to_worksite).transpose()
    }

    pub fn list_incident_worksites(&self, incident_id: i64) -> Result<Vec<Worksite>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = worksites::table
            .filter(worksites::incident_id.eq(incident_id))
            .order(worksites::case_number.asc())
            .load::<WorksiteDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_worksite).collect()
    }

    pub fn count_incident_worksites(&self, incident_id: i64) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = worksites::table
            .filter(worksites::incident_id.eq(incident_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    /// Reconcile pulled worksites into the local cache.
    ///
    /// Rows carrying unpushed local edits are left untouched so a pull never
    /// clobbers an edit that has not reached the server yet. A short-data
    /// pull also leaves previously cached full-data columns in place.
    pub async fn reconcile_worksites(
        &self,
        pulled: Vec<Worksite>,
        full_data: bool,
    ) -> Result<ReconcileCounts> {
        if pulled.is_empty() {
            return Ok(ReconcileCounts::default());
        }

        self.writer
            .exec(move |conn| {
                let mut counts = ReconcileCounts::default();
                for worksite in pulled {
                    let existing = worksites::table
                        .filter(worksites::network_id.eq(worksite.network_id))
                        .first::<WorksiteDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    match existing {
                        Some(row) if row.is_local_modified != 0 => {
                            counts.skipped_local_modified += 1;
                        }
                        Some(row) => {
                            apply_pulled_update(conn, &row.id, &worksite, full_data)?;
                            counts.updated += 1;
                        }
                        None => {
                            let mut insert = from_worksite(&worksite)?;
                            if insert.id.is_empty() {
                                insert.id = Uuid::now_v7().to_string();
                            }
                            insert.has_full_data = i32::from(full_data);
                            insert.is_local_modified = 0;
                            insert.local_modified_at = None;
                            diesel::insert_into(worksites::table)
                                .values(&insert)
                                .execute(conn)
                                .map_err(StorageError::from)?;
                            counts.inserted += 1;
                        }
                    }
                }
                Ok(counts)
            })
            .await
    }

    /// Save a local edit and enqueue its outbox change atomically.
    pub async fn save_local_change(&self, worksite: Worksite) -> Result<Worksite> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let mut edited = worksite;
                if edited.id.is_empty() {
                    edited.id = Uuid::now_v7().to_string();
                }
                edited.is_local_modified = true;
                edited.local_modified_at = Some(now);

                let row = from_worksite(&edited)?;
                diesel::insert_into(worksites::table)
                    .values(&row)
                    .on_conflict(worksites::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                write_worksite_change(
                    conn,
                    ChangeWriteRequest::new(
                        edited.id.clone(),
                        edited.incident_id,
                        serde_json::to_value(&edited)?,
                    ),
                )?;
                Ok(edited)
            })
            .await
    }

    /// Record the server-assigned identity after a successful push.
    pub async fn mark_worksite_synced(
        &self,
        worksite_id: String,
        network_id: i64,
        case_number: Option<String>,
        updated_at: String,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(worksites::table.find(&worksite_id))
                    .set((
                        worksites::network_id.eq(network_id),
                        worksites::updated_at.eq(updated_at),
                        worksites::is_local_modified.eq(0),
                        worksites::local_modified_at.eq::<Option<String>>(None),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if let Some(case_number) = case_number {
                    diesel::update(worksites::table.find(&worksite_id))
                        .set(worksites::case_number.eq(case_number))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }
}

fn apply_pulled_update(
    conn: &mut SqliteConnection,
    local_id: &str,
    worksite: &Worksite,
    full_data: bool,
) -> Result<()> {
    let row = from_worksite(worksite)?;
    diesel::update(worksites::table.find(local_id))
        .set((
            worksites::incident_id.eq(row.incident_id),
            worksites::name.eq(row.name),
            worksites::case_number.eq(row.case_number),
            worksites::address.eq(row.address),
            worksites::city.eq(row.city),
            worksites::county.eq(row.county),
            worksites::state.eq(row.state),
            worksites::postal_code.eq(row.postal_code),
            worksites::latitude.eq(row.latitude),
            worksites::longitude.eq(row.longitude),
            worksites::phone1.eq(row.phone1),
            worksites::svi.eq(row.svi),
            worksites::updated_at.eq(row.updated_at),
            worksites::work_types.eq(row.work_types),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;

    if full_data {
        diesel::update(worksites::table.find(local_id))
            .set((
                worksites::email.eq(row.email),
                worksites::reported_by.eq(row.reported_by),
                worksites::what3words.eq(row.what3words),
                worksites::flags.eq(row.flags),
                worksites::notes.eq(row.notes),
                worksites::has_full_data.eq(1),
            ))
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, write_actor::spawn_writer};
    use crate::sync::SyncStateRepository;
    use crisiscleanup_core::sync::WorksiteChangeStatus;
    use crisiscleanup_core::worksites::UNSYNCED_NETWORK_ID;
    use tempfile::tempdir;

    fn setup() -> (WorksiteRepository, SyncStateRepository) {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        (
            WorksiteRepository::new(pool.clone(), writer.clone()),
            SyncStateRepository::new(pool, writer),
        )
    }

    fn pulled_worksite(network_id: i64, name: &str) -> Worksite {
        Worksite {
            id: String::new(),
            network_id,
            incident_id: 255,
            name: name.to_string(),
            case_number: format!("V{network_id}"),
            address: "2 Oak Ave".to_string(),
            city: "Harmony".to_string(),
            county: "Iredell".to_string(),
            state: "NC".to_string(),
            postal_code: "28634".to_string(),
            latitude: 35.1,
            longitude: -80.9,
            phone1: "828-555-0100".to_string(),
            email: None,
            reported_by: None,
            svi: Some(0.6),
            what3words: None,
            updated_at: "2026-03-01T00:00:00Z".to_string(),
            work_types: vec![WorkType {
                id: 1,
                work_type: "muck_out".to_string(),
                status: "open_unassigned".to_string(),
                claimed_by: None,
            }],
            flags: Vec::new(),
            notes: Vec::new(),
            has_full_data: false,
            is_local_modified: false,
            local_modified_at: None,
        }
    }

    #[tokio::test]
    async fn pulled_worksites_insert_then_update() {
        let (repo, _) = setup();

        let counts = repo
            .reconcile_worksites(vec![pulled_worksite(31, "Flooded basement")], false)
            .await
            .expect("reconcile");
        assert_eq!(counts.inserted, 1);

        let counts = repo
            .reconcile_worksites(vec![pulled_worksite(31, "Flooded basement and yard")], false)
            .await
            .expect("reconcile again");
        assert_eq!(counts.updated, 1);
        assert_eq!(repo.count_incident_worksites(255).expect("count"), 1);

        let stored = repo
            .get_worksite_by_network_id(31)
            .expect("get")
            .expect("exists");
        assert_eq!(stored.name, "Flooded basement and yard");
        assert_eq!(stored.work_types.len(), 1);
        assert!(!stored.id.is_empty(), "insert assigns a local id");
    }

    #[tokio::test]
    async fn pull_never_clobbers_local_edits() {
        let (repo, _) = setup();
        repo.reconcile_worksites(vec![pulled_worksite(31, "Flooded basement")], false)
            .await
            .expect("seed");
        let mut edited = repo
            .get_worksite_by_network_id(31)
            .expect("get")
            .expect("exists");
        edited.name = "Edited offline".to_string();
        repo.save_local_change(edited).await.expect("local edit");

        let counts = repo
            .reconcile_worksites(vec![pulled_worksite(31, "Server rename")], false)
            .await
            .expect("reconcile");
        assert_eq!(counts.skipped_local_modified, 1);
        let stored = repo
            .get_worksite_by_network_id(31)
            .expect("get")
            .expect("exists");
        assert_eq!(stored.name, "Edited offline");
    }

    #[tokio::test]
    async fn short_pull_preserves_full_data_columns() {
        let (repo, _) = setup();
        let mut full = pulled_worksite(31, "Flooded basement");
        full.email = Some("resident@example.com".to_string());
        full.flags = vec![WorksiteFlag {
            reason_t: "flag.worksite_high_priority".to_string(),
            is_high_priority: true,
            notes: None,
        }];
        repo.reconcile_worksites(vec![full], true)
            .await
            .expect("full reconcile");

        repo.reconcile_worksites(vec![pulled_worksite(31, "Renamed")], false)
            .await
            .expect("short reconcile");

        let stored = repo
            .get_worksite_by_network_id(31)
            .expect("get")
            .expect("exists");
        assert_eq!(stored.name, "Renamed");
        assert!(stored.has_full_data);
        assert_eq!(stored.email.as_deref(), Some("resident@example.com"));
        assert_eq!(stored.flags.len(), 1);
    }

    #[tokio::test]
    async fn local_change_enqueues_outbox_entry_atomically() {
        let (repo, sync_state) = setup();

        let mut new_case = pulled_worksite(UNSYNCED_NETWORK_ID, "New case");
        new_case.is_local_modified = true;
        let saved = repo.save_local_change(new_case).await.expect("save");
        assert!(!saved.id.is_empty());
        assert!(saved.is_local_modified);

        let pending = sync_state.list_pending_changes(10).expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].worksite_id, saved.id);
        assert_eq!(pending[0].status, WorksiteChangeStatus::Pending);

        let snapshot: Worksite =
            serde_json::from_str(&pending[0].payload).expect("payload parses");
        assert_eq!(snapshot.name, "New case");
    }

    #[tokio::test]
    async fn duplicate_change_id_rolls_back_the_whole_edit() {
        let (repo, sync_state) = setup();

        let outcome = repo
            .writer
            .exec(|conn| {
                let worksite = Worksite {
                    id: "ws-rollback".to_string(),
                    ..pulled_worksite(UNSYNCED_NETWORK_ID, "Rollback case")
                };
                let row = from_worksite(&worksite)?;
                diesel::insert_into(worksites::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let mut request = ChangeWriteRequest::new(
                    "ws-rollback",
                    255,
                    serde_json::json!({ "id": "ws-rollback" }),
                );
                request.change_id = Some("fixed-change-id".to_string());
                write_worksite_change(conn, request.clone())?;
                let _ = write_worksite_change(conn, request)?;
                Ok(())
            })
            .await;
        assert!(outcome.is_err(), "expected duplicate change_id failure");

        assert!(repo
            .get_worksite("ws-rollback")
            .expect("get")
            .is_none(), "worksite insert should be rolled back");
        assert_eq!(sync_state.count_pending_changes().expect("count"), 0);
    }

    #[tokio::test]
    async fn marking_synced_records_network_identity() {
        let (repo, _) = setup();
        let mut new_case = pulled_worksite(UNSYNCED_NETWORK_ID, "New case");
        new_case.case_number = String::new();
        let saved = repo.save_local_change(new_case).await.expect("save");

        repo.mark_worksite_synced(
            saved.id.clone(),
            8_642,
            Some("V8642".to_string()),
            "2026-03-02T00:00:00Z".to_string(),
        )
        .await
        .expect("mark synced");

        let stored = repo.get_worksite(&saved.id).expect("get").expect("exists");
        assert_eq!(stored.network_id, 8_642);
        assert_eq!(stored.case_number, "V8642");
        assert!(!stored.is_local_modified);
        assert_eq!(stored.local_modified_at, None);
    }
}
