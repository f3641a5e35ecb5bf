//! Shared fixtures for sync crate tests: real SQLite storage in a tempdir
//! and an in-memory network data source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crisiscleanup_api_client::{
    ApiError, NetworkDataSource, NetworkIncident, NetworkWorksiteFull, NetworkWorksiteFullPage,
    NetworkWorksitePage, NetworkWorksiteShort, Result as ApiResult, WorksitePushPayload,
};
use crisiscleanup_storage_sqlite::db::{
    create_pool, init, run_migrations, write_actor::spawn_writer,
};
use crisiscleanup_storage_sqlite::incidents::IncidentRepository;
use crisiscleanup_storage_sqlite::preferences::AppPreferencesRepository;
use crisiscleanup_storage_sqlite::sync::SyncStateRepository;
use crisiscleanup_storage_sqlite::worksites::WorksiteRepository;

use crate::pipeline::SyncCancellation;

pub(crate) struct TestStorage {
    pub incidents: Arc<IncidentRepository>,
    pub worksites: Arc<WorksiteRepository>,
    pub sync_state: Arc<SyncStateRepository>,
    pub preferences: Arc<AppPreferencesRepository>,
}

pub(crate) fn setup_storage() -> TestStorage {
    let app_data = tempfile::tempdir()
        .expect("tempdir")
        .keep()
        .to_string_lossy()
        .to_string();
    let db_path = init(&app_data).expect("init db");
    run_migrations(&db_path).expect("migrate db");
    let pool = create_pool(&db_path).expect("create pool");
    let writer = spawn_writer(pool.as_ref().clone());
    TestStorage {
        incidents: Arc::new(IncidentRepository::new(pool.clone(), writer.clone())),
        worksites: Arc::new(WorksiteRepository::new(pool.clone(), writer.clone())),
        sync_state: Arc::new(SyncStateRepository::new(pool.clone(), writer.clone())),
        preferences: Arc::new(AppPreferencesRepository::new(pool, writer)),
    }
}

pub(crate) fn network_incident(id: i64) -> NetworkIncident {
    NetworkIncident {
        id,
        name: format!("Incident {id}"),
        short_name: format!("incident_{id}"),
        incident_type: "hurricane".to_string(),
        start_at: "2026-03-01T00:00:00Z".to_string(),
        active_phone_number: None,
        turn_on_release: false,
        is_archived: false,
        updated_at: Some("2026-03-01T00:00:00Z".to_string()),
    }
}

pub(crate) fn short_worksite(id: i64, incident: i64, updated_at: &str) -> NetworkWorksiteShort {
    NetworkWorksiteShort {
        id,
        incident,
        name: format!("Worksite {id}"),
        case_number: format!("V{id}"),
        address: "2 Oak Ave".to_string(),
        city: "Harmony".to_string(),
        county: "Iredell".to_string(),
        state: "NC".to_string(),
        postal_code: "28634".to_string(),
        latitude: 35.1,
        longitude: -80.9,
        phone1: String::new(),
        svi: None,
        updated_at: updated_at.to_string(),
        work_types: Vec::new(),
    }
}

pub(crate) fn full_worksite(id: i64, incident: i64, updated_at: &str) -> NetworkWorksiteFull {
    NetworkWorksiteFull {
        id,
        incident,
        name: format!("Worksite {id}"),
        case_number: format!("V{id}"),
        address: "2 Oak Ave".to_string(),
        city: "Harmony".to_string(),
        county: "Iredell".to_string(),
        state: "NC".to_string(),
        postal_code: "28634".to_string(),
        latitude: 35.1,
        longitude: -80.9,
        phone1: String::new(),
        email: Some(format!("resident{id}@example.com")),
        reported_by: None,
        svi: None,
        what3words: None,
        updated_at: updated_at.to_string(),
        work_types: Vec::new(),
        flags: Vec::new(),
        notes: Vec::new(),
    }
}

/// In-memory stand-in for the remote API.
#[derive(Default)]
pub(crate) struct FakeNetworkDataSource {
    pub incidents: Vec<NetworkIncident>,
    pub fail_incidents_status: Option<u16>,
    pub worksites: Vec<NetworkWorksiteShort>,
    pub full_worksites: Vec<NetworkWorksiteFull>,
    pub fail_worksites_status: Option<u16>,
    pub fail_push_status: Option<u16>,
    pub page_calls: AtomicUsize,
    pub push_calls: AtomicUsize,
    /// Cancels the paired flag once the given number of pages has been served.
    pub cancel_after_pages: Mutex<Option<(usize, SyncCancellation)>>,
}

impl FakeNetworkDataSource {
    fn filtered_worksites(
        &self,
        incident_id: i64,
        updated_after: Option<&str>,
    ) -> Vec<NetworkWorksiteShort> {
        let mut matching = self
            .worksites
            .iter()
            .filter(|worksite| worksite.incident == incident_id)
            .filter(|worksite| match updated_after {
                Some(after) => worksite.updated_at.as_str() > after,
                None => true,
            })
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by_key(|worksite| worksite.id);
        matching
    }

    fn full_from_payload(&self, network_id: i64, payload: &WorksitePushPayload) -> NetworkWorksiteFull {
        NetworkWorksiteFull {
            id: network_id,
            incident: payload.incident,
            name: payload.name.clone(),
            case_number: payload
                .case_number
                .clone()
                .unwrap_or_else(|| format!("V{network_id}")),
            address: payload.address.clone(),
            city: payload.city.clone(),
            county: payload.county.clone(),
            state: payload.state.clone(),
            postal_code: payload.postal_code.clone(),
            latitude: payload.latitude,
            longitude: payload.longitude,
            phone1: payload.phone1.clone(),
            email: payload.email.clone(),
            reported_by: None,
            svi: None,
            what3words: payload.what3words.clone(),
            updated_at: "2026-03-02T00:00:00Z".to_string(),
            work_types: payload.work_types.clone(),
            flags: Vec::new(),
            notes: Vec::new(),
        }
    }
}

#[async_trait]
impl NetworkDataSource for FakeNetworkDataSource {
    async fn get_incidents(
        &self,
        _token: &str,
        _updated_after: Option<&str>,
    ) -> ApiResult<Vec<NetworkIncident>> {
        if let Some(status) = self.fail_incidents_status {
            return Err(ApiError::api(status, "fake incidents failure"));
        }
        Ok(self.incidents.clone())
    }

    async fn get_worksites_count(
        &self,
        _token: &str,
        incident_id: i64,
        updated_after: Option<&str>,
    ) -> ApiResult<i64> {
        if let Some(status) = self.fail_worksites_status {
            return Err(ApiError::api(status, "fake worksites failure"));
        }
        Ok(self.filtered_worksites(incident_id, updated_after).len() as i64)
    }

    async fn get_worksites_page(
        &self,
        _token: &str,
        incident_id: i64,
        limit: u32,
        offset: i64,
        updated_after: Option<&str>,
    ) -> ApiResult<NetworkWorksitePage> {
        if let Some(status) = self.fail_worksites_status {
            return Err(ApiError::api(status, "fake worksites failure"));
        }
        let matching = self.filtered_worksites(incident_id, updated_after);
        let start = (offset.max(0) as usize).min(matching.len());
        let end = (start + limit as usize).min(matching.len());
        let page = NetworkWorksitePage {
            count: matching.len() as i64,
            results: matching[start..end].to_vec(),
        };

        let served = self.page_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after_pages, cancellation)) =
            self.cancel_after_pages.lock().expect("lock").as_ref()
        {
            if served >= *after_pages {
                cancellation.cancel();
            }
        }
        Ok(page)
    }

    async fn get_worksites_full_page(
        &self,
        _token: &str,
        incident_id: i64,
        limit: u32,
        offset: i64,
        updated_after: Option<&str>,
    ) -> ApiResult<NetworkWorksiteFullPage> {
        if let Some(status) = self.fail_worksites_status {
            return Err(ApiError::api(status, "fake worksites failure"));
        }
        let mut matching = self
            .full_worksites
            .iter()
            .filter(|worksite| worksite.incident == incident_id)
            .filter(|worksite| match updated_after {
                Some(after) => worksite.updated_at.as_str() > after,
                None => true,
            })
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by_key(|worksite| worksite.id);
        let start = (offset.max(0) as usize).min(matching.len());
        let end = (start + limit as usize).min(matching.len());
        Ok(NetworkWorksiteFullPage {
            count: matching.len() as i64,
            results: matching[start..end].to_vec(),
        })
    }

    async fn create_worksite(
        &self,
        _token: &str,
        payload: &WorksitePushPayload,
    ) -> ApiResult<NetworkWorksiteFull> {
        if let Some(status) = self.fail_push_status {
            return Err(ApiError::api(status, "fake push failure"));
        }
        let network_id = 9_000 + self.push_calls.fetch_add(1, Ordering::SeqCst) as i64;
        Ok(self.full_from_payload(network_id, payload))
    }

    async fn update_worksite(
        &self,
        _token: &str,
        network_id: i64,
        payload: &WorksitePushPayload,
    ) -> ApiResult<NetworkWorksiteFull> {
        if let Some(status) = self.fail_push_status {
            return Err(ApiError::api(status, "fake push failure"));
        }
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.full_from_payload(network_id, payload))
    }
}
