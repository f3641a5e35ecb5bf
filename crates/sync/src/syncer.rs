//! App-level sync orchestration: one in-flight job, cancel-and-replace.

use std::sync::Arc;

use chrono::Utc;
use log::debug;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

use crisiscleanup_api_client::NetworkDataSource;
use crisiscleanup_core::device::DeviceCapabilities;
use crisiscleanup_core::sync::SyncResult;
use crisiscleanup_storage_sqlite::incidents::IncidentRepository;
use crisiscleanup_storage_sqlite::preferences::AppPreferencesRepository;
use crisiscleanup_storage_sqlite::sync::SyncStateRepository;
use crisiscleanup_storage_sqlite::worksites::WorksiteRepository;

use crate::cache::IncidentWorksitesCacheRepository;
use crate::pipeline::{SyncCancellation, SyncPipeline};
use crate::planner::gather_sync_plan;
use crate::pusher::WorksiteChangePusher;
use crate::reporter::SyncReporter;

/// Resolve the API base URL from the environment.
pub fn api_base_url_from_env() -> Option<String> {
    std::env::var("CRISIS_CLEANUP_API_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
}

/// Static configuration for a syncer instance.
#[derive(Debug, Clone)]
pub struct SyncerConfig {
    pub api_base_url: String,
    pub access_token: String,
    pub app_build_version_code: i64,
    pub capabilities: DeviceCapabilities,
}

struct InFlightSync {
    abort: AbortHandle,
    cancellation: SyncCancellation,
}

pub(crate) struct SyncerInner {
    pub(crate) pipeline: SyncPipeline,
    pub(crate) incidents: Arc<IncidentRepository>,
    pub(crate) sync_state: Arc<SyncStateRepository>,
    pub(crate) preferences: Arc<AppPreferencesRepository>,
    sync_job: Mutex<Option<InFlightSync>>,
    pub(crate) background_task: Mutex<Option<JoinHandle<()>>>,
}

/// Orchestrates sync cycles for the app.
///
/// At most one sync job runs per instance; a new request cancels and
/// replaces any in-flight one.
#[derive(Clone)]
pub struct AppSyncer {
    pub(crate) inner: Arc<SyncerInner>,
}

impl AppSyncer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<dyn NetworkDataSource>,
        incidents: Arc<IncidentRepository>,
        worksites: Arc<WorksiteRepository>,
        sync_state: Arc<SyncStateRepository>,
        preferences: Arc<AppPreferencesRepository>,
        reporter: Arc<dyn SyncReporter>,
        config: SyncerConfig,
    ) -> Self {
        let cache = Arc::new(IncidentWorksitesCacheRepository::new(
            api.clone(),
            worksites.clone(),
            sync_state.clone(),
            config.capabilities,
            reporter.clone(),
            config.app_build_version_code,
        ));
        let pusher = Arc::new(WorksiteChangePusher::new(
            api.clone(),
            worksites,
            sync_state.clone(),
        ));
        let pipeline = SyncPipeline::new(
            api,
            incidents.clone(),
            sync_state.clone(),
            cache,
            pusher,
            reporter,
            config,
        );

        Self {
            inner: Arc::new(SyncerInner {
                pipeline,
                incidents,
                sync_state,
                preferences,
                sync_job: Mutex::new(None),
                background_task: Mutex::new(None),
            }),
        }
    }

    /// Start a sync cycle, cancelling any in-flight one.
    pub async fn request_sync(&self, forced: bool) {
        let _ = self.spawn_sync(forced).await;
    }

    /// Start a sync cycle and wait for its result.
    ///
    /// Returns `NotAttempted` when another request replaces this cycle
    /// before it finishes.
    pub async fn sync_and_wait(&self, forced: bool) -> SyncResult {
        let handle = self.spawn_sync(forced).await;
        handle.await.unwrap_or(SyncResult::NotAttempted {
            reason: "Cancelled".to_string(),
        })
    }

    /// Run a passive cycle only when no job is already in flight.
    pub(crate) async fn passive_sync_and_wait(&self) -> Option<SyncResult> {
        let handle = {
            let mut guard = self.inner.sync_job.lock().await;
            if let Some(in_flight) = guard.as_ref() {
                if !in_flight.abort.is_finished() {
                    debug!("[AppSync] Skipping passive cycle; sync already in flight");
                    return None;
                }
            }
            let (handle, in_flight) = spawn_sync_job(Arc::clone(&self.inner), false);
            *guard = Some(in_flight);
            handle
        };
        Some(handle.await.unwrap_or(SyncResult::NotAttempted {
            reason: "Cancelled".to_string(),
        }))
    }

    async fn spawn_sync(&self, forced: bool) -> JoinHandle<SyncResult> {
        let mut guard = self.inner.sync_job.lock().await;
        if let Some(previous) = guard.take() {
            debug!("[AppSync] Replacing in-flight sync job");
            previous.cancellation.cancel();
            previous.abort.abort();
        }
        let (handle, in_flight) = spawn_sync_job(Arc::clone(&self.inner), forced);
        *guard = Some(in_flight);
        handle
    }
}

fn spawn_sync_job(
    inner: Arc<SyncerInner>,
    forced: bool,
) -> (JoinHandle<SyncResult>, InFlightSync) {
    let cancellation = SyncCancellation::new();
    let job_cancellation = cancellation.clone();
    let handle = tokio::spawn(async move { run_sync_cycle(inner, forced, job_cancellation).await });
    let in_flight = InFlightSync {
        abort: handle.abort_handle(),
        cancellation,
    };
    (handle, in_flight)
}

async fn run_sync_cycle(
    inner: Arc<SyncerInner>,
    forced: bool,
    cancellation: SyncCancellation,
) -> SyncResult {
    let preferences = match inner.preferences.get() {
        Ok(preferences) => preferences,
        Err(err) => {
            return SyncResult::Error {
                message: format!("Failed to read preferences: {err}"),
            }
        }
    };
    if preferences.sync_paused && !forced {
        return SyncResult::NotAttempted {
            reason: "Passive sync is paused".to_string(),
        };
    }

    let plan = match gather_sync_plan(
        &inner.incidents,
        &inner.sync_state,
        &inner.preferences,
        forced,
        Utc::now().timestamp(),
    ) {
        Ok(plan) => plan,
        Err(err) => {
            return SyncResult::Error {
                message: format!("Failed to plan sync: {err}"),
            }
        }
    };

    inner.pipeline.execute(&plan, &cancellation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::LogSyncReporter;
    use crate::testing::{network_incident, setup_storage, FakeNetworkDataSource, TestStorage};

    const APP_BUILD: i64 = 190;

    fn syncer_with(api: Arc<FakeNetworkDataSource>, storage: &TestStorage) -> AppSyncer {
        let config = SyncerConfig {
            api_base_url: "https://api.test.local".to_string(),
            access_token: "token".to_string(),
            app_build_version_code: APP_BUILD,
            capabilities: DeviceCapabilities::new(2_048, false),
        };
        AppSyncer::new(
            api,
            storage.incidents.clone(),
            storage.worksites.clone(),
            storage.sync_state.clone(),
            storage.preferences.clone(),
            Arc::new(LogSyncReporter),
            config,
        )
    }

    #[tokio::test]
    async fn sync_and_wait_runs_a_cycle() {
        let storage = setup_storage();
        let api = Arc::new(FakeNetworkDataSource {
            incidents: vec![network_incident(255)],
            ..Default::default()
        });
        let syncer = syncer_with(api, &storage);

        let result = syncer.sync_and_wait(false).await;
        assert!(result.is_success(), "unexpected result: {result}");
        assert_eq!(storage.incidents.count_incidents().expect("count"), 1);
    }

    #[tokio::test]
    async fn paused_preferences_block_passive_but_not_forced_sync() {
        let storage = setup_storage();
        storage
            .preferences
            .set_sync_paused(true)
            .await
            .expect("pause");
        let api = Arc::new(FakeNetworkDataSource {
            incidents: vec![network_incident(255)],
            ..Default::default()
        });
        let syncer = syncer_with(api, &storage);

        let passive = syncer.sync_and_wait(false).await;
        assert_eq!(
            passive,
            SyncResult::NotAttempted {
                reason: "Passive sync is paused".to_string()
            }
        );
        assert_eq!(storage.incidents.count_incidents().expect("count"), 0);

        let forced = syncer.sync_and_wait(true).await;
        assert!(forced.is_success(), "unexpected result: {forced}");
        assert_eq!(storage.incidents.count_incidents().expect("count"), 1);
    }

    #[tokio::test]
    async fn missing_token_surfaces_preconditions_not_met() {
        let storage = setup_storage();
        let api = Arc::new(FakeNetworkDataSource {
            incidents: vec![network_incident(255)],
            ..Default::default()
        });
        let config = SyncerConfig {
            api_base_url: "https://api.test.local".to_string(),
            access_token: String::new(),
            app_build_version_code: APP_BUILD,
            capabilities: DeviceCapabilities::default(),
        };
        let syncer = AppSyncer::new(
            api,
            storage.incidents.clone(),
            storage.worksites.clone(),
            storage.sync_state.clone(),
            storage.preferences.clone(),
            Arc::new(LogSyncReporter),
            config,
        );

        assert_eq!(
            syncer.sync_and_wait(false).await,
            SyncResult::PreconditionsNotMet
        );
    }

    #[tokio::test]
    async fn new_request_replaces_the_in_flight_job() {
        let storage = setup_storage();
        let api = Arc::new(FakeNetworkDataSource {
            incidents: vec![network_incident(255)],
            ..Default::default()
        });
        let syncer = syncer_with(api, &storage);

        let first = syncer.spawn_sync(false).await;
        let second = syncer.spawn_sync(true).await;

        let first_result = first.await.unwrap_or(SyncResult::NotAttempted {
            reason: "Cancelled".to_string(),
        });
        let second_result = second.await.expect("second job completes");
        assert!(second_result.is_success(), "{second_result}");
        // The first job either finished before the replacement or was
        // cancelled; it can never report a late failure over the winner.
        assert!(
            matches!(
                first_result,
                SyncResult::Success { .. } | SyncResult::NotAttempted { .. }
            ),
            "{first_result}"
        );
    }
}
