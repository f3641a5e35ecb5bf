//! Incremental and full caching of an incident's worksites.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::debug;

use crisiscleanup_api_client::{ApiError, NetworkDataSource};
use crisiscleanup_core::device::{DeviceCapabilities, FULL_PAGE_SIZE, MIN_PAGE_SIZE};
use crisiscleanup_core::errors::{Error, Result};
use crisiscleanup_core::sync::{incident_worksites_sync_key, pull_strategy, CachePull};
use crisiscleanup_storage_sqlite::sync::SyncStateRepository;
use crisiscleanup_storage_sqlite::worksites::WorksiteRepository;

use crate::convert::{worksite_from_full, worksite_from_short};
use crate::pipeline::SyncCancellation;
use crate::reporter::SyncReporter;

/// A page slower than this shrinks subsequent requests.
const SLOW_PAGE_SECS: f64 = 15.0;
/// A page faster than this grows subsequent requests.
const FAST_PAGE_SECS: f64 = 3.0;

/// Grows and shrinks page sizes from observed page latency.
#[derive(Debug, Clone)]
struct AdaptivePageSizer {
    current: u32,
    max: u32,
}

impl AdaptivePageSizer {
    fn new(initial: u32) -> Self {
        Self {
            current: initial.max(MIN_PAGE_SIZE),
            max: initial.max(MIN_PAGE_SIZE),
        }
    }

    fn page_size(&self) -> u32 {
        self.current
    }

    fn record(&mut self, elapsed_secs: f64) {
        if elapsed_secs > SLOW_PAGE_SECS {
            self.current = (self.current / 2).max(MIN_PAGE_SIZE);
        } else if elapsed_secs < FAST_PAGE_SECS {
            self.current = self.current.saturating_mul(3).div_euclid(2).min(self.max);
        }
    }
}

/// Outcome of a worksites cache pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Completed { pulled: usize, full_pulled: usize },
    /// Cancelled mid-pass; `paged_count` is persisted for resume.
    Interrupted { paged_count: i64 },
}

/// Pulls one incident's worksites into the local cache in stages: a short
/// pass everyone runs, then a full-data pass on capable devices.
pub struct IncidentWorksitesCacheRepository {
    api: Arc<dyn NetworkDataSource>,
    worksites: Arc<WorksiteRepository>,
    sync_state: Arc<SyncStateRepository>,
    capabilities: DeviceCapabilities,
    reporter: Arc<dyn SyncReporter>,
    app_build_version_code: i64,
}

impl IncidentWorksitesCacheRepository {
    pub fn new(
        api: Arc<dyn NetworkDataSource>,
        worksites: Arc<WorksiteRepository>,
        sync_state: Arc<SyncStateRepository>,
        capabilities: DeviceCapabilities,
        reporter: Arc<dyn SyncReporter>,
        app_build_version_code: i64,
    ) -> Self {
        Self {
            api,
            worksites,
            sync_state,
            capabilities,
            reporter,
            app_build_version_code,
        }
    }

    /// Run a cache pass and record the attempt outcome.
    ///
    /// An interrupted pass records neither success nor failure so the next
    /// passive cycle resumes without a backoff penalty.
    pub async fn sync_incident_worksites(
        &self,
        token: &str,
        incident_id: i64,
        cancellation: &SyncCancellation,
    ) -> Result<CacheOutcome> {
        let attempt_key = incident_worksites_sync_key(incident_id);
        let outcome = self.run_cache_pass(token, incident_id, cancellation).await;
        match &outcome {
            Ok(CacheOutcome::Completed { .. }) => {
                self.sync_state
                    .record_attempt_success(attempt_key, Utc::now().timestamp())
                    .await?;
            }
            Ok(CacheOutcome::Interrupted { paged_count }) => {
                debug!(
                    "[AppSync] Incident {incident_id} worksite caching interrupted at {paged_count}"
                );
            }
            Err(_) => {
                self.sync_state
                    .record_attempt_failure(attempt_key, Utc::now().timestamp())
                    .await?;
            }
        }
        outcome
    }

    async fn run_cache_pass(
        &self,
        token: &str,
        incident_id: i64,
        cancellation: &SyncCancellation,
    ) -> Result<CacheOutcome> {
        let stats = self.sync_state.get_worksite_sync_stats(incident_id)?;
        let strategy = pull_strategy(stats.as_ref(), self.app_build_version_code);
        let full_synced_at = stats.as_ref().and_then(|s| s.full_synced_at.clone());

        let (updated_after, mut paged) = match &strategy {
            CachePull::FullPage { resume_offset } => (None, *resume_offset),
            CachePull::DeltaSince { after } => (Some(after.clone()), 0),
        };

        let data_count = self
            .api
            .get_worksites_count(token, incident_id, updated_after.as_deref())
            .await
            .map_err(to_network_error)?;
        self.sync_state
            .begin_worksite_sync(
                incident_id,
                data_count,
                paged,
                self.app_build_version_code,
                Utc::now().to_rfc3339(),
            )
            .await?;

        let mut sizer = AdaptivePageSizer::new(self.capabilities.short_page_size());
        let mut pulled = 0usize;

        while paged < data_count {
            if cancellation.is_cancelled() {
                return Ok(CacheOutcome::Interrupted { paged_count: paged });
            }

            let fetch_started = Instant::now();
            let page = self
                .api
                .get_worksites_page(
                    token,
                    incident_id,
                    sizer.page_size(),
                    paged,
                    updated_after.as_deref(),
                )
                .await
                .map_err(to_network_error)?;
            sizer.record(fetch_started.elapsed().as_secs_f64());

            if page.results.is_empty() {
                break;
            }
            let page_len = page.results.len();
            let pulled_worksites = page
                .results
                .into_iter()
                .map(worksite_from_short)
                .collect::<Vec<_>>();
            let counts = self
                .worksites
                .reconcile_worksites(pulled_worksites, false)
                .await?;
            if counts.skipped_local_modified > 0 {
                debug!(
                    "[AppSync] Kept {} locally modified worksites during pull",
                    counts.skipped_local_modified
                );
            }

            paged += page_len as i64;
            pulled += page_len;
            self.sync_state
                .record_paged_progress(incident_id, paged)
                .await?;
            self.reporter
                .on_worksites_progress(incident_id, paged, data_count);
        }

        self.sync_state
            .mark_worksites_synced(incident_id, Utc::now().to_rfc3339())
            .await?;

        let mut full_pulled = 0usize;
        if self.capabilities.allows_full_caching() {
            let (pulled_count, completed) = self
                .pull_full_worksites(token, incident_id, full_synced_at.as_deref(), cancellation)
                .await?;
            full_pulled = pulled_count;
            if completed {
                self.sync_state
                    .mark_worksites_full_synced(incident_id, Utc::now().to_rfc3339())
                    .await?;
            } else {
                return Ok(CacheOutcome::Interrupted { paged_count: paged });
            }
        } else {
            debug!(
                "[AppSync] Skipping full worksite data for incident {incident_id} on this device"
            );
        }

        Ok(CacheOutcome::Completed {
            pulled,
            full_pulled,
        })
    }

    /// Returns pulled count and whether the pass ran to completion.
    async fn pull_full_worksites(
        &self,
        token: &str,
        incident_id: i64,
        updated_after: Option<&str>,
        cancellation: &SyncCancellation,
    ) -> Result<(usize, bool)> {
        let mut offset = 0i64;
        let mut pulled = 0usize;
        loop {
            if cancellation.is_cancelled() {
                return Ok((pulled, false));
            }

            let page = self
                .api
                .get_worksites_full_page(token, incident_id, FULL_PAGE_SIZE, offset, updated_after)
                .await
                .map_err(to_network_error)?;
            if page.results.is_empty() {
                return Ok((pulled, true));
            }

            let page_len = page.results.len();
            let pulled_worksites = page
                .results
                .into_iter()
                .map(worksite_from_full)
                .collect::<Vec<_>>();
            self.worksites
                .reconcile_worksites(pulled_worksites, true)
                .await?;

            pulled += page_len;
            offset += page_len as i64;
            if offset >= page.count {
                return Ok((pulled, true));
            }
        }
    }
}

fn to_network_error(err: ApiError) -> Error {
    Error::Network(err.to_string())
}
