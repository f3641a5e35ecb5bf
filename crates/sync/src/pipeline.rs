//! Staged sync execution: push changes, pull incidents, pull worksites.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::warn;

use crisiscleanup_api_client::NetworkDataSource;
use crisiscleanup_core::errors::{Error, Result};
use crisiscleanup_core::incidents::Incident;
use crisiscleanup_core::sync::{SyncPlan, SyncResult, INCIDENTS_SYNC_KEY};
use crisiscleanup_storage_sqlite::incidents::IncidentRepository;
use crisiscleanup_storage_sqlite::sync::SyncStateRepository;

use crate::cache::{CacheOutcome, IncidentWorksitesCacheRepository};
use crate::convert::incident_from_network;
use crate::pusher::WorksiteChangePusher;
use crate::reporter::SyncReporter;
use crate::syncer::SyncerConfig;

/// Cooperative cancellation flag shared between the syncer and a running
/// pipeline.
#[derive(Debug, Clone, Default)]
pub struct SyncCancellation(Arc<AtomicBool>);

impl SyncCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes a [`SyncPlan`] stage by stage, mapping failures into typed
/// results instead of raw errors.
pub struct SyncPipeline {
    api: Arc<dyn NetworkDataSource>,
    incidents: Arc<IncidentRepository>,
    sync_state: Arc<SyncStateRepository>,
    cache: Arc<IncidentWorksitesCacheRepository>,
    pusher: Arc<WorksiteChangePusher>,
    reporter: Arc<dyn SyncReporter>,
    config: SyncerConfig,
}

impl SyncPipeline {
    pub fn new(
        api: Arc<dyn NetworkDataSource>,
        incidents: Arc<IncidentRepository>,
        sync_state: Arc<SyncStateRepository>,
        cache: Arc<IncidentWorksitesCacheRepository>,
        pusher: Arc<WorksiteChangePusher>,
        reporter: Arc<dyn SyncReporter>,
        config: SyncerConfig,
    ) -> Self {
        Self {
            api,
            incidents,
            sync_state,
            cache,
            pusher,
            reporter,
            config,
        }
    }

    /// Run a plan to completion.
    ///
    /// Stage order: push pending changes, pull incidents, pull worksites,
    /// with a cancellation check between stages.
    pub async fn execute(&self, plan: &SyncPlan, cancellation: &SyncCancellation) -> SyncResult {
        if !plan.requires_sync() {
            return SyncResult::NotAttempted {
                reason: "Nothing to sync".to_string(),
            };
        }
        if self.config.api_base_url.trim().is_empty()
            || self.config.access_token.trim().is_empty()
        {
            return SyncResult::PreconditionsNotMet;
        }

        let mut notes: Vec<String> = Vec::new();
        let mut any_success = false;
        let mut failures = 0usize;
        let mut partial = false;

        // Local edits go out before pulls so a pull cannot resurrect the
        // server's stale copy of a freshly edited worksite.
        match self.pusher.push_pending(&self.config.access_token).await {
            Ok(outcome) => {
                if outcome.reauth_required {
                    return SyncResult::Error {
                        message: "Authentication required".to_string(),
                    };
                }
                if outcome.pushed > 0 {
                    any_success = true;
                    notes.push(format!("pushed {} changes", outcome.pushed));
                }
                if outcome.retried > 0 || outcome.dead > 0 {
                    partial = true;
                    notes.push(format!(
                        "{} changes deferred, {} dead",
                        outcome.retried, outcome.dead
                    ));
                }
            }
            Err(err) => {
                warn!("[AppSync] Change push failed: {err}");
                partial = true;
                notes.push(format!("push failed: {err}"));
            }
        }

        if cancellation.is_cancelled() {
            return cancelled_result(notes, any_success);
        }

        if plan.pull_incidents() {
            self.reporter.on_status("Syncing incidents");
            match self.pull_incidents().await {
                Ok(count) => {
                    any_success = true;
                    notes.push(format!("pulled {count} incidents"));
                }
                Err(err) => {
                    warn!("[AppSync] Incident pull failed: {err}");
                    failures += 1;
                    notes.push(format!("incidents failed: {err}"));
                }
            }
        }

        if cancellation.is_cancelled() {
            return cancelled_result(notes, any_success);
        }

        if let Some(incident_id) = plan.pull_worksites_incident() {
            let label = self
                .incidents
                .get_incident(incident_id)
                .ok()
                .flatten()
                .map(|incident| incident.display_label().to_string())
                .unwrap_or_else(|| format!("incident {incident_id}"));
            self.reporter
                .on_status(&format!("Syncing {label} worksites"));

            match self
                .cache
                .sync_incident_worksites(&self.config.access_token, incident_id, cancellation)
                .await
            {
                Ok(CacheOutcome::Completed {
                    pulled,
                    full_pulled,
                }) => {
                    any_success = true;
                    notes.push(format!(
                        "pulled {pulled} worksites ({full_pulled} full)"
                    ));
                }
                Ok(CacheOutcome::Interrupted { paged_count }) => {
                    partial = true;
                    notes.push(format!("worksites interrupted at {paged_count}"));
                }
                Err(err) => {
                    warn!("[AppSync] Worksite pull failed: {err}");
                    failures += 1;
                    notes.push(format!("worksites failed: {err}"));
                }
            }
        }

        let notes = notes.join("; ");
        if failures > 0 && !any_success {
            SyncResult::Error { message: notes }
        } else if failures > 0 || partial {
            SyncResult::Partial { notes }
        } else {
            SyncResult::Success { notes }
        }
    }

    async fn pull_incidents(&self) -> Result<usize> {
        let attempted_at = Utc::now().timestamp();
        match self.api.get_incidents(&self.config.access_token, None).await {
            Ok(pulled) => {
                let incidents: Vec<Incident> =
                    pulled.into_iter().map(incident_from_network).collect();
                let count = self.incidents.upsert_incidents(incidents).await?;
                self.sync_state
                    .record_attempt_success(INCIDENTS_SYNC_KEY.to_string(), Utc::now().timestamp())
                    .await?;
                Ok(count)
            }
            Err(err) => {
                self.sync_state
                    .record_attempt_failure(INCIDENTS_SYNC_KEY.to_string(), attempted_at)
                    .await?;
                Err(Error::Network(err.to_string()))
            }
        }
    }
}

fn cancelled_result(notes: Vec<String>, any_success: bool) -> SyncResult {
    if any_success {
        let mut notes = notes;
        notes.push("cancelled".to_string());
        SyncResult::Partial {
            notes: notes.join("; "),
        }
    } else {
        SyncResult::NotAttempted {
            reason: "Cancelled".to_string(),
        }
    }
}
