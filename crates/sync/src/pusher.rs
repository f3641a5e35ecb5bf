//! Pushes pending worksite changes to the server.

use std::sync::Arc;

use log::{debug, warn};

use crisiscleanup_api_client::{ApiRetryClass, NetworkDataSource};
use crisiscleanup_core::errors::Result;
use crisiscleanup_core::sync::WorksiteChangeStatus;
use crisiscleanup_storage_sqlite::sync::SyncStateRepository;
use crisiscleanup_storage_sqlite::worksites::WorksiteRepository;

use crate::convert::push_payload_from_worksite;

/// Upper bound of changes drained per cycle.
const PUSH_BATCH_LIMIT: i64 = 100;

/// Retry delay after an auth failure, long enough for a token refresh.
const REAUTH_RETRY_DELAY_SECS: i64 = 30;

/// Accounting for one outbox drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub pushed: usize,
    pub retried: usize,
    pub dead: usize,
    pub reauth_required: bool,
}

/// Drains the worksite change outbox, classifying failures into retries and
/// dead letters.
pub struct WorksiteChangePusher {
    api: Arc<dyn NetworkDataSource>,
    worksites: Arc<WorksiteRepository>,
    sync_state: Arc<SyncStateRepository>,
}

impl WorksiteChangePusher {
    pub fn new(
        api: Arc<dyn NetworkDataSource>,
        worksites: Arc<WorksiteRepository>,
        sync_state: Arc<SyncStateRepository>,
    ) -> Self {
        Self {
            api,
            worksites,
            sync_state,
        }
    }

    /// Push pending changes whose retry window has passed, oldest first.
    ///
    /// The current worksite row is pushed rather than the queued snapshot so
    /// several queued edits of one worksite collapse into the latest state.
    pub async fn push_pending(&self, token: &str) -> Result<PushOutcome> {
        let pending = self.sync_state.list_pending_changes(PUSH_BATCH_LIMIT)?;
        let mut outcome = PushOutcome::default();

        for change in pending {
            let Some(worksite) = self.worksites.get_worksite(&change.worksite_id)? else {
                // The worksite row is gone; the change can never apply.
                self.sync_state
                    .mark_change_dead(
                        change.change_id,
                        Some("Worksite no longer exists locally".to_string()),
                        None,
                    )
                    .await?;
                outcome.dead += 1;
                continue;
            };

            let payload = push_payload_from_worksite(&worksite);
            let pushed = if worksite.is_synced() {
                self.api
                    .update_worksite(token, worksite.network_id, &payload)
                    .await
            } else {
                self.api.create_worksite(token, &payload).await
            };

            match pushed {
                Ok(remote) => {
                    self.worksites
                        .mark_worksite_synced(
                            worksite.id.clone(),
                            remote.id,
                            Some(remote.case_number),
                            remote.updated_at,
                        )
                        .await?;
                    self.sync_state
                        .mark_changes_sent(vec![change.change_id])
                        .await?;
                    outcome.pushed += 1;
                    debug!("[AppSync] Pushed worksite {} as {}", worksite.id, remote.id);
                }
                Err(err) => {
                    let retry_class = err.retry_class();
                    match retry_class {
                        ApiRetryClass::ReauthRequired => {
                            warn!("[AppSync] Auth error during push, stopping drain");
                            self.sync_state
                                .schedule_change_retry(
                                    change.change_id,
                                    Some(REAUTH_RETRY_DELAY_SECS),
                                    Some(err.to_string()),
                                    Some(retry_class.code().to_string()),
                                )
                                .await?;
                            outcome.reauth_required = true;
                            return Ok(outcome);
                        }
                        ApiRetryClass::Retryable => {
                            let status = self
                                .sync_state
                                .schedule_change_retry(
                                    change.change_id,
                                    None,
                                    Some(err.to_string()),
                                    Some(retry_class.code().to_string()),
                                )
                                .await?;
                            if status == WorksiteChangeStatus::Dead {
                                outcome.dead += 1;
                            } else {
                                outcome.retried += 1;
                            }
                        }
                        ApiRetryClass::Permanent => {
                            self.sync_state
                                .mark_change_dead(
                                    change.change_id,
                                    Some(err.to_string()),
                                    Some(retry_class.code().to_string()),
                                )
                                .await?;
                            outcome.dead += 1;
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }
}
