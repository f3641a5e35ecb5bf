//! Periodic passive sync loop.

use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};

use crisiscleanup_core::sync::{
    SyncResult, APP_SYNC_INTERVAL_JITTER_SECS, APP_SYNC_PERIODIC_INTERVAL_SECS,
    BACKGROUND_UNMET_PRECONDITION_LIMIT, PENDING_CHANGE_SLEEP_BOUND_MS,
};

use crate::syncer::AppSyncer;

impl AppSyncer {
    /// Spawn the periodic passive sync loop if it is not already running.
    pub async fn ensure_background_started(&self) {
        let mut guard = self.inner.background_task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
            // Loop stopped (repeated unmet preconditions); clear and respawn.
            guard.take();
        }

        let syncer = self.clone();
        let handle = tokio::spawn(async move {
            let mut consecutive_unmet: u32 = 0;
            loop {
                match syncer.passive_sync_and_wait().await {
                    None => {
                        debug!("[AppSync] Passive cycle skipped; a sync is already running");
                    }
                    Some(result) => {
                        debug!("[AppSync] Passive cycle finished: {result}");
                        if matches!(result, SyncResult::PreconditionsNotMet) {
                            consecutive_unmet += 1;
                            if consecutive_unmet >= BACKGROUND_UNMET_PRECONDITION_LIMIT {
                                info!(
                                    "[AppSync] {consecutive_unmet} consecutive cycles with unmet \
                                     preconditions. Stopping background loop."
                                );
                                break;
                            }
                        } else {
                            consecutive_unmet = 0;
                        }
                        if let SyncResult::Error { message } = &result {
                            warn!("[AppSync] Passive cycle failed: {message}");
                        }
                    }
                }

                tokio::time::sleep(Duration::from_millis(syncer.next_cycle_delay_ms())).await;
            }
        });
        *guard = Some(handle);
    }

    /// Stop the periodic loop if it is running.
    pub async fn ensure_background_stopped(&self) {
        let mut guard = self.inner.background_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }

    /// Sleep before the next passive cycle: the periodic interval plus
    /// deterministic jitter, shortened while outbox changes are waiting.
    fn next_cycle_delay_ms(&self) -> u64 {
        let jitter_bound = APP_SYNC_INTERVAL_JITTER_SECS.saturating_mul(1_000);
        let jitter_ms = if jitter_bound > 0 {
            Utc::now().timestamp_millis().unsigned_abs() % jitter_bound
        } else {
            0
        };
        let mut delay_ms = APP_SYNC_PERIODIC_INTERVAL_SECS.saturating_mul(1_000) + jitter_ms;

        match self.inner.sync_state.count_pending_changes() {
            Ok(pending) if pending > 0 => {
                delay_ms = delay_ms.min(PENDING_CHANGE_SLEEP_BOUND_MS + (jitter_ms % 500));
            }
            Ok(_) => {}
            Err(err) => {
                warn!("[AppSync] Failed to count pending changes: {err}");
            }
        }
        delay_ms
    }
}
