//! Progress reporting seam for sync pipelines.

/// Receives human-readable progress during a sync cycle.
///
/// Implementations typically forward to a notification surface; the default
/// worksites hook is a no-op for callers that only care about status lines.
pub trait SyncReporter: Send + Sync {
    fn on_status(&self, message: &str);

    fn on_worksites_progress(&self, incident_id: i64, paged: i64, total: i64) {
        let _ = (incident_id, paged, total);
    }
}

/// Reporter that forwards progress to the log facade.
#[derive(Debug, Default)]
pub struct LogSyncReporter;

impl SyncReporter for LogSyncReporter {
    fn on_status(&self, message: &str) {
        log::info!("[AppSync] {message}");
    }

    fn on_worksites_progress(&self, incident_id: i64, paged: i64, total: i64) {
        log::debug!("[AppSync] Incident {incident_id} worksites {paged}/{total}");
    }
}
