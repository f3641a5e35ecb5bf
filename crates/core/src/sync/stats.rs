//! Per-incident worksite sync bookkeeping.

use serde::{Deserialize, Serialize};

/// How a worksites pull for an incident should proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePull {
    /// Page through all short worksites starting at the given offset.
    FullPage { resume_offset: i64 },
    /// Pull only worksites updated after the given RFC3339 instant.
    DeltaSince { after: String },
}

/// Tracks one incident's worksite caching progress across sync cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksiteSyncStats {
    pub incident_id: i64,
    /// RFC3339 instant the current (or last) pass started.
    pub sync_started_at: String,
    /// Server-reported worksite count at pass start.
    pub data_count: i64,
    /// Short worksites persisted so far; doubles as the resume offset.
    pub paged_count: i64,
    pub successful_sync_at: Option<String>,
    pub full_synced_at: Option<String>,
    pub attempted_sync_at: Option<String>,
    pub attempted_counter: i32,
    /// App build the cached data was written under.
    pub app_build_version_code: i64,
}

impl WorksiteSyncStats {
    pub fn is_short_pass_complete(&self) -> bool {
        self.successful_sync_at.is_some() && self.paged_count >= self.data_count
    }
}

/// Decide between an incremental delta pull and a (possibly resumed) full
/// paging pass.
pub fn pull_strategy(stats: Option<&WorksiteSyncStats>, app_build_version_code: i64) -> CachePull {
    let Some(stats) = stats else {
        return CachePull::FullPage { resume_offset: 0 };
    };
    // Cached data from another app build may predate local schema changes.
    if stats.app_build_version_code != app_build_version_code {
        return CachePull::FullPage { resume_offset: 0 };
    }
    match &stats.successful_sync_at {
        Some(after) if stats.is_short_pass_complete() => CachePull::DeltaSince {
            after: after.clone(),
        },
        _ => CachePull::FullPage {
            resume_offset: stats.paged_count.max(0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_BUILD: i64 = 190;

    fn stats() -> WorksiteSyncStats {
        WorksiteSyncStats {
            incident_id: 255,
            sync_started_at: "2026-03-01T00:00:00Z".to_string(),
            data_count: 120,
            paged_count: 120,
            successful_sync_at: Some("2026-03-01T00:10:00Z".to_string()),
            full_synced_at: None,
            attempted_sync_at: Some("2026-03-01T00:00:00Z".to_string()),
            attempted_counter: 0,
            app_build_version_code: APP_BUILD,
        }
    }

    #[test]
    fn missing_stats_pull_everything() {
        assert_eq!(
            pull_strategy(None, APP_BUILD),
            CachePull::FullPage { resume_offset: 0 }
        );
    }

    #[test]
    fn completed_pass_pulls_delta() {
        assert_eq!(
            pull_strategy(Some(&stats()), APP_BUILD),
            CachePull::DeltaSince {
                after: "2026-03-01T00:10:00Z".to_string()
            }
        );
    }

    #[test]
    fn interrupted_pass_resumes_at_paged_count() {
        let mut interrupted = stats();
        interrupted.paged_count = 40;
        interrupted.successful_sync_at = None;
        assert_eq!(
            pull_strategy(Some(&interrupted), APP_BUILD),
            CachePull::FullPage { resume_offset: 40 }
        );
    }

    #[test]
    fn app_build_change_invalidates_cached_progress() {
        assert_eq!(
            pull_strategy(Some(&stats()), APP_BUILD + 1),
            CachePull::FullPage { resume_offset: 0 }
        );
    }
}
