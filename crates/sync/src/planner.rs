//! Gathers repository state into a sync plan.

use crisiscleanup_core::errors::Result;
use crisiscleanup_core::sync::{
    build_sync_plan, incident_worksites_sync_key, SyncPlan, SyncPlanInput, INCIDENTS_SYNC_KEY,
};
use crisiscleanup_storage_sqlite::incidents::IncidentRepository;
use crisiscleanup_storage_sqlite::preferences::AppPreferencesRepository;
use crisiscleanup_storage_sqlite::sync::SyncStateRepository;

/// Snapshot persisted state and build the plan for one cycle.
pub fn gather_sync_plan(
    incidents: &IncidentRepository,
    sync_state: &SyncStateRepository,
    preferences: &AppPreferencesRepository,
    forced: bool,
    now: i64,
) -> Result<SyncPlan> {
    let prefs = preferences.get()?;
    let has_cached_incidents = incidents.count_incidents()? > 0;
    let incidents_attempt = sync_state.get_attempt(INCIDENTS_SYNC_KEY)?;
    let selected_incident_id = prefs.selected_incident_id;
    let selected_incident_attempt = match selected_incident_id {
        Some(incident_id) => sync_state.get_attempt(&incident_worksites_sync_key(incident_id))?,
        None => None,
    };

    Ok(build_sync_plan(&SyncPlanInput {
        has_cached_incidents,
        incidents_attempt,
        selected_incident_id,
        selected_incident_attempt,
        forced,
        now,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup_storage;
    use chrono::Utc;
    use crisiscleanup_core::incidents::Incident;

    fn incident(id: i64) -> Incident {
        Incident {
            id,
            name: format!("Incident {id}"),
            short_name: format!("incident_{id}"),
            incident_type: "hurricane".to_string(),
            start_at: "2026-03-01T00:00:00Z".to_string(),
            active_phone_number: None,
            turn_on_release: false,
            is_archived: false,
            updated_at: "2026-03-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_cache_plans_incident_pull() {
        let storage = setup_storage();
        let plan = gather_sync_plan(
            &storage.incidents,
            &storage.sync_state,
            &storage.preferences,
            false,
            Utc::now().timestamp(),
        )
        .expect("plan");
        assert!(plan.pull_incidents());
        assert_eq!(plan.pull_worksites_incident(), None);
    }

    #[tokio::test]
    async fn recent_attempt_skips_passive_pull() {
        let storage = setup_storage();
        let now = Utc::now().timestamp();
        storage
            .incidents
            .upsert_incidents(vec![incident(255)])
            .await
            .expect("seed incidents");
        storage
            .sync_state
            .record_attempt_success(INCIDENTS_SYNC_KEY.to_string(), now - 30)
            .await
            .expect("attempt");

        let plan = gather_sync_plan(
            &storage.incidents,
            &storage.sync_state,
            &storage.preferences,
            false,
            now,
        )
        .expect("plan");
        assert!(!plan.requires_sync());
    }

    #[tokio::test]
    async fn selected_incident_is_planned_for_worksites_pull() {
        let storage = setup_storage();
        let now = Utc::now().timestamp();
        storage
            .incidents
            .upsert_incidents(vec![incident(255)])
            .await
            .expect("seed incidents");
        storage
            .preferences
            .set_selected_incident(Some(255))
            .await
            .expect("select");

        let plan = gather_sync_plan(
            &storage.incidents,
            &storage.sync_state,
            &storage.preferences,
            false,
            now,
        )
        .expect("plan");
        assert!(plan.pull_incidents(), "no attempt recorded yet");
        assert_eq!(plan.pull_worksites_incident(), Some(255));
    }

    #[tokio::test]
    async fn forced_plan_ignores_recent_attempts() {
        let storage = setup_storage();
        let now = Utc::now().timestamp();
        storage
            .incidents
            .upsert_incidents(vec![incident(255)])
            .await
            .expect("seed incidents");
        storage
            .preferences
            .set_selected_incident(Some(255))
            .await
            .expect("select");
        storage
            .sync_state
            .record_attempt_success(INCIDENTS_SYNC_KEY.to_string(), now)
            .await
            .expect("attempt");
        storage
            .sync_state
            .record_attempt_success(incident_worksites_sync_key(255), now)
            .await
            .expect("attempt");

        let plan = gather_sync_plan(
            &storage.incidents,
            &storage.sync_state,
            &storage.preferences,
            true,
            now,
        )
        .expect("plan");
        assert!(plan.pull_incidents());
        assert_eq!(plan.pull_worksites_incident(), Some(255));
    }
}
