//! Immutable sync plan and the passive/forced sync decision.

use super::attempt::SyncAttempt;

/// What a sync cycle should pull.
///
/// Built only through [`SyncPlanBuilder`] so construction stays atomic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pull_incidents: bool,
    pull_worksites_incident: Option<i64>,
}

impl SyncPlan {
    pub fn builder() -> SyncPlanBuilder {
        SyncPlanBuilder::default()
    }

    pub fn pull_incidents(&self) -> bool {
        self.pull_incidents
    }

    pub fn pull_worksites_incident(&self) -> Option<i64> {
        self.pull_worksites_incident
    }

    pub fn requires_sync(&self) -> bool {
        self.pull_incidents || self.pull_worksites_incident.is_some()
    }
}

/// Builder for [`SyncPlan`].
#[derive(Debug, Default)]
pub struct SyncPlanBuilder {
    pull_incidents: bool,
    pull_worksites_incident: Option<i64>,
}

impl SyncPlanBuilder {
    pub fn pull_incidents(mut self) -> Self {
        self.pull_incidents = true;
        self
    }

    pub fn pull_worksites(mut self, incident_id: i64) -> Self {
        self.pull_worksites_incident = Some(incident_id);
        self
    }

    pub fn build(self) -> SyncPlan {
        SyncPlan {
            pull_incidents: self.pull_incidents,
            pull_worksites_incident: self.pull_worksites_incident,
        }
    }
}

/// Snapshot of the state the sync decision depends on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncPlanInput {
    pub has_cached_incidents: bool,
    pub incidents_attempt: Option<SyncAttempt>,
    pub selected_incident_id: Option<i64>,
    pub selected_incident_attempt: Option<SyncAttempt>,
    pub forced: bool,
    /// Epoch seconds.
    pub now: i64,
}

/// Decide what a sync cycle should pull.
///
/// An empty local incident cache always pulls the incident list. Otherwise
/// pulls are gated by each scope's [`SyncAttempt`]; a forced sync includes
/// both pulls and bypasses backoff.
pub fn build_sync_plan(input: &SyncPlanInput) -> SyncPlan {
    let mut builder = SyncPlan::builder();

    let pull_incidents = input.forced
        || !input.has_cached_incidents
        || input
            .incidents_attempt
            .map_or(true, |attempt| attempt.should_sync_passively(input.now));
    if pull_incidents {
        builder = builder.pull_incidents();
    }

    if let Some(incident_id) = input.selected_incident_id {
        let pull_worksites = input.forced
            || input
                .selected_incident_attempt
                .map_or(true, |attempt| attempt.should_sync_passively(input.now));
        if pull_worksites {
            builder = builder.pull_worksites(incident_id);
        }
    }

    builder.build()
}
