//! Seam between the sync engine and the remote API.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    NetworkIncident, NetworkWorksiteFull, NetworkWorksiteFullPage, NetworkWorksitePage,
    WorksitePushPayload,
};

/// Remote operations the sync engine depends on.
///
/// Implemented by [`crate::CrisisCleanupClient`]; tests substitute in-memory
/// fakes.
#[async_trait]
pub trait NetworkDataSource: Send + Sync {
    /// List incidents, optionally only those updated after the given instant.
    async fn get_incidents(
        &self,
        token: &str,
        updated_after: Option<&str>,
    ) -> Result<Vec<NetworkIncident>>;

    /// Server-side worksite count for an incident (optionally delta-scoped).
    async fn get_worksites_count(
        &self,
        token: &str,
        incident_id: i64,
        updated_after: Option<&str>,
    ) -> Result<i64>;

    /// One page of short worksites for an incident.
    async fn get_worksites_page(
        &self,
        token: &str,
        incident_id: i64,
        limit: u32,
        offset: i64,
        updated_after: Option<&str>,
    ) -> Result<NetworkWorksitePage>;

    /// One page of full worksite records for an incident.
    async fn get_worksites_full_page(
        &self,
        token: &str,
        incident_id: i64,
        limit: u32,
        offset: i64,
        updated_after: Option<&str>,
    ) -> Result<NetworkWorksiteFullPage>;

    /// Create a worksite; the server assigns id and case number.
    async fn create_worksite(
        &self,
        token: &str,
        payload: &WorksitePushPayload,
    ) -> Result<NetworkWorksiteFull>;

    /// Update an existing worksite by its network id.
    async fn update_worksite(
        &self,
        token: &str,
        network_id: i64,
        payload: &WorksitePushPayload,
    ) -> Result<NetworkWorksiteFull>;
}
