//! HTTP client for the Crisis Cleanup REST API.

use async_trait::async_trait;
use log::debug;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tokio::time::sleep;

use crate::data_source::NetworkDataSource;
use crate::error::{ApiError, Result};
use crate::types::{
    ApiErrorResponse, NetworkIncident, NetworkIncidentsResult, NetworkWorksiteFull,
    NetworkWorksiteFullPage, NetworkWorksitePage, WorksitePushPayload,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;
const GET_MAX_ATTEMPTS: usize = 3;
const GET_BASE_BACKOFF_MS: u64 = 250;
const GET_MAX_BACKOFF_MS: u64 = 4_000;

/// Fields requested for short worksite pages.
const SHORT_WORKSITE_FIELDS: &str = "id,incident,name,case_number,address,city,county,state,\
                                     postal_code,latitude,longitude,phone1,svi,updated_at,work_types";

fn is_retryable_transport_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

fn is_retryable_get_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

fn is_retryable_get_error(err: &ApiError) -> bool {
    match err {
        ApiError::Api { status, .. } => is_retryable_get_status(*status),
        ApiError::Http(inner) => is_retryable_transport_error(inner),
        _ => false,
    }
}

fn get_backoff_with_jitter(attempt: usize) -> Duration {
    let exp = (attempt.saturating_sub(1) as u32).min(8);
    let backoff = (GET_BASE_BACKOFF_MS.saturating_mul(1_u64 << exp)).min(GET_MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=(backoff / 5).max(1));
    Duration::from_millis(backoff.saturating_add(jitter))
}

/// Client for the Crisis Cleanup cloud API.
#[derive(Debug, Clone)]
pub struct CrisisCleanupClient {
    client: reqwest::Client,
    base_url: String,
}

impl CrisisCleanupClient {
    /// Create a new API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the API (e.g., "https://api.crisiscleanup.org")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ApiError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(ApiError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            ApiError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .headers(self.headers(token)?)
            .query(query)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// GET with bounded retries for transient failures.
    async fn get_json_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.get_json(token, path, query).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < GET_MAX_ATTEMPTS && is_retryable_get_error(&err) => {
                    debug!(
                        "Retrying GET {} after transient failure (attempt {}): {}",
                        path, attempt, err
                    );
                    sleep(get_backoff_with_jitter(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn worksites_query(
        incident_id: i64,
        limit: u32,
        offset: i64,
        updated_after: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut query = vec![
            ("incident".to_string(), incident_id.to_string()),
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        if let Some(after) = updated_after {
            query.push(("updated_at__gt".to_string(), after.to_string()));
        }
        query
    }
}

#[async_trait]
impl NetworkDataSource for CrisisCleanupClient {
    async fn get_incidents(
        &self,
        token: &str,
        updated_after: Option<&str>,
    ) -> Result<Vec<NetworkIncident>> {
        let mut query = vec![
            ("limit".to_string(), "250".to_string()),
            ("ordering".to_string(), "-start_at".to_string()),
        ];
        if let Some(after) = updated_after {
            query.push(("updated_at__gt".to_string(), after.to_string()));
        }
        let result: NetworkIncidentsResult =
            self.get_json_with_retry(token, "incidents", &query).await?;
        Ok(result.results)
    }

    async fn get_worksites_count(
        &self,
        token: &str,
        incident_id: i64,
        updated_after: Option<&str>,
    ) -> Result<i64> {
        // Count-only probe; the results payload is ignored.
        #[derive(serde::Deserialize)]
        struct CountEnvelope {
            count: i64,
        }

        let mut query = Self::worksites_query(incident_id, 1, 0, updated_after);
        query.push(("fields".to_string(), "id".to_string()));
        let envelope: CountEnvelope = self.get_json_with_retry(token, "worksites", &query).await?;
        Ok(envelope.count)
    }

    async fn get_worksites_page(
        &self,
        token: &str,
        incident_id: i64,
        limit: u32,
        offset: i64,
        updated_after: Option<&str>,
    ) -> Result<NetworkWorksitePage> {
        let mut query = Self::worksites_query(incident_id, limit, offset, updated_after);
        query.push(("fields".to_string(), SHORT_WORKSITE_FIELDS.to_string()));
        self.get_json_with_retry(token, "worksites", &query).await
    }

    async fn get_worksites_full_page(
        &self,
        token: &str,
        incident_id: i64,
        limit: u32,
        offset: i64,
        updated_after: Option<&str>,
    ) -> Result<NetworkWorksiteFullPage> {
        let query = Self::worksites_query(incident_id, limit, offset, updated_after);
        self.get_json_with_retry(token, "worksites", &query).await
    }

    async fn create_worksite(
        &self,
        token: &str,
        payload: &WorksitePushPayload,
    ) -> Result<NetworkWorksiteFull> {
        let url = format!("{}/worksites", self.base_url);
        let response = self
            .client
            .post(&url)
            .headers(self.headers(token)?)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_worksite(
        &self,
        token: &str,
        network_id: i64,
        payload: &WorksitePushPayload,
    ) -> Result<NetworkWorksiteFull> {
        let url = format!("{}/worksites/{}", self.base_url, network_id);
        let response = self
            .client
            .put(&url)
            .headers(self.headers(token)?)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }
}
