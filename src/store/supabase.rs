//! PostgREST reader for the hosted response table.

use super::{sort_by_manager, ResponseStore, StoreError};
use crate::config::BackendConfig;
use crate::models::SurveyResponse;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::time::Duration;
use tracing::{debug, info};

/// Reads responses through the backend's REST interface.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
}

impl SupabaseStore {
    /// Create a store from explicit backend settings.
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        if !config.is_configured() {
            return Err(StoreError::Config(
                "backend url and anon key must both be set".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let key = HeaderValue::from_str(&config.anon_key)
            .map_err(|_| StoreError::Config("invalid anon key format".to_string()))?;
        headers.insert("apikey", key);

        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.anon_key))
            .map_err(|_| StoreError::Config("invalid anon key format".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .default_headers(headers);
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let client = builder
            .build()
            .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl ResponseStore for SupabaseStore {
    async fn fetch_responses(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        let url = self.table_url();
        debug!("Fetching responses from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("select", "*"), ("order", "manager_name.asc")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::unavailable("request to the backend timed out")
                } else if e.is_connect() {
                    StoreError::unavailable(format!("cannot connect to backend at {}", self.base_url))
                } else {
                    StoreError::unavailable(format!("failed to send request: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::unavailable(format!(
                "backend returned {status}: {body}"
            )));
        }

        let mut responses: Vec<SurveyResponse> = response
            .json()
            .await
            .map_err(|e| StoreError::unavailable(format!("failed to decode responses: {e}")))?;

        sort_by_manager(&mut responses);
        info!("Fetched {} responses from {}", responses.len(), self.table);
        Ok(responses)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.base_url, self.table)
    }
}
