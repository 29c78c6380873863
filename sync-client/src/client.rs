use async_trait::async_trait;
use event_cache::domain::{Delta, FullSnapshot, GroupId, VersionMarker};
use event_cache::ports::EventSource;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::config::Config;
use shared::{Error, Result};
use shared_http::api::{DeltaRequest, DeltaResponse, ErrorResponse, FullFetchResponse};
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP client for the group events API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn events_url(&self, group: &GroupId) -> String {
        format!("{}/groups/{}/events", self.base_url, group)
    }

    fn delta_url(&self, group: &GroupId) -> String {
        format!("{}/groups/{}/events/delta", self.base_url, group)
    }
}

/// Turn a response into `T`, or into `Error::Remote` for any non-2xx status
async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        warn!("Reading response from {} failed: {}", url, e);
        Error::Transport(e.to_string())
    })?;

    if !status.is_success() {
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error) => error.error,
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            Err(_) => body.trim().to_string(),
        };
        warn!("{} responded with {}: {}", url, status, message);
        return Err(Error::Remote {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        warn!("Unexpected response body from {}: {}", url, e);
        Error::from(e)
    })
}

fn transport_error(url: &str, err: reqwest::Error) -> Error {
    warn!("Request to {} failed: {}", url, err);
    Error::Transport(err.to_string())
}

#[async_trait]
impl EventSource for ApiClient {
    async fn fetch_all(&self, group: &GroupId) -> Result<FullSnapshot> {
        let url = self.events_url(group);
        info!("Fetching all events from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let body: FullFetchResponse = decode(&url, response).await?;
        Ok(body.into())
    }

    async fn fetch_delta(&self, group: &GroupId, known: &[VersionMarker]) -> Result<Delta> {
        let url = self.delta_url(group);
        debug!("Requesting delta for {} known event(s) from {}", known.len(), url);

        let response = self
            .client
            .post(&url)
            .json(&DeltaRequest::new(known))
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let body: DeltaResponse = decode(&url, response).await?;
        Ok(body.into())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
