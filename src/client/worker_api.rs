//! # Worker API Client
//!
//! HTTP client for the worker service's connector management endpoints.

use super::traits::{ApiResponse, ApiResult, ConnectorApi};
use crate::error::{ApiError, ControllerError, ControllerResult};
use crate::models::ServiceEndpoint;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{header, Client, Method, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Shared slot for the currently reachable worker endpoint
#[derive(Debug, Clone, Default)]
pub struct EndpointCell {
    inner: Arc<RwLock<Option<ServiceEndpoint>>>,
}

impl EndpointCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<ServiceEndpoint> {
        self.inner.read().clone()
    }

    pub fn set(&self, endpoint: Option<ServiceEndpoint>) {
        *self.inner.write() = endpoint;
    }
}

/// Configuration for the worker API client
#[derive(Debug, Clone)]
pub struct WorkerApiConfig {
    /// Request timeout in milliseconds, enforced by the transport
    pub timeout_ms: u64,
}

impl Default for WorkerApiConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

/// HTTP client for connector management operations
pub struct WorkerApiClient {
    client: Client,
    endpoint: EndpointCell,
    config: WorkerApiConfig,
}

impl std::fmt::Debug for WorkerApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerApiClient")
            .field("endpoint", &self.endpoint.get())
            .field("timeout_ms", &self.config.timeout_ms)
            .finish()
    }
}

impl WorkerApiClient {
    pub fn new(config: WorkerApiConfig, endpoint: EndpointCell) -> ControllerResult<Self> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("connect-controller/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .build()
            .map_err(|e| {
                ControllerError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &EndpointCell {
        &self.endpoint
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let endpoint = self.endpoint.get().ok_or(ApiError::Unreachable)?;
        let mut url = Url::parse(&endpoint.base_url())
            .map_err(|e| ApiError::Transport(format!("Invalid endpoint {endpoint}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("Endpoint {endpoint} cannot be a base")))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, segments: &[&str], body: Option<&Value>) -> ApiResult {
        let url = self.url(segments)?;
        debug!(method = %method, url = %url, "Worker API request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "Worker API request failed");
            ApiError::from(e)
        })?;

        let status_code = response.status().as_u16();
        let bytes = response.bytes().await?;
        // Non-JSON bodies (e.g. empty 204) are a soft outcome, not a failure
        let body = serde_json::from_slice(&bytes).ok();

        debug!(url = %url, status_code, "Worker API response");
        Ok(ApiResponse::new(status_code, body))
    }
}

#[async_trait]
impl ConnectorApi for WorkerApiClient {
    async fn register_or_update(&self, name: &str, config: &Value) -> ApiResult {
        self.send(Method::PUT, &["connectors", name, "config"], Some(config))
            .await
    }

    async fn unregister(&self, name: &str) -> ApiResult {
        self.send(Method::DELETE, &["connectors", name], None).await
    }

    async fn list_connectors(&self) -> ApiResult {
        self.send(Method::GET, &["connectors"], None).await
    }

    async fn status(&self, name: &str) -> ApiResult {
        self.send(Method::GET, &["connectors", name, "status"], None)
            .await
    }

    async fn restart(&self, name: &str) -> ApiResult {
        self.send(Method::POST, &["connectors", name, "restart"], None)
            .await
    }

    async fn pause(&self, name: &str) -> ApiResult {
        self.send(Method::PUT, &["connectors", name, "pause"], None)
            .await
    }

    async fn resume(&self, name: &str) -> ApiResult {
        self.send(Method::PUT, &["connectors", name, "resume"], None)
            .await
    }

    async fn list_tasks(&self, name: &str) -> ApiResult {
        self.send(Method::GET, &["connectors", name, "tasks"], None)
            .await
    }
}
