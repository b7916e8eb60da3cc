//! # Worker API Traits
//!
//! Defines the connector management operations the controller needs from the
//! worker service, and the uniform response shape they return.

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of a completed HTTP exchange with the worker API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status_code: u16,
    /// Parsed JSON body; `None` when the body was empty or not valid JSON
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: Option<Value>) -> Self {
        Self { status_code, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Deletion outcome meaning the connector no longer exists (204 or 404)
    pub fn is_absent(&self) -> bool {
        matches!(self.status_code, 204 | 404)
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Some(body) => write!(f, "HTTP {} {}", self.status_code, body),
            None => write!(f, "HTTP {} (no body)", self.status_code),
        }
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;

/// Connector management operations of the worker service
///
/// Each call issues exactly one request against the current endpoint and
/// fails with [`ApiError::Unreachable`] when no endpoint is recorded.
#[async_trait]
pub trait ConnectorApi: Send + Sync {
    /// `PUT /connectors/{name}/config`
    async fn register_or_update(&self, name: &str, config: &Value) -> ApiResult;

    /// `DELETE /connectors/{name}`
    async fn unregister(&self, name: &str) -> ApiResult;

    /// `GET /connectors`
    async fn list_connectors(&self) -> ApiResult;

    /// `GET /connectors/{name}/status`
    async fn status(&self, name: &str) -> ApiResult;

    /// `POST /connectors/{name}/restart`
    async fn restart(&self, name: &str) -> ApiResult;

    /// `PUT /connectors/{name}/pause`
    async fn pause(&self, name: &str) -> ApiResult;

    /// `PUT /connectors/{name}/resume`
    async fn resume(&self, name: &str) -> ApiResult;

    /// `GET /connectors/{name}/tasks`
    async fn list_tasks(&self, name: &str) -> ApiResult;
}
