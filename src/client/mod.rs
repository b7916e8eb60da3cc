//! # Worker Management API Client
//!
//! Thin verb wrappers over the worker service's REST management API.
//!
//! ## Architecture
//!
//! - **ConnectorApi**: the seam the recovery protocol and controller call through
//! - **WorkerApiClient**: `reqwest` implementation, one HTTP request per call
//! - **EndpointCell**: shared slot holding the currently reachable endpoint;
//!   written by the controller, read by the client before every request
//!
//! Every call yields either an [`ApiResponse`] (any HTTP status, body possibly
//! absent) or an [`crate::error::ApiError`] when no exchange happened. There
//! are no retries at this layer.

pub mod traits;
pub mod worker_api;

pub use traits::{ApiResponse, ApiResult, ConnectorApi};
pub use worker_api::{EndpointCell, WorkerApiClient, WorkerApiConfig};
