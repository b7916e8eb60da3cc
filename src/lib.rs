#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Connect Controller
//!
//! Reconciliation controller for a Kafka Connect worker service deployed on a
//! container orchestrator.
//!
//! ## Overview
//!
//! The controller watches its dependencies (orchestrator, broker cluster,
//! operator settings, bookkeeping topics), computes the desired worker
//! configuration, submits it to the orchestrator only when it actually
//! changed, and keeps a durable registry of connectors so they can be replayed
//! whenever the worker service is torn down and recreated.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Reconciliation states, events and guard conditions
//! - [`orchestration`] - Desired-state building, change detection, recovery and the controller
//! - [`registry`] - Durable connector registry
//! - [`client`] - Worker management API client
//! - [`models`] - Value types (endpoints, worker configuration, deployment descriptor)
//! - [`persistence`] - Snapshot storage for the registry and controller checkpoint
//! - [`config`] - Process configuration and operator settings
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use connect_controller::{
//!     config::ControllerConfig, orchestration::Collaborators, ControllerEvent,
//!     ReconciliationController,
//! };
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! connect_controller::logging::init_structured_logging();
//!
//! let config = ControllerConfig::load()?;
//! let mut controller = ReconciliationController::open(config, collaborators)?;
//!
//! let state = controller.handle(ControllerEvent::OrchestratorAvailable).await;
//! println!("controller is {state}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod registry;
pub mod state_machine;

pub use client::{ApiResponse, ApiResult, ConnectorApi, EndpointCell, WorkerApiClient};
pub use crate::config::{ControllerConfig, ControllerSettings, TopicSettings};
pub use constants::StatusLevel;
pub use error::{ApiError, ControllerError, ControllerResult};
pub use models::{
    BrokerEndpoint, DeploymentDescriptor, OrchestratorStatusReport, ServiceEndpoint,
    WorkerConfiguration,
};
pub use orchestration::{
    ChangeDetector, Collaborators, DesiredStateBuilder, ReconciliationController,
    RegistryRecoveryProtocol,
};
pub use registry::ConnectorRegistry;
pub use state_machine::{ControllerEvent, ReconciliationState};
