//! # Data Model
//!
//! Value types shared by the desired-state builder, the change detector and
//! the reconciliation controller.

pub mod deployment;
pub mod endpoint;
pub mod orchestrator_status;
pub mod worker_configuration;

pub use deployment::DeploymentDescriptor;
pub use endpoint::{BrokerEndpoint, ServiceEndpoint};
pub use orchestrator_status::{DeploymentObservation, OrchestratorStatusReport};
pub use worker_configuration::WorkerConfiguration;
