//! Collaborator interfaces of the reconciliation controller.
//!
//! The controller never talks to the orchestrator, the status surface, the
//! downstream consumers or the broker administration tools directly; it goes
//! through these traits so hosts can plug in their own transport.

use super::topics::TopicSpec;
use crate::constants::StatusLevel;
use crate::error::ControllerResult;
use crate::models::{BrokerEndpoint, DeploymentDescriptor};
use tracing::{info, warn};

/// Container-orchestration endpoint
#[async_trait::async_trait]
pub trait Orchestrator: Send + Sync {
    /// Fire-and-forget apply of the desired resources
    async fn submit_manifest(&self, descriptor: &DeploymentDescriptor) -> ControllerResult<()>;
}

/// Operator-visible status surface; purely observational
pub trait StatusSink: Send + Sync {
    fn report(&self, level: StatusLevel, message: &str);
}

/// Downstream consumers of the worker service endpoint
#[async_trait::async_trait]
pub trait EndpointPublisher: Send + Sync {
    async fn publish(&self, hostname: &str, port: u16) -> ControllerResult<()>;
}

/// Broker-side topic administration
#[async_trait::async_trait]
pub trait TopicProvisioner: Send + Sync {
    /// Number of broker nodes currently registered with the coordinators
    async fn live_broker_count(&self, coordinators: &[BrokerEndpoint]) -> ControllerResult<usize>;

    async fn existing_topics(&self, coordinators: &[BrokerEndpoint]) -> ControllerResult<Vec<String>>;

    async fn create_topic(
        &self,
        coordinators: &[BrokerEndpoint],
        topic: &TopicSpec,
    ) -> ControllerResult<()>;
}

/// Status sink that only emits tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn report(&self, level: StatusLevel, message: &str) {
        match level {
            StatusLevel::Blocked => warn!(level = %level, message, "Controller status"),
            _ => info!(level = %level, message, "Controller status"),
        }
    }
}
