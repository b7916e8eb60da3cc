//! Orchestrator status feed payloads.
//!
//! The orchestrator reports `{"status": {<cluster uuid>: [resource, ...]}}`.
//! Only the resources listed under this controller's cluster uuid are
//! considered. A payload without a `status` object, or with no resources for
//! the uuid, carries no information yet.

use super::ServiceEndpoint;
use crate::constants::resource_kinds;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStatusReport {
    /// Raw status document as delivered by the orchestrator
    pub payload: Value,
    /// Cluster/session uuid keying this controller's resources
    pub uuid: String,
    /// Addresses of the orchestrator's worker nodes
    #[serde(default)]
    pub worker_ips: Vec<String>,
}

/// What a complete status report says about the worker deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentObservation {
    /// `nodePort` of the first port of the `Service` resource
    pub node_port: Option<u16>,
    /// `availableReplicas == readyReplicas` on the `Deployment` resource
    pub deployment_available: bool,
    pub worker_ips: Vec<String>,
}

impl OrchestratorStatusReport {
    pub fn new(payload: Value, uuid: impl Into<String>, worker_ips: Vec<String>) -> Self {
        Self {
            payload,
            uuid: uuid.into(),
            worker_ips,
        }
    }

    /// Derive the deployment observation, `None` when the report is incomplete
    pub fn observe(&self) -> Option<DeploymentObservation> {
        let resources = self
            .payload
            .get("status")?
            .as_object()?
            .get(&self.uuid)?
            .as_array()?;

        if resources.is_empty() {
            return None;
        }

        let mut node_port = None;
        let mut deployment_available = false;

        for resource in resources {
            match resource.get("kind").and_then(Value::as_str) {
                Some(resource_kinds::SERVICE) => {
                    node_port = resource
                        .pointer("/spec/ports/0/nodePort")
                        .and_then(Value::as_u64)
                        .and_then(|port| u16::try_from(port).ok());
                }
                Some(resource_kinds::DEPLOYMENT) => {
                    let status = resource.get("status");
                    let available = status.and_then(|s| s.get("availableReplicas"));
                    let ready = status.and_then(|s| s.get("readyReplicas"));
                    deployment_available = matches!(available, Some(a) if Some(a) == ready);
                }
                _ => {}
            }
        }

        Some(DeploymentObservation {
            node_port,
            deployment_available,
            worker_ips: self.worker_ips.clone(),
        })
    }
}

impl DeploymentObservation {
    /// Reachable management endpoint, present only when the deployment is fully available
    pub fn service_endpoint(&self) -> Option<ServiceEndpoint> {
        if !self.deployment_available {
            return None;
        }
        let port = self.node_port?;
        let host = self.worker_ips.first()?;
        Some(ServiceEndpoint::new(host.clone(), port))
    }
}
