use crate::config::ControllerSettings;
use crate::models::{BrokerEndpoint, OrchestratorStatusReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// External notifications consumed by the reconciliation controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// The container-orchestration endpoint became available
    OrchestratorAvailable,
    /// The container-orchestration endpoint went away
    OrchestratorLost,
    /// Broker membership as currently reported by the broker topology source
    BrokerTopologyChanged {
        brokers: Vec<BrokerEndpoint>,
        #[serde(default)]
        coordinators: Vec<BrokerEndpoint>,
    },
    /// The broker cluster is no longer ready
    BrokerLost,
    /// New operator settings snapshot
    ConfigChanged(ControllerSettings),
    /// Bookkeeping topics reported by the topic relation
    TopicsReady(Vec<String>),
    /// Status feed update from the orchestrator
    OrchestratorStatus(OrchestratorStatusReport),
    /// Base worker properties supplied by an upper layer
    WorkerPropertiesChanged(BTreeMap<String, String>),
    /// Container image supplied by an upper layer
    BaseImageChanged(String),
    /// A downstream consumer attached and wants the service endpoint
    ConsumerJoined,
    /// Re-delivery with no new facts; retries unresolved passes
    Tick,
}

impl ControllerEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrchestratorAvailable => "orchestrator_available",
            Self::OrchestratorLost => "orchestrator_lost",
            Self::BrokerTopologyChanged { .. } => "broker_topology_changed",
            Self::BrokerLost => "broker_lost",
            Self::ConfigChanged(_) => "config_changed",
            Self::TopicsReady(_) => "topics_ready",
            Self::OrchestratorStatus(_) => "orchestrator_status",
            Self::WorkerPropertiesChanged(_) => "worker_properties_changed",
            Self::BaseImageChanged(_) => "base_image_changed",
            Self::ConsumerJoined => "consumer_joined",
            Self::Tick => "tick",
        }
    }
}

/// Helpers for creating common events
impl ControllerEvent {
    pub fn brokers(brokers: Vec<BrokerEndpoint>) -> Self {
        Self::BrokerTopologyChanged {
            brokers,
            coordinators: Vec::new(),
        }
    }
}
