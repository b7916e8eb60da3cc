use super::states::ReconciliationState;
use crate::config::ControllerSettings;
use crate::constants::messages;
use crate::models::BrokerEndpoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker membership last reported by the topology source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerTopology {
    pub brokers: Vec<BrokerEndpoint>,
    pub coordinators: Vec<BrokerEndpoint>,
}

impl BrokerTopology {
    pub fn new(mut brokers: Vec<BrokerEndpoint>, mut coordinators: Vec<BrokerEndpoint>) -> Self {
        brokers.sort();
        brokers.dedup();
        coordinators.sort();
        coordinators.dedup();
        Self {
            brokers,
            coordinators,
        }
    }

    /// Comma-joined sorted `host:port` list for `bootstrap.servers`
    pub fn bootstrap_servers(&self) -> String {
        BrokerEndpoint::join_sorted(&self.brokers)
    }
}

/// Externally observed facts the guard conditions are evaluated over
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyFacts {
    pub orchestrator_available: bool,
    /// Present while the broker cluster is ready
    pub broker: Option<BrokerTopology>,
    pub settings: Option<ControllerSettings>,
    pub topics_created: bool,
}

/// Why the controller cannot make forward progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockedReason {
    OrchestratorUnavailable,
    BrokerUnready,
    ConfigUnset,
    TopicsNotCreated,
    InvalidConfiguration(String),
}

impl BlockedReason {
    pub fn message(&self) -> String {
        match self {
            Self::OrchestratorUnavailable => messages::WAITING_FOR_ORCHESTRATOR_RELATION.to_string(),
            Self::BrokerUnready => messages::WAITING_FOR_BROKER.to_string(),
            Self::ConfigUnset => messages::WAITING_FOR_CONFIG.to_string(),
            Self::TopicsNotCreated => messages::WAITING_FOR_TOPICS.to_string(),
            Self::InvalidConfiguration(reason) => format!("Invalid configuration: {reason}"),
        }
    }

    /// Loss of a dependency the running worker service relies on
    pub fn is_dependency_loss(&self) -> bool {
        matches!(self, Self::OrchestratorUnavailable | Self::BrokerUnready)
    }
}

impl fmt::Display for BlockedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl DependencyFacts {
    pub fn broker_ready(&self) -> bool {
        self.broker
            .as_ref()
            .is_some_and(|topology| !topology.brokers.is_empty())
    }

    /// Orchestrator and broker both present
    pub fn dependencies_available(&self) -> bool {
        self.orchestrator_available && self.broker_ready()
    }

    /// First unsatisfied guard, `None` when the controller may proceed past Blocked
    pub fn blocked_reason(&self) -> Option<BlockedReason> {
        if !self.orchestrator_available {
            return Some(BlockedReason::OrchestratorUnavailable);
        }
        if !self.broker_ready() {
            return Some(BlockedReason::BrokerUnready);
        }
        match &self.settings {
            Some(settings) if settings.is_set() => {
                if let Err(e) = settings.validate() {
                    return Some(BlockedReason::InvalidConfiguration(e.to_string()));
                }
            }
            _ => return Some(BlockedReason::ConfigUnset),
        }
        if !self.topics_created {
            return Some(BlockedReason::TopicsNotCreated);
        }
        None
    }
}

/// Total transition table of the reconciliation state machine
#[derive(Debug)]
pub struct TransitionGuard;

impl TransitionGuard {
    pub fn can_transition(from: ReconciliationState, to: ReconciliationState) -> bool {
        use ReconciliationState::*;

        matches!(
            (from, to),
            (Blocked, Ready)
                | (Blocked, Unregistering)
                | (Ready, Configuring)
                | (Ready, Blocked)
                | (Configuring, Waiting)
                | (Configuring, Blocked)
                | (Waiting, Active)
                | (Waiting, Reregistering)
                | (Waiting, Configuring)
                | (Waiting, Unregistering)
                | (Waiting, Blocked)
                | (Active, Waiting)
                | (Active, Configuring)
                | (Active, Unregistering)
                | (Active, Blocked)
                | (Unregistering, Reregistering)
                | (Reregistering, Active)
                | (Reregistering, Waiting)
                | (Reregistering, Configuring)
                | (Reregistering, Unregistering)
                | (Reregistering, Blocked)
        )
    }
}
