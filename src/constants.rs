//! # System Constants
//!
//! Defaults and well-known names shared by the desired-state builder, the
//! topic provisioner and the reconciliation controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Worker property keys the controller computes or reads
pub mod worker_keys {
    pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
    pub const GROUP_ID: &str = "group.id";
    pub const REST_PORT: &str = "rest.port";
    pub const CONFIG_STORAGE_TOPIC: &str = "config.storage.topic";
    pub const OFFSET_STORAGE_TOPIC: &str = "offset.storage.topic";
    pub const STATUS_STORAGE_TOPIC: &str = "status.storage.topic";
}

/// Deployment defaults
pub mod deployment {
    /// Management API port used when `rest.port` is not configured
    pub const DEFAULT_REST_PORT: u16 = 8083;
    pub const DEFAULT_IMAGE: &str = "sborny/kafka-connect-base";
    pub const DEFAULT_REPLICAS: u32 = 1;
    pub const LABEL_PREFIX: &str = "kafka-connect-";
    pub const CONFIGMAP_SUFFIX: &str = "-cfgmap";
    pub const SERVICE_SUFFIX: &str = "-service";
    pub const DEPLOYMENT_SUFFIX: &str = "-deployment";
}

/// Internal bookkeeping topics of the worker service
pub mod topics {
    pub const CONFIGS_SUFFIX: &str = "configs";
    pub const OFFSETS_SUFFIX: &str = "offsets";
    pub const STATUS_SUFFIX: &str = "status";

    /// The config topic must stay single-partitioned for a consistent log of connector configs
    pub const CONFIGS_PARTITIONS: u32 = 1;
    pub const OFFSETS_PARTITIONS: u32 = 25;
    pub const STATUS_PARTITIONS: u32 = 5;

    pub const MAX_REPLICATION_FACTOR: u32 = 3;
    pub const REQUIRED_TOPIC_COUNT: usize = 3;
}

/// Orchestrator resource kinds inspected in status reports
pub mod resource_kinds {
    pub const SERVICE: &str = "Service";
    pub const DEPLOYMENT: &str = "Deployment";
}

/// Status levels accepted by the status-reporting sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Blocked,
    Waiting,
    Maintenance,
    Active,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "blocked"),
            Self::Waiting => write!(f, "waiting"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Operator-facing status messages
pub mod messages {
    pub const WAITING_FOR_ORCHESTRATOR_RELATION: &str = "Waiting for Kubernetes deployer relation";
    pub const WAITING_FOR_BROKER: &str = "Waiting for Kafka relation";
    pub const WAITING_FOR_CONFIG: &str = "Waiting for workers configuration";
    pub const WAITING_FOR_TOPICS: &str =
        "Waiting on all 3 topic relations (config, offsets and status)";
    pub const WAITING_FOR_DEPLOYMENT: &str = "Waiting for k8s deployment";
    pub const DEPLOYMENT_RUNNING: &str = "K8s deployment running";
    pub const UNREGISTERING: &str = "Unregistering connectors";
    pub const UNREGISTER_FAILED: &str = "Could not unregister connectors";
    pub const REREGISTERING: &str = "Reregistering connectors";
    pub const REREGISTER_FAILED: &str =
        "Could not reregister previous connectors, trying next event";
    pub const READY: &str = "ready";
}
