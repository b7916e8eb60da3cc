//! # Desired State Builder
//!
//! Merges base worker properties, computed values and operator overrides into
//! the canonical worker configuration, and wraps it in a deployment descriptor.
//!
//! Precedence, lowest to highest:
//!
//! 1. base properties supplied by an upper layer
//! 2. computed defaults (`group.id` only when absent, storage topic keys only when absent)
//! 3. `bootstrap.servers`, always recomputed from the broker topology
//! 4. operator overrides from the `worker-config` text, applied last

use crate::config::TopicSettings;
use crate::constants::worker_keys;
use crate::error::{ControllerError, ControllerResult};
use crate::models::{BrokerEndpoint, DeploymentDescriptor, WorkerConfiguration};

/// Source of the `group.id` value when the base properties don't carry one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupIdPolicy {
    /// Operator supplied `group-id`
    Explicit(String),
    /// Identifier derived from the controller's unit name
    Derived(String),
}

impl GroupIdPolicy {
    /// Empty setting means fall back to the derived identifier
    pub fn from_setting(setting: &str, derived: impl Into<String>) -> Self {
        if setting.is_empty() {
            Self::Derived(derived.into())
        } else {
            Self::Explicit(setting.to_string())
        }
    }

    pub fn group_id(&self) -> &str {
        match self {
            Self::Explicit(id) | Self::Derived(id) => id,
        }
    }
}

/// Pure builder for worker configuration and deployment descriptors
#[derive(Debug)]
pub struct DesiredStateBuilder;

impl DesiredStateBuilder {
    pub fn build(
        base_properties: &WorkerConfiguration,
        overrides: &str,
        brokers: &[BrokerEndpoint],
        group_id: &GroupIdPolicy,
        topics: Option<&TopicSettings>,
    ) -> ControllerResult<WorkerConfiguration> {
        let mut config = base_properties.clone();

        if !config.contains_key(worker_keys::GROUP_ID) {
            config.insert(worker_keys::GROUP_ID, group_id.group_id());
        }

        config.insert(
            worker_keys::BOOTSTRAP_SERVERS,
            BrokerEndpoint::join_sorted(brokers),
        );

        if let Some(topics) = topics {
            for (key, name) in [
                (worker_keys::CONFIG_STORAGE_TOPIC, &topics.configs),
                (worker_keys::OFFSET_STORAGE_TOPIC, &topics.offsets),
                (worker_keys::STATUS_STORAGE_TOPIC, &topics.status),
            ] {
                if !config.contains_key(key) {
                    config.insert(key, name.as_str());
                }
            }
        }

        for (key, value) in parse_overrides(overrides)? {
            config.insert(key, value);
        }

        Ok(config)
    }

    /// Build the descriptor the orchestrator is asked to apply
    pub fn descriptor(
        application_name: &str,
        properties: WorkerConfiguration,
        replicas: u32,
        image: &str,
    ) -> DeploymentDescriptor {
        DeploymentDescriptor::new(application_name, properties, replicas, image)
    }
}

/// Parse `key=value` lines
///
/// Only trailing line breaks of the whole text are ignored; every remaining
/// line, blank ones included, must contain exactly one `=` and a non-empty
/// key. Keys are kept as written, values lose trailing whitespace.
pub fn parse_overrides(text: &str) -> ControllerResult<Vec<(String, String)>> {
    let text = text.trim_end_matches(|c: char| c == '\n' || c == '\r');
    if text.is_empty() {
        return Ok(Vec::new());
    }

    text.lines()
        .map(|line| {
            let mut parts = line.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) if !key.is_empty() => {
                    Ok((key.to_string(), value.trim_end().to_string()))
                }
                _ => Err(ControllerError::malformed_override(line)),
            }
        })
        .collect()
}
