//! Bookkeeping topic planning and provisioning.
//!
//! The worker service keeps connector configs, source offsets and task status
//! in three broker topics. Names follow `{environment}.{application}.{suffix}`.
//! The replication factor follows the live broker count, capped at three. The
//! count is read while the cluster may still be converging, so the factor is
//! best-effort.

use super::types::TopicProvisioner;
use crate::config::TopicSettings;
use crate::constants::topics;
use crate::error::{ControllerError, ControllerResult};
use crate::models::BrokerEndpoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: u32,
    pub replication_factor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPlan {
    pub configs: TopicSpec,
    pub offsets: TopicSpec,
    pub status: TopicSpec,
}

/// `min(live brokers, 3)`, never below one
pub fn replication_factor(live_brokers: usize) -> u32 {
    let live = u32::try_from(live_brokers).unwrap_or(u32::MAX);
    live.clamp(1, topics::MAX_REPLICATION_FACTOR)
}

/// `{environment}.{application}.{suffix}`
pub fn topic_name(environment: &str, application: &str, suffix: &str) -> String {
    format!("{environment}.{application}.{suffix}")
}

impl TopicSettings {
    /// Topic names following the provisioning naming convention
    pub fn conventional(environment: &str, application: &str) -> Self {
        Self {
            configs: topic_name(environment, application, topics::CONFIGS_SUFFIX),
            offsets: topic_name(environment, application, topics::OFFSETS_SUFFIX),
            status: topic_name(environment, application, topics::STATUS_SUFFIX),
        }
    }
}

impl TopicPlan {
    pub fn for_application(environment: &str, application: &str, live_brokers: usize) -> Self {
        Self::from_settings(
            &TopicSettings::conventional(environment, application),
            live_brokers,
        )
    }

    pub fn from_settings(settings: &TopicSettings, live_brokers: usize) -> Self {
        let replication_factor = replication_factor(live_brokers);
        let spec = |name: &str, partitions: u32| TopicSpec {
            name: name.to_string(),
            partitions,
            replication_factor,
        };

        Self {
            configs: spec(&settings.configs, topics::CONFIGS_PARTITIONS),
            offsets: spec(&settings.offsets, topics::OFFSETS_PARTITIONS),
            status: spec(&settings.status, topics::STATUS_PARTITIONS),
        }
    }

    pub fn specs(&self) -> [&TopicSpec; 3] {
        [&self.configs, &self.offsets, &self.status]
    }

    pub fn names(&self) -> Vec<String> {
        self.specs().iter().map(|spec| spec.name.clone()).collect()
    }
}

/// Create the planned topics that don't exist yet; returns the names created
pub async fn provision_topics(
    provisioner: &dyn TopicProvisioner,
    coordinators: &[BrokerEndpoint],
    plan: &TopicPlan,
) -> ControllerResult<Vec<String>> {
    let existing: BTreeSet<String> = provisioner
        .existing_topics(coordinators)
        .await?
        .into_iter()
        .collect();

    let mut created = Vec::new();
    for spec in plan.specs() {
        if existing.contains(&spec.name) {
            debug!(topic = %spec.name, "Topic already exists, skipping");
            continue;
        }

        provisioner
            .create_topic(coordinators, spec)
            .await
            .map_err(|e| ControllerError::TopicProvisioning {
                topic: spec.name.clone(),
                reason: e.to_string(),
            })?;

        info!(
            topic = %spec.name,
            partitions = spec.partitions,
            replication_factor = spec.replication_factor,
            "Created topic"
        );
        created.push(spec.name.clone());
    }

    Ok(created)
}
