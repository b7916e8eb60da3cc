//! Desired orchestrator resources for the worker service.
//!
//! The descriptor is a value object: it is rebuilt on every reconciliation
//! attempt and compared wholesale against the last applied one. Its
//! `version_marker` is a content hash, so any change to the worker properties,
//! replica count, image or port yields a new marker and the orchestrator rolls
//! the running instances.

use super::WorkerConfiguration;
use crate::constants::deployment;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    pub configmap_name: String,
    pub service_name: String,
    pub deployment_name: String,
    pub container_name: String,
    /// Label used both on the pods and as the service selector
    pub label: String,
    pub replicas: u32,
    pub image: String,
    /// Container and service port of the management API
    pub port: u16,
    pub properties: WorkerConfiguration,
    pub version_marker: String,
}

impl DeploymentDescriptor {
    /// Derive resource names from the application name and stamp the version marker
    pub fn new(
        application_name: &str,
        properties: WorkerConfiguration,
        replicas: u32,
        image: impl Into<String>,
    ) -> Self {
        let image = image.into();
        let port = properties.rest_port();
        let version_marker = version_marker(&properties, replicas, &image, port);

        Self {
            configmap_name: format!("{application_name}{}", deployment::CONFIGMAP_SUFFIX),
            service_name: format!("{application_name}{}", deployment::SERVICE_SUFFIX),
            deployment_name: format!("{application_name}{}", deployment::DEPLOYMENT_SUFFIX),
            container_name: application_name.to_string(),
            label: format!("{}{application_name}", deployment::LABEL_PREFIX),
            replicas,
            image,
            port,
            properties,
            version_marker,
        }
    }
}

/// Hex-encoded SHA-256 prefix over the canonical descriptor content
///
/// Every string is length-prefixed, so values containing separators can't
/// collide with a different property set.
fn version_marker(properties: &WorkerConfiguration, replicas: u32, image: &str, port: u16) -> String {
    fn field(hasher: &mut Sha256, bytes: &[u8]) {
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }

    let mut hasher = Sha256::new();
    hasher.update((properties.len() as u64).to_be_bytes());
    for (key, value) in properties.iter() {
        field(&mut hasher, key.as_bytes());
        field(&mut hasher, value.as_bytes());
    }
    hasher.update(replicas.to_be_bytes());
    field(&mut hasher, image.as_bytes());
    hasher.update(port.to_be_bytes());
    let hash = hasher.finalize();

    hex::encode(&hash[..20])
}
