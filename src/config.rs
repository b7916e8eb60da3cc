//! # Controller Configuration
//!
//! Two layers of configuration feed the controller:
//!
//! - [`ControllerConfig`]: process-level settings read once at startup
//!   (application identity, storage paths, API timeout). Loaded from built-in
//!   defaults, an optional TOML file and `CONNECT_CONTROLLER_*` environment variables.
//! - [`ControllerSettings`]: the operator-facing settings (`workers`, `group-id`,
//!   `worker-config`, topic names). These change at runtime and reach the
//!   controller as a `ConfigChanged` event carrying an immutable snapshot.

use crate::constants::deployment;
use crate::error::{ControllerError, ControllerResult};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "CONNECT_CONTROLLER_CONFIG";
/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "CONNECT_CONTROLLER";
const DEFAULT_CONFIG_FILE: &str = "connect-controller";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Application name; prefixes every orchestrator resource
    pub application_name: String,
    /// Unit identifier (`app/N`), used to derive the default group id
    pub unit_name: String,
    /// Deployment environment, first segment of provisioned topic names
    pub environment: String,
    /// Durable connector registry file
    pub registry_path: PathBuf,
    /// Durable controller checkpoint file
    pub checkpoint_path: PathBuf,
    /// Container image used until an upper layer sets one
    pub default_image: String,
    /// Timeout applied by the transport for each worker API request
    pub api_timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            application_name: "kafka-connect".to_string(),
            unit_name: "kafka-connect/0".to_string(),
            environment: "development".to_string(),
            registry_path: PathBuf::from("state/connectors.json"),
            checkpoint_path: PathBuf::from("state/controller.json"),
            default_image: deployment::DEFAULT_IMAGE.to_string(),
            api_timeout_ms: 30000,
        }
    }
}

impl ControllerConfig {
    /// Load configuration, honoring `CONNECT_CONTROLLER_CONFIG` when set
    pub fn load() -> ControllerResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load configuration layered as defaults, then file, then environment
    ///
    /// An explicit `path` must exist; without one, `connect-controller.toml`
    /// in the working directory is used if present.
    pub fn load_from(path: Option<&Path>) -> ControllerResult<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("application_name", defaults.application_name)?
            .set_default("unit_name", defaults.unit_name)?
            .set_default("environment", defaults.environment)?
            .set_default(
                "registry_path",
                defaults.registry_path.to_string_lossy().to_string(),
            )?
            .set_default(
                "checkpoint_path",
                defaults.checkpoint_path.to_string_lossy().to_string(),
            )?
            .set_default("default_image", defaults.default_image)?
            .set_default("api_timeout_ms", defaults.api_timeout_ms as i64)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        debug!(
            application = %config.application_name,
            environment = %config.environment,
            registry = %config.registry_path.display(),
            "Controller configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> ControllerResult<()> {
        if self.application_name.trim().is_empty() {
            return Err(ControllerError::Configuration(
                "application_name must not be empty".to_string(),
            ));
        }
        if self.unit_name.trim().is_empty() {
            return Err(ControllerError::Configuration(
                "unit_name must not be empty".to_string(),
            ));
        }
        if self.api_timeout_ms == 0 {
            return Err(ControllerError::Configuration(
                "api_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Group id used when the operator leaves `group-id` empty
    pub fn derived_group_id(&self) -> String {
        self.unit_name.replace('/', "-")
    }
}

/// Names of the three bookkeeping topics of the worker service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSettings {
    pub configs: String,
    pub offsets: String,
    pub status: String,
}

/// Operator-facing settings snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// Worker replica count
    #[serde(default)]
    pub workers: Option<u32>,
    /// Explicit group id; empty means derive from the unit name
    #[serde(default, rename = "group-id")]
    pub group_id: String,
    /// Free-form `key=value` lines applied over the computed worker properties
    #[serde(default, rename = "worker-config")]
    pub worker_config: String,
    #[serde(default)]
    pub topics: Option<TopicSettings>,
}

impl ControllerSettings {
    /// Load a settings snapshot from a TOML/YAML/JSON file
    pub fn from_file(path: &Path) -> ControllerResult<Self> {
        let settings: Self = Config::builder()
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Required settings are present; topic names fall back to the
    /// `{environment}.{application}.{suffix}` convention when omitted
    pub fn is_set(&self) -> bool {
        self.workers.is_some()
    }

    pub fn validate(&self) -> ControllerResult<()> {
        if self.workers == Some(0) {
            return Err(ControllerError::Configuration(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
