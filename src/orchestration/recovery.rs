//! # Registry Recovery Protocol
//!
//! Bulk unregister and re-register passes over the connector registry, used
//! when the worker service is about to disappear and once a replacement is
//! reachable.
//!
//! Both passes walk a detached snapshot of the registry in name order and stop
//! at the first failing entry. A stopped pass leaves the registry untouched so
//! the next event can retry it from the start.

use crate::client::{ApiResult, ConnectorApi};
use crate::error::{ControllerError, ControllerResult};
use crate::logging::log_connector_operation;
use crate::registry::ConnectorRegistry;
use tracing::{info, warn};

const UNREGISTER: &str = "unregister_all";
const REREGISTER: &str = "reregister_all";

pub struct RegistryRecoveryProtocol<'a> {
    registry: &'a ConnectorRegistry,
    api: &'a dyn ConnectorApi,
}

impl<'a> RegistryRecoveryProtocol<'a> {
    pub fn new(registry: &'a ConnectorRegistry, api: &'a dyn ConnectorApi) -> Self {
        Self { registry, api }
    }

    /// Remove every registered connector; 204 and 404 count as removed
    pub async fn unregister_all(&self) -> bool {
        self.try_unregister_all().await.is_ok()
    }

    /// Replay every registered connector; any 2xx counts as registered
    pub async fn reregister_all(&self) -> bool {
        self.try_reregister_all().await.is_ok()
    }

    /// Like [`Self::unregister_all`], returning the processed count or the failing entry
    pub async fn try_unregister_all(&self) -> ControllerResult<usize> {
        let snapshot = self.registry.all();

        for name in snapshot.keys() {
            let result = self.api.unregister(name).await;
            log_connector_operation(UNREGISTER, name, status_code(&result), None);

            match result {
                Ok(response) if response.is_absent() => {}
                other => return Err(failure(UNREGISTER, name, &other)),
            }
        }

        info!(count = snapshot.len(), "Unregistered all connectors");
        Ok(snapshot.len())
    }

    /// Like [`Self::reregister_all`], returning the processed count or the failing entry
    pub async fn try_reregister_all(&self) -> ControllerResult<usize> {
        let snapshot = self.registry.all();

        for (name, config) in &snapshot {
            let result = self.api.register_or_update(name, config).await;
            log_connector_operation(REREGISTER, name, status_code(&result), None);

            match result {
                Ok(response) if response.is_success() => {}
                other => return Err(failure(REREGISTER, name, &other)),
            }
        }

        info!(count = snapshot.len(), "Reregistered all connectors");
        Ok(snapshot.len())
    }
}

fn status_code(result: &ApiResult) -> Option<u16> {
    result.as_ref().ok().map(|response| response.status_code)
}

fn failure(operation: &str, connector: &str, result: &ApiResult) -> ControllerError {
    let reason = match result {
        Ok(response) => response.to_string(),
        Err(_) => "connection error".to_string(),
    };
    warn!(operation, connector, reason = %reason, "Recovery pass stopped");
    ControllerError::partial_recovery(operation, connector, reason)
}
