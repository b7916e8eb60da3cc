use crate::error::ControllerResult;
use crate::persistence::{InMemoryStore, SnapshotStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Connector configuration document, passed verbatim to the worker API
pub type ConnectorConfig = Value;

/// Point-in-time copy of the registry, iterated in connector-name order
pub type RegistrySnapshot = BTreeMap<String, ConnectorConfig>;

/// Keyed store of connector name to connector configuration
///
/// Every mutation persists the whole registry before returning. Single-writer:
/// the controller owns the registry and mutates it one event at a time.
pub struct ConnectorRegistry {
    entries: RegistrySnapshot,
    store: Arc<dyn SnapshotStore<RegistrySnapshot>>,
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("connectors", &self.entries.keys().collect::<Vec<_>>())
            .field("store", &self.store.location())
            .finish()
    }
}

impl ConnectorRegistry {
    /// Open the registry, loading previously persisted entries
    pub fn open(store: Arc<dyn SnapshotStore<RegistrySnapshot>>) -> ControllerResult<Self> {
        let entries = store.load()?.unwrap_or_default();
        info!(
            connectors = entries.len(),
            store = %store.location(),
            "Connector registry opened"
        );
        Ok(Self { entries, store })
    }

    /// Registry without durable storage
    pub fn in_memory() -> Self {
        Self {
            entries: RegistrySnapshot::new(),
            store: Arc::new(InMemoryStore::new()),
        }
    }

    /// Insert or silently overwrite the entry for `name`
    ///
    /// The in-memory entries only change once the store accepted the update.
    pub fn put(&mut self, name: impl Into<String>, config: ConnectorConfig) -> ControllerResult<()> {
        let name = name.into();
        debug!(connector = %name, "Recording connector in registry");
        let mut staged = self.entries.clone();
        staged.insert(name, config);
        self.commit(staged)
    }

    /// Remove the entry for `name`, returning the removed configuration
    pub fn remove(&mut self, name: &str) -> ControllerResult<Option<ConnectorConfig>> {
        if !self.entries.contains_key(name) {
            return Ok(None);
        }

        debug!(connector = %name, "Removing connector from registry");
        let mut staged = self.entries.clone();
        let removed = staged.remove(name);
        self.commit(staged)?;
        Ok(removed)
    }

    fn commit(&mut self, staged: RegistrySnapshot) -> ControllerResult<()> {
        self.store.save(&staged)?;
        self.entries = staged;
        Ok(())
    }

    /// Snapshot copy of all entries; later mutations are not observed through it
    pub fn all(&self) -> RegistrySnapshot {
        self.entries.clone()
    }

    pub fn get(&self, name: &str) -> Option<&ConnectorConfig> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
