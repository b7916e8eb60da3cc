use crate::constants::{deployment::DEFAULT_REST_PORT, worker_keys};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Worker properties with property-file semantics
///
/// Backed by an ordered map so equality and serialization are independent of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerConfiguration(BTreeMap<String, String>);

impl WorkerConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Management API port, `rest.port` when it parses, else the default
    pub fn rest_port(&self) -> u16 {
        self.get(worker_keys::REST_PORT)
            .and_then(|port| port.trim().parse().ok())
            .unwrap_or(DEFAULT_REST_PORT)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl From<BTreeMap<String, String>> for WorkerConfiguration {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for WorkerConfiguration {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_port_default_and_override() {
        let mut config = WorkerConfiguration::new();
        assert_eq!(config.rest_port(), 8083);

        config.insert("rest.port", "9000");
        assert_eq!(config.rest_port(), 9000);

        config.insert("rest.port", "not-a-port");
        assert_eq!(config.rest_port(), 8083);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let mut a = WorkerConfiguration::new();
        a.insert("x", "1");
        a.insert("y", "2");

        let mut b = WorkerConfiguration::new();
        b.insert("y", "2");
        b.insert("x", "1");

        assert_eq!(a, b);
        assert_eq!(a.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
