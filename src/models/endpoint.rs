use serde::{Deserialize, Serialize};
use std::fmt;

/// A broker or coordinator address reported by the broker topology source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Render a list of endpoints as a sorted, de-duplicated `host:port,...` string
    pub fn join_sorted(endpoints: &[BrokerEndpoint]) -> String {
        let mut addresses: Vec<String> = endpoints.iter().map(ToString::to_string).collect();
        addresses.sort();
        addresses.dedup();
        addresses.join(",")
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Reachable address of the worker management API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_sorted_orders_and_dedups() {
        let brokers = vec![
            BrokerEndpoint::new("kafka-2", 9092),
            BrokerEndpoint::new("kafka-1", 9092),
            BrokerEndpoint::new("kafka-2", 9092),
        ];
        assert_eq!(
            BrokerEndpoint::join_sorted(&brokers),
            "kafka-1:9092,kafka-2:9092"
        );
        assert_eq!(BrokerEndpoint::join_sorted(&[]), "");
    }

    #[test]
    fn test_service_endpoint_url() {
        let endpoint = ServiceEndpoint::new("10.0.0.4", 30001);
        assert_eq!(endpoint.base_url(), "http://10.0.0.4:30001");
        assert_eq!(endpoint.to_string(), "10.0.0.4:30001");
    }
}
