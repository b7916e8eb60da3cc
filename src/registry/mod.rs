//! # Connector Registry
//!
//! Durable record of which connectors should exist on the worker service,
//! independent of whether the worker service is currently running. The
//! registry is replayed by the recovery protocol after the worker service is
//! torn down and recreated.

pub mod connector_registry;

pub use connector_registry::{ConnectorConfig, ConnectorRegistry, RegistrySnapshot};
