//! Proptest strategies for worker properties and controller event sequences

use super::builders::{brokers, deployment_status, healthy_status};
use connect_controller::ControllerEvent;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Property keys shaped like worker settings (`key.converter`, `tasks.max`, ...)
pub fn property_key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}(\\.[a-z][a-z0-9]{0,8}){0,2}"
}

/// Values without `=`, newlines or trailing whitespace
pub fn property_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9:/_,.-]{0,16}"
}

pub fn properties_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(property_key_strategy(), property_value_strategy(), 0..8)
}

/// Render a map as `key=value` override lines, optionally with trailing padding
pub fn override_text(overrides: &BTreeMap<String, String>, padded: bool) -> String {
    overrides
        .iter()
        .map(|(key, value)| {
            if padded {
                format!("{key}={value}  \n")
            } else {
                format!("{key}={value}\n")
            }
        })
        .collect()
}

/// Dependency flapping and status churn once the controller is deployed
pub fn flapping_event_strategy() -> impl Strategy<Value = ControllerEvent> {
    prop_oneof![
        Just(ControllerEvent::BrokerLost),
        Just(brokers(&[("kafka-1", 9092)])),
        Just(brokers(&[("kafka-1", 9092), ("kafka-2", 9092)])),
        Just(ControllerEvent::OrchestratorLost),
        Just(ControllerEvent::OrchestratorAvailable),
        Just(healthy_status()),
        Just(deployment_status(2, 1)),
        Just(ControllerEvent::ConsumerJoined),
        Just(ControllerEvent::Tick),
    ]
}

pub fn flapping_sequence_strategy() -> impl Strategy<Value = Vec<ControllerEvent>> {
    prop::collection::vec(flapping_event_strategy(), 1..40)
}
