//! Controller harness and event builders shared by the integration tests

use super::mocks::{
    FakeTopicProvisioner, RecordingOrchestrator, RecordingPublisher, RecordingStatusSink,
    ScriptedConnectorApi,
};
use connect_controller::client::EndpointCell;
use connect_controller::config::{ControllerConfig, ControllerSettings, TopicSettings};
use connect_controller::models::{BrokerEndpoint, OrchestratorStatusReport};
use connect_controller::orchestration::{Collaborators, ControllerCheckpoint, TopicProvisioner};
use connect_controller::persistence::SnapshotStore;
use connect_controller::{ConnectorRegistry, ControllerEvent, ReconciliationController, ReconciliationState};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

pub const CLUSTER_UUID: &str = "cluster-1";
pub const WORKER_IP: &str = "10.0.0.5";
pub const NODE_PORT: u16 = 30001;

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        application_name: "connect".to_string(),
        unit_name: "connect/0".to_string(),
        environment: "test".to_string(),
        registry_path: PathBuf::from("unused/connectors.json"),
        checkpoint_path: PathBuf::from("unused/controller.json"),
        ..Default::default()
    }
}

pub fn settings() -> ControllerSettings {
    ControllerSettings {
        workers: Some(1),
        topics: Some(TopicSettings::conventional("test", "connect")),
        ..Default::default()
    }
}

pub fn settings_with_overrides(worker_config: &str) -> ControllerSettings {
    ControllerSettings {
        worker_config: worker_config.to_string(),
        ..settings()
    }
}

pub fn brokers(endpoints: &[(&str, u16)]) -> ControllerEvent {
    ControllerEvent::brokers(
        endpoints
            .iter()
            .map(|(host, port)| BrokerEndpoint::new(*host, *port))
            .collect(),
    )
}

pub fn topics_ready() -> ControllerEvent {
    ControllerEvent::TopicsReady(vec![
        "test.connect.configs".to_string(),
        "test.connect.offsets".to_string(),
        "test.connect.status".to_string(),
    ])
}

/// Status feed update for a deployment with the given replica counts
pub fn deployment_status(available: u32, ready: u32) -> ControllerEvent {
    ControllerEvent::OrchestratorStatus(OrchestratorStatusReport::new(
        json!({
            "status": {
                "cluster-1": [
                    {"kind": "Service", "spec": {"ports": [{"port": 8083, "nodePort": NODE_PORT}]}},
                    {"kind": "Deployment", "status": {"availableReplicas": available, "readyReplicas": ready}}
                ]
            }
        }),
        CLUSTER_UUID,
        vec![WORKER_IP.to_string()],
    ))
}

pub fn healthy_status() -> ControllerEvent {
    deployment_status(2, 2)
}

/// Controller wired to recording doubles
pub struct TestHarness {
    pub controller: ReconciliationController,
    pub orchestrator: RecordingOrchestrator,
    pub status: RecordingStatusSink,
    pub publisher: RecordingPublisher,
    pub api: ScriptedConnectorApi,
    pub endpoint: EndpointCell,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::build(ConnectorRegistry::in_memory(), None, None)
    }

    pub fn with_provisioner(provisioner: FakeTopicProvisioner) -> Self {
        Self::build(ConnectorRegistry::in_memory(), None, Some(provisioner))
    }

    pub fn with_stores(
        registry: ConnectorRegistry,
        checkpoint_store: Arc<dyn SnapshotStore<ControllerCheckpoint>>,
    ) -> Self {
        Self::build(registry, Some(checkpoint_store), None)
    }

    fn build(
        registry: ConnectorRegistry,
        checkpoint_store: Option<Arc<dyn SnapshotStore<ControllerCheckpoint>>>,
        provisioner: Option<FakeTopicProvisioner>,
    ) -> Self {
        connect_controller::logging::init_structured_logging();

        let orchestrator = RecordingOrchestrator::default();
        let status = RecordingStatusSink::default();
        let publisher = RecordingPublisher::default();
        let api = ScriptedConnectorApi::new();
        let endpoint = EndpointCell::new();

        let collaborators = Collaborators {
            orchestrator: Arc::new(orchestrator.clone()),
            status: Arc::new(status.clone()),
            publisher: Arc::new(publisher.clone()),
            topic_provisioner: provisioner.map(|p| Arc::new(p) as Arc<dyn TopicProvisioner>),
        };

        let mut controller = ReconciliationController::new(
            test_config(),
            registry,
            Arc::new(api.clone()),
            endpoint.clone(),
            collaborators,
        );
        if let Some(store) = checkpoint_store {
            controller = controller
                .with_checkpoint_store(store)
                .expect("checkpoint store should load");
        }

        Self {
            controller,
            orchestrator,
            status,
            publisher,
            api,
            endpoint,
        }
    }

    pub async fn handle(&mut self, event: ControllerEvent) -> ReconciliationState {
        self.controller.handle(event).await
    }

    /// Satisfy every guard; the desired state is applied and the controller waits
    pub async fn drive_to_waiting(&mut self) -> ReconciliationState {
        self.handle(ControllerEvent::OrchestratorAvailable).await;
        self.handle(brokers(&[("kafka-1", 9092)])).await;
        self.handle(ControllerEvent::ConfigChanged(settings())).await;
        self.handle(topics_ready()).await
    }

    pub async fn drive_to_active(&mut self) -> ReconciliationState {
        self.drive_to_waiting().await;
        self.handle(healthy_status()).await
    }
}
