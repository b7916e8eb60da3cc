//! Recording test doubles for the controller's collaborators
//!
//! Every double keeps its observations in an `Arc<Mutex<..>>` state so tests
//! can keep a handle after moving the double into the controller.

use async_trait::async_trait;
use connect_controller::client::{ApiResponse, ApiResult, ConnectorApi};
use connect_controller::error::{ApiError, ControllerError, ControllerResult};
use connect_controller::models::{BrokerEndpoint, DeploymentDescriptor};
use connect_controller::orchestration::{
    EndpointPublisher, Orchestrator, StatusSink, TopicProvisioner, TopicSpec,
};
use connect_controller::StatusLevel;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One request issued against the worker API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Register(String),
    Unregister(String),
    List,
    Status(String),
    Restart(String),
    Pause(String),
    Resume(String),
    Tasks(String),
}

impl ApiCall {
    pub fn connector(&self) -> Option<&str> {
        match self {
            Self::List => None,
            Self::Register(name)
            | Self::Unregister(name)
            | Self::Status(name)
            | Self::Restart(name)
            | Self::Pause(name)
            | Self::Resume(name)
            | Self::Tasks(name) => Some(name),
        }
    }
}

#[derive(Debug, Default)]
pub struct MockApiState {
    pub calls: Vec<ApiCall>,
    pub register_status: HashMap<String, u16>,
    pub unregister_status: HashMap<String, u16>,
    pub unreachable: bool,
    pub transport_failure: bool,
}

/// Worker API answering 201 to registrations and 204 to deletions unless scripted
#[derive(Debug, Default, Clone)]
pub struct ScriptedConnectorApi {
    state: Arc<Mutex<MockApiState>>,
}

impl ScriptedConnectorApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_register_status(&self, name: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .register_status
            .insert(name.to_string(), status);
    }

    pub fn set_unregister_status(&self, name: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .unregister_status
            .insert(name.to_string(), status);
    }

    pub fn clear_scripts(&self) {
        let mut state = self.state.lock().unwrap();
        state.register_status.clear();
        state.unregister_status.clear();
        state.unreachable = false;
        state.transport_failure = false;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn set_transport_failure(&self, failing: bool) {
        self.state.lock().unwrap().transport_failure = failing;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn answer(&self, call: ApiCall, default_status: u16) -> ApiResult {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(ApiError::Unreachable);
        }
        if state.transport_failure {
            state.calls.push(call);
            return Err(ApiError::Transport("connection refused".to_string()));
        }

        let scripted = match &call {
            ApiCall::Register(name) => state.register_status.get(name).copied(),
            ApiCall::Unregister(name) => state.unregister_status.get(name).copied(),
            _ => None,
        };
        state.calls.push(call);

        Ok(ApiResponse::new(scripted.unwrap_or(default_status), None))
    }
}

#[async_trait]
impl ConnectorApi for ScriptedConnectorApi {
    async fn register_or_update(&self, name: &str, _config: &Value) -> ApiResult {
        self.answer(ApiCall::Register(name.to_string()), 201)
    }

    async fn unregister(&self, name: &str) -> ApiResult {
        self.answer(ApiCall::Unregister(name.to_string()), 204)
    }

    async fn list_connectors(&self) -> ApiResult {
        self.answer(ApiCall::List, 200)
    }

    async fn status(&self, name: &str) -> ApiResult {
        self.answer(ApiCall::Status(name.to_string()), 200)
    }

    async fn restart(&self, name: &str) -> ApiResult {
        self.answer(ApiCall::Restart(name.to_string()), 204)
    }

    async fn pause(&self, name: &str) -> ApiResult {
        self.answer(ApiCall::Pause(name.to_string()), 202)
    }

    async fn resume(&self, name: &str) -> ApiResult {
        self.answer(ApiCall::Resume(name.to_string()), 202)
    }

    async fn list_tasks(&self, name: &str) -> ApiResult {
        self.answer(ApiCall::Tasks(name.to_string()), 200)
    }
}

/// Orchestrator that records submitted descriptors
#[derive(Debug, Default, Clone)]
pub struct RecordingOrchestrator {
    submitted: Arc<Mutex<Vec<DeploymentDescriptor>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingOrchestrator {
    pub fn submitted(&self) -> Vec<DeploymentDescriptor> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn last_submitted(&self) -> Option<DeploymentDescriptor> {
        self.submitted.lock().unwrap().last().cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl Orchestrator for RecordingOrchestrator {
    async fn submit_manifest(&self, descriptor: &DeploymentDescriptor) -> ControllerResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(ControllerError::Orchestrator(
                "manifest rejected".to_string(),
            ));
        }
        self.submitted.lock().unwrap().push(descriptor.clone());
        Ok(())
    }
}

/// Status sink recording every reported status
#[derive(Debug, Default, Clone)]
pub struct RecordingStatusSink {
    reports: Arc<Mutex<Vec<(StatusLevel, String)>>>,
}

impl RecordingStatusSink {
    pub fn reports(&self) -> Vec<(StatusLevel, String)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(StatusLevel, String)> {
        self.reports.lock().unwrap().last().cloned()
    }

    pub fn contains(&self, level: StatusLevel, message: &str) -> bool {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }
}

impl StatusSink for RecordingStatusSink {
    fn report(&self, level: StatusLevel, message: &str) {
        self.reports
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

/// Endpoint publisher recording every publication
#[derive(Debug, Default, Clone)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<(String, u16)>>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<(String, u16)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EndpointPublisher for RecordingPublisher {
    async fn publish(&self, hostname: &str, port: u16) -> ControllerResult<()> {
        self.published
            .lock()
            .unwrap()
            .push((hostname.to_string(), port));
        Ok(())
    }
}

/// Topic provisioner over an in-memory topic list
#[derive(Debug, Clone)]
pub struct FakeTopicProvisioner {
    pub live_brokers: usize,
    existing: Arc<Mutex<Vec<String>>>,
    created: Arc<Mutex<Vec<TopicSpec>>>,
}

impl FakeTopicProvisioner {
    pub fn new(live_brokers: usize, existing: &[&str]) -> Self {
        Self {
            live_brokers,
            existing: Arc::new(Mutex::new(
                existing.iter().map(|name| name.to_string()).collect(),
            )),
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn created(&self) -> Vec<TopicSpec> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl TopicProvisioner for FakeTopicProvisioner {
    async fn live_broker_count(&self, _coordinators: &[BrokerEndpoint]) -> ControllerResult<usize> {
        Ok(self.live_brokers)
    }

    async fn existing_topics(&self, _coordinators: &[BrokerEndpoint]) -> ControllerResult<Vec<String>> {
        Ok(self.existing.lock().unwrap().clone())
    }

    async fn create_topic(
        &self,
        _coordinators: &[BrokerEndpoint],
        topic: &TopicSpec,
    ) -> ControllerResult<()> {
        self.existing.lock().unwrap().push(topic.name.clone());
        self.created.lock().unwrap().push(topic.clone());
        Ok(())
    }
}
