//! # Reconciliation Controller
//!
//! Consumes one [`ControllerEvent`] at a time, folds it into the observed
//! dependency facts and then steps the state machine until it settles.
//!
//! ```text
//! Blocked -> Ready -> Configuring -> Waiting -> Active
//!                                       ^         |
//!                                       |   dependency lost
//!                                       |         v
//!                             Reregistering <- Unregistering
//! ```
//!
//! Losing the broker or the orchestrator while a worker service is deployed
//! unregisters every connector before the service goes away; once a healthy
//! replacement is reported the registry is replayed against it. Failed passes
//! leave the controller in place and are retried on the next event.
//!
//! `handle` never returns an error: collaborator failures become status
//! messages and structured log events.

use super::change_detector::ChangeDetector;
use super::desired_state::{DesiredStateBuilder, GroupIdPolicy};
use super::recovery::RegistryRecoveryProtocol;
use super::topics::{provision_topics, TopicPlan};
use super::types::{EndpointPublisher, Orchestrator, StatusSink, TopicProvisioner};
use crate::client::{ApiResult, ConnectorApi, EndpointCell, WorkerApiClient, WorkerApiConfig};
use crate::config::{ControllerConfig, TopicSettings};
use crate::constants::{deployment, messages, topics, StatusLevel};
use crate::error::{ControllerError, ControllerResult};
use crate::logging::{log_connector_operation, log_error, log_reconciliation_operation};
use crate::models::{
    DeploymentDescriptor, DeploymentObservation, ServiceEndpoint, WorkerConfiguration,
};
use crate::persistence::{InMemoryStore, JsonFileStore, SnapshotStore};
use crate::registry::{ConnectorConfig, ConnectorRegistry};
use crate::state_machine::{
    BlockedReason, BrokerTopology, ControllerEvent, DependencyFacts, ReconciliationState,
    TransitionGuard,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "reconciliation_controller";

/// Upper bound on transitions taken for a single event
const MAX_STEPS_PER_EVENT: usize = 16;

/// External systems the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub orchestrator: Arc<dyn Orchestrator>,
    pub status: Arc<dyn StatusSink>,
    pub publisher: Arc<dyn EndpointPublisher>,
    /// Provisions missing bookkeeping topics while blocked on them
    pub topic_provisioner: Option<Arc<dyn TopicProvisioner>>,
}

/// Durable controller state, saved after every handled event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerCheckpoint {
    pub state: ReconciliationState,
    pub facts: DependencyFacts,
    pub endpoint: Option<ServiceEndpoint>,
    pub committed: Option<DeploymentDescriptor>,
    pub last_observation: Option<DeploymentObservation>,
    pub base_properties: WorkerConfiguration,
    pub image: Option<String>,
    pub desired_state_current: bool,
    /// A worker deployment was applied and its connectors not yet unregistered
    #[serde(default)]
    pub deployment_live: bool,
    pub reregistration_pending: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

enum Step {
    /// Settled for this event
    Stay,
    Next(ReconciliationState),
    /// Transition, report the blocked message and stop processing the event
    Halt(ReconciliationState, String),
}

pub struct ReconciliationController {
    config: ControllerConfig,
    state: ReconciliationState,
    facts: DependencyFacts,
    base_properties: WorkerConfiguration,
    image: Option<String>,
    /// Desired state was built from the current inputs
    desired_state_current: bool,
    /// Worker deployment applied; cleared once its connectors are unregistered
    deployment_live: bool,
    /// Connectors were unregistered and still have to be replayed
    reregistration_pending: bool,
    last_observation: Option<DeploymentObservation>,
    change_detector: ChangeDetector,
    endpoint: EndpointCell,
    registry: ConnectorRegistry,
    api: Arc<dyn ConnectorApi>,
    collaborators: Collaborators,
    checkpoint_store: Arc<dyn SnapshotStore<ControllerCheckpoint>>,
    last_status: Option<(StatusLevel, String)>,
}

impl std::fmt::Debug for ReconciliationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationController")
            .field("application", &self.config.application_name)
            .field("state", &self.state)
            .field("endpoint", &self.endpoint.get())
            .field("registry", &self.registry)
            .field("checkpoint", &self.checkpoint_store.location())
            .finish()
    }
}

impl ReconciliationController {
    /// Controller with an in-memory checkpoint
    ///
    /// `endpoint` must be the cell `api` resolves its base URL from.
    pub fn new(
        config: ControllerConfig,
        registry: ConnectorRegistry,
        api: Arc<dyn ConnectorApi>,
        endpoint: EndpointCell,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            config,
            state: ReconciliationState::default(),
            facts: DependencyFacts::default(),
            base_properties: WorkerConfiguration::new(),
            image: None,
            desired_state_current: false,
            deployment_live: false,
            reregistration_pending: false,
            last_observation: None,
            change_detector: ChangeDetector::new(),
            endpoint,
            registry,
            api,
            collaborators,
            checkpoint_store: Arc::new(InMemoryStore::new()),
            last_status: None,
        }
    }

    /// Open the file-backed registry and checkpoint named in `config` and talk
    /// to the worker service over HTTP
    pub fn open(config: ControllerConfig, collaborators: Collaborators) -> ControllerResult<Self> {
        config.validate()?;

        let registry =
            ConnectorRegistry::open(Arc::new(JsonFileStore::new(config.registry_path.clone())))?;
        let endpoint = EndpointCell::new();
        let api = WorkerApiClient::new(
            WorkerApiConfig {
                timeout_ms: config.api_timeout_ms,
            },
            endpoint.clone(),
        )?;
        let checkpoint_store = Arc::new(JsonFileStore::new(config.checkpoint_path.clone()));

        Self::new(config, registry, Arc::new(api), endpoint, collaborators)
            .with_checkpoint_store(checkpoint_store)
    }

    /// Use `store` for checkpoints, resuming from its last checkpoint if any
    pub fn with_checkpoint_store(
        mut self,
        store: Arc<dyn SnapshotStore<ControllerCheckpoint>>,
    ) -> ControllerResult<Self> {
        if let Some(checkpoint) = store.load()? {
            info!(
                state = %checkpoint.state,
                store = %store.location(),
                "Resuming controller from checkpoint"
            );
            self.restore(checkpoint);
        }
        self.checkpoint_store = store;
        Ok(self)
    }

    pub fn state(&self) -> ReconciliationState {
        self.state
    }

    /// Currently reachable worker management endpoint
    pub fn worker_service(&self) -> Option<ServiceEndpoint> {
        self.endpoint.get()
    }

    pub fn facts(&self) -> &DependencyFacts {
        &self.facts
    }

    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    pub fn api(&self) -> &dyn ConnectorApi {
        self.api.as_ref()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Last descriptor submitted to the orchestrator
    pub fn committed_descriptor(&self) -> Option<&DeploymentDescriptor> {
        self.change_detector.snapshot()
    }

    pub fn is_reregistration_pending(&self) -> bool {
        self.reregistration_pending
    }

    /// A worker deployment is applied whose connectors may still be registered
    pub fn is_deployment_live(&self) -> bool {
        self.deployment_live
    }

    pub fn configs_topic(&self) -> Option<String> {
        self.topic_settings().map(|t| t.configs)
    }

    pub fn offsets_topic(&self) -> Option<String> {
        self.topic_settings().map(|t| t.offsets)
    }

    pub fn status_topic(&self) -> Option<String> {
        self.topic_settings().map(|t| t.status)
    }

    /// Operator topic names, or the conventional names when the operator set none
    fn topic_settings(&self) -> Option<TopicSettings> {
        let settings = self.facts.settings.as_ref()?;
        Some(settings.topics.clone().unwrap_or_else(|| {
            TopicSettings::conventional(&self.config.environment, &self.config.application_name)
        }))
    }

    /// Record `config` in the registry, then submit it to the worker service
    ///
    /// The registry write happens first so the connector is replayed after a
    /// redeployment even when the worker service is unreachable right now.
    pub async fn register_connector(
        &mut self,
        name: &str,
        config: ConnectorConfig,
    ) -> ControllerResult<ApiResult> {
        self.registry.put(name, config.clone())?;
        let result = self.api.register_or_update(name, &config).await;
        log_connector_operation("register", name, status_code(&result), None);
        Ok(result)
    }

    /// Drop `name` from the registry, then delete it on the worker service
    pub async fn unregister_connector(&mut self, name: &str) -> ControllerResult<ApiResult> {
        self.registry.remove(name)?;
        let result = self.api.unregister(name).await;
        log_connector_operation("unregister", name, status_code(&result), None);
        Ok(result)
    }

    /// Process one event and return the state the controller settled in
    pub async fn handle(&mut self, event: ControllerEvent) -> ReconciliationState {
        let event_type = event.event_type();
        let previous = self.state;
        let consumer_joined = matches!(event, ControllerEvent::ConsumerJoined);
        debug!(event = event_type, state = %previous, "Handling controller event");

        self.absorb(event);
        self.reconcile(event_type).await;

        if consumer_joined && previous.is_active() && self.state.is_active() {
            self.publish_endpoint().await;
        }

        self.persist_checkpoint();
        self.state
    }

    /// Snapshot of everything needed to resume after a restart
    pub fn checkpoint(&self) -> ControllerCheckpoint {
        ControllerCheckpoint {
            state: self.state,
            facts: self.facts.clone(),
            endpoint: self.endpoint.get(),
            committed: self.change_detector.snapshot().cloned(),
            last_observation: self.last_observation.clone(),
            base_properties: self.base_properties.clone(),
            image: self.image.clone(),
            desired_state_current: self.desired_state_current,
            deployment_live: self.deployment_live,
            reregistration_pending: self.reregistration_pending,
            updated_at: Some(Utc::now()),
        }
    }

    fn restore(&mut self, checkpoint: ControllerCheckpoint) {
        self.state = checkpoint.state;
        self.facts = checkpoint.facts;
        self.endpoint.set(checkpoint.endpoint);
        self.change_detector = ChangeDetector::with_snapshot(checkpoint.committed);
        self.last_observation = checkpoint.last_observation;
        self.base_properties = checkpoint.base_properties;
        self.image = checkpoint.image;
        self.desired_state_current = checkpoint.desired_state_current;
        self.deployment_live = checkpoint.deployment_live;
        self.reregistration_pending = checkpoint.reregistration_pending;
    }

    fn persist_checkpoint(&self) {
        if let Err(e) = self.checkpoint_store.save(&self.checkpoint()) {
            log_error(
                COMPONENT,
                "persist_checkpoint",
                &e.to_string(),
                Some(&self.checkpoint_store.location()),
            );
        }
    }

    /// Fold an event into the observed facts
    fn absorb(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::OrchestratorAvailable => self.facts.orchestrator_available = true,
            ControllerEvent::OrchestratorLost => self.facts.orchestrator_available = false,
            ControllerEvent::BrokerTopologyChanged {
                brokers,
                coordinators,
            } => self.absorb_topology(BrokerTopology::new(brokers, coordinators)),
            ControllerEvent::BrokerLost => self.facts.broker = None,
            ControllerEvent::ConfigChanged(settings) => {
                self.facts.settings = Some(settings);
                self.desired_state_current = false;
            }
            ControllerEvent::TopicsReady(names) => {
                let distinct: BTreeSet<String> = names.into_iter().collect();
                if distinct.len() >= topics::REQUIRED_TOPIC_COUNT {
                    self.facts.topics_created = true;
                } else {
                    debug!(reported = distinct.len(), "Not all bookkeeping topics reported yet");
                }
            }
            ControllerEvent::OrchestratorStatus(report) => match report.observe() {
                None => debug!(uuid = %report.uuid, "Incomplete orchestrator status, ignoring"),
                Some(observation) => {
                    if self.state.is_configured() || self.state.is_recovering() {
                        self.last_observation = Some(observation);
                    } else {
                        debug!(state = %self.state, "Orchestrator status before configuration, ignoring");
                    }
                }
            },
            ControllerEvent::WorkerPropertiesChanged(properties) => {
                self.base_properties = properties.into();
                self.desired_state_current = false;
            }
            ControllerEvent::BaseImageChanged(image) => {
                self.image = Some(image);
                self.desired_state_current = false;
            }
            ControllerEvent::ConsumerJoined | ControllerEvent::Tick => {}
        }
    }

    fn absorb_topology(&mut self, topology: BrokerTopology) {
        if topology.brokers.is_empty() {
            self.facts.broker = None;
            return;
        }

        let brokers_changed = self
            .facts
            .broker
            .as_ref()
            .map_or(true, |previous| previous.brokers != topology.brokers);

        if brokers_changed && self.state.is_configured() {
            info!(
                bootstrap_servers = %topology.bootstrap_servers(),
                "Broker membership changed, reconfiguring worker service"
            );
            self.change_detector.reset();
            self.desired_state_current = false;
        }

        self.facts.broker = Some(topology);
    }

    async fn reconcile(&mut self, event_type: &str) {
        for _ in 0..MAX_STEPS_PER_EVENT {
            match self.step().await {
                Step::Stay => return,
                Step::Next(to) => {
                    if !self.transition(to, event_type).await {
                        return;
                    }
                }
                Step::Halt(to, message) => {
                    if self.transition(to, event_type).await {
                        self.report(StatusLevel::Blocked, &message);
                    }
                    return;
                }
            }
        }
        warn!(state = %self.state, event = event_type, "Reconciliation did not settle");
    }

    async fn step(&mut self) -> Step {
        use ReconciliationState::*;

        match self.state {
            Blocked => self.step_blocked().await,
            Ready => match self.facts.blocked_reason() {
                Some(_) => Step::Next(Blocked),
                None => Step::Next(Configuring),
            },
            Configuring => match self.configure().await {
                Ok(()) => Step::Next(Waiting),
                Err(e) => {
                    log_error(COMPONENT, "configure", &e.to_string(), None);
                    Step::Halt(Blocked, failure_message(&e))
                }
            },
            Waiting => self.step_waiting(),
            Active => self.step_active().await,
            Unregistering => self.step_unregistering().await,
            Reregistering => self.step_reregistering().await,
        }
    }

    /// Exit shared by the states that have a deployed worker service
    fn deployed_exit(&self) -> Option<ReconciliationState> {
        match self.facts.blocked_reason() {
            Some(reason) if reason.is_dependency_loss() => Some(ReconciliationState::Unregistering),
            Some(_) => Some(ReconciliationState::Blocked),
            None if !self.desired_state_current => Some(ReconciliationState::Configuring),
            None => None,
        }
    }

    fn observed_endpoint(&self) -> Option<ServiceEndpoint> {
        self.last_observation
            .as_ref()
            .and_then(DeploymentObservation::service_endpoint)
    }

    async fn step_blocked(&mut self) -> Step {
        if self.deployment_live && !self.facts.dependencies_available() {
            info!("Dependency lost while blocked with a live worker deployment");
            return Step::Next(ReconciliationState::Unregistering);
        }

        match self.facts.blocked_reason() {
            None => Step::Next(ReconciliationState::Ready),
            Some(BlockedReason::TopicsNotCreated) if self.collaborators.topic_provisioner.is_some() => {
                match self.provision().await {
                    Ok(()) => Step::Next(ReconciliationState::Ready),
                    Err(e) => {
                        log_error(COMPONENT, "provision_topics", &e.to_string(), None);
                        self.report(StatusLevel::Blocked, &failure_message(&e));
                        Step::Stay
                    }
                }
            }
            Some(reason) => {
                self.report(StatusLevel::Blocked, &reason.message());
                Step::Stay
            }
        }
    }

    fn step_waiting(&mut self) -> Step {
        if let Some(next) = self.deployed_exit() {
            return Step::Next(next);
        }

        match self.observed_endpoint() {
            Some(endpoint) => {
                self.endpoint.set(Some(endpoint));
                if self.reregistration_pending {
                    Step::Next(ReconciliationState::Reregistering)
                } else {
                    Step::Next(ReconciliationState::Active)
                }
            }
            None => Step::Stay,
        }
    }

    async fn step_active(&mut self) -> Step {
        if let Some(next) = self.deployed_exit() {
            return Step::Next(next);
        }

        match self.observed_endpoint() {
            Some(endpoint) => {
                if self.endpoint.get().as_ref() != Some(&endpoint) {
                    info!(endpoint = %endpoint, "Worker service endpoint moved");
                    self.endpoint.set(Some(endpoint));
                    self.publish_endpoint().await;
                }
                Step::Stay
            }
            None => {
                info!("Worker deployment no longer available");
                self.endpoint.set(None);
                Step::Next(ReconciliationState::Waiting)
            }
        }
    }

    async fn step_unregistering(&mut self) -> Step {
        if let Some(endpoint) = self.observed_endpoint() {
            self.endpoint.set(Some(endpoint));
        }

        if self.endpoint.get().is_none() {
            info!("No worker service endpoint recorded, nothing to unregister");
            self.deployment_live = false;
            return Step::Next(ReconciliationState::Reregistering);
        }

        let unregistered = RegistryRecoveryProtocol::new(&self.registry, self.api.as_ref())
            .unregister_all()
            .await;

        if unregistered {
            self.endpoint.set(None);
            self.last_observation = None;
            self.deployment_live = false;
            self.reregistration_pending = true;
            Step::Next(ReconciliationState::Reregistering)
        } else {
            self.report(StatusLevel::Blocked, messages::UNREGISTER_FAILED);
            Step::Stay
        }
    }

    async fn step_reregistering(&mut self) -> Step {
        if self.endpoint.get().is_none() {
            return match self.facts.blocked_reason() {
                Some(_) => Step::Next(ReconciliationState::Blocked),
                None if !self.desired_state_current => Step::Next(ReconciliationState::Configuring),
                None => Step::Next(ReconciliationState::Waiting),
            };
        }

        if let Some(next) = self.deployed_exit() {
            return Step::Next(next);
        }

        if self.observed_endpoint().is_none() {
            self.endpoint.set(None);
            return Step::Next(ReconciliationState::Waiting);
        }

        let reregistered = RegistryRecoveryProtocol::new(&self.registry, self.api.as_ref())
            .reregister_all()
            .await;

        if reregistered {
            self.reregistration_pending = false;
            Step::Next(ReconciliationState::Active)
        } else {
            self.report(StatusLevel::Blocked, messages::REREGISTER_FAILED);
            Step::Stay
        }
    }

    async fn transition(&mut self, to: ReconciliationState, event_type: &str) -> bool {
        let from = self.state;
        if !TransitionGuard::can_transition(from, to) {
            log_error(
                COMPONENT,
                "transition",
                &format!("Illegal transition {from} -> {to}"),
                Some(event_type),
            );
            return false;
        }

        self.state = to;
        log_reconciliation_operation("transition", &from.to_string(), &to.to_string(), event_type, None);
        self.on_enter(from, to).await;
        true
    }

    async fn on_enter(&mut self, from: ReconciliationState, to: ReconciliationState) {
        match to {
            ReconciliationState::Blocked => {
                if let Some(reason) = self.facts.blocked_reason() {
                    self.report(StatusLevel::Blocked, &reason.message());
                }
            }
            ReconciliationState::Ready | ReconciliationState::Configuring => {}
            ReconciliationState::Waiting => {
                self.report(StatusLevel::Waiting, messages::WAITING_FOR_DEPLOYMENT)
            }
            ReconciliationState::Active => {
                let message = if from == ReconciliationState::Reregistering {
                    messages::READY
                } else {
                    messages::DEPLOYMENT_RUNNING
                };
                self.report(StatusLevel::Active, message);
                self.publish_endpoint().await;
            }
            ReconciliationState::Unregistering => {
                self.change_detector.reset();
                self.desired_state_current = false;
                self.report(StatusLevel::Maintenance, messages::UNREGISTERING);
            }
            ReconciliationState::Reregistering => {
                if self.endpoint.get().is_some() {
                    self.report(StatusLevel::Maintenance, messages::REREGISTERING);
                }
            }
        }
    }

    /// Build the desired state and submit it when it differs from the last apply
    async fn configure(&mut self) -> ControllerResult<()> {
        let settings = self
            .facts
            .settings
            .clone()
            .ok_or_else(|| ControllerError::InvalidState("configuring without settings".to_string()))?;
        let topology = self.facts.broker.clone().ok_or_else(|| {
            ControllerError::InvalidState("configuring without broker topology".to_string())
        })?;

        let group_id = GroupIdPolicy::from_setting(&settings.group_id, self.config.derived_group_id());
        let properties = DesiredStateBuilder::build(
            &self.base_properties,
            &settings.worker_config,
            &topology.brokers,
            &group_id,
            self.topic_settings().as_ref(),
        )?;

        let replicas = settings.workers.unwrap_or(deployment::DEFAULT_REPLICAS);
        let image = self.image.as_deref().unwrap_or(&self.config.default_image);
        let descriptor = DesiredStateBuilder::descriptor(
            &self.config.application_name,
            properties,
            replicas,
            image,
        );

        if self.change_detector.has_changed(&descriptor) {
            self.collaborators
                .orchestrator
                .submit_manifest(&descriptor)
                .await?;
            info!(
                deployment = %descriptor.deployment_name,
                version = %descriptor.version_marker,
                replicas,
                "Submitted worker deployment"
            );
            self.change_detector.commit(descriptor);
            self.last_observation = None;
        } else {
            debug!(version = %descriptor.version_marker, "Desired state unchanged, skipping apply");
        }

        self.desired_state_current = true;
        self.deployment_live = true;
        Ok(())
    }

    async fn provision(&mut self) -> ControllerResult<()> {
        let Some(provisioner) = self.collaborators.topic_provisioner.clone() else {
            return Ok(());
        };
        let operator_topics = self
            .facts
            .settings
            .as_ref()
            .ok_or_else(|| ControllerError::InvalidState("provisioning without settings".to_string()))?
            .topics
            .clone();
        let coordinators = self
            .facts
            .broker
            .as_ref()
            .map(|topology| topology.coordinators.clone())
            .unwrap_or_default();

        let live_brokers = provisioner.live_broker_count(&coordinators).await?;
        let plan = match operator_topics {
            Some(topics) => TopicPlan::from_settings(&topics, live_brokers),
            None => TopicPlan::for_application(
                &self.config.environment,
                &self.config.application_name,
                live_brokers,
            ),
        };
        provision_topics(provisioner.as_ref(), &coordinators, &plan).await?;

        self.facts.topics_created = true;
        Ok(())
    }

    async fn publish_endpoint(&self) {
        let Some(endpoint) = self.endpoint.get() else {
            return;
        };

        match self
            .collaborators
            .publisher
            .publish(&endpoint.host, endpoint.port)
            .await
        {
            Ok(()) => info!(endpoint = %endpoint, "Published worker service endpoint"),
            Err(e) => log_error(
                COMPONENT,
                "publish_endpoint",
                &e.to_string(),
                Some(&endpoint.to_string()),
            ),
        }
    }

    /// Forward to the status sink, skipping repeats of the current status
    fn report(&mut self, level: StatusLevel, message: &str) {
        let repeated = self
            .last_status
            .as_ref()
            .is_some_and(|(last_level, last_message)| *last_level == level && last_message == message);
        if repeated {
            return;
        }

        self.collaborators.status.report(level, message);
        self.last_status = Some((level, message.to_string()));
    }
}

/// Status text for a failed step; retryable failures say they will be retried
fn failure_message(error: &ControllerError) -> String {
    if error.is_retryable() {
        format!("{error}, retrying next event")
    } else {
        error.to_string()
    }
}

fn status_code(result: &ApiResult) -> Option<u16> {
    result.as_ref().ok().map(|response| response.status_code)
}
