//! # Orchestration
//!
//! Drives the worker service towards the desired state.
//!
//! ## Core Components
//!
//! - **DesiredStateBuilder**: merges base properties, computed values and operator overrides
//! - **ChangeDetector**: gates manifest submission on a structural change
//! - **RegistryRecoveryProtocol**: bulk unregister / re-register passes over the registry
//! - **TopicPlan**: bookkeeping topic specs and idempotent provisioning
//! - **ReconciliationController**: the event-driven state machine tying it all together
//!
//! Collaborators (orchestrator, status sink, endpoint publisher, topic
//! provisioner) are traits in [`types`] so hosts can supply their own transport.

pub mod change_detector;
pub mod controller;
pub mod desired_state;
pub mod recovery;
pub mod topics;
pub mod types;

pub use change_detector::{descriptors_differ, ChangeDetector};
pub use controller::{Collaborators, ControllerCheckpoint, ReconciliationController};
pub use desired_state::{parse_overrides, DesiredStateBuilder, GroupIdPolicy};
pub use recovery::RegistryRecoveryProtocol;
pub use topics::{provision_topics, replication_factor, topic_name, TopicPlan, TopicSpec};
pub use types::{EndpointPublisher, Orchestrator, StatusSink, TopicProvisioner, TracingStatusSink};
