// State machine module for the reconciliation controller
//
// A single authoritative ReconciliationState replaces independent guarded
// handlers; DependencyFacts carries the external facts the guards read.

pub mod events;
pub mod guards;
pub mod states;

// Re-export main types for convenient access
pub use events::ControllerEvent;
pub use guards::{BlockedReason, BrokerTopology, DependencyFacts, TransitionGuard};
pub use states::ReconciliationState;
