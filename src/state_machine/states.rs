use serde::{Deserialize, Serialize};
use std::fmt;

/// Reconciliation state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationState {
    /// One or more required dependencies are missing
    Blocked,
    /// All dependencies present, desired state not yet applied
    Ready,
    /// Building and (if changed) applying the desired state
    Configuring,
    /// Apply submitted, waiting for the orchestrator to report a healthy deployment
    Waiting,
    /// Worker service reachable and published downstream
    Active,
    /// Dependency lost, removing registered connectors from the worker service
    Unregistering,
    /// Connectors removed, replaying the registry once the worker service is back
    Reregistering,
}

impl ReconciliationState {
    /// States in which desired state has been applied to the orchestrator
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Waiting | Self::Active | Self::Reregistering)
    }

    /// States in which the registry may be in flux on the worker service
    pub fn is_recovering(&self) -> bool {
        matches!(self, Self::Unregistering | Self::Reregistering)
    }

    /// Check if this is the active state (worker service reachable)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ReconciliationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "blocked"),
            Self::Ready => write!(f, "ready"),
            Self::Configuring => write!(f, "configuring"),
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Unregistering => write!(f, "unregistering"),
            Self::Reregistering => write!(f, "reregistering"),
        }
    }
}

impl std::str::FromStr for ReconciliationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocked" => Ok(Self::Blocked),
            "ready" => Ok(Self::Ready),
            "configuring" => Ok(Self::Configuring),
            "waiting" => Ok(Self::Waiting),
            "active" => Ok(Self::Active),
            "unregistering" => Ok(Self::Unregistering),
            "reregistering" => Ok(Self::Reregistering),
            _ => Err(format!("Invalid reconciliation state: {s}")),
        }
    }
}

/// A fresh controller is blocked until it has observed its dependencies
impl Default for ReconciliationState {
    fn default() -> Self {
        Self::Blocked
    }
}
