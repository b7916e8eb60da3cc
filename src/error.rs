//! Error types for the connect controller.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("Malformed worker-config override line '{line}': expected exactly one '='")]
    MalformedOverride { line: String },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Persistence error for {path}: {reason}")]
    Persistence { path: String, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),
    #[error("Topic provisioning error for {topic}: {reason}")]
    TopicProvisioning { topic: String, reason: String },
    #[error("{operation} stopped at connector '{connector}': {reason}")]
    PartialRecoveryFailure {
        operation: String,
        connector: String,
        reason: String,
    },
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ControllerError {
    pub fn malformed_override(line: impl Into<String>) -> Self {
        Self::MalformedOverride { line: line.into() }
    }

    pub fn persistence(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn partial_recovery(
        operation: impl Into<String>,
        connector: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PartialRecoveryFailure {
            operation: operation.into(),
            connector: connector.into(),
            reason: reason.into(),
        }
    }

    /// Whether re-delivering the same event may succeed without operator action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence { .. }
            | Self::Orchestrator(_)
            | Self::TopicProvisioning { .. }
            | Self::PartialRecoveryFailure { .. } => true,
            // Operator has to fix the configuration first
            Self::MalformedOverride { .. } | Self::Configuration(_) => false,
            Self::Serialization(_) | Self::InvalidState(_) => false,
        }
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(error: serde_json::Error) -> Self {
        ControllerError::Serialization(error.to_string())
    }
}

impl From<config::ConfigError> for ControllerError {
    fn from(error: config::ConfigError) -> Self {
        ControllerError::Configuration(error.to_string())
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Failure to complete an HTTP exchange with the worker management API.
///
/// A response carrying a non-2xx status is not an `ApiError`; it is returned
/// as a regular [`crate::client::ApiResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Worker service unreachable: no endpoint recorded")]
    Unreachable,
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport(error.to_string())
    }
}
