//! # Structured Logging Module
//!
//! Environment-aware console logging using the tracing ecosystem. The
//! controller runs as a container sidecar, so logs go to stdout only.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let console_layer = if use_json_format() {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already exist (tests, embedding host)
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("CONNECT_CONTROLLER_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" | "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn use_json_format() -> bool {
    std::env::var("CONNECT_CONTROLLER_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log a reconciliation state change or decision
pub fn log_reconciliation_operation(
    operation: &str,
    from_state: &str,
    to_state: &str,
    event: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        from_state = %from_state,
        to_state = %to_state,
        event = %event,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "RECONCILIATION_OPERATION"
    );
}

/// Log a connector registration or removal against the worker API
pub fn log_connector_operation(
    operation: &str,
    connector: &str,
    status_code: Option<u16>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        connector = %connector,
        status_code = status_code,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "CONNECTOR_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
