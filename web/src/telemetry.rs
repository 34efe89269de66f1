//! Tracing subscriber installation.
//!
//! Library crates only emit events. The binary calls [`init_tracing`] once at
//! startup.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors from installing the subscriber.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The filter directive could not be parsed
    #[error("Invalid log filter {filter:?}: {reason}")]
    InvalidFilter {
        /// The rejected directive
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed
    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install a `fmt` subscriber filtered by `filter` (e.g. `info,mediator_runtime=debug`).
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(filter: &str) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))
}
