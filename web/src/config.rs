//! Web host configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use mediator_runtime::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Host configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebConfig {
    /// Address the API listens on (`BIND_ADDR`)
    pub bind_addr: SocketAddr,
    /// Address the Prometheus scrape endpoint listens on (`METRICS_ADDR`); disabled when unset
    pub metrics_addr: Option<SocketAddr>,
    /// `tracing` filter directive (`RUST_LOG`)
    pub log_filter: String,
    /// Database connection string (`DATABASE_URL`), passed to the persistence layer
    pub connection_string: Option<String>,
}

impl WebConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            bind_addr: lookup("BIND_ADDR")
                .map(|raw| parse_addr("BIND_ADDR", &raw))
                .transpose()?
                .unwrap_or(defaults.bind_addr),
            metrics_addr: lookup("METRICS_ADDR")
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| parse_addr("METRICS_ADDR", &raw))
                .transpose()?,
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
            connection_string: lookup("DATABASE_URL").filter(|raw| !raw.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Empty`] if the log filter is blank
    /// - [`ConfigError::InvalidValue`] if the API and metrics share an address
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Empty("RUST_LOG"));
        }
        if self.metrics_addr == Some(self.bind_addr) {
            return Err(ConfigError::InvalidValue {
                key: "METRICS_ADDR",
                value: self.bind_addr.to_string(),
                reason: "must differ from BIND_ADDR".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_addr(key: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.trim().parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            metrics_addr: None,
            log_filter: "info".to_string(),
            connection_string: None,
        }
    }
}
