//! Mediator configuration.
//!
//! Loaded from environment variables with defaults, or built in code with the
//! `with_*` methods.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`MediatorConfig::request_type_property`]
pub const REQUEST_TYPE_PROPERTY_ENV: &str = "MEDIATOR_REQUEST_TYPE_PROPERTY";

/// Environment variable overriding the slow request threshold, in milliseconds
pub const SLOW_REQUEST_MS_ENV: &str = "MEDIATOR_SLOW_REQUEST_MS";

/// Errors from loading or validating configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A required setting is empty
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Settings shared by every dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediatorConfig {
    /// Key the logging stage pushes the request type under
    pub request_type_property: String,
    /// Dispatches slower than this are logged at warn level, in milliseconds
    pub slow_request_threshold_ms: u64,
}

impl MediatorConfig {
    /// Set the log property key
    #[must_use]
    pub fn with_request_type_property(mut self, key: impl Into<String>) -> Self {
        self.request_type_property = key.into();
        self
    }

    /// Set the slow request threshold
    #[must_use]
    pub fn with_slow_request_threshold(mut self, threshold: Duration) -> Self {
        self.slow_request_threshold_ms = u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Slow request threshold as a [`Duration`]
    #[must_use]
    pub const fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let request_type_property = lookup(REQUEST_TYPE_PROPERTY_ENV)
            .unwrap_or(defaults.request_type_property);

        let slow_request_threshold_ms = match lookup(SLOW_REQUEST_MS_ENV) {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: SLOW_REQUEST_MS_ENV,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.slow_request_threshold_ms,
        };

        let config = Self {
            request_type_property,
            slow_request_threshold_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] if the log property key is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_type_property.trim().is_empty() {
            return Err(ConfigError::Empty(REQUEST_TYPE_PROPERTY_ENV));
        }
        Ok(())
    }
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            request_type_property: "request_type".to_string(),
            slow_request_threshold_ms: 500,
        }
    }
}
