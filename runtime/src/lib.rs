//! # Mediator Runtime
//!
//! Decorated request dispatch.
//!
//! Every registered handler is wrapped, once at startup, in a fixed chain of
//! decorators:
//!
//! ```text
//! Transaction → Validation → Metrics → Logging → Handler
//! ```
//!
//! The transaction stage is the first to see a request and the last to see
//! its result. A dispatch that fails anywhere in the chain is rolled back,
//! and the failure reaches the caller unchanged.
//!
//! ## Core Components
//!
//! - **[`MediatorBuilder`]**: explicit registration of handlers and validators
//! - **[`Mediator`]**: routes a request to its chain; async and blocking entry points
//! - **[`Scope`]**: a mediator paired with one per-request persistence context
//! - **[`stages`]**: the four decorators
//! - **[`metrics`]**: Prometheus recorder and the default metrics sink
//!
//! ## Example
//!
//! ```ignore
//! use mediator_runtime::Mediator;
//!
//! let mediator = Mediator::<SchoolContext>::builder()
//!     .handler::<CreateStudent, _>(CreateStudentHandler)
//!     .validator::<CreateStudent, _>(create_student::validate)
//!     .build()?;
//!
//! let scope = mediator.scope(SchoolContext::new(store.clone()));
//! let id = scope.send(CreateStudent { .. }).await?;
//! ```

use serde::Serialize;

/// Mediator configuration
pub mod config;

/// `tracing`-backed log context
pub mod log_context;

/// The dispatcher and per-request scopes
pub mod mediator;

/// Prometheus metrics for observability
pub mod metrics;

/// Fixed decorator order and chain assembly
pub mod pipeline;

/// Handler and validator registration
pub mod registry;

/// The decorators
pub mod stages;

pub use config::{ConfigError, MediatorConfig};
pub use log_context::TracingLogContext;
pub use mediator::{Mediator, Scope};
pub use metrics::{MetricsServer, PrometheusMetricsSink};
pub use pipeline::{PIPELINE_ORDER, PipelineServices, Stage};
pub use registry::MediatorBuilder;

/// Health check status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,

    /// Component is up but cannot serve everything it should
    Degraded,

    /// Component is not operational
    Unhealthy,
}

impl HealthStatus {
    /// Check if status is healthy
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Check if status is unhealthy
    #[must_use]
    pub const fn is_unhealthy(self) -> bool {
        matches!(self, Self::Unhealthy)
    }

    /// Get the worst status between two statuses
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Name of the component being checked
    pub component: String,

    /// Current health status
    pub status: HealthStatus,

    /// Optional message providing details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Extra details, e.g. handler counts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<(String, String)>,
}

impl HealthCheck {
    /// Create a healthy check result
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
            metadata: Vec::new(),
        }
    }

    /// Create a degraded check result
    #[must_use]
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Create an unhealthy check result
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Add metadata to the health check
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Aggregated health report
///
/// The overall status is the worst of the individual checks.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Worst of all checks
    pub status: HealthStatus,

    /// Individual component checks
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    /// Create a new health report from checks
    #[must_use]
    pub fn new(checks: Vec<HealthCheck>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .fold(HealthStatus::Healthy, HealthStatus::worst);

        Self { status, checks }
    }

    /// Check if overall system is healthy
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Check if overall system is unhealthy
    #[must_use]
    pub const fn is_unhealthy(&self) -> bool {
        self.status.is_unhealthy()
    }
}
