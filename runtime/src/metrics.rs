//! Prometheus metrics for the dispatch pipeline.
//!
//! The stages report through the `metrics` facade. Nothing is exported until
//! a recorder is installed, which is what [`MetricsServer::start`] does; before
//! that every recording call is a no-op.
//!
//! # Example
//!
//! ```rust,no_run
//! use mediator_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Serve `server.render()` at /metrics
//! # Ok(())
//! # }
//! ```

use mediator_core::MetricsSink;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the handle used to render the scrape body.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a metrics server that will be scraped at `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint is served on
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// A recorder can only be installed once per process. If one is already
    /// installed (e.g., by another test) this returns `Ok` without a handle,
    /// and [`render`](Self::render) returns `None`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "mediator_requests_total",
        "Total number of dispatches that reached the handler chain, by request type"
    );
    describe_histogram!(
        "mediator_request_duration_seconds",
        "Time spent in the handler chain, by request type"
    );
    describe_counter!(
        "mediator_validation_failures_total",
        "Total number of requests rejected by validation, by request type"
    );
    describe_counter!(
        "mediator_transactions_committed_total",
        "Total number of committed units of work"
    );
    describe_counter!(
        "mediator_transactions_rolled_back_total",
        "Total number of rolled back units of work"
    );
    describe_counter!(
        "mediator_transaction_rollback_failures_total",
        "Total number of rollbacks that themselves failed"
    );
}

/// [`MetricsSink`] reporting to Prometheus and the log.
///
/// Every record is logged at info level. Records slower than the configured
/// threshold are also logged at warn level.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusMetricsSink {
    slow_request_threshold: Duration,
}

impl PrometheusMetricsSink {
    /// Create a sink warning about dispatches slower than `slow_request_threshold`
    #[must_use]
    pub const fn new(slow_request_threshold: Duration) -> Self {
        Self {
            slow_request_threshold,
        }
    }
}

impl MetricsSink for PrometheusMetricsSink {
    fn record(&self, name: &str, elapsed: Duration) {
        counter!("mediator_requests_total", "request_type" => name.to_string()).increment(1);
        histogram!("mediator_request_duration_seconds", "request_type" => name.to_string())
            .record(elapsed.as_secs_f64());

        tracing::info!("{name} executed, time elapsed {elapsed:?}");
        if elapsed > self.slow_request_threshold {
            tracing::warn!(
                request_type = name,
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                threshold_ms = u64::try_from(self.slow_request_threshold.as_millis()).unwrap_or(u64::MAX),
                "Slow request"
            );
        }
    }
}

/// Transaction stage metrics recorder.
pub struct TransactionMetrics;

impl TransactionMetrics {
    /// Record a committed unit of work.
    pub fn record_commit() {
        counter!("mediator_transactions_committed_total").increment(1);
    }

    /// Record a rolled back unit of work.
    pub fn record_rollback() {
        counter!("mediator_transactions_rolled_back_total").increment(1);
    }

    /// Record a rollback that failed.
    pub fn record_rollback_failure() {
        counter!("mediator_transaction_rollback_failures_total").increment(1);
    }
}

/// Validation stage metrics recorder.
pub struct ValidationMetrics;

impl ValidationMetrics {
    /// Record a request rejected by validation.
    pub fn record_failure(request_type: &str) {
        counter!("mediator_validation_failures_total", "request_type" => request_type.to_string())
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn server() -> MetricsServer {
        MetricsServer::new(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
    }

    #[test]
    fn test_metrics_server_creation() {
        let server = server();
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
        assert_eq!(server.addr().port(), 0);
    }

    #[test]
    fn test_metrics_server_render() {
        let mut server = server();
        assert!(server.start().is_ok());

        PrometheusMetricsSink::new(Duration::from_secs(1)).record("CreateStudent", Duration::from_millis(20));
        TransactionMetrics::record_commit();
        ValidationMetrics::record_failure("CreateStudent");

        // Another test in this binary may own the recorder
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("mediator_requests_total"));
            assert!(rendered.contains("mediator_transactions_committed_total"));
            assert!(rendered.contains("mediator_validation_failures_total"));
        }
    }

    #[test]
    fn test_sink_without_recorder_is_a_noop() {
        let sink = PrometheusMetricsSink::new(Duration::ZERO);
        sink.record("Anything", Duration::from_millis(1));
    }
}
