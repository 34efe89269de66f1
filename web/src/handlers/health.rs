//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use mediator_core::PersistenceContext;
use mediator_runtime::HealthReport;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check backed by mediator health.
///
/// # Status Codes
///
/// - 200 OK: Healthy or Degraded
/// - 503 Service Unavailable: Unhealthy
///
/// # Endpoint
///
/// ```text
/// GET /health/ready
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "checks": [
///     { "component": "mediator", "status": "healthy", "metadata": [["handlers", "2"]] }
///   ]
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn readiness<C>(State(state): State<AppState<C>>) -> (StatusCode, Json<HealthReport>)
where
    C: PersistenceContext + 'static,
{
    let report = HealthReport::new(vec![state.mediator().health()]);

    let status = if report.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status, Json(report))
}
