//! Router assembly.
//!
//! Application routes are merged under the shared health endpoints and a
//! `TraceLayer`, then bound to the [`AppState`].

use crate::handlers::{health_check, readiness};
use crate::state::AppState;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use mediator_core::PersistenceContext;
use mediator_runtime::MetricsServer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// Adds `GET /health` and `GET /health/ready` to `routes`.
pub fn build_router<C>(routes: Router<AppState<C>>, state: AppState<C>) -> Router
where
    C: PersistenceContext + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness::<C>))
        .merge(routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router serving the Prometheus scrape body at `GET /metrics`.
pub fn metrics_router(server: Arc<MetricsServer>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(server)
}

#[allow(clippy::unused_async)]
async fn render_metrics(State(server): State<Arc<MetricsServer>>) -> (StatusCode, String) {
    match server.render() {
        Some(body) => (StatusCode::OK, body),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
