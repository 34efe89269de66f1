//! Axum integration for the mediator pipeline.
//!
//! The web layer is a thin shell: it deserializes a request, opens a scope
//! with a fresh persistence context, dispatches, and maps the outcome to a
//! response.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Deserialize** the body or query string into a request value
//! 3. **Open a scope** from the [`AppState`] context factory
//! 4. **Dispatch** through the mediator's decorated chain
//! 5. **Map result** to HTTP: the response as JSON, a validation failure as 400
//!    with the model state, anything else as 500
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::{get, post}};
//! use mediator_web::{AppState, build_router, handlers::{dispatch_json, dispatch_query}};
//!
//! let routes = Router::new()
//!     .route("/students", post(dispatch_json::<CreateStudent, SchoolContext>))
//!     .route("/students", get(dispatch_query::<ListStudents, SchoolContext>));
//!
//! let app = build_router(routes, AppState::new(mediator, move || SchoolContext::new(store.clone())));
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod telemetry;

// Re-export key types for convenience
pub use config::WebConfig;
pub use error::{AppError, ModelState};
pub use router::{build_router, metrics_router};
pub use state::AppState;
pub use telemetry::init_tracing;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
