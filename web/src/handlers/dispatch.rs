//! Generic dispatch handlers.
//!
//! Route a request type straight to the mediator without a hand-written
//! handler per endpoint:
//!
//! ```ignore
//! Router::new()
//!     .route("/students", post(dispatch_json::<CreateStudent, SchoolContext>))
//!     .route("/students", get(dispatch_query::<ListStudents, SchoolContext>))
//! ```

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use mediator_core::{PersistenceContext, Request};
use serde::{Serialize, de::DeserializeOwned};

/// Dispatch a JSON body as request `R` in a fresh scope.
///
/// # Errors
///
/// Returns [`AppError`]: 400 with the model state for validation failures,
/// 500 for anything else the dispatch fails with.
pub async fn dispatch_json<R, C>(
    State(state): State<AppState<C>>,
    Json(request): Json<R>,
) -> Result<Json<R::Response>, AppError>
where
    R: Request + DeserializeOwned,
    R::Response: Serialize,
    C: PersistenceContext + 'static,
{
    let scope = state.scope();
    let response = scope.send(request).await?;
    Ok(Json(response))
}

/// Dispatch query-string parameters as request `R` in a fresh scope.
///
/// # Errors
///
/// Same as [`dispatch_json`].
pub async fn dispatch_query<R, C>(
    State(state): State<AppState<C>>,
    Query(request): Query<R>,
) -> Result<Json<R::Response>, AppError>
where
    R: Request + DeserializeOwned,
    R::Response: Serialize,
    C: PersistenceContext + 'static,
{
    let scope = state.scope();
    let response = scope.send(request).await?;
    Ok(Json(response))
}
