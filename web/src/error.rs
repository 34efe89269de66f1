//! Error types for web handlers.
//!
//! [`AppError`] is the only place dispatch failures become HTTP responses.
//! A [`ValidationError`] becomes a 400 whose body is the model state: a JSON
//! object mapping each field name to its messages. Everything else is left to
//! the generic 500 path, with the details logged and not exposed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mediator_core::{DispatchError, ValidationError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field name → messages, in the shape clients expect for form errors.
///
/// ```json
/// { "LastName": ["required"], "EnrollmentDate": ["must not be in the future"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModelState {
    entries: BTreeMap<String, Vec<String>>,
}

impl ModelState {
    /// Create an empty model state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` to the errors for `field`
    pub fn add_model_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.entries.entry(field.into()).or_default().push(message.into());
    }

    /// Messages recorded for `field`
    #[must_use]
    pub fn errors(&self, field: &str) -> &[String] {
        self.entries.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether no errors are recorded
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&ValidationError> for ModelState {
    fn from(error: &ValidationError) -> Self {
        let mut state = Self::new();
        for failure in error.errors() {
            state.add_model_error(&failure.field, &failure.message);
        }
        state
    }
}

/// Application error type for web handlers.
///
/// Implements Axum's `IntoResponse`, so handlers can return
/// `Result<_, AppError>` and use `?` on dispatch results.
///
/// # Examples
///
/// ```ignore
/// async fn create(
///     State(state): State<AppState<SchoolContext>>,
///     Json(request): Json<CreateStudent>,
/// ) -> Result<Json<StudentId>, AppError> {
///     Ok(Json(state.scope().send(request).await?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Set for validation failures; replaces the generic body
    model_state: Option<ModelState>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            model_state: None,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 400 from a validation failure; the body is the model state.
    #[must_use]
    pub fn validation(error: &ValidationError) -> Self {
        let mut app_error = Self::new(
            StatusCode::BAD_REQUEST,
            error.to_string(),
            "VALIDATION_ERROR".to_string(),
        );
        app_error.model_state = Some(ModelState::from(error));
        app_error
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// HTTP status this error responds with
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Model state, for validation failures
    #[must_use]
    pub const fn model_state(&self) -> Option<&ModelState> {
        self.model_state.as_ref()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(model_state) = self.model_state {
            tracing::warn!("{}", self.message);
            return (self.status, Json(model_state)).into_response();
        }

        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Only validation failures are translated; the rest take the generic 500 path.
impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(error) => Self::validation(&error),
            DispatchError::Handler(source) => {
                Self::internal("An internal error occurred").with_source(source)
            },
            other => Self::internal("An internal error occurred").with_source(other.into()),
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
