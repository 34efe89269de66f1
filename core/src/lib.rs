//! # Mediator Core
//!
//! Core contracts for decorated request dispatch.
//!
//! This crate defines the seams that the runtime pipeline is assembled from.
//! It contains no dispatch logic of its own.
//!
//! ## Core Concepts
//!
//! - **Request**: An immutable input value, paired one-to-one with a response type
//! - **Handler**: Business logic consuming one request and producing one response
//! - **Validator**: A pure check producing field-level errors for a request
//! - **Persistence context**: Unit-of-work transaction control for one scope
//! - **Metrics sink / Log context**: Observability seams handed to the pipeline
//!
//! ## Example
//!
//! ```ignore
//! use mediator_core::{BoxFuture, DispatchError, FieldError, Handler, Request};
//!
//! struct CreateStudent {
//!     last_name: String,
//! }
//!
//! impl Request for CreateStudent {
//!     type Response = u64;
//! }
//!
//! struct CreateStudentHandler;
//!
//! impl Handler<CreateStudent, SchoolContext> for CreateStudentHandler {
//!     fn handle<'a>(
//!         &'a self,
//!         request: CreateStudent,
//!         db: &'a SchoolContext,
//!     ) -> BoxFuture<'a, Result<u64, DispatchError>> {
//!         Box::pin(async move { db.insert_student(request.last_name).await })
//!     }
//! }
//!
//! // Validators are plain closures over a borrowed request
//! let validator = |req: &CreateStudent| {
//!     if req.last_name.is_empty() {
//!         vec![FieldError::new("LastName", "required")]
//!     } else {
//!         vec![]
//!     }
//! };
//! ```

use std::future::Future;
use std::pin::Pin;

/// Dispatch error taxonomy
pub mod error;

/// Handler contract and adapters
pub mod handler;

/// Metrics sink and scoped log context seams
pub mod observability;

/// Unit-of-work transaction contract
pub mod persistence;

/// Request/response pairing
pub mod request;

/// Field errors, validation failures and the validator contract
pub mod validation;

/// Boxed, sendable future returned by dyn-compatible pipeline traits.
///
/// Traits in this crate return `BoxFuture` instead of using `async fn` so they
/// can be used as trait objects (`Arc<dyn Handler<R, C>>`). The decorated
/// chain is a stack of such trait objects.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// Re-export the contract surface
pub use error::DispatchError;
pub use handler::{Handler, HandlerFn, HandlerResult, handler_fn};
pub use observability::{LogContext, LogScope, MetricsSink, NoopMetricsSink};
pub use persistence::{PersistenceContext, TransactionError};
pub use request::Request;
pub use validation::{FieldError, ValidationError, Validator};
