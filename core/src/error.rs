//! Dispatch error taxonomy.
//!
//! Every stage of the pipeline returns [`DispatchError`]. Stages never
//! reclassify an error they receive from the stage they wrap: a validation
//! failure stays a validation failure and a handler failure keeps its
//! original error value.

use crate::persistence::TransactionError;
use crate::validation::ValidationError;
use thiserror::Error;

/// Errors that can occur while dispatching a request.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No handler is registered for the request type.
    ///
    /// Configuration error. The registry reports it at startup when a
    /// validator names a request type without a handler, and
    /// `Mediator::ensure_handler` reports it for routed types.
    #[error("No handler registered for request type {request_type}")]
    HandlerNotFound {
        /// Fully qualified request type name
        request_type: &'static str,
    },

    /// More than one handler was registered for the request type.
    ///
    /// Configuration error, reported when the registry is built.
    #[error("{count} handlers registered for request type {request_type}, expected exactly one")]
    AmbiguousHandler {
        /// Fully qualified request type name
        request_type: &'static str,
        /// Number of handlers registered
        count: usize,
    },

    /// One or more validators rejected the request; the handler did not run.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Beginning or committing the unit of work failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// The handler failed.
    ///
    /// The original error is kept as-is; use [`DispatchError::handler_error`]
    /// to recover it.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl DispatchError {
    /// Wrap a handler failure
    #[must_use]
    pub fn handler<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Handler(error.into())
    }

    /// Whether this is a validation failure
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this is a startup configuration error
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::HandlerNotFound { .. } | Self::AmbiguousHandler { .. }
        )
    }

    /// The validation failure, if this is one
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }

    /// The handler's original error, if this is a handler failure of type `E`
    #[must_use]
    pub fn handler_error<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Handler(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }
}
