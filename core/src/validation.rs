//! Field errors, validation failures and the validator contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field (as exposed to clients, e.g. `LastName`)
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// An entry with a blank message carries no failure and is dropped during aggregation
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.message.trim().is_empty()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// One or more field errors collected before a handler ran.
///
/// Produced by the validation stage of the pipeline. The handler it guards
/// was never invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create a validation error from collected field errors
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// The collected field errors, in collection order
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consume the error, returning the field errors
    #[must_use]
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Number of field errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no field errors were collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed:")?;
        for error in &self.errors {
            write!(f, " -- {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A checker bound to a request type.
///
/// Validators are pure: they inspect a borrowed request and return every
/// field error they find. An empty vector means the request is valid as far
/// as this validator is concerned.
///
/// Any `Fn(&R) -> Vec<FieldError>` closure is a validator.
///
/// # Example
///
/// ```
/// use mediator_core::{FieldError, Validator};
///
/// struct CreateCourse {
///     title: String,
///     credits: u8,
/// }
///
/// let credits = |req: &CreateCourse| {
///     if req.credits > 5 {
///         vec![FieldError::new("Credits", "must be between 0 and 5")]
///     } else {
///         vec![]
///     }
/// };
///
/// let req = CreateCourse { title: "Chemistry".into(), credits: 7 };
/// assert_eq!(credits.validate(&req).len(), 1);
/// ```
pub trait Validator<R>: Send + Sync {
    /// Validate a request, returning all field errors found
    fn validate(&self, request: &R) -> Vec<FieldError>;
}

impl<R, F> Validator<R> for F
where
    F: Fn(&R) -> Vec<FieldError> + Send + Sync,
{
    fn validate(&self, request: &R) -> Vec<FieldError> {
        self(request)
    }
}
