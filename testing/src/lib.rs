//! # Mediator Testing
//!
//! Test doubles and helpers for the mediator pipeline.
//!
//! This crate provides:
//! - [`InMemoryPersistenceContext`]: counts begin/commit/rollback, one transaction at a time
//! - [`RecordingMetricsSink`] and [`RecordingLogContext`]: capture what the pipeline reports
//! - [`DispatchTest`]: fluent Given-When-Then dispatch harness
//! - [`properties`]: proptest strategies for validation data
//!
//! ## Example
//!
//! ```ignore
//! use mediator_testing::{InMemoryPersistenceContext, RecordingMetricsSink};
//!
//! #[tokio::test]
//! async fn test_create_student_commits() {
//!     let sink = RecordingMetricsSink::new();
//!     let mediator = university::mediator_builder()
//!         .metrics_sink(sink.clone())
//!         .build()?;
//!
//!     let db = InMemoryPersistenceContext::new();
//!     mediator.send(&db, valid_student()).await?;
//!
//!     assert_eq!(db.commits(), 1);
//!     assert_eq!(sink.records().len(), 1);
//! }
//! ```

mod dispatch_test;
mod observability_mocks;
mod persistence_mocks;

pub use dispatch_test::DispatchTest;
pub use observability_mocks::{MetricRecord, RecordingLogContext, RecordingMetricsSink};
pub use persistence_mocks::InMemoryPersistenceContext;

/// Test helpers and utilities.
pub mod helpers {
    /// Install a `fmt` subscriber writing through the test harness.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use mediator_core::FieldError;
    use proptest::prelude::*;

    /// Field names drawn from a small fixed set so collisions are common
    pub fn field_name() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["Name", "LastName", "FirstMidName", "EnrollmentDate", "Email"])
            .prop_map(str::to_string)
    }

    /// Non-blank field errors
    pub fn field_error() -> impl Strategy<Value = FieldError> {
        (field_name(), "[a-z][a-z ]{0,23}").prop_map(|(field, message)| FieldError::new(field, message))
    }

    /// What one validator reports: usually nothing, sometimes several errors
    pub fn validator_output() -> impl Strategy<Value = Vec<FieldError>> {
        prop_oneof![
            2 => Just(Vec::new()),
            3 => prop::collection::vec(field_error(), 1..4),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::properties::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_generated_field_errors_are_never_blank(error in field_error()) {
            prop_assert!(!error.is_blank());
        }
    }
}
