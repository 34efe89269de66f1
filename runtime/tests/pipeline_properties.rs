//! Dispatch behavior observed from outside the crate: what the handler,
//! persistence context, metrics sink and log context see for each outcome.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use mediator_core::{DispatchError, FieldError, Request, handler_fn};
use mediator_runtime::Mediator;
use mediator_testing::properties::validator_output;
use mediator_testing::{
    DispatchTest, InMemoryPersistenceContext, RecordingLogContext, RecordingMetricsSink,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct Enroll {
    student_id: u32,
}

impl Request for Enroll {
    type Response = u32;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Enrollment for student {0} is closed")]
struct EnrollmentClosed(u32);

struct Fixture {
    mediator: Mediator<InMemoryPersistenceContext>,
    calls: Arc<AtomicUsize>,
    metrics: RecordingMetricsSink,
    log: RecordingLogContext,
}

fn fixture(validators: Vec<Vec<FieldError>>, fail_handler: bool) -> Fixture {
    let calls = Arc::new(AtomicUsize::new(0));
    let metrics = RecordingMetricsSink::new();
    let log = RecordingLogContext::new();

    let handler_calls = Arc::clone(&calls);
    let handler_log = log.clone();
    let mut builder = Mediator::<InMemoryPersistenceContext>::builder()
        .handler::<Enroll, _>(handler_fn(move |req: Enroll| {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            let during = handler_log.active("request_type");
            async move {
                assert_eq!(during.as_deref(), Some(Enroll::type_name()));
                if fail_handler {
                    Err(DispatchError::handler(EnrollmentClosed(req.student_id)))
                } else {
                    Ok(req.student_id)
                }
            }
        }))
        .metrics_sink(metrics.clone())
        .log_context(log.clone());

    for output in validators {
        builder = builder.validator::<Enroll, _>(move |_req: &Enroll| output.clone());
    }

    Fixture {
        mediator: builder.build().expect("valid registry"),
        calls,
        metrics,
        log,
    }
}

#[tokio::test]
async fn test_no_validators_invokes_handler_once() {
    let fx = fixture(Vec::new(), false);
    let db = InMemoryPersistenceContext::new();

    let response = fx.mediator.send(&db, Enroll { student_id: 7 }).await;

    assert_eq!(response.unwrap(), 7);
    assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_validators_empty_invokes_handler_once() {
    let fx = fixture(vec![Vec::new(), Vec::new(), Vec::new()], false);
    let db = InMemoryPersistenceContext::new();

    let response = fx.mediator.send(&db, Enroll { student_id: 3 }).await;

    assert_eq!(response.unwrap(), 3);
    assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_success_commits_once_and_never_rolls_back() {
    let fx = fixture(Vec::new(), false);

    DispatchTest::new(&fx.mediator)
        .given_context(InMemoryPersistenceContext::new())
        .when_request(Enroll { student_id: 1 })
        .then_response(|id| assert_eq!(*id, 1))
        .then_context(|db| {
            assert_eq!(db.begins(), 1);
            assert_eq!(db.commits(), 1);
            assert_eq!(db.rollbacks(), 0);
        })
        .run()
        .await;
}

#[test]
fn test_validation_failure_rolls_back_once_and_never_commits() {
    let fx = fixture(vec![vec![FieldError::new("StudentId", "unknown")]], false);

    DispatchTest::new(&fx.mediator)
        .given_context(InMemoryPersistenceContext::new())
        .when_request(Enroll { student_id: 1 })
        .then_error(|err| assert!(err.is_validation()))
        .then_context(|db| {
            assert_eq!(db.commits(), 0);
            assert_eq!(db.rollbacks(), 1);
        })
        .run_blocking();

    assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_metrics_recorded_once_per_dispatch() {
    let fx = fixture(Vec::new(), false);
    let db = InMemoryPersistenceContext::new();

    fx.mediator.send(&db, Enroll { student_id: 1 }).await.unwrap();
    fx.mediator.send(&db, Enroll { student_id: 2 }).await.unwrap();

    let records = fx.metrics.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.name == Enroll::type_name()));
}

#[tokio::test]
async fn test_log_property_released_after_success() {
    let fx = fixture(Vec::new(), false);
    let db = InMemoryPersistenceContext::new();

    fx.mediator.send(&db, Enroll { student_id: 1 }).await.unwrap();

    assert_eq!(fx.log.active("request_type"), None);
    assert_eq!(
        fx.log.released(),
        vec![("request_type".to_string(), Enroll::type_name().to_string())]
    );
}

/// Valid request, generic handler failure: every observer sees it exactly once
/// and the caller gets the handler's own error back.
#[tokio::test]
async fn test_handler_failure_propagates_unchanged() {
    let fx = fixture(vec![Vec::new()], true);
    let db = InMemoryPersistenceContext::new();

    let err = fx
        .mediator
        .send(&db, Enroll { student_id: 9 })
        .await
        .expect_err("handler fails");

    assert!(!err.is_validation());
    assert_eq!(err.handler_error::<EnrollmentClosed>(), Some(&EnrollmentClosed(9)));
    assert_eq!(err.to_string(), "Enrollment for student 9 is closed");
    assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
    assert_eq!(db.rollbacks(), 1);
    assert_eq!(db.commits(), 0);
    assert_eq!(fx.metrics.records().len(), 1);
    assert_eq!(fx.log.releases(), 1);
    assert_eq!(fx.log.active("request_type"), None);
}

#[test]
fn test_blocking_and_async_paths_agree() {
    let fx = fixture(vec![vec![FieldError::new("StudentId", "unknown")]], false);

    let blocking = fx
        .mediator
        .send_blocking(&InMemoryPersistenceContext::new(), Enroll { student_id: 1 })
        .expect_err("validation fails");
    let polled = futures::executor::block_on(
        fx.mediator
            .send(&InMemoryPersistenceContext::new(), Enroll { student_id: 1 }),
    )
    .expect_err("validation fails");

    assert_eq!(blocking.as_validation(), polled.as_validation());
}

#[tokio::test]
async fn test_concurrent_scopes_do_not_share_transactions() {
    let fx = fixture(Vec::new(), false);
    let mediator = Arc::new(fx.mediator);

    let tasks: Vec<_> = (0..16)
        .map(|student_id| {
            let mediator = Arc::clone(&mediator);
            tokio::spawn(async move {
                let scope = mediator.scope(InMemoryPersistenceContext::new());
                let id = scope.send(Enroll { student_id }).await;
                (id, scope.into_context())
            })
        })
        .collect();

    for (student_id, task) in (0..16).zip(tasks) {
        let (id, db) = task.await.unwrap();
        assert_eq!(id.unwrap(), student_id);
        assert_eq!((db.commits(), db.rollbacks()), (1, 0));
    }
}

proptest! {
    #[test]
    fn prop_validation_errors_are_the_concatenation_of_every_validator(
        outputs in prop::collection::vec(validator_output(), 0..5)
    ) {
        let expected: Vec<FieldError> = outputs.iter().flatten().cloned().collect();
        let fx = fixture(outputs, false);
        let db = InMemoryPersistenceContext::new();

        let result = fx.mediator.send_blocking(&db, Enroll { student_id: 1 });

        if expected.is_empty() {
            prop_assert_eq!(result.ok(), Some(1));
            prop_assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
            prop_assert_eq!(db.commits(), 1);
        } else {
            let err = result.expect_err("validation must fail");
            let errors = err.as_validation().map(|v| v.errors().to_vec());
            prop_assert_eq!(errors, Some(expected));
            prop_assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
            prop_assert_eq!(db.rollbacks(), 1);
        }
    }
}
