//! Validation stage.
//!
//! Runs every validator registered for the request type before anything
//! below it sees the request. Validators run synchronously, while the stage's
//! `handle` is being called, so validation never introduces a suspension
//! point of its own.

use crate::metrics::ValidationMetrics;
use mediator_core::{
    BoxFuture, DispatchError, FieldError, Handler, HandlerResult, Request, ValidationError,
    Validator,
};
use std::sync::Arc;

/// Rejects requests with field errors before they reach the wrapped chain.
pub struct ValidationStage<R: Request, C> {
    inner: Arc<dyn Handler<R, C>>,
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R: Request, C> ValidationStage<R, C> {
    /// Wrap `inner` behind the given validators
    #[must_use]
    pub fn new(inner: Arc<dyn Handler<R, C>>, validators: Vec<Arc<dyn Validator<R>>>) -> Self {
        Self { inner, validators }
    }

    /// Number of validators guarding the chain
    #[must_use]
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }
}

/// Run every validator and concatenate their errors.
///
/// Does not stop at the first failing validator. Blank entries are dropped.
#[must_use]
pub fn collect_failures<R>(validators: &[Arc<dyn Validator<R>>], request: &R) -> Vec<FieldError> {
    validators
        .iter()
        .flat_map(|validator| validator.validate(request))
        .filter(|error| !error.is_blank())
        .collect()
}

impl<R, C> Handler<R, C> for ValidationStage<R, C>
where
    R: Request,
    C: Send + Sync + 'static,
{
    fn handle<'a>(&'a self, request: R, ctx: &'a C) -> BoxFuture<'a, HandlerResult<R>> {
        let failures = collect_failures(&self.validators, &request);

        if failures.is_empty() {
            return self.inner.handle(request, ctx);
        }

        ValidationMetrics::record_failure(R::type_name());
        tracing::debug!(
            request_type = R::type_name(),
            failures = failures.len(),
            "Request rejected by validation"
        );

        let error = DispatchError::Validation(ValidationError::new(failures));
        Box::pin(std::future::ready(Err::<R::Response, _>(error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct Rename {
        name: String,
    }

    impl Request for Rename {
        type Response = String;
    }

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    impl Handler<Rename, ()> for CountingHandler {
        fn handle<'a>(&'a self, request: Rename, _ctx: &'a ()) -> BoxFuture<'a, HandlerResult<Rename>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(request.name) })
        }
    }

    fn required_name() -> Arc<dyn Validator<Rename>> {
        Arc::new(|req: &Rename| {
            if req.name.is_empty() {
                vec![FieldError::new("Name", "required")]
            } else {
                Vec::new()
            }
        })
    }

    fn max_length() -> Arc<dyn Validator<Rename>> {
        Arc::new(|req: &Rename| {
            if req.name.len() < 2 {
                vec![FieldError::new("Name", "must be at least 2 characters")]
            } else {
                Vec::new()
            }
        })
    }

    fn stage(validators: Vec<Arc<dyn Validator<Rename>>>) -> (ValidationStage<Rename, ()>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            calls: Arc::clone(&calls),
        };
        (ValidationStage::new(Arc::new(handler), validators), calls)
    }

    #[tokio::test]
    async fn test_no_validators_delegates() {
        let (stage, calls) = stage(Vec::new());

        let result = stage.handle(Rename { name: "Kim".into() }, &()).await;

        assert_eq!(result.ok().as_deref(), Some("Kim"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_passing_validators_delegate_once() {
        let (stage, calls) = stage(vec![required_name(), max_length()]);

        let result = stage.handle(Rename { name: "Kim".into() }, &()).await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_collects_from_every_validator() {
        let (stage, calls) = stage(vec![required_name(), max_length()]);

        let result = stage.handle(Rename { name: String::new() }, &()).await;

        let Err(DispatchError::Validation(error)) = result else {
            unreachable!("expected a validation failure");
        };
        assert_eq!(
            error.errors(),
            &[
                FieldError::new("Name", "required"),
                FieldError::new("Name", "must be at least 2 characters"),
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blank_entries_are_dropped() {
        let blank: Arc<dyn Validator<Rename>> =
            Arc::new(|_req: &Rename| vec![FieldError::new("Name", ""), FieldError::new("Name", "  ")]);

        let failures = collect_failures(&[blank], &Rename { name: String::new() });

        assert!(failures.is_empty());
    }

    #[test]
    fn test_rejection_happens_before_any_poll() {
        let (stage, calls) = stage(vec![required_name()]);

        // Validation runs inside `handle`; the returned future is already resolved
        let future = stage.handle(Rename { name: String::new() }, &());
        let result = futures::executor::block_on(future);

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(stage.validator_count(), 1);
    }
}
