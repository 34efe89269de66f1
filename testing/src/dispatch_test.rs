//! Fluent Given-When-Then harness for dispatch tests

#![allow(clippy::module_name_repetitions)] // DispatchTest is the natural name

use mediator_core::{DispatchError, PersistenceContext, Request};
use mediator_runtime::Mediator;

type ResponseAssertion<T> = Box<dyn FnOnce(&T)>;
type ErrorAssertion = Box<dyn FnOnce(&DispatchError)>;
type ContextAssertion<C> = Box<dyn FnOnce(&C)>;

/// Dispatches one request through a mediator and checks the outcome.
///
/// # Example
///
/// ```ignore
/// use mediator_testing::{DispatchTest, InMemoryPersistenceContext};
///
/// DispatchTest::new(&mediator)
///     .given_context(InMemoryPersistenceContext::new())
///     .when_request(CreateStudent::default())
///     .then_error(|err| assert!(err.is_validation()))
///     .then_context(|db| assert_eq!(db.rollbacks(), 1))
///     .run_blocking();
/// ```
pub struct DispatchTest<'m, C, R: Request> {
    mediator: &'m Mediator<C>,
    context: Option<C>,
    request: Option<R>,
    response_assertions: Vec<ResponseAssertion<R::Response>>,
    error_assertions: Vec<ErrorAssertion>,
    context_assertions: Vec<ContextAssertion<C>>,
}

impl<'m, C, R> DispatchTest<'m, C, R>
where
    C: PersistenceContext + 'static,
    R: Request,
{
    /// Create a test dispatching through `mediator`
    #[must_use]
    pub const fn new(mediator: &'m Mediator<C>) -> Self {
        Self {
            mediator,
            context: None,
            request: None,
            response_assertions: Vec::new(),
            error_assertions: Vec::new(),
            context_assertions: Vec::new(),
        }
    }

    /// Set the persistence context the request runs against (Given)
    #[must_use]
    pub fn given_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the request to dispatch (When)
    #[must_use]
    pub fn when_request(mut self, request: R) -> Self {
        self.request = Some(request);
        self
    }

    /// Expect success and check the response (Then)
    #[must_use]
    pub fn then_response<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::Response) + 'static,
    {
        self.response_assertions.push(Box::new(assertion));
        self
    }

    /// Expect failure and check the error (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&DispatchError) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Check the persistence context after dispatch (Then)
    #[must_use]
    pub fn then_context<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&C) + 'static,
    {
        self.context_assertions.push(Box::new(assertion));
        self
    }

    /// Dispatch with [`Mediator::send`] and run every assertion
    ///
    /// # Panics
    ///
    /// Panics if the context or request is not set, if the outcome is the
    /// opposite of what the assertions expect, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub async fn run(self) {
        let context = self
            .context
            .expect("Context must be set with given_context()");
        let request = self.request.expect("Request must be set with when_request()");

        let outcome = self.mediator.send(&context, request).await;
        Self::check(
            outcome,
            &context,
            self.response_assertions,
            self.error_assertions,
            self.context_assertions,
        );
    }

    /// Dispatch with [`Mediator::send_blocking`] and run every assertion
    ///
    /// # Panics
    ///
    /// Same as [`run`](Self::run).
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run_blocking(self) {
        let context = self
            .context
            .expect("Context must be set with given_context()");
        let request = self.request.expect("Request must be set with when_request()");

        let outcome = self.mediator.send_blocking(&context, request);
        Self::check(
            outcome,
            &context,
            self.response_assertions,
            self.error_assertions,
            self.context_assertions,
        );
    }

    #[allow(clippy::panic)] // Test assertion
    fn check(
        outcome: Result<R::Response, DispatchError>,
        context: &C,
        response_assertions: Vec<ResponseAssertion<R::Response>>,
        error_assertions: Vec<ErrorAssertion>,
        context_assertions: Vec<ContextAssertion<C>>,
    ) {
        match outcome {
            Ok(response) => {
                assert!(
                    error_assertions.is_empty(),
                    "Expected {} to fail, but it succeeded",
                    R::type_name()
                );
                for assertion in response_assertions {
                    assertion(&response);
                }
            },
            Err(error) => {
                assert!(
                    response_assertions.is_empty(),
                    "Expected {} to succeed, but it failed: {error}",
                    R::type_name()
                );
                for assertion in error_assertions {
                    assertion(&error);
                }
            },
        }

        for assertion in context_assertions {
            assertion(context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryPersistenceContext, RecordingMetricsSink};
    use mediator_core::{FieldError, handler_fn};

    struct Echo(String);

    impl Request for Echo {
        type Response = String;
    }

    fn mediator() -> Mediator<InMemoryPersistenceContext> {
        Mediator::<InMemoryPersistenceContext>::builder()
            .handler::<Echo, _>(handler_fn(|req: Echo| async move {
                Ok::<_, DispatchError>(req.0)
            }))
            .validator::<Echo, _>(|req: &Echo| {
                if req.0.is_empty() {
                    vec![FieldError::new("Text", "required")]
                } else {
                    Vec::new()
                }
            })
            .metrics_sink(RecordingMetricsSink::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_successful_dispatch() {
        let mediator = mediator();
        DispatchTest::new(&mediator)
            .given_context(InMemoryPersistenceContext::new())
            .when_request(Echo("hi".into()))
            .then_response(|text| assert_eq!(text, "hi"))
            .then_context(|db| assert_eq!(db.commits(), 1))
            .run_blocking();
    }

    #[tokio::test]
    async fn test_failed_dispatch() {
        let mediator = mediator();
        DispatchTest::new(&mediator)
            .given_context(InMemoryPersistenceContext::new())
            .when_request(Echo(String::new()))
            .then_error(|err| assert!(err.is_validation()))
            .then_context(|db| {
                assert_eq!(db.commits(), 0);
                assert_eq!(db.rollbacks(), 1);
            })
            .run()
            .await;
    }

    #[test]
    #[should_panic(expected = "to fail, but it succeeded")]
    fn test_unexpected_success_panics() {
        let mediator = mediator();
        DispatchTest::new(&mediator)
            .given_context(InMemoryPersistenceContext::new())
            .when_request(Echo("hi".into()))
            .then_error(|_| {})
            .run_blocking();
    }
}
