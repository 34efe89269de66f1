//! Handler contract.
//!
//! A [`Handler`] consumes one request and produces its response. Every
//! decorator in the runtime pipeline implements this same trait, which is what
//! lets decorators wrap each other and terminate at the real handler.

use crate::BoxFuture;
use crate::error::DispatchError;
use crate::request::Request;
use std::future::Future;
use std::sync::Arc;

/// Result of handling a request of type `R`.
pub type HandlerResult<R> = Result<<R as Request>::Response, DispatchError>;

/// Business logic for one request type.
///
/// # Type Parameters
///
/// - `R`: The request type handled
/// - `C`: The per-scope persistence context the handler performs I/O against
///
/// The context is borrowed for the duration of the call. The transaction
/// stage has already begun a unit of work on it, so any writes the handler
/// stages are committed or discarded together with the rest of the dispatch.
///
/// # Dyn Compatibility
///
/// This trait returns `BoxFuture` instead of using `async fn` so chains can be
/// stored as `Arc<dyn Handler<R, C>>`.
///
/// # Example
///
/// ```ignore
/// impl Handler<EnrollStudent, SchoolContext> for EnrollStudentHandler {
///     fn handle<'a>(
///         &'a self,
///         request: EnrollStudent,
///         db: &'a SchoolContext,
///     ) -> BoxFuture<'a, HandlerResult<EnrollStudent>> {
///         Box::pin(async move {
///             let id = db.stage_enrollment(request.student_id, request.course_id)?;
///             Ok(id)
///         })
///     }
/// }
/// ```
pub trait Handler<R: Request, C>: Send + Sync {
    /// Handle a request within the given scope
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if the request cannot be handled. Decorators
    /// return the error of the handler they wrap unchanged.
    fn handle<'a>(&'a self, request: R, ctx: &'a C) -> BoxFuture<'a, HandlerResult<R>>;
}

impl<R, C, H> Handler<R, C> for Arc<H>
where
    R: Request,
    H: Handler<R, C> + ?Sized,
{
    fn handle<'a>(&'a self, request: R, ctx: &'a C) -> BoxFuture<'a, HandlerResult<R>> {
        (**self).handle(request, ctx)
    }
}

/// Handler adapter for context-free async closures.
///
/// Created by [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure that does not need the persistence context as a handler.
///
/// # Example
///
/// ```
/// use mediator_core::{DispatchError, Request, handler_fn};
///
/// struct Ping;
///
/// impl Request for Ping {
///     type Response = &'static str;
/// }
///
/// let handler = handler_fn(|_req: Ping| async { Ok::<_, DispatchError>("pong") });
/// # let _ = handler;
/// ```
#[must_use]
pub const fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

impl<R, C, F, Fut> Handler<R, C> for HandlerFn<F>
where
    R: Request,
    C: Sync,
    F: Fn(R) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    fn handle<'a>(&'a self, request: R, _ctx: &'a C) -> BoxFuture<'a, HandlerResult<R>> {
        Box::pin((self.f)(request))
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HandlerFn(<closure>)")
    }
}
