//! Application state for Axum handlers.
//!
//! Holds the process-wide mediator and the factory that opens a fresh
//! persistence context for every inbound request.

use mediator_core::PersistenceContext;
use mediator_runtime::{Mediator, Scope};
use std::sync::Arc;

type ContextFactory<C> = Arc<dyn Fn() -> C + Send + Sync>;

/// Application state shared across all HTTP handlers.
///
/// # Examples
///
/// ```ignore
/// let store = SchoolStore::default();
/// let state = AppState::new(Arc::new(mediator), move || SchoolContext::new(store.clone()));
///
/// async fn handler(State(state): State<AppState<SchoolContext>>) -> Result<Json<Vec<Student>>, AppError> {
///     Ok(Json(state.scope().send(ListStudents::default()).await?))
/// }
/// ```
pub struct AppState<C> {
    mediator: Arc<Mediator<C>>,
    contexts: ContextFactory<C>,
}

impl<C: PersistenceContext + 'static> AppState<C> {
    /// Create state from a mediator and a per-request context factory
    pub fn new<F>(mediator: Arc<Mediator<C>>, contexts: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            mediator,
            contexts: Arc::new(contexts),
        }
    }

    /// The shared mediator
    #[must_use]
    pub fn mediator(&self) -> &Mediator<C> {
        &self.mediator
    }

    /// Open a scope over a fresh persistence context
    #[must_use]
    pub fn scope(&self) -> Scope<'_, C> {
        self.mediator.scope((self.contexts)())
    }
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            mediator: Arc::clone(&self.mediator),
            contexts: Arc::clone(&self.contexts),
        }
    }
}
