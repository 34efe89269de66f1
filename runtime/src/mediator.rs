//! The dispatcher.
//!
//! A [`Mediator`] maps each request type to its assembled chain. It is built
//! once at startup, shared behind an `Arc`, and never mutated afterwards.
//! Each dispatch is given the persistence context it runs against, either
//! directly through [`Mediator::send`] or through a [`Scope`].

use crate::HealthCheck;
use crate::config::MediatorConfig;
use crate::registry::MediatorBuilder;
use mediator_core::{DispatchError, Handler, PersistenceContext, Request};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Assembled chain for one request type, erased to `Arc<dyn Handler<R, C>>`.
pub(crate) struct Chain {
    pub(crate) request_type: &'static str,
    pub(crate) handler: Box<dyn Any + Send + Sync>,
}

/// Routes each request to the single chain registered for its type.
pub struct Mediator<C> {
    chains: HashMap<TypeId, Chain>,
    config: MediatorConfig,
    _context: PhantomData<fn(&C)>,
}

impl<C: PersistenceContext + 'static> Mediator<C> {
    /// Start registering handlers
    #[must_use]
    pub fn builder() -> MediatorBuilder<C> {
        MediatorBuilder::new()
    }

    pub(crate) fn from_parts(chains: HashMap<TypeId, Chain>, config: MediatorConfig) -> Self {
        Self {
            chains,
            config,
            _context: PhantomData,
        }
    }

    fn chain<R: Request>(&self) -> Result<&Arc<dyn Handler<R, C>>, DispatchError> {
        self.chains
            .get(&TypeId::of::<R>())
            .and_then(|chain| chain.handler.downcast_ref::<Arc<dyn Handler<R, C>>>())
            .ok_or(DispatchError::HandlerNotFound {
                request_type: R::type_name(),
            })
    }

    /// Dispatch `request` through its chain against `ctx`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::HandlerNotFound`] if no handler is registered for `R`
    /// - Whatever the chain fails with, unchanged
    #[tracing::instrument(skip_all, name = "mediator_send", fields(request_type = R::type_name()))]
    pub async fn send<R: Request>(&self, ctx: &C, request: R) -> Result<R::Response, DispatchError> {
        let chain = self.chain::<R>()?;
        chain.handle(request, ctx).await
    }

    /// Dispatch `request` and block the calling thread until it completes.
    ///
    /// Polls the same chain as [`send`](Self::send), commit included, on the
    /// calling thread. Handlers that rely on a Tokio reactor (timers, Tokio
    /// sockets) must be dispatched with `send` from inside the runtime instead.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn send_blocking<R: Request>(&self, ctx: &C, request: R) -> Result<R::Response, DispatchError> {
        futures::executor::block_on(self.send(ctx, request))
    }

    /// Bind a persistence context for a run of dispatches
    pub const fn scope(&self, ctx: C) -> Scope<'_, C> {
        Scope { mediator: self, ctx }
    }

    /// Fail unless a handler is registered for `R`.
    ///
    /// Lets a composition root assert every routed request type is wired up
    /// before it starts serving.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HandlerNotFound`] if `R` has no handler.
    pub fn ensure_handler<R: Request>(&self) -> Result<(), DispatchError> {
        self.chain::<R>().map(|_| ())
    }

    /// Whether a handler is registered for `R`
    #[must_use]
    pub fn contains<R: Request>(&self) -> bool {
        self.chains.contains_key(&TypeId::of::<R>())
    }

    /// Names of every registered request type, sorted
    #[must_use]
    pub fn request_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.chains.values().map(|chain| chain.request_type).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered request types
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no handler is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Configuration the chains were assembled with
    #[must_use]
    pub const fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Health of the dispatcher.
    ///
    /// Degraded when no handlers are registered: every dispatch would fail.
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        if self.is_empty() {
            HealthCheck::degraded("mediator", "No request handlers registered")
        } else {
            HealthCheck::healthy("mediator").with_metadata("handlers", self.len().to_string())
        }
    }
}

impl<C> fmt::Debug for Mediator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.chains.values().map(|chain| chain.request_type).collect();
        names.sort_unstable();
        f.debug_struct("Mediator")
            .field("request_types", &names)
            .field("config", &self.config)
            .finish()
    }
}

/// A mediator paired with one persistence context.
///
/// Typically one scope per inbound request. The context is owned by the scope
/// and never shared with concurrent requests.
pub struct Scope<'m, C> {
    mediator: &'m Mediator<C>,
    ctx: C,
}

impl<C: PersistenceContext + 'static> Scope<'_, C> {
    /// Dispatch `request` against this scope's context.
    ///
    /// # Errors
    ///
    /// Same as [`Mediator::send`].
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, DispatchError> {
        self.mediator.send(&self.ctx, request).await
    }

    /// Blocking form of [`send`](Self::send).
    ///
    /// # Errors
    ///
    /// Same as [`Mediator::send`].
    pub fn send_blocking<R: Request>(&self, request: R) -> Result<R::Response, DispatchError> {
        self.mediator.send_blocking(&self.ctx, request)
    }

    /// The scope's persistence context
    #[must_use]
    pub const fn context(&self) -> &C {
        &self.ctx
    }

    /// End the scope and take back the context
    #[must_use]
    pub fn into_context(self) -> C {
        self.ctx
    }
}

impl<C: fmt::Debug> fmt::Debug for Scope<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("mediator", self.mediator)
            .field("ctx", &self.ctx)
            .finish()
    }
}
