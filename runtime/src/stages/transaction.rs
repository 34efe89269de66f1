//! Transaction stage - outermost wrapper.
//!
//! One unit of work spans the whole chain for a dispatch: validation, metrics,
//! logging and the handler all run inside it. The stage commits only after the
//! inner chain succeeds. Every other way of leaving the stage (inner failure,
//! commit failure, the dispatch future being dropped) rolls back exactly once.

use crate::metrics::TransactionMetrics;
use mediator_core::{
    BoxFuture, DispatchError, Handler, HandlerResult, PersistenceContext, Request,
};
use std::sync::Arc;

/// Wraps the chain in a begin/commit/rollback unit of work.
pub struct TransactionStage<R: Request, C> {
    inner: Arc<dyn Handler<R, C>>,
}

impl<R: Request, C> TransactionStage<R, C> {
    /// Wrap `inner` in a transaction
    #[must_use]
    pub fn new(inner: Arc<dyn Handler<R, C>>) -> Self {
        Self { inner }
    }
}

impl<R, C> Handler<R, C> for TransactionStage<R, C>
where
    R: Request,
    C: PersistenceContext + 'static,
{
    fn handle<'a>(&'a self, request: R, ctx: &'a C) -> BoxFuture<'a, HandlerResult<R>> {
        Box::pin(async move {
            ctx.begin_transaction()?;
            let rollback = RollbackGuard::arm(ctx, R::type_name());

            // Inner failure: the guard rolls back as `?` returns
            let response = self.inner.handle(request, ctx).await?;

            match ctx.commit_transaction().await {
                Ok(()) => {
                    rollback.disarm();
                    TransactionMetrics::record_commit();
                    tracing::debug!(request_type = R::type_name(), "Transaction committed");
                    Ok(response)
                },
                Err(error) => {
                    tracing::warn!(
                        request_type = R::type_name(),
                        error = %error,
                        "Commit failed, rolling back"
                    );
                    drop(rollback);
                    Err(DispatchError::Transaction(error))
                },
            }
        })
    }
}

/// Rolls back the active transaction on drop unless disarmed.
///
/// Covers error returns and cancellation of the dispatch future alike.
struct RollbackGuard<'a, C: PersistenceContext> {
    ctx: &'a C,
    request_type: &'static str,
    armed: bool,
}

impl<'a, C: PersistenceContext> RollbackGuard<'a, C> {
    const fn arm(ctx: &'a C, request_type: &'static str) -> Self {
        Self {
            ctx,
            request_type,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<C: PersistenceContext> Drop for RollbackGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        match self.ctx.rollback_transaction() {
            Ok(()) => {
                TransactionMetrics::record_rollback();
                tracing::debug!(request_type = self.request_type, "Transaction rolled back");
            },
            Err(error) => {
                // The failure that triggered the rollback is what the caller sees
                TransactionMetrics::record_rollback_failure();
                tracing::error!(
                    request_type = self.request_type,
                    error = %error,
                    "Rollback failed"
                );
            },
        }
    }
}
