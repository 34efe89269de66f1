//! Unit-of-work transaction contract.
//!
//! The transaction stage of the pipeline drives a [`PersistenceContext`]:
//! it begins a transaction before anything else runs, commits after the
//! handler succeeds, and rolls back when anything inside fails.
//!
//! # Scoping
//!
//! A context instance belongs to one dispatch scope (typically one inbound
//! HTTP request). It is never shared across concurrent scopes, and it allows
//! at most one active transaction at a time.

use crate::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a persistence context while controlling a transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// `begin_transaction` was called while a transaction was already active
    #[error("A transaction is already active in this scope")]
    AlreadyActive,

    /// `commit_transaction` or `rollback_transaction` was called with no active transaction
    #[error("No active transaction in this scope")]
    NoActiveTransaction,

    /// The backend rejected the commit
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// The backend rejected the rollback
    #[error("Rollback failed: {0}")]
    RollbackFailed(String),

    /// Any other backend failure (connection lost, etc.)
    #[error("Persistence backend error: {0}")]
    Backend(String),
}

/// Transaction control for one dispatch scope.
///
/// # Thread Safety
///
/// Methods take `&self`: the context is borrowed by both the transaction stage
/// and the handler for the duration of a dispatch, so implementations keep
/// their transaction state behind interior mutability.
///
/// # Dyn Compatibility
///
/// `commit_transaction` returns `BoxFuture` so `Arc<dyn PersistenceContext>`
/// remains usable.
///
/// # Example
///
/// ```ignore
/// impl PersistenceContext for SchoolContext {
///     fn begin_transaction(&self) -> Result<(), TransactionError> {
///         self.connection.begin()
///     }
///
///     fn commit_transaction(&self) -> BoxFuture<'_, Result<(), TransactionError>> {
///         Box::pin(async move { self.connection.commit().await })
///     }
///
///     fn rollback_transaction(&self) -> Result<(), TransactionError> {
///         self.connection.rollback()
///     }
/// }
/// ```
pub trait PersistenceContext: Send + Sync {
    /// Begin a unit of work
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::AlreadyActive`] if a transaction is already
    /// open in this scope, or a backend error.
    fn begin_transaction(&self) -> Result<(), TransactionError>;

    /// Commit the active unit of work
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NoActiveTransaction`] if nothing is open,
    /// or [`TransactionError::CommitFailed`] if the backend rejects the commit.
    fn commit_transaction(&self) -> BoxFuture<'_, Result<(), TransactionError>>;

    /// Discard the active unit of work
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NoActiveTransaction`] if nothing is open,
    /// or [`TransactionError::RollbackFailed`] if the backend fails.
    fn rollback_transaction(&self) -> Result<(), TransactionError>;
}

impl<P> PersistenceContext for Arc<P>
where
    P: PersistenceContext + ?Sized,
{
    fn begin_transaction(&self) -> Result<(), TransactionError> {
        (**self).begin_transaction()
    }

    fn commit_transaction(&self) -> BoxFuture<'_, Result<(), TransactionError>> {
        (**self).commit_transaction()
    }

    fn rollback_transaction(&self) -> Result<(), TransactionError> {
        (**self).rollback_transaction()
    }
}
