//! In-memory persistence context
//!
//! Counts begin/commit/rollback calls and enforces one active transaction,
//! so tests can assert exactly how the transaction stage drove it.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use mediator_core::{BoxFuture, PersistenceContext, TransactionError};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Ledger {
    active: bool,
    begins: usize,
    commit_attempts: usize,
    commits: usize,
    rollbacks: usize,
    commit_failure: Option<TransactionError>,
    rollback_failure: Option<TransactionError>,
}

/// Persistence context double.
///
/// Clones share the same ledger, so a test can hand one clone to the mediator
/// (or a scope factory) and inspect another.
///
/// # Example
///
/// ```
/// use mediator_core::PersistenceContext;
/// use mediator_testing::InMemoryPersistenceContext;
///
/// let db = InMemoryPersistenceContext::new();
/// db.begin_transaction().unwrap();
/// assert!(db.begin_transaction().is_err()); // one at a time
/// db.rollback_transaction().unwrap();
/// assert_eq!(db.rollbacks(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryPersistenceContext {
    ledger: Arc<Mutex<Ledger>>,
}

impl InMemoryPersistenceContext {
    /// Create a context with no transaction history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every commit fail with `error`, leaving the transaction active
    #[must_use]
    pub fn failing_commits_with(self, error: TransactionError) -> Self {
        self.ledger.lock().unwrap().commit_failure = Some(error);
        self
    }

    /// Make every rollback fail with `error`, leaving the transaction active
    #[must_use]
    pub fn failing_rollbacks_with(self, error: TransactionError) -> Self {
        self.ledger.lock().unwrap().rollback_failure = Some(error);
        self
    }

    /// Transactions begun
    #[must_use]
    pub fn begins(&self) -> usize {
        self.ledger.lock().unwrap().begins
    }

    /// Commits attempted, successful or not
    #[must_use]
    pub fn commit_attempts(&self) -> usize {
        self.ledger.lock().unwrap().commit_attempts
    }

    /// Successful commits
    #[must_use]
    pub fn commits(&self) -> usize {
        self.ledger.lock().unwrap().commits
    }

    /// Rollbacks attempted on an open transaction, successful or not
    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.ledger.lock().unwrap().rollbacks
    }

    /// Whether a transaction is currently open
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.ledger.lock().unwrap().active
    }
}

impl PersistenceContext for InMemoryPersistenceContext {
    fn begin_transaction(&self) -> Result<(), TransactionError> {
        let mut ledger = self.ledger.lock().unwrap();
        if ledger.active {
            return Err(TransactionError::AlreadyActive);
        }
        ledger.active = true;
        ledger.begins += 1;
        Ok(())
    }

    fn commit_transaction(&self) -> BoxFuture<'_, Result<(), TransactionError>> {
        Box::pin(async move {
            let mut ledger = self.ledger.lock().unwrap();
            if !ledger.active {
                return Err(TransactionError::NoActiveTransaction);
            }
            ledger.commit_attempts += 1;
            if let Some(error) = ledger.commit_failure.clone() {
                return Err(error);
            }
            ledger.active = false;
            ledger.commits += 1;
            Ok(())
        })
    }

    fn rollback_transaction(&self) -> Result<(), TransactionError> {
        let mut ledger = self.ledger.lock().unwrap();
        if !ledger.active {
            return Err(TransactionError::NoActiveTransaction);
        }
        ledger.rollbacks += 1;
        if let Some(error) = ledger.rollback_failure.clone() {
            return Err(error);
        }
        ledger.active = false;
        Ok(())
    }
}
