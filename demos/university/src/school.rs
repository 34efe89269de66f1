//! In-memory school database.
//!
//! [`SchoolStore`] holds the committed roster and is shared by the whole
//! process. [`SchoolContext`] is the per-request unit of work over it: writes
//! are staged while a transaction is open, moved into the store on commit and
//! discarded on rollback.

use chrono::NaiveDate;
use mediator_core::{BoxFuture, PersistenceContext, TransactionError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;

/// Identifier assigned to a student when it is staged
pub type StudentId = u64;

/// A student row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Student {
    /// Identifier
    pub id: StudentId,
    /// Family name
    pub last_name: String,
    /// Given and middle names
    pub first_mid_name: String,
    /// First day of enrollment
    pub enrollment_date: NaiveDate,
}

impl Student {
    /// Whether this row records the same person enrolled on the same day
    #[must_use]
    pub fn is_same_enrollment(
        &self,
        last_name: &str,
        first_mid_name: &str,
        enrollment_date: NaiveDate,
    ) -> bool {
        self.last_name == last_name
            && self.first_mid_name == first_mid_name
            && self.enrollment_date == enrollment_date
    }
}

/// Fields of a student that is not yet stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    /// Family name
    pub last_name: String,
    /// Given and middle names
    pub first_mid_name: String,
    /// First day of enrollment
    pub enrollment_date: NaiveDate,
}

/// Committed state shared across requests.
///
/// Ids come from a sequence that is never rolled back, so a discarded
/// transaction leaves a gap.
#[derive(Debug, Clone, Default)]
pub struct SchoolStore {
    roster: Arc<RwLock<BTreeMap<StudentId, Student>>>,
    sequence: Arc<AtomicU64>,
}

impl SchoolStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a unit of work over this store
    #[must_use]
    pub fn context(&self) -> SchoolContext {
        SchoolContext::new(self.clone())
    }

    /// Committed students, ordered by id
    pub async fn students(&self) -> Vec<Student> {
        self.roster.read().await.values().cloned().collect()
    }

    fn next_id(&self) -> StudentId {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Unit of work over a [`SchoolStore`].
///
/// Reads see committed rows plus this context's own staged writes.
#[derive(Debug)]
pub struct SchoolContext {
    store: SchoolStore,
    staged: Mutex<Option<Vec<Student>>>,
}

impl SchoolContext {
    /// Create a context with no open transaction
    #[must_use]
    pub const fn new(store: SchoolStore) -> Self {
        Self {
            store,
            staged: Mutex::new(None),
        }
    }

    /// Stage a new student and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NoActiveTransaction`] outside a transaction.
    pub fn add_student(&self, student: NewStudent) -> Result<StudentId, TransactionError> {
        let mut staged = self.staged()?;
        let writes = staged.as_mut().ok_or(TransactionError::NoActiveTransaction)?;

        let id = self.store.next_id();
        writes.push(Student {
            id,
            last_name: student.last_name,
            first_mid_name: student.first_mid_name,
            enrollment_date: student.enrollment_date,
        });
        Ok(id)
    }

    /// Committed and staged students, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::Backend`] if the staging area is unusable.
    pub async fn students(&self) -> Result<Vec<Student>, TransactionError> {
        let mut roster = self.store.roster.read().await.clone();
        if let Some(writes) = self.staged()?.as_ref() {
            roster.extend(writes.iter().map(|student| (student.id, student.clone())));
        }
        Ok(roster.into_values().collect())
    }

    /// Look a student up by id.
    ///
    /// # Errors
    ///
    /// Same as [`students`](Self::students).
    pub async fn find(&self, id: StudentId) -> Result<Option<Student>, TransactionError> {
        if let Some(student) = self.store.roster.read().await.get(&id) {
            return Ok(Some(student.clone()));
        }
        Ok(self
            .staged()?
            .as_ref()
            .and_then(|writes| writes.iter().find(|student| student.id == id).cloned()))
    }

    /// The store this context writes to
    #[must_use]
    pub const fn store(&self) -> &SchoolStore {
        &self.store
    }

    fn staged(&self) -> Result<MutexGuard<'_, Option<Vec<Student>>>, TransactionError> {
        self.staged
            .lock()
            .map_err(|_| TransactionError::Backend("staging area lock poisoned".to_string()))
    }
}

impl PersistenceContext for SchoolContext {
    fn begin_transaction(&self) -> Result<(), TransactionError> {
        let mut staged = self.staged()?;
        if staged.is_some() {
            return Err(TransactionError::AlreadyActive);
        }
        *staged = Some(Vec::new());
        Ok(())
    }

    /// Publishes the staged rows under the roster write lock.
    ///
    /// Rows are checked against the committed roster again, since a
    /// concurrent unit of work may have enrolled the same student after this
    /// one read it. On any failure the rows stay staged for the rollback.
    fn commit_transaction(&self) -> BoxFuture<'_, Result<(), TransactionError>> {
        Box::pin(async move {
            let mut roster = self.store.roster.write().await;
            let writes = {
                let mut staged = self.staged()?;
                let pending = staged.as_ref().ok_or(TransactionError::NoActiveTransaction)?;
                if let Some(conflict) = pending.iter().find(|student| {
                    roster.values().any(|existing| {
                        existing.is_same_enrollment(
                            &student.last_name,
                            &student.first_mid_name,
                            student.enrollment_date,
                        )
                    })
                }) {
                    return Err(TransactionError::CommitFailed(format!(
                        "{} {} was enrolled concurrently",
                        conflict.first_mid_name, conflict.last_name
                    )));
                }
                staged.take().unwrap_or_default()
            };

            let count = writes.len();
            roster.extend(writes.into_iter().map(|student| (student.id, student)));
            tracing::debug!(count, "committed staged students");
            Ok(())
        })
    }

    fn rollback_transaction(&self) -> Result<(), TransactionError> {
        let discarded = self
            .staged()?
            .take()
            .ok_or(TransactionError::NoActiveTransaction)?;
        tracing::debug!(count = discarded.len(), "discarded staged students");
        Ok(())
    }
}
