//! Unit of work: one session, one repository per entity type, one atomic save.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use givebook_core::StoredRecord;

use crate::datastore::Datastore;
use crate::error::{StoreError, StoreResult};
use crate::relations::HasRelations;
use crate::repository::Repository;
use crate::session::Session;

/// Transaction lifecycle of a unit of work.
///
/// `Committed` and `RolledBack` are terminal; a finished unit of work is not
/// reused for another transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TxnState {
    Idle,
    InTransaction,
    Committed,
    RolledBack,
}

/// Coordinates every repository of one logical business operation.
///
/// All repositories handed out by one instance share exactly one session, so
/// [`Self::save_changes`] is atomic across entity types. The unit of work is
/// owned exclusively by the request that created it; dropping it with an open
/// transaction rolls the transaction back.
pub struct UnitOfWork {
    session: Arc<Session>,
    repos: Mutex<HashMap<TypeId, Box<dyn core::any::Any + Send + Sync>>>,
}

impl UnitOfWork {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self {
            session: Arc::new(Session::new(store)),
            repos: Mutex::new(HashMap::new()),
        }
    }

    /// The repository for `T`, created on first use and cached — one instance
    /// per entity type, all sharing this unit of work's session.
    pub fn repo<T: StoredRecord + HasRelations>(&self) -> Repository<T> {
        let mut repos = match self.repos.lock() {
            Ok(guard) => guard,
            // A poisoned cache only loses memoization; hand out a fresh facade.
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = repos
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Repository::<T>::new(Arc::clone(&self.session))));
        match entry.downcast_ref::<Repository<T>>() {
            Some(repo) => repo.clone(),
            None => Repository::<T>::new(Arc::clone(&self.session)),
        }
    }

    /// Number of staged, not yet saved changes.
    pub fn pending_changes(&self) -> StoreResult<usize> {
        self.session.pending_ops()
    }

    /// Flush all staged adds/updates/soft-deletes across every repository as
    /// one atomic batch. Returns the number of affected records. On failure
    /// nothing is applied and the staged batch is discarded.
    pub async fn save_changes(&self) -> StoreResult<u64> {
        self.session.save_changes()
    }

    /// `Idle → InTransaction`. Fails with `InvalidState` when a transaction is
    /// already open or this unit of work already finished one.
    pub async fn begin_transaction(&self) -> StoreResult<()> {
        self.session.begin_transaction()
    }

    /// `InTransaction → Committed`: replay everything saved since
    /// `begin_transaction` against the shared store as one atomic commit,
    /// preserving whatever other sessions committed in the meantime. A replay
    /// conflict fails the commit, leaves the store untouched and rolls the
    /// transaction back. Calling twice is an error.
    pub async fn commit_transaction(&self) -> StoreResult<()> {
        self.session.commit_transaction()
    }

    /// `InTransaction → RolledBack`: discard the workspace and any staged,
    /// unsaved changes.
    pub async fn rollback_transaction(&self) -> StoreResult<()> {
        self.session.rollback_transaction()
    }

    pub fn txn_state(&self) -> TxnState {
        self.session.txn_state().unwrap_or(TxnState::Idle)
    }

    /// Convenience guard: fail unless a transaction is open.
    pub fn require_transaction(&self) -> StoreResult<()> {
        match self.txn_state() {
            TxnState::InTransaction => Ok(()),
            state => Err(StoreError::invalid_state(format!(
                "operation requires an open transaction (state: {state:?})"
            ))),
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // No silent partial commit on abandonment: an open transaction's
        // workspace never reached the shared store, discarding it is the rollback.
        self.session.abandon();
    }
}

impl core::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("txn_state", &self.txn_state())
            .finish()
    }
}
