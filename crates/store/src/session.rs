//! Session: staged changes and the transaction workspace for one unit of work.
//!
//! Repositories stage adds/updates/deletes here in call order. `save_changes`
//! hands the whole batch to the datastore, which applies it to a clone of the
//! committed sets and swaps the clone in under its write lock, so a batch is
//! all-or-nothing and concurrent sessions cannot erase each other's commits.
//! While a transaction is open the batch targets a private working copy
//! instead; other sessions keep seeing the last committed state until `commit`
//! replays the transaction's saved batches against the shared store.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use givebook_core::{RecordId, StoredRecord};

use crate::datastore::{clone_sets, set_of_mut, Datastore, SetMap};
use crate::error::{StoreError, StoreResult};
use crate::unit_of_work::TxnState;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum OpKind {
    Add,
    Update,
    Delete,
}

/// One staged mutation, type-erased so a single ordered buffer can hold
/// changes for every entity type in the session.
pub(crate) trait StagedOp: Send + Sync {
    fn apply(&self, sets: &mut SetMap, now: DateTime<Utc>) -> StoreResult<u64>;
    fn op_kind(&self) -> OpKind;
    fn entity_type(&self) -> TypeId;
    fn record_id(&self) -> Option<RecordId>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct AddOp<T>(pub(crate) T);

impl<T: StoredRecord> StagedOp for AddOp<T> {
    fn apply(&self, sets: &mut SetMap, _now: DateTime<Utc>) -> StoreResult<u64> {
        let set = set_of_mut::<T>(sets)?;
        let id = self.0.id();
        if set.rows.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                record: T::RECORD_TYPE,
                id,
            });
        }
        set.rows.insert(id, self.0.clone());
        Ok(1)
    }

    fn op_kind(&self) -> OpKind {
        OpKind::Add
    }

    fn entity_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn record_id(&self) -> Option<RecordId> {
        Some(self.0.id())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) struct AddRangeOp<T>(pub(crate) Vec<T>);

impl<T: StoredRecord> StagedOp for AddRangeOp<T> {
    fn apply(&self, sets: &mut SetMap, _now: DateTime<Utc>) -> StoreResult<u64> {
        let set = set_of_mut::<T>(sets)?;
        for record in &self.0 {
            if set.rows.contains_key(&record.id()) {
                return Err(StoreError::DuplicateId {
                    record: T::RECORD_TYPE,
                    id: record.id(),
                });
            }
        }
        for record in &self.0 {
            set.rows.insert(record.id(), record.clone());
        }
        Ok(self.0.len() as u64)
    }

    fn op_kind(&self) -> OpKind {
        OpKind::Add
    }

    fn entity_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn record_id(&self) -> Option<RecordId> {
        None
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) struct UpdateOp<T>(pub(crate) T);

impl<T: StoredRecord> StagedOp for UpdateOp<T> {
    fn apply(&self, sets: &mut SetMap, now: DateTime<Utc>) -> StoreResult<u64> {
        let set = set_of_mut::<T>(sets)?;
        let id = self.0.id();
        let existing = set.rows.get(&id).ok_or(StoreError::NotFound {
            record: T::RECORD_TYPE,
            id,
        })?;
        if existing.meta().is_deleted() {
            return Err(StoreError::NotFound {
                record: T::RECORD_TYPE,
                id,
            });
        }
        let mut record = self.0.clone();
        record
            .meta_mut()
            .touch(now)
            .map_err(|e| StoreError::invalid_state(e.to_string()))?;
        set.rows.insert(id, record);
        Ok(1)
    }

    fn op_kind(&self) -> OpKind {
        OpKind::Update
    }

    fn entity_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn record_id(&self) -> Option<RecordId> {
        Some(self.0.id())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) struct DeleteOp<T> {
    pub(crate) id: RecordId,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

impl<T: StoredRecord> StagedOp for DeleteOp<T> {
    fn apply(&self, sets: &mut SetMap, now: DateTime<Utc>) -> StoreResult<u64> {
        let set = set_of_mut::<T>(sets)?;
        let record = set.rows.get_mut(&self.id).ok_or(StoreError::NotFound {
            record: T::RECORD_TYPE,
            id: self.id,
        })?;
        if record.meta().is_deleted() {
            return Err(StoreError::NotFound {
                record: T::RECORD_TYPE,
                id: self.id,
            });
        }
        record
            .meta_mut()
            .soft_delete(now)
            .map_err(|e| StoreError::invalid_state(e.to_string()))?;
        Ok(1)
    }

    fn op_kind(&self) -> OpKind {
        OpKind::Delete
    }

    fn entity_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn record_id(&self) -> Option<RecordId> {
        Some(self.id)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct SessionInner {
    ops: Vec<Box<dyn StagedOp>>,
    txn: TxnState,
    workspace: Option<SetMap>,
    // Batches already saved into the workspace, kept for replay at commit.
    txn_log: Vec<Box<dyn StagedOp>>,
}

/// Staging and transaction scope shared by every repository of one unit of
/// work. Owned exclusively by that unit of work; never shared across requests.
pub struct Session {
    store: Arc<Datastore>,
    inner: Mutex<SessionInner>,
}

impl Session {
    pub(crate) fn new(store: Arc<Datastore>) -> Self {
        Self {
            store,
            inner: Mutex::new(SessionInner {
                ops: Vec::new(),
                txn: TxnState::Idle,
                workspace: None,
                txn_log: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, SessionInner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::backend("session lock poisoned"))
    }

    /// Run `f` against the sets this session currently reads from: the
    /// transaction workspace when one is open, the shared store otherwise.
    pub(crate) fn with_visible_sets<R>(&self, f: impl FnOnce(&SetMap) -> R) -> StoreResult<R> {
        let inner = self.lock()?;
        match &inner.workspace {
            Some(workspace) => Ok(f(workspace)),
            None => self.store.with_sets(f),
        }
    }

    pub(crate) fn stage(&self, op: Box<dyn StagedOp>) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.ops.push(op);
        Ok(())
    }

    /// Stage an update, coalescing with an immediately prior staged update of
    /// the same record: two sequential updates commit once, with the final
    /// field values.
    pub(crate) fn stage_update<T: StoredRecord>(&self, record: T) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let id = record.id();
        if let Some(last) = inner.ops.iter_mut().rev().find(|op| {
            op.entity_type() == TypeId::of::<T>() && op.record_id() == Some(id)
        }) {
            if last.op_kind() == OpKind::Update {
                if let Some(op) = last.as_any_mut().downcast_mut::<UpdateOp<T>>() {
                    op.0 = record;
                    return Ok(());
                }
            }
        }
        inner.ops.push(Box::new(UpdateOp(record)));
        Ok(())
    }

    pub(crate) fn pending_ops(&self) -> StoreResult<usize> {
        Ok(self.lock()?.ops.len())
    }

    /// Flush every staged change as one atomic batch.
    ///
    /// The batch is applied to a clone of the target sets; only a fully
    /// successful batch is swapped in. Outside a transaction the clone and
    /// swap happen inside the datastore's write lock, so commits from other
    /// sessions are never lost. On failure nothing is visible and the staged
    /// batch is discarded — the caller retries the whole operation.
    pub(crate) fn save_changes(&self) -> StoreResult<u64> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let ops = core::mem::take(&mut inner.ops);
        if ops.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let in_transaction = inner.workspace.is_some();
        let affected = match inner.workspace.as_mut() {
            Some(workspace) => {
                let mut target = clone_sets(workspace);
                let mut affected = 0u64;
                for op in &ops {
                    affected += op.apply(&mut target, now)?;
                }
                *workspace = target;
                inner.txn_log.extend(ops);
                affected
            }
            None => self.store.commit(|target| {
                let mut affected = 0u64;
                for op in &ops {
                    affected += op.apply(target, now)?;
                }
                Ok(affected)
            })?,
        };

        tracing::debug!(affected, in_transaction, "saved changes");
        Ok(affected)
    }

    pub(crate) fn txn_state(&self) -> StoreResult<TxnState> {
        Ok(self.lock()?.txn)
    }

    pub(crate) fn begin_transaction(&self) -> StoreResult<()> {
        let mut inner = self.lock()?;
        match inner.txn {
            TxnState::Idle => {}
            TxnState::InTransaction => {
                return Err(StoreError::invalid_state("transaction already open"))
            }
            TxnState::Committed | TxnState::RolledBack => {
                return Err(StoreError::invalid_state(
                    "unit of work already finished its transaction",
                ))
            }
        }
        inner.workspace = Some(self.store.snapshot()?);
        inner.txn = TxnState::InTransaction;
        tracing::debug!("transaction begun");
        Ok(())
    }

    /// Replay the transaction's saved batches against the shared store as one
    /// atomic commit. The workspace itself is never swapped in wholesale: it
    /// is a snapshot from `begin_transaction`, and replacing the store with it
    /// would erase everything other sessions committed since. Replaying the
    /// log rebases this transaction's work onto the current committed state;
    /// an op that no longer applies (a concurrent commit took the same id, or
    /// deleted a record this transaction updates) fails the whole commit and
    /// the store stays untouched.
    pub(crate) fn commit_transaction(&self) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.txn != TxnState::InTransaction {
            return Err(StoreError::invalid_state(format!(
                "commit without an open transaction (state: {:?})",
                inner.txn
            )));
        }
        inner
            .workspace
            .take()
            .ok_or_else(|| StoreError::backend("transaction open but workspace missing"))?;

        let log = core::mem::take(&mut inner.txn_log);
        let now = Utc::now();
        let replayed = if log.is_empty() {
            Ok(0)
        } else {
            self.store.commit(|target| {
                let mut affected = 0u64;
                for op in &log {
                    affected += op.apply(target, now)?;
                }
                Ok(affected)
            })
        };

        match replayed {
            Ok(affected) => {
                inner.txn = TxnState::Committed;
                tracing::debug!(affected, "transaction committed");
                Ok(())
            }
            Err(err) => {
                inner.txn = TxnState::RolledBack;
                tracing::warn!(error = %err, "transaction commit conflicted; rolled back");
                Err(err)
            }
        }
    }

    pub(crate) fn rollback_transaction(&self) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.txn != TxnState::InTransaction {
            return Err(StoreError::invalid_state(format!(
                "rollback without an open transaction (state: {:?})",
                inner.txn
            )));
        }
        inner.workspace = None;
        inner.ops.clear();
        inner.txn_log.clear();
        inner.txn = TxnState::RolledBack;
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    /// Rollback on abandonment: discard the workspace and staged batch without
    /// touching the shared store. Called from the unit of work's `Drop`.
    pub(crate) fn abandon(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.txn == TxnState::InTransaction {
                tracing::warn!("unit of work dropped with open transaction; rolling back");
                inner.workspace = None;
                inner.ops.clear();
                inner.txn_log.clear();
                inner.txn = TxnState::RolledBack;
            }
        }
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Session")
    }
}
