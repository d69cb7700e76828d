//! In-memory datastore engine: one typed set per entity type.
//!
//! This is the storage collaborator behind repositories and the unit of work.
//! Committed state lives in a `SetMap` (typed sets keyed by `TypeId`) behind a
//! single `RwLock`. Commits never mutate the live map in place: [`Datastore::commit`]
//! clones the map, applies the batch to the clone and swaps it in, all while
//! holding the write lock. A batch either lands completely or not at all,
//! concurrent commits serialize on the lock instead of overwriting each other,
//! and a future dropped mid-commit leaves the committed state untouched.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use givebook_core::{RecordId, StoredRecord};

use crate::error::{StoreError, StoreResult};

/// One entity type's committed rows, keyed by record id.
///
/// `BTreeMap` keeps enumeration deterministic; with UUIDv7 keys the default
/// order is creation order.
#[derive(Debug)]
pub(crate) struct TypedSet<T: StoredRecord> {
    pub(crate) rows: BTreeMap<RecordId, T>,
}

impl<T: StoredRecord> TypedSet<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: StoredRecord> Clone for TypedSet<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

/// Object-safe view of a typed set, so heterogeneous sets can share one map.
pub(crate) trait AnySet: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_box(&self) -> Box<dyn AnySet>;
    fn len(&self) -> usize;
}

impl<T: StoredRecord> AnySet for TypedSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn AnySet> {
        Box::new(self.clone())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// All committed sets, keyed by entity type.
pub(crate) type SetMap = HashMap<TypeId, Box<dyn AnySet>>;

pub(crate) fn clone_sets(sets: &SetMap) -> SetMap {
    sets.iter()
        .map(|(k, v)| (*k, v.clone_box()))
        .collect()
}

/// Borrow the set for `T`, if any rows were ever committed for it.
pub(crate) fn set_of<T: StoredRecord>(sets: &SetMap) -> Option<&TypedSet<T>> {
    sets.get(&TypeId::of::<T>())
        .and_then(|s| s.as_any().downcast_ref::<TypedSet<T>>())
}

/// Borrow the set for `T` mutably, creating it on first write.
pub(crate) fn set_of_mut<T: StoredRecord>(sets: &mut SetMap) -> StoreResult<&mut TypedSet<T>> {
    let entry = sets
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Box::new(TypedSet::<T>::new()));
    entry
        .as_any_mut()
        .downcast_mut::<TypedSet<T>>()
        .ok_or_else(|| StoreError::backend("typed set downcast mismatch"))
}

/// Shared in-memory datastore.
///
/// Intended to back one process; sessions snapshot and swap whole set maps, so
/// writers serialize on the lock while readers see a consistent map.
#[derive(Default)]
pub struct Datastore {
    sets: RwLock<SetMap>,
}

impl Datastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows for `T`, soft-deleted included.
    pub fn committed_count<T: StoredRecord>(&self) -> StoreResult<usize> {
        self.with_sets(|sets| set_of::<T>(sets).map(|s| s.rows.len()).unwrap_or(0))
    }

    pub(crate) fn with_sets<R>(&self, f: impl FnOnce(&SetMap) -> R) -> StoreResult<R> {
        let sets = self
            .sets
            .read()
            .map_err(|_| StoreError::backend("datastore lock poisoned"))?;
        Ok(f(&sets))
    }

    /// Deep-clone the committed sets (transaction workspace).
    pub(crate) fn snapshot(&self) -> StoreResult<SetMap> {
        self.with_sets(clone_sets)
    }

    /// Apply one batch atomically. The single serialization point: the clone,
    /// the batch and the swap all happen under the write lock, so a commit can
    /// never overwrite state it has not seen.
    pub(crate) fn commit(
        &self,
        apply: impl FnOnce(&mut SetMap) -> StoreResult<u64>,
    ) -> StoreResult<u64> {
        let mut sets = self
            .sets
            .write()
            .map_err(|_| StoreError::backend("datastore lock poisoned"))?;
        let mut target = clone_sets(&sets);
        let affected = apply(&mut target)?;
        *sets = target;
        Ok(affected)
    }
}

impl core::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let types = self.sets.read().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("Datastore").field("entity_types", &types).finish()
    }
}
