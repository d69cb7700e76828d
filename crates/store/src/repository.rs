//! Generic repository: a stateless facade over one entity type.
//!
//! A repository owns no data. Reads resolve specifications against the
//! session's visible sets; mutations stage into the session and surface only
//! after the owning unit of work saves.

use std::marker::PhantomData;
use std::sync::Arc;

use givebook_core::{RecordId, StoredRecord};

use crate::datastore::{set_of, SetMap};
use crate::error::{StoreError, StoreResult};
use crate::relations::{attach_all, HasRelations};
use crate::session::{AddOp, AddRangeOp, DeleteOp, Session};
use crate::specification::{SortKey, Specification};

/// One page of results plus the total count of the filtered set.
///
/// `total_count` is computed before slicing, so it is the same for every page
/// of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

/// Generic repository bound to one entity type and one session.
pub struct Repository<T> {
    session: Arc<Session>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            _marker: PhantomData,
        }
    }
}

impl<T: StoredRecord + HasRelations> Repository<T> {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _marker: PhantomData,
        }
    }

    /// Fetch a record by id. Soft-deleted records are treated as absent.
    pub async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<T>> {
        self.get_by_id_with(id, &[]).await
    }

    /// Fetch a record by id with the named relations attached.
    pub async fn get_by_id_with(&self, id: RecordId, includes: &[&str]) -> StoreResult<Option<T>> {
        self.session.with_visible_sets(|sets| {
            let Some(record) = lookup::<T>(sets, id, false) else {
                return Ok(None);
            };
            let mut record = record;
            attach_all(&mut record, includes, sets)?;
            Ok(Some(record))
        })?
    }

    /// Explicit opt-out of the soft-delete filter.
    pub async fn get_by_id_including_deleted(&self, id: RecordId) -> StoreResult<Option<T>> {
        self.session
            .with_visible_sets(|sets| lookup::<T>(sets, id, true))
    }

    /// All non-deleted records matching `predicate`, with relations attached.
    ///
    /// The result is materialized at call time; no ordering is implied.
    pub async fn find(
        &self,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        includes: &[&str],
    ) -> StoreResult<Vec<T>> {
        let spec = Specification::new().filter(predicate);
        let spec = includes
            .iter()
            .fold(spec, |spec, include| spec.include(*include));
        self.query(&spec).await
    }

    /// Resolve a specification to a materialized result list.
    pub async fn query(&self, spec: &Specification<T>) -> StoreResult<Vec<T>> {
        Ok(self.query_paged(spec).await?.items)
    }

    /// Count of records matching the specification's criteria, paging ignored.
    pub async fn count(&self, spec: &Specification<T>) -> StoreResult<u64> {
        Ok(self.query_paged(spec).await?.total_count)
    }

    /// Resolve a specification: criteria, then includes, then ordering, then
    /// the total count of the filtered set, then the skip/take slice if paging
    /// is enabled.
    pub async fn query_paged(&self, spec: &Specification<T>) -> StoreResult<Page<T>> {
        self.session.with_visible_sets(|sets| {
            let mut items: Vec<T> = match set_of::<T>(sets) {
                Some(set) => set
                    .rows
                    .values()
                    .filter(|r| spec.is_deleted_included() || !r.meta().is_deleted())
                    .filter(|r| spec.matches(r))
                    .cloned()
                    .collect(),
                None => Vec::new(),
            };

            for item in &mut items {
                attach_all(item, spec.includes(), sets)?;
            }

            spec.sort(&mut items);

            // Count before slicing; this is what pagination metadata builds on.
            let total_count = items.len() as u64;
            if spec.is_paging_enabled() {
                items = items
                    .into_iter()
                    .skip(spec.skip())
                    .take(spec.take())
                    .collect();
            }

            Ok(Page { items, total_count })
        })?
    }

    /// Page through all non-deleted records. `page_number` and `page_size`
    /// start at 1; a page past the end is empty, not an error.
    pub async fn get_paged(
        &self,
        page_number: u64,
        page_size: u64,
        order: Option<SortKey<T>>,
        ascending: bool,
    ) -> StoreResult<Page<T>> {
        if page_number < 1 {
            return Err(StoreError::invalid_argument("page_number must be >= 1"));
        }
        if page_size < 1 {
            return Err(StoreError::invalid_argument("page_size must be >= 1"));
        }

        // A page number far past the end must yield the empty page, not an
        // overflowing multiply.
        let skip = ((page_number - 1) as usize).saturating_mul(page_size as usize);
        let mut spec = Specification::new().apply_paging(skip, page_size as usize);
        if let Some(key) = order {
            spec = spec.with_sort_key(key, ascending);
        }
        self.query_paged(&spec).await
    }

    /// Stage an insert. The record's generated fields (id, `created_at`) were
    /// assigned at construction; the stored form is returned.
    pub async fn add(&self, entity: T) -> StoreResult<T> {
        if entity.id().is_nil() {
            return Err(StoreError::invalid_argument(format!(
                "{} requires a non-nil id",
                T::RECORD_TYPE
            )));
        }
        self.session.stage(Box::new(AddOp(entity.clone())))?;
        Ok(entity)
    }

    /// Stage a batch insert with the same per-item contract as [`Self::add`].
    pub async fn add_range(&self, entities: Vec<T>) -> StoreResult<Vec<T>> {
        if entities.is_empty() {
            return Err(StoreError::invalid_argument(format!(
                "{} add_range requires at least one record",
                T::RECORD_TYPE
            )));
        }
        for entity in &entities {
            if entity.id().is_nil() {
                return Err(StoreError::invalid_argument(format!(
                    "{} requires a non-nil id",
                    T::RECORD_TYPE
                )));
            }
        }
        self.session.stage(Box::new(AddRangeOp(entities.clone())))?;
        Ok(entities)
    }

    /// Stage an update. Does not commit; two sequential updates of the same
    /// record coalesce and commit once with the final values.
    pub async fn update(&self, entity: T) -> StoreResult<()> {
        if entity.id().is_nil() {
            return Err(StoreError::invalid_argument(format!(
                "{} requires a non-nil id",
                T::RECORD_TYPE
            )));
        }
        self.session.stage_update(entity)
    }

    /// Stage a soft delete. Fails with `NotFound` when no visible record has
    /// the id; deletion is uniformly logical for every entity type.
    pub async fn delete(&self, id: RecordId) -> StoreResult<()> {
        let exists = self
            .session
            .with_visible_sets(|sets| lookup::<T>(sets, id, false).is_some())?;
        if !exists {
            return Err(StoreError::NotFound {
                record: T::RECORD_TYPE,
                id,
            });
        }
        self.session.stage(Box::new(DeleteOp::<T> {
            id,
            _marker: PhantomData,
        }))
    }

    /// Whether a non-deleted record with `id` exists. Soft-deleted ids report
    /// `false`, consistent with default reads.
    pub async fn exists(&self, id: RecordId) -> StoreResult<bool> {
        self.session
            .with_visible_sets(|sets| lookup::<T>(sets, id, false).is_some())
    }
}

impl<T> core::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Repository")
    }
}

fn lookup<T: StoredRecord>(sets: &SetMap, id: RecordId, include_deleted: bool) -> Option<T> {
    set_of::<T>(sets)
        .and_then(|set| set.rows.get(&id))
        .filter(|r| include_deleted || !r.meta().is_deleted())
        .cloned()
}
