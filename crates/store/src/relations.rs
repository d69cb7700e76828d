//! Explicit relation ("includes") resolution.
//!
//! Relations are identifier-based: a record stores a foreign key and an
//! optional, separately loaded navigation value. Nothing is traversed
//! implicitly — a read attaches a relation only when its name appears in the
//! caller's includes, and unknown names are rejected.

use givebook_core::{RecordId, StoredRecord};

use crate::datastore::{set_of, SetMap};
use crate::error::{StoreError, StoreResult};

/// Read-only view over committed sets, handed to records while attaching
/// relations.
pub struct RelationView<'a> {
    sets: &'a SetMap,
}

impl<'a> RelationView<'a> {
    pub(crate) fn new(sets: &'a SetMap) -> Self {
        Self { sets }
    }

    /// Fetch a related record by id. Soft-deleted records resolve to `None`,
    /// same as every other default read.
    pub fn get<R: StoredRecord>(&self, id: RecordId) -> Option<R> {
        set_of::<R>(self.sets)
            .and_then(|set| set.rows.get(&id))
            .filter(|r| !r.meta().is_deleted())
            .cloned()
    }
}

impl core::fmt::Debug for RelationView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("RelationView")
    }
}

/// Implemented by records that expose named relations.
///
/// Records without relations implement this with the defaults; any include
/// name then fails with [`StoreError::UnknownRelation`].
pub trait HasRelations: StoredRecord {
    /// Relation names this record accepts in `includes`.
    fn relations() -> &'static [&'static str] {
        &[]
    }

    /// Populate the navigation value for `relation` from `view`.
    ///
    /// A dangling foreign key is not an error here: the navigation value just
    /// stays empty. Unknown relation names must be rejected.
    fn attach_relation(&mut self, relation: &str, view: &RelationView<'_>) -> StoreResult<()> {
        let _ = view;
        Err(StoreError::UnknownRelation {
            record: Self::RECORD_TYPE,
            relation: relation.to_string(),
        })
    }
}

/// Attach every requested relation to `record`, in include order.
pub(crate) fn attach_all<T: HasRelations>(
    record: &mut T,
    includes: &[impl AsRef<str>],
    sets: &SetMap,
) -> StoreResult<()> {
    let view = RelationView::new(sets);
    for include in includes {
        let include = include.as_ref();
        if !T::relations().contains(&include) {
            return Err(StoreError::UnknownRelation {
                record: T::RECORD_TYPE,
                relation: include.to_string(),
            });
        }
        record.attach_relation(include, &view)?;
    }
    Ok(())
}
