//! Record base shape: identity, audit timestamps, soft delete, pending events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::event::DomainEventRecord;
use crate::id::RecordId;

/// Common shape shared by every stored record.
///
/// Embed this in each entity struct and expose it through [`StoredRecord`].
/// Invariants enforced here:
/// - `created_at` is set once at construction and never mutated
/// - `updated_at` stays `None` until the first mutation
/// - a soft-deleted record cannot be un-deleted or further mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    id: RecordId,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    is_active: bool,
    is_deleted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    events: Vec<DomainEventRecord>,
}

impl RecordMeta {
    /// Fresh metadata with a generated id and `created_at = now`.
    pub fn new() -> Self {
        Self::new_at(RecordId::new(), Utc::now())
    }

    /// Fresh metadata with an explicit id and creation time.
    ///
    /// Prefer this in tests for determinism.
    pub fn new_at(id: RecordId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            updated_at: None,
            is_active: true,
            is_deleted: false,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Mark the record as mutated at `now`.
    ///
    /// Fails with `InvalidState` once the record is soft-deleted.
    pub fn touch(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.is_deleted {
            return Err(DomainError::invalid_state(format!(
                "record {} is deleted and cannot be mutated",
                self.id
            )));
        }
        self.updated_at = Some(now);
        Ok(())
    }

    /// Logically remove the record: `is_deleted = true`, `is_active = false`.
    ///
    /// Deleting twice fails with `InvalidState`; there is no un-delete.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.touch(now)?;
        self.is_deleted = true;
        self.is_active = false;
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.touch(now)?;
        self.is_active = false;
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.touch(now)?;
        self.is_active = true;
        Ok(())
    }

    /// Append a domain event to the pending list (ordered, append-only).
    pub fn record_event(&mut self, event: DomainEventRecord) {
        self.events.push(event);
    }

    /// Pending events, in the order they were recorded.
    pub fn events(&self) -> &[DomainEventRecord] {
        &self.events
    }

    /// Remove and return all pending events. Called by the publishing layer.
    pub fn drain_events(&mut self) -> Vec<DomainEventRecord> {
        core::mem::take(&mut self.events)
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait implemented by every entity the store can hold.
///
/// The store only ever touches records through this interface, which keeps the
/// soft-delete and audit invariants in one place.
pub trait StoredRecord: Clone + Send + Sync + 'static {
    /// Stable entity-type name, used for relation lookups and log lines.
    const RECORD_TYPE: &'static str;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn id(&self) -> RecordId {
        self.meta().id()
    }
}
