//! Pending domain events carried by records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A domain event recorded by an entity, awaiting publication.
///
/// Events are facts: immutable once recorded, ordered by insertion. The record
/// that produced them never publishes; whatever layer owns publication drains
/// the list and clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEventRecord {
    /// Stable event name (e.g. "donation.created").
    pub event_type: String,
    /// When the event occurred (business time).
    pub occurred_at: DateTime<Utc>,
    /// Event payload, schema owned by the emitting domain crate.
    pub payload: JsonValue,
}

impl DomainEventRecord {
    pub fn new(
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
        payload: JsonValue,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            occurred_at,
            payload,
        }
    }
}
