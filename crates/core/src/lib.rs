//! `givebook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage or pipeline concerns).

pub mod error;
pub mod event;
pub mod id;
pub mod record;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use event::DomainEventRecord;
pub use id::RecordId;
pub use record::{RecordMeta, StoredRecord};
pub use value_object::{Email, Money, ValueObject};
