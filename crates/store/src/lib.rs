//! `givebook-store` — persistence substrate: datastore engine, specifications,
//! generic repositories and the unit of work.
//!
//! Layering:
//!
//! ```text
//! UnitOfWork ── one per logical operation, owns the Session
//!   └─ Repository<T> ── one per entity type, stateless facade over the Session
//!        └─ Session ── staged changes + optional transaction workspace
//!             └─ Datastore ── shared in-memory typed sets, atomic swap commit
//! ```
//!
//! Mutations stage into the session and become visible only after
//! [`UnitOfWork::save_changes`]. Reads always see committed state (or the
//! private transaction workspace once a transaction is open).

pub mod datastore;
pub mod error;
pub mod relations;
pub mod repository;
pub mod session;
pub mod specification;
pub mod unit_of_work;

pub use datastore::Datastore;
pub use error::{StoreError, StoreResult};
pub use relations::{HasRelations, RelationView};
pub use repository::{Page, Repository};
pub use specification::{SortKey, Specification};
pub use unit_of_work::{TxnState, UnitOfWork};
