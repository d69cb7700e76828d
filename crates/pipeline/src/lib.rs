//! `givebook-pipeline` — the request pipeline: commands and queries, field
//! validation, and a startup-built dispatcher.
//!
//! Flow per request: all registered validators run (collecting field errors),
//! a failing set short-circuits, otherwise the single registered handler runs
//! and produces the output or a domain error.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod request;
pub mod rules;
pub mod validate;

pub use dispatcher::{Dispatcher, DispatcherBuilder, RegistryError};
pub use error::RequestError;
pub use handler::Handler;
pub use request::{Request, RequestKind};
pub use validate::{FieldError, FieldErrors, Validator};
