//! Dispatcher: a startup-built registry routing each request to its handler,
//! with validators running in front.
//!
//! The registry is keyed by the request's `TypeId`, so routing is a map lookup
//! plus a downcast; nothing is discovered at runtime. Registration happens
//! once through [`DispatcherBuilder`], after which the dispatcher is immutable
//! and shared behind an `Arc`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::error::RequestError;
use crate::handler::Handler;
use crate::request::Request;
use crate::validate::{FieldErrors, Validator};

/// Misconfigured registry, reported at build time rather than per request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate handler registered for '{0}'")]
    DuplicateHandler(&'static str),
}

struct HandlerEntry {
    name: &'static str,
    // Arc<dyn Handler<R>> behind a type-erased box; recovered via downcast.
    handler: Box<dyn Any + Send + Sync>,
}

struct ValidatorEntry {
    // Vec<Arc<dyn Validator<R>>> behind a type-erased box.
    validators: Box<dyn Any + Send + Sync>,
}

/// Collects registrations, then freezes them into a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<TypeId, HandlerEntry>,
    validators: HashMap<TypeId, ValidatorEntry>,
    duplicates: Vec<&'static str>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `R`. Registering a second handler for the same
    /// request type makes [`Self::build`] fail.
    pub fn handle<R: Request, H: Handler<R> + 'static>(mut self, handler: H) -> Self {
        let erased: Arc<dyn Handler<R>> = Arc::new(handler);
        let entry = HandlerEntry {
            name: R::NAME,
            handler: Box::new(erased),
        };
        if self.handlers.insert(TypeId::of::<R>(), entry).is_some() {
            self.duplicates.push(R::NAME);
        }
        self
    }

    /// Add a validator for `R`. Multiple validators per request type are fine;
    /// they all run, in registration order.
    pub fn validate<R: Request, V: Validator<R> + 'static>(mut self, validator: V) -> Self {
        let entry = self
            .validators
            .entry(TypeId::of::<R>())
            .or_insert_with(|| ValidatorEntry {
                validators: Box::new(Vec::<Arc<dyn Validator<R>>>::new()),
            });
        if let Some(list) = entry
            .validators
            .downcast_mut::<Vec<Arc<dyn Validator<R>>>>()
        {
            list.push(Arc::new(validator));
        }
        self
    }

    pub fn build(self) -> Result<Dispatcher, RegistryError> {
        if let Some(&name) = self.duplicates.first() {
            return Err(RegistryError::DuplicateHandler(name));
        }
        let mut names: Vec<&'static str> = self.handlers.values().map(|e| e.name).collect();
        names.sort_unstable();
        tracing::debug!(handlers = ?names, "dispatcher built");
        Ok(Dispatcher {
            handlers: self.handlers,
            validators: self.validators,
        })
    }
}

/// Immutable request router. Cheap to share; all state is behind `Arc`s.
pub struct Dispatcher {
    handlers: HashMap<TypeId, HandlerEntry>,
    validators: HashMap<TypeId, ValidatorEntry>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Run `request` through its validators and handler.
    ///
    /// Every validator for the request type runs; if any produced errors the
    /// combined field errors come back and the handler is never invoked.
    pub async fn dispatch<R: Request>(&self, request: R) -> Result<R::Output, RequestError> {
        let mut errors = FieldErrors::new();
        for validator in self.validators_for::<R>() {
            errors.extend(validator.validate(&request).await);
        }
        if !errors.is_empty() {
            tracing::warn!(request = R::NAME, %errors, "request rejected by validation");
            return Err(RequestError::Validation(errors));
        }

        let handler = self
            .handler_for::<R>()
            .ok_or(RequestError::NoHandler(R::NAME))?;
        tracing::debug!(request = R::NAME, kind = ?R::KIND, "dispatching");
        handler.handle(request).await.map_err(RequestError::from)
    }

    /// Whether a handler is registered for `R`.
    pub fn handles<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    fn handler_for<R: Request>(&self) -> Option<Arc<dyn Handler<R>>> {
        self.handlers
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.handler.downcast_ref::<Arc<dyn Handler<R>>>())
            .map(Arc::clone)
    }

    fn validators_for<R: Request>(&self) -> Vec<Arc<dyn Validator<R>>> {
        self.validators
            .get(&TypeId::of::<R>())
            .and_then(|entry| {
                entry
                    .validators
                    .downcast_ref::<Vec<Arc<dyn Validator<R>>>>()
            })
            .map(|list| list.to_vec())
            .unwrap_or_default()
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
