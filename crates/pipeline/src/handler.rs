//! Handler trait: the single unit of business logic behind each request.

use async_trait::async_trait;
use givebook_core::DomainError;

use crate::request::Request;

/// Handles one request type.
///
/// Exactly one handler per request type is registered with the dispatcher; the
/// handler owns its collaborators (datastore handle, ports) and builds a fresh
/// unit of work per call.
#[async_trait]
pub trait Handler<R: Request>: Send + Sync {
    async fn handle(&self, request: R) -> Result<R::Output, DomainError>;
}
