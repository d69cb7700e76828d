//! User queries.

use std::sync::Arc;

use async_trait::async_trait;

use givebook_core::{DomainError, RecordId};
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_store::{Datastore, Page, SortKey, UnitOfWork};

use crate::user::User;

#[derive(Debug, Clone)]
pub struct GetUser {
    pub id: RecordId,
}

impl Request for GetUser {
    type Output = User;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "get_user";
}

/// Users ordered by e-mail, one page at a time.
#[derive(Debug, Clone)]
pub struct ListUsers {
    pub page_number: u64,
    pub page_size: u64,
}

impl Request for ListUsers {
    type Output = Page<User>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "list_users";
}

pub struct ListUsersRules;

#[async_trait]
impl Validator<ListUsers> for ListUsersRules {
    async fn validate(&self, request: &ListUsers) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if request.page_number < 1 {
            errors.push(FieldError::new("page_number", "page_number must be >= 1"));
        }
        if request.page_size < 1 {
            errors.push(FieldError::new("page_size", "page_size must be >= 1"));
        }
        errors
    }
}

pub struct GetUserHandler {
    store: Arc<Datastore>,
}

impl GetUserHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<GetUser> for GetUserHandler {
    async fn handle(&self, request: GetUser) -> Result<User, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<User>()
            .get_by_id(request.id)
            .await?
            .ok_or(DomainError::NotFound)
    }
}

pub struct ListUsersHandler {
    store: Arc<Datastore>,
}

impl ListUsersHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<ListUsers> for ListUsersHandler {
    async fn handle(&self, request: ListUsers) -> Result<Page<User>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let order = SortKey::by(|u: &User| u.email.as_str().to_string());
        let page = uow
            .repo::<User>()
            .get_paged(request.page_number, request.page_size, Some(order), true)
            .await?;
        Ok(page)
    }
}
