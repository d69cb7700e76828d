//! Donor queries.

use std::sync::Arc;

use async_trait::async_trait;

use givebook_core::{DomainError, RecordId};
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_store::{Datastore, Page, SortKey, UnitOfWork};

use crate::donor::Donor;

#[derive(Debug, Clone)]
pub struct GetDonor {
    pub id: RecordId,
}

impl Request for GetDonor {
    type Output = Donor;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "get_donor";
}

/// Donors ordered by name, one page at a time.
#[derive(Debug, Clone)]
pub struct ListDonors {
    pub page_number: u64,
    pub page_size: u64,
}

impl Request for ListDonors {
    type Output = Page<Donor>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "list_donors";
}

pub struct ListDonorsRules;

#[async_trait]
impl Validator<ListDonors> for ListDonorsRules {
    async fn validate(&self, request: &ListDonors) -> Vec<FieldError> {
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

pub struct GetDonorHandler {
    store: Arc<Datastore>,
}

impl GetDonorHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<GetDonor> for GetDonorHandler {
    async fn handle(&self, request: GetDonor) -> Result<Donor, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<Donor>()
            .get_by_id(request.id)
            .await?
            .ok_or(DomainError::NotFound)
    }
}

pub struct ListDonorsHandler {
    store: Arc<Datastore>,
}

impl ListDonorsHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<ListDonors> for ListDonorsHandler {
    async fn handle(&self, request: ListDonors) -> Result<Page<Donor>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let order = SortKey::by(|d: &Donor| d.full_name.clone());
        let page = uow
            .repo::<Donor>()
            .get_paged(request.page_number, request.page_size, Some(order), true)
            .await?;
        Ok(page)
    }
}
