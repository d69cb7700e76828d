//! Donor commands: create, update, delete.

use std::sync::Arc;

use async_trait::async_trait;

use givebook_core::{DomainError, Email, RecordId, StoredRecord};
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_pipeline::rules;
use givebook_store::{Datastore, UnitOfWork};

use crate::donor::{Donor, MAX_NAME_LEN};

#[derive(Debug, Clone)]
pub struct CreateDonor {
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Request for CreateDonor {
    type Output = Donor;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "create_donor";
}

#[derive(Debug, Clone)]
pub struct UpdateDonor {
    pub id: RecordId,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Request for UpdateDonor {
    type Output = Donor;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "update_donor";
}

#[derive(Debug, Clone)]
pub struct DeleteDonor {
    pub id: RecordId,
}

impl Request for DeleteDonor {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "delete_donor";
}

/// Field rules shared by create and update.
fn donor_field_errors(full_name: &str, email: Option<&str>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    errors.extend(rules::required("full_name", full_name));
    errors.extend(rules::max_len("full_name", full_name, MAX_NAME_LEN));
    if let Some(email) = email {
        if Email::new(email).is_err() {
            errors.push(FieldError::new("email", "email is not a valid address"));
        }
    }
    errors
}

pub struct CreateDonorRules;

#[async_trait]
impl Validator<CreateDonor> for CreateDonorRules {
    async fn validate(&self, request: &CreateDonor) -> Vec<FieldError> {
        donor_field_errors(&request.full_name, request.email.as_deref())
    }
}

pub struct UpdateDonorRules;

#[async_trait]
impl Validator<UpdateDonor> for UpdateDonorRules {
    async fn validate(&self, request: &UpdateDonor) -> Vec<FieldError> {
        let mut errors = donor_field_errors(&request.full_name, request.email.as_deref());
        if request.id.is_nil() {
            errors.push(FieldError::new("id", "id is required"));
        }
        errors
    }
}

fn parse_email(email: Option<String>) -> Result<Option<Email>, DomainError> {
    email.map(Email::new).transpose()
}

pub struct CreateDonorHandler {
    store: Arc<Datastore>,
}

impl CreateDonorHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<CreateDonor> for CreateDonorHandler {
    async fn handle(&self, request: CreateDonor) -> Result<Donor, DomainError> {
        let donor = Donor::new(request.full_name, request.phone, parse_email(request.email)?)?;

        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let donor = uow.repo::<Donor>().add(donor).await?;
        uow.save_changes().await?;

        tracing::debug!(donor = %donor.id(), "donor created");
        Ok(donor)
    }
}

pub struct UpdateDonorHandler {
    store: Arc<Datastore>,
}

impl UpdateDonorHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<UpdateDonor> for UpdateDonorHandler {
    async fn handle(&self, request: UpdateDonor) -> Result<Donor, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let repo = uow.repo::<Donor>();

        let mut donor = repo
            .get_by_id(request.id)
            .await?
            .ok_or(DomainError::NotFound)?;
        donor.rename(request.full_name)?;
        donor.phone = request.phone;
        donor.email = parse_email(request.email)?;

        repo.update(donor.clone()).await?;
        uow.save_changes().await?;
        Ok(donor)
    }
}

pub struct DeleteDonorHandler {
    store: Arc<Datastore>,
}

impl DeleteDonorHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<DeleteDonor> for DeleteDonorHandler {
    async fn handle(&self, request: DeleteDonor) -> Result<(), DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<Donor>().delete(request.id).await?;
        uow.save_changes().await?;
        tracing::debug!(donor = %request.id, "donor deleted");
        Ok(())
    }
}
