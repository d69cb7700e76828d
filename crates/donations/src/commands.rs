//! Donation commands: create, update, delete.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use givebook_core::{DomainError, Money, RecordId, StoredRecord};
use givebook_donors::Donor;
use givebook_pipeline::rules;
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_store::{Datastore, UnitOfWork};

use crate::donation::{Donation, DonationKind, MAX_AMOUNT_MINOR, MAX_NOTE_LEN};

#[derive(Debug, Clone)]
pub struct CreateDonation {
    pub donor_id: RecordId,
    pub kind: DonationKind,
    /// Amount in minor units of the default currency.
    pub amount_minor: i64,
    pub donated_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Request for CreateDonation {
    type Output = Donation;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "create_donation";
}

#[derive(Debug, Clone)]
pub struct UpdateDonation {
    pub id: RecordId,
    pub kind: DonationKind,
    pub amount_minor: i64,
    pub donated_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Request for UpdateDonation {
    type Output = Donation;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "update_donation";
}

#[derive(Debug, Clone)]
pub struct DeleteDonation {
    pub id: RecordId,
}

impl Request for DeleteDonation {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "delete_donation";
}

fn donation_field_errors(
    amount_minor: i64,
    donated_at: DateTime<Utc>,
    note: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    errors.extend(rules::positive("amount", amount_minor));
    errors.extend(rules::less_than("amount", amount_minor, MAX_AMOUNT_MINOR));
    errors.extend(rules::not_future("donated_at", donated_at, Utc::now()));
    if let Some(note) = note {
        errors.extend(rules::max_len("note", note, MAX_NOTE_LEN));
    }
    errors
}

pub struct CreateDonationRules;

#[async_trait]
impl Validator<CreateDonation> for CreateDonationRules {
    async fn validate(&self, request: &CreateDonation) -> Vec<FieldError> {
        let mut errors = donation_field_errors(
            request.amount_minor,
            request.donated_at,
            request.note.as_deref(),
        );
        if request.donor_id.is_nil() {
            errors.push(FieldError::new("donor_id", "donor_id is required"));
        }
        errors
    }
}

pub struct UpdateDonationRules;

#[async_trait]
impl Validator<UpdateDonation> for UpdateDonationRules {
    async fn validate(&self, request: &UpdateDonation) -> Vec<FieldError> {
        let mut errors = donation_field_errors(
            request.amount_minor,
            request.donated_at,
            request.note.as_deref(),
        );
        if request.id.is_nil() {
            errors.push(FieldError::new("id", "id is required"));
        }
        errors
    }
}

pub struct CreateDonationHandler {
    store: Arc<Datastore>,
}

impl CreateDonationHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<CreateDonation> for CreateDonationHandler {
    async fn handle(&self, request: CreateDonation) -> Result<Donation, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        if !uow.repo::<Donor>().exists(request.donor_id).await? {
            return Err(DomainError::NotFound);
        }

        let donation = Donation::new(
            request.donor_id,
            request.kind,
            Money::from_minor(request.amount_minor)?,
            request.donated_at,
            request.note,
        )?;
        let donation = uow.repo::<Donation>().add(donation).await?;
        uow.save_changes().await?;

        tracing::debug!(
            donation = %donation.id(),
            donor = %request.donor_id,
            amount = request.amount_minor,
            "donation recorded"
        );
        Ok(donation)
    }
}

pub struct UpdateDonationHandler {
    store: Arc<Datastore>,
}

impl UpdateDonationHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<UpdateDonation> for UpdateDonationHandler {
    async fn handle(&self, request: UpdateDonation) -> Result<Donation, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let repo = uow.repo::<Donation>();

        let mut donation = repo
            .get_by_id(request.id)
            .await?
            .ok_or(DomainError::NotFound)?;
        donation.kind = request.kind;
        donation.set_amount(Money::from_minor(request.amount_minor)?)?;
        donation.donated_at = request.donated_at;
        donation.set_note(request.note)?;

        repo.update(donation.clone()).await?;
        uow.save_changes().await?;
        Ok(donation)
    }
}

pub struct DeleteDonationHandler {
    store: Arc<Datastore>,
}

impl DeleteDonationHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<DeleteDonation> for DeleteDonationHandler {
    async fn handle(&self, request: DeleteDonation) -> Result<(), DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<Donation>().delete(request.id).await?;
        uow.save_changes().await?;
        tracing::debug!(donation = %request.id, "donation deleted");
        Ok(())
    }
}
