//! Donation queries and reports.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use givebook_core::{DomainError, RecordId};
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_store::{Datastore, Page, SortKey, UnitOfWork};

use crate::donation::{Donation, DonationKind};
use crate::filters;

/// One donation with its donor attached.
#[derive(Debug, Clone)]
pub struct GetDonationDetail {
    pub id: RecordId,
}

impl Request for GetDonationDetail {
    type Output = Donation;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "get_donation_detail";
}

/// All donations, newest first, one page at a time.
#[derive(Debug, Clone)]
pub struct ListDonations {
    pub page_number: u64,
    pub page_size: u64,
}

impl Request for ListDonations {
    type Output = Page<Donation>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "list_donations";
}

/// Everything one donor gave, donor attached, newest first.
#[derive(Debug, Clone)]
pub struct DonationsByDonor {
    pub donor_id: RecordId,
}

impl Request for DonationsByDonor {
    type Output = Vec<Donation>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "donations_by_donor";
}

/// Donations inside an inclusive date range, newest first.
#[derive(Debug, Clone)]
pub struct DonationsInRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Request for DonationsInRange {
    type Output = Vec<Donation>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "donations_in_range";
}

/// Donations of one kind, newest first.
#[derive(Debug, Clone)]
pub struct DonationsByKind {
    pub kind: DonationKind,
}

impl Request for DonationsByKind {
    type Output = Vec<Donation>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "donations_by_kind";
}

/// Donations between two amounts (minor units, inclusive), smallest first.
#[derive(Debug, Clone)]
pub struct DonationsInAmountRange {
    pub min_minor: i64,
    pub max_minor: i64,
}

impl Request for DonationsInAmountRange {
    type Output = Vec<Donation>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "donations_in_amount_range";
}

pub struct ListDonationsRules;

#[async_trait]
impl Validator<ListDonations> for ListDonationsRules {
    async fn validate(&self, request: &ListDonations) -> Vec<FieldError> {
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

pub struct DonationsInRangeRules;

#[async_trait]
impl Validator<DonationsInRange> for DonationsInRangeRules {
    async fn validate(&self, request: &DonationsInRange) -> Vec<FieldError> {
        if request.from > request.to {
            vec![FieldError::new("from", "from must not be after to")]
        } else {
            Vec::new()
        }
    }
}

pub struct GetDonationDetailHandler {
    store: Arc<Datastore>,
}

impl GetDonationDetailHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<GetDonationDetail> for GetDonationDetailHandler {
    async fn handle(&self, request: GetDonationDetail) -> Result<Donation, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<Donation>()
            .get_by_id_with(request.id, &["donor"])
            .await?
            .ok_or(DomainError::NotFound)
    }
}

pub struct ListDonationsHandler {
    store: Arc<Datastore>,
}

impl ListDonationsHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<ListDonations> for ListDonationsHandler {
    async fn handle(&self, request: ListDonations) -> Result<Page<Donation>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let order = SortKey::by(|d: &Donation| d.donated_at);
        let page = uow
            .repo::<Donation>()
            .get_paged(request.page_number, request.page_size, Some(order), false)
            .await?;
        Ok(page)
    }
}

pub struct DonationsByDonorHandler {
    store: Arc<Datastore>,
}

impl DonationsByDonorHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<DonationsByDonor> for DonationsByDonorHandler {
    async fn handle(&self, request: DonationsByDonor) -> Result<Vec<Donation>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let donations = uow
            .repo::<Donation>()
            .query(&filters::by_donor(request.donor_id))
            .await?;
        Ok(donations)
    }
}

pub struct DonationsInRangeHandler {
    store: Arc<Datastore>,
}

impl DonationsInRangeHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<DonationsInRange> for DonationsInRangeHandler {
    async fn handle(&self, request: DonationsInRange) -> Result<Vec<Donation>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let donations = uow
            .repo::<Donation>()
            .query(&filters::in_date_range(request.from, request.to))
            .await?;
        Ok(donations)
    }
}

pub struct DonationsByKindHandler {
    store: Arc<Datastore>,
}

impl DonationsByKindHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<DonationsByKind> for DonationsByKindHandler {
    async fn handle(&self, request: DonationsByKind) -> Result<Vec<Donation>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let donations = uow
            .repo::<Donation>()
            .query(&filters::of_kind(request.kind))
            .await?;
        Ok(donations)
    }
}

pub struct DonationsInAmountRangeHandler {
    store: Arc<Datastore>,
}

impl DonationsInAmountRangeHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<DonationsInAmountRange> for DonationsInAmountRangeHandler {
    async fn handle(&self, request: DonationsInAmountRange) -> Result<Vec<Donation>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let donations = uow
            .repo::<Donation>()
            .query(&filters::amount_between(request.min_minor, request.max_minor))
            .await?;
        Ok(donations)
    }
}
