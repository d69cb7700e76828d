//! Accounting queries.

use std::sync::Arc;

use async_trait::async_trait;

use givebook_core::{DomainError, RecordId};
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_store::{Datastore, Page, SortKey, UnitOfWork};

use crate::account::CashAccount;
use crate::voucher::Voucher;

/// One voucher with its ledger account attached.
#[derive(Debug, Clone)]
pub struct GetVoucherDetail {
    pub id: RecordId,
}

impl Request for GetVoucherDetail {
    type Output = Voucher;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "get_voucher_detail";
}

/// Vouchers newest first, one page at a time.
#[derive(Debug, Clone)]
pub struct ListVouchers {
    pub page_number: u64,
    pub page_size: u64,
}

impl Request for ListVouchers {
    type Output = Page<Voucher>;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "list_vouchers";
}

#[derive(Debug, Clone)]
pub struct GetCashAccount {
    pub id: RecordId,
}

impl Request for GetCashAccount {
    type Output = CashAccount;
    const KIND: RequestKind = RequestKind::Query;
    const NAME: &'static str = "get_cash_account";
}

pub struct ListVouchersRules;

#[async_trait]
impl Validator<ListVouchers> for ListVouchersRules {
    async fn validate(&self, request: &ListVouchers) -> Vec<FieldError> {
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

pub struct GetVoucherDetailHandler {
    store: Arc<Datastore>,
}

impl GetVoucherDetailHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<GetVoucherDetail> for GetVoucherDetailHandler {
    async fn handle(&self, request: GetVoucherDetail) -> Result<Voucher, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<Voucher>()
            .get_by_id_with(request.id, &["account"])
            .await?
            .ok_or(DomainError::NotFound)
    }
}

pub struct ListVouchersHandler {
    store: Arc<Datastore>,
}

impl ListVouchersHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<ListVouchers> for ListVouchersHandler {
    async fn handle(&self, request: ListVouchers) -> Result<Page<Voucher>, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let order = SortKey::by(|v: &Voucher| v.entry_date);
        let page = uow
            .repo::<Voucher>()
            .get_paged(request.page_number, request.page_size, Some(order), false)
            .await?;
        Ok(page)
    }
}

pub struct GetCashAccountHandler {
    store: Arc<Datastore>,
}

impl GetCashAccountHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<GetCashAccount> for GetCashAccountHandler {
    async fn handle(&self, request: GetCashAccount) -> Result<CashAccount, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<CashAccount>()
            .get_by_id(request.id)
            .await?
            .ok_or(DomainError::NotFound)
    }
}
