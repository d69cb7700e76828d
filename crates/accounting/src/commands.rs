//! Accounting commands. `PostVoucher` is the interesting one: the voucher and
//! the cash-account balance move in a single atomic save.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use givebook_core::{DomainError, Money, RecordId, StoredRecord};
use givebook_pipeline::rules;
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_store::{Datastore, UnitOfWork};

use crate::account::{CashAccount, CashAccountKind, LedgerAccount};
use crate::voucher::{Voucher, VoucherKind, MAX_DESCRIPTION_LEN};

#[derive(Debug, Clone)]
pub struct CreateLedgerAccount {
    pub code: String,
    pub description: String,
}

impl Request for CreateLedgerAccount {
    type Output = LedgerAccount;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "create_ledger_account";
}

#[derive(Debug, Clone)]
pub struct CreateCashAccount {
    pub name: String,
    pub kind: CashAccountKind,
    pub opening_balance_minor: i64,
}

impl Request for CreateCashAccount {
    type Output = CashAccount;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "create_cash_account";
}

/// Book a money movement: insert the voucher and adjust the cash balance,
/// both or neither.
#[derive(Debug, Clone)]
pub struct PostVoucher {
    pub voucher_no: String,
    pub description: String,
    pub amount_minor: i64,
    pub entry_date: DateTime<Utc>,
    pub kind: VoucherKind,
    pub account_id: RecordId,
    pub cash_account_id: RecordId,
}

impl Request for PostVoucher {
    type Output = Voucher;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "post_voucher";
}

pub struct CreateLedgerAccountRules;

#[async_trait]
impl Validator<CreateLedgerAccount> for CreateLedgerAccountRules {
    async fn validate(&self, request: &CreateLedgerAccount) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(rules::required("code", &request.code));
        errors.extend(rules::max_len(
            "description",
            &request.description,
            MAX_DESCRIPTION_LEN,
        ));
        errors
    }
}

pub struct CreateCashAccountRules;

#[async_trait]
impl Validator<CreateCashAccount> for CreateCashAccountRules {
    async fn validate(&self, request: &CreateCashAccount) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(rules::required("name", &request.name));
        if request.opening_balance_minor < 0 {
            errors.push(FieldError::new(
                "opening_balance",
                "opening_balance must not be negative",
            ));
        }
        errors
    }
}

pub struct PostVoucherRules;

#[async_trait]
impl Validator<PostVoucher> for PostVoucherRules {
    async fn validate(&self, request: &PostVoucher) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(rules::required("voucher_no", &request.voucher_no));
        errors.extend(rules::required("description", &request.description));
        errors.extend(rules::max_len(
            "description",
            &request.description,
            MAX_DESCRIPTION_LEN,
        ));
        errors.extend(rules::positive("amount", request.amount_minor));
        errors.extend(rules::not_future("entry_date", request.entry_date, Utc::now()));
        errors
    }
}

pub struct CreateLedgerAccountHandler {
    store: Arc<Datastore>,
}

impl CreateLedgerAccountHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<CreateLedgerAccount> for CreateLedgerAccountHandler {
    async fn handle(&self, request: CreateLedgerAccount) -> Result<LedgerAccount, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let repo = uow.repo::<LedgerAccount>();

        let code = request.code.trim().to_string();
        let same_code = {
            let code = code.clone();
            repo.find(move |a: &LedgerAccount| a.code == code, &[]).await?
        };
        if !same_code.is_empty() {
            return Err(DomainError::conflict(format!(
                "ledger account code {code} already exists"
            )));
        }

        let account = repo
            .add(LedgerAccount::new(code, request.description)?)
            .await?;
        uow.save_changes().await?;
        Ok(account)
    }
}

pub struct CreateCashAccountHandler {
    store: Arc<Datastore>,
}

impl CreateCashAccountHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<CreateCashAccount> for CreateCashAccountHandler {
    async fn handle(&self, request: CreateCashAccount) -> Result<CashAccount, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let account = CashAccount::new(
            request.name,
            request.kind,
            Money::from_minor(request.opening_balance_minor)?,
        )?;
        let account = uow.repo::<CashAccount>().add(account).await?;
        uow.save_changes().await?;
        Ok(account)
    }
}

pub struct PostVoucherHandler {
    store: Arc<Datastore>,
}

impl PostVoucherHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<PostVoucher> for PostVoucherHandler {
    async fn handle(&self, request: PostVoucher) -> Result<Voucher, DomainError> {
        let amount = Money::from_minor(request.amount_minor)?;

        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let vouchers = uow.repo::<Voucher>();
        let cash_accounts = uow.repo::<CashAccount>();

        if !uow
            .repo::<LedgerAccount>()
            .exists(request.account_id)
            .await?
        {
            return Err(DomainError::NotFound);
        }

        let voucher_no = request.voucher_no.trim().to_string();
        let duplicate = {
            let voucher_no = voucher_no.clone();
            vouchers
                .find(move |v: &Voucher| v.voucher_no == voucher_no, &[])
                .await?
        };
        if !duplicate.is_empty() {
            return Err(DomainError::conflict(format!(
                "voucher {voucher_no} already posted"
            )));
        }

        let mut cash = cash_accounts
            .get_by_id(request.cash_account_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        match request.kind {
            VoucherKind::Income => cash.deposit(&amount)?,
            VoucherKind::Expense => cash.withdraw(&amount)?,
        }

        let voucher = vouchers
            .add(Voucher::new(
                voucher_no,
                request.description,
                amount,
                request.entry_date,
                request.kind,
                request.account_id,
                request.cash_account_id,
            ))
            .await?;
        cash_accounts.update(cash).await?;

        // Voucher insert and balance change land together or not at all.
        uow.save_changes().await?;

        tracing::debug!(
            voucher = %voucher.id(),
            no = %voucher.voucher_no,
            kind = ?voucher.kind,
            amount = voucher.amount.amount(),
            "voucher posted"
        );
        Ok(voucher)
    }
}
