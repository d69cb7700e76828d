//! Accounting vouchers: one money movement each.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use givebook_core::{DomainEventRecord, Money, RecordId, RecordMeta, StoredRecord};
use givebook_store::{HasRelations, RelationView, StoreError, StoreResult};

use crate::account::LedgerAccount;

pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoucherKind {
    Income,
    Expense,
}

/// One booked movement of money, categorized by a ledger account and settled
/// against a cash account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub meta: RecordMeta,
    pub voucher_no: String,
    pub description: String,
    pub amount: Money,
    pub entry_date: DateTime<Utc>,
    pub kind: VoucherKind,
    pub account_id: RecordId,
    pub cash_account_id: RecordId,
    #[serde(skip)]
    pub account: Option<LedgerAccount>,
}

impl Voucher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        voucher_no: impl Into<String>,
        description: impl Into<String>,
        amount: Money,
        entry_date: DateTime<Utc>,
        kind: VoucherKind,
        account_id: RecordId,
        cash_account_id: RecordId,
    ) -> Self {
        let voucher_no = voucher_no.into();
        let mut meta = RecordMeta::new();
        meta.record_event(DomainEventRecord::new(
            "voucher.posted",
            entry_date,
            serde_json::json!({
                "voucher_no": voucher_no,
                "amount_minor": amount.amount(),
                "currency": amount.currency(),
            }),
        ));
        Self {
            meta,
            voucher_no,
            description: description.into(),
            amount,
            entry_date,
            kind,
            account_id,
            cash_account_id,
            account: None,
        }
    }
}

impl StoredRecord for Voucher {
    const RECORD_TYPE: &'static str = "voucher";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for Voucher {
    fn relations() -> &'static [&'static str] {
        &["account"]
    }

    fn attach_relation(&mut self, relation: &str, view: &RelationView<'_>) -> StoreResult<()> {
        match relation {
            "account" => {
                self.account = view.get(self.account_id);
                Ok(())
            }
            other => Err(StoreError::UnknownRelation {
                record: Self::RECORD_TYPE,
                relation: other.to_string(),
            }),
        }
    }
}
