//! Ledger and cash accounts.

use serde::{Deserialize, Serialize};

use givebook_core::{DomainError, DomainResult, Money, RecordMeta, StoredRecord};
use givebook_store::HasRelations;

/// A chart-of-accounts entry used to categorize vouchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub meta: RecordMeta,
    pub code: String,
    pub description: String,
}

impl LedgerAccount {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> DomainResult<Self> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err(DomainError::validation("code is required"));
        }
        Ok(Self {
            meta: RecordMeta::new(),
            code,
            description: description.into(),
        })
    }
}

impl StoredRecord for LedgerAccount {
    const RECORD_TYPE: &'static str = "ledger_account";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for LedgerAccount {}

/// Where money physically sits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashAccountKind {
    Cash,
    Bank,
}

/// A till or bank account with a running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashAccount {
    pub meta: RecordMeta,
    pub name: String,
    pub kind: CashAccountKind,
    pub balance: Money,
}

impl CashAccount {
    pub fn new(
        name: impl Into<String>,
        kind: CashAccountKind,
        opening_balance: Money,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok(Self {
            meta: RecordMeta::new(),
            name,
            kind,
            balance: opening_balance,
        })
    }

    pub fn deposit(&mut self, amount: &Money) -> DomainResult<()> {
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }

    /// Take money out. Overdrafts are a conflict, not a validation error: the
    /// input was well-formed, the account state forbids it.
    pub fn withdraw(&mut self, amount: &Money) -> DomainResult<()> {
        if amount.currency() == self.balance.currency() && amount.amount() > self.balance.amount()
        {
            return Err(DomainError::conflict(format!(
                "insufficient funds in {}: balance {}, requested {}",
                self.name, self.balance, amount
            )));
        }
        self.balance = self.balance.checked_sub(amount)?;
        Ok(())
    }
}

impl StoredRecord for CashAccount {
    const RECORD_TYPE: &'static str = "cash_account";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for CashAccount {}
