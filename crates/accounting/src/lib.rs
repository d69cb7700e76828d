//! `givebook-accounting` — chart of accounts, cash accounts and vouchers.

pub mod account;
pub mod commands;
pub mod queries;
pub mod voucher;

pub use account::{CashAccount, CashAccountKind, LedgerAccount};
pub use commands::{CreateCashAccount, CreateLedgerAccount, PostVoucher};
pub use queries::{GetCashAccount, GetVoucherDetail, ListVouchers};
pub use voucher::{Voucher, VoucherKind};

use std::sync::Arc;

use givebook_pipeline::DispatcherBuilder;
use givebook_store::Datastore;

/// Wire every accounting request into the dispatcher.
pub fn register(builder: DispatcherBuilder, store: &Arc<Datastore>) -> DispatcherBuilder {
    builder
        .handle(commands::CreateLedgerAccountHandler::new(Arc::clone(store)))
        .validate(commands::CreateLedgerAccountRules)
        .handle(commands::CreateCashAccountHandler::new(Arc::clone(store)))
        .validate(commands::CreateCashAccountRules)
        .handle(commands::PostVoucherHandler::new(Arc::clone(store)))
        .validate(commands::PostVoucherRules)
        .handle(queries::GetVoucherDetailHandler::new(Arc::clone(store)))
        .handle(queries::ListVouchersHandler::new(Arc::clone(store)))
        .validate(queries::ListVouchersRules)
        .handle(queries::GetCashAccountHandler::new(Arc::clone(store)))
}
