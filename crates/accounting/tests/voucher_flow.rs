//! Voucher posting through the dispatcher, including the atomicity of the
//! voucher/balance pair.

use std::sync::Arc;

use chrono::{Duration, Utc};
use givebook_accounting::{
    CashAccount, CashAccountKind, CreateCashAccount, CreateLedgerAccount, GetCashAccount,
    GetVoucherDetail, LedgerAccount, ListVouchers, PostVoucher, VoucherKind,
};
use givebook_core::{DomainError, StoredRecord};
use givebook_pipeline::{Dispatcher, RequestError};
use givebook_store::Datastore;

fn setup() -> Dispatcher {
    let store = Arc::new(Datastore::new());
    givebook_accounting::register(Dispatcher::builder(), &store)
        .build()
        .unwrap()
}

async fn seed(dispatcher: &Dispatcher, opening_minor: i64) -> (LedgerAccount, CashAccount) {
    let ledger = dispatcher
        .dispatch(CreateLedgerAccount {
            code: "600".to_string(),
            description: "donation income".to_string(),
        })
        .await
        .unwrap();
    let cash = dispatcher
        .dispatch(CreateCashAccount {
            name: "main till".to_string(),
            kind: CashAccountKind::Cash,
            opening_balance_minor: opening_minor,
        })
        .await
        .unwrap();
    (ledger, cash)
}

fn voucher(
    no: &str,
    kind: VoucherKind,
    minor: i64,
    ledger: &LedgerAccount,
    cash: &CashAccount,
) -> PostVoucher {
    PostVoucher {
        voucher_no: no.to_string(),
        description: "booked in test".to_string(),
        amount_minor: minor,
        entry_date: Utc::now() - Duration::hours(1),
        kind,
        account_id: ledger.id(),
        cash_account_id: cash.id(),
    }
}

#[tokio::test]
async fn income_raises_the_balance() {
    let dispatcher = setup();
    let (ledger, cash) = seed(&dispatcher, 1_000).await;

    let posted = dispatcher
        .dispatch(voucher("V-1", VoucherKind::Income, 500, &ledger, &cash))
        .await
        .unwrap();
    assert_eq!(posted.amount.amount(), 500);

    let cash = dispatcher
        .dispatch(GetCashAccount { id: cash.id() })
        .await
        .unwrap();
    assert_eq!(cash.balance.amount(), 1_500);
}

#[tokio::test]
async fn expense_lowers_the_balance() {
    let dispatcher = setup();
    let (ledger, cash) = seed(&dispatcher, 1_000).await;

    dispatcher
        .dispatch(voucher("V-1", VoucherKind::Expense, 400, &ledger, &cash))
        .await
        .unwrap();

    let cash = dispatcher
        .dispatch(GetCashAccount { id: cash.id() })
        .await
        .unwrap();
    assert_eq!(cash.balance.amount(), 600);
}

#[tokio::test]
async fn overdraft_posts_nothing_at_all() {
    let dispatcher = setup();
    let (ledger, cash) = seed(&dispatcher, 100).await;

    let err = dispatcher
        .dispatch(voucher("V-1", VoucherKind::Expense, 500, &ledger, &cash))
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }

    // Neither the voucher nor a balance change survived.
    let page = dispatcher
        .dispatch(ListVouchers {
            page_number: 1,
            page_size: 10,
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);

    let cash = dispatcher
        .dispatch(GetCashAccount { id: cash.id() })
        .await
        .unwrap();
    assert_eq!(cash.balance.amount(), 100);
}

#[tokio::test]
async fn voucher_numbers_are_unique() {
    let dispatcher = setup();
    let (ledger, cash) = seed(&dispatcher, 1_000).await;

    dispatcher
        .dispatch(voucher("V-1", VoucherKind::Income, 100, &ledger, &cash))
        .await
        .unwrap();
    let err = dispatcher
        .dispatch(voucher("V-1", VoucherKind::Income, 200, &ledger, &cash))
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn detail_attaches_the_ledger_account() {
    let dispatcher = setup();
    let (ledger, cash) = seed(&dispatcher, 1_000).await;

    let posted = dispatcher
        .dispatch(voucher("V-1", VoucherKind::Income, 100, &ledger, &cash))
        .await
        .unwrap();

    let detail = dispatcher
        .dispatch(GetVoucherDetail { id: posted.id() })
        .await
        .unwrap();
    assert_eq!(detail.account.as_ref().map(|a| a.code.as_str()), Some("600"));
}

#[tokio::test]
async fn posting_against_unknown_accounts_is_not_found() {
    let dispatcher = setup();
    let (ledger, cash) = seed(&dispatcher, 1_000).await;

    let ghost_ledger = LedgerAccount::new("999", "ghost").unwrap();
    let err = dispatcher
        .dispatch(voucher("V-1", VoucherKind::Income, 100, &ghost_ledger, &cash))
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::NotFound) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    let ghost_cash =
        CashAccount::new("ghost", CashAccountKind::Bank, givebook_core::Money::from_minor(0).unwrap())
            .unwrap();
    let err = dispatcher
        .dispatch(voucher("V-2", VoucherKind::Income, 100, &ledger, &ghost_cash))
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::NotFound) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_voucher_collects_field_errors() {
    let dispatcher = setup();
    let (ledger, cash) = seed(&dispatcher, 1_000).await;

    let err = dispatcher
        .dispatch(PostVoucher {
            voucher_no: "  ".to_string(),
            description: String::new(),
            amount_minor: 0,
            entry_date: Utc::now() + Duration::days(1),
            kind: VoucherKind::Income,
            account_id: ledger.id(),
            cash_account_id: cash.id(),
        })
        .await
        .unwrap_err();

    let errors = err.field_errors().expect("validation error");
    assert_eq!(
        errors.fields().collect::<Vec<_>>(),
        vec!["amount", "description", "entry_date", "voucher_no"]
    );
}
