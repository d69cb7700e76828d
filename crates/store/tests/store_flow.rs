//! End-to-end store behavior through the public surface: unit of work,
//! repositories, specifications and transactions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use givebook_core::{RecordId, RecordMeta, StoredRecord};
use givebook_store::{
    Datastore, HasRelations, RelationView, SortKey, Specification, StoreError, StoreResult,
    TxnState, UnitOfWork,
};

#[derive(Debug, Clone, PartialEq)]
struct Contact {
    meta: RecordMeta,
    name: String,
}

impl Contact {
    fn new(name: &str) -> Self {
        Self {
            meta: RecordMeta::new(),
            name: name.to_string(),
        }
    }
}

impl StoredRecord for Contact {
    const RECORD_TYPE: &'static str = "contact";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for Contact {}

#[derive(Debug, Clone, PartialEq)]
struct Pledge {
    meta: RecordMeta,
    contact_id: RecordId,
    amount: i64,
    pledged_at: DateTime<Utc>,
    contact: Option<Contact>,
}

impl Pledge {
    fn new(contact_id: RecordId, amount: i64) -> Self {
        Self {
            meta: RecordMeta::new(),
            contact_id,
            amount,
            pledged_at: Utc::now(),
            contact: None,
        }
    }
}

impl StoredRecord for Pledge {
    const RECORD_TYPE: &'static str = "pledge";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for Pledge {
    fn relations() -> &'static [&'static str] {
        &["contact"]
    }

    fn attach_relation(&mut self, relation: &str, view: &RelationView<'_>) -> StoreResult<()> {
        match relation {
            "contact" => {
                self.contact = view.get(self.contact_id);
                Ok(())
            }
            other => Err(StoreError::UnknownRelation {
                record: Self::RECORD_TYPE,
                relation: other.to_string(),
            }),
        }
    }
}

#[tokio::test]
async fn staged_add_is_invisible_until_save() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(Arc::clone(&store));
    let repo = uow.repo::<Contact>();

    let contact = repo.add(Contact::new("Ada")).await.unwrap();
    assert!(!repo.exists(contact.id()).await.unwrap());

    let other = UnitOfWork::new(Arc::clone(&store));
    assert!(!other.repo::<Contact>().exists(contact.id()).await.unwrap());

    let affected = uow.save_changes().await.unwrap();
    assert_eq!(affected, 1);

    let loaded = other.repo::<Contact>().get_by_id(contact.id()).await.unwrap();
    assert_eq!(loaded.map(|c| c.name), Some("Ada".to_string()));
}

#[tokio::test]
async fn failed_batch_applies_nothing() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(Arc::clone(&store));
    let repo = uow.repo::<Contact>();

    let first = repo.add(Contact::new("Ada")).await.unwrap();
    // Same id staged twice; the batch must fail as a whole.
    repo.add(first.clone()).await.unwrap();

    let err = uow.save_changes().await.unwrap_err();
    match err {
        StoreError::DuplicateId { record, .. } => assert_eq!(record, "contact"),
        other => panic!("expected DuplicateId, got {other:?}"),
    }

    // The first add did not land either, and the batch was discarded.
    assert!(!repo.exists(first.id()).await.unwrap());
    assert_eq!(uow.pending_changes().unwrap(), 0);
}

#[tokio::test]
async fn save_with_nothing_staged_affects_zero() {
    let uow = UnitOfWork::new(Arc::new(Datastore::new()));
    assert_eq!(uow.save_changes().await.unwrap(), 0);
}

#[tokio::test]
async fn sequential_updates_coalesce_into_one_commit() {
    let store = Arc::new(Datastore::new());
    let setup = UnitOfWork::new(Arc::clone(&store));
    let contact = setup.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    setup.save_changes().await.unwrap();

    let uow = UnitOfWork::new(Arc::clone(&store));
    let repo = uow.repo::<Contact>();

    let mut loaded = repo.get_by_id(contact.id()).await.unwrap().unwrap();
    loaded.name = "Ada L.".to_string();
    repo.update(loaded.clone()).await.unwrap();
    loaded.name = "Ada Lovelace".to_string();
    repo.update(loaded).await.unwrap();

    assert_eq!(uow.pending_changes().unwrap(), 1);
    assert_eq!(uow.save_changes().await.unwrap(), 1);

    let final_state = repo.get_by_id(contact.id()).await.unwrap().unwrap();
    assert_eq!(final_state.name, "Ada Lovelace");
    assert!(final_state.meta().updated_at().is_some());
}

#[tokio::test]
async fn update_of_unknown_record_fails_on_save() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(store);
    let repo = uow.repo::<Contact>();

    repo.update(Contact::new("Ghost")).await.unwrap();
    let err = uow.save_changes().await.unwrap_err();
    match err {
        StoreError::NotFound { record, .. } => assert_eq!(record, "contact"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn soft_deleted_records_vanish_from_default_reads() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(Arc::clone(&store));
    let repo = uow.repo::<Contact>();

    let contact = repo.add(Contact::new("Ada")).await.unwrap();
    uow.save_changes().await.unwrap();

    repo.delete(contact.id()).await.unwrap();
    uow.save_changes().await.unwrap();

    assert!(repo.get_by_id(contact.id()).await.unwrap().is_none());
    assert!(!repo.exists(contact.id()).await.unwrap());
    assert_eq!(repo.query(&Specification::new()).await.unwrap().len(), 0);

    // Still physically present for the explicit opt-outs.
    let raw = repo
        .get_by_id_including_deleted(contact.id())
        .await
        .unwrap()
        .unwrap();
    assert!(raw.meta().is_deleted());
    assert!(!raw.meta().is_active());

    let all = repo
        .query(&Specification::new().including_deleted())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn delete_of_missing_or_deleted_record_is_not_found() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(store);
    let repo = uow.repo::<Contact>();

    let err = repo.delete(RecordId::new()).await.unwrap_err();
    match err {
        StoreError::NotFound { .. } => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    let contact = repo.add(Contact::new("Ada")).await.unwrap();
    uow.save_changes().await.unwrap();
    repo.delete(contact.id()).await.unwrap();
    uow.save_changes().await.unwrap();

    let err = repo.delete(contact.id()).await.unwrap_err();
    match err {
        StoreError::NotFound { .. } => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn paged_reads_count_before_slicing() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(Arc::clone(&store));
    let repo = uow.repo::<Pledge>();

    let contact_id = RecordId::new();
    let pledges: Vec<Pledge> = (1..=7).map(|n| Pledge::new(contact_id, n * 100)).collect();
    repo.add_range(pledges).await.unwrap();
    uow.save_changes().await.unwrap();

    let order = SortKey::by(|p: &Pledge| p.amount);
    let page = repo.get_paged(1, 3, Some(order.clone()), true).await.unwrap();
    assert_eq!(page.total_count, 7);
    assert_eq!(
        page.items.iter().map(|p| p.amount).collect::<Vec<_>>(),
        vec![100, 200, 300]
    );

    let page = repo.get_paged(3, 3, Some(order.clone()), true).await.unwrap();
    assert_eq!(page.total_count, 7);
    assert_eq!(page.items.iter().map(|p| p.amount).collect::<Vec<_>>(), vec![700]);

    // Past the end: empty page, same total.
    let page = repo.get_paged(4, 3, Some(order.clone()), true).await.unwrap();
    assert_eq!(page.total_count, 7);
    assert!(page.items.is_empty());

    // Descending flips the first page.
    let page = repo.get_paged(1, 2, Some(order), false).await.unwrap();
    assert_eq!(page.items.iter().map(|p| p.amount).collect::<Vec<_>>(), vec![700, 600]);
}

#[tokio::test]
async fn huge_page_number_is_an_empty_page() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(store);
    let repo = uow.repo::<Contact>();

    repo.add_range(vec![Contact::new("Ada"), Contact::new("Grace")])
        .await
        .unwrap();
    uow.save_changes().await.unwrap();

    let page = repo.get_paged(u64::MAX, 10, None, true).await.unwrap();
    assert_eq!(page.total_count, 2);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn page_bounds_start_at_one() {
    let uow = UnitOfWork::new(Arc::new(Datastore::new()));
    let repo = uow.repo::<Contact>();

    for (number, size) in [(0, 10), (1, 0)] {
        let err = repo.get_paged(number, size, None, true).await.unwrap_err();
        match err {
            StoreError::InvalidArgument(_) => {}
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn includes_attach_named_relations_only() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(Arc::clone(&store));

    let contact = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    let pledge = uow
        .repo::<Pledge>()
        .add(Pledge::new(contact.id(), 500))
        .await
        .unwrap();
    uow.save_changes().await.unwrap();

    let repo = uow.repo::<Pledge>();

    // Without the include the navigation value stays empty.
    let bare = repo.get_by_id(pledge.id()).await.unwrap().unwrap();
    assert!(bare.contact.is_none());

    let full = repo
        .get_by_id_with(pledge.id(), &["contact"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(full.contact.as_ref().map(|c| c.name.as_str()), Some("Ada"));

    let err = repo
        .get_by_id_with(pledge.id(), &["owner"])
        .await
        .unwrap_err();
    match err {
        StoreError::UnknownRelation { record, relation } => {
            assert_eq!(record, "pledge");
            assert_eq!(relation, "owner");
        }
        other => panic!("expected UnknownRelation, got {other:?}"),
    }
}

#[tokio::test]
async fn include_of_deleted_relation_stays_empty() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(Arc::clone(&store));

    let contact = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    let pledge = uow
        .repo::<Pledge>()
        .add(Pledge::new(contact.id(), 500))
        .await
        .unwrap();
    uow.save_changes().await.unwrap();

    uow.repo::<Contact>().delete(contact.id()).await.unwrap();
    uow.save_changes().await.unwrap();

    let loaded = uow
        .repo::<Pledge>()
        .get_by_id_with(pledge.id(), &["contact"])
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.contact.is_none());
}

#[tokio::test]
async fn cross_repo_save_is_one_atomic_batch() {
    let store = Arc::new(Datastore::new());

    let uow = UnitOfWork::new(Arc::clone(&store));
    let contact = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    // A pledge for a contact that already carries a duplicate id poisons the
    // batch; neither record may land.
    uow.repo::<Pledge>()
        .add(Pledge::new(contact.id(), 500))
        .await
        .unwrap();
    uow.repo::<Contact>().add(contact.clone()).await.unwrap();

    uow.save_changes().await.unwrap_err();

    let check = UnitOfWork::new(store);
    assert!(!check.repo::<Contact>().exists(contact.id()).await.unwrap());
    assert_eq!(
        check.repo::<Pledge>().query(&Specification::new()).await.unwrap().len(),
        0
    );
}

#[tokio::test]
async fn transaction_isolates_until_commit() {
    let store = Arc::new(Datastore::new());

    let uow = UnitOfWork::new(Arc::clone(&store));
    uow.begin_transaction().await.unwrap();
    assert_eq!(uow.txn_state(), TxnState::InTransaction);

    let contact = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    uow.save_changes().await.unwrap();

    // Saved inside the transaction: visible here, invisible elsewhere.
    assert!(uow.repo::<Contact>().exists(contact.id()).await.unwrap());
    let outsider = UnitOfWork::new(Arc::clone(&store));
    assert!(!outsider.repo::<Contact>().exists(contact.id()).await.unwrap());

    uow.commit_transaction().await.unwrap();
    assert_eq!(uow.txn_state(), TxnState::Committed);
    assert!(outsider.repo::<Contact>().exists(contact.id()).await.unwrap());
}

#[tokio::test]
async fn rollback_discards_saved_and_staged_work() {
    let store = Arc::new(Datastore::new());

    let uow = UnitOfWork::new(Arc::clone(&store));
    uow.begin_transaction().await.unwrap();

    let saved = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    uow.save_changes().await.unwrap();
    let staged = uow.repo::<Contact>().add(Contact::new("Grace")).await.unwrap();

    uow.rollback_transaction().await.unwrap();
    assert_eq!(uow.txn_state(), TxnState::RolledBack);
    assert_eq!(uow.pending_changes().unwrap(), 0);

    let check = UnitOfWork::new(store);
    assert!(!check.repo::<Contact>().exists(saved.id()).await.unwrap());
    assert!(!check.repo::<Contact>().exists(staged.id()).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_saves_all_land() {
    let store = Arc::new(Datastore::new());

    let mut handles = Vec::new();
    for n in 0..64 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let uow = UnitOfWork::new(store);
            uow.repo::<Contact>()
                .add(Contact::new(&format!("contact-{n}")))
                .await
                .unwrap();
            uow.save_changes().await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Every commit survives; none is overwritten by a racing one.
    let check = UnitOfWork::new(store);
    let all = check.repo::<Contact>().query(&Specification::new()).await.unwrap();
    assert_eq!(all.len(), 64);
}

#[tokio::test]
async fn transaction_commit_keeps_concurrent_saves() {
    let store = Arc::new(Datastore::new());

    let uow = UnitOfWork::new(Arc::clone(&store));
    uow.begin_transaction().await.unwrap();
    let inside = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    uow.save_changes().await.unwrap();

    // Another request commits while the transaction is still open.
    let outsider = UnitOfWork::new(Arc::clone(&store));
    let outside = outsider.repo::<Contact>().add(Contact::new("Grace")).await.unwrap();
    outsider.save_changes().await.unwrap();

    uow.commit_transaction().await.unwrap();

    let check = UnitOfWork::new(store);
    assert!(check.repo::<Contact>().exists(inside.id()).await.unwrap());
    assert!(check.repo::<Contact>().exists(outside.id()).await.unwrap());
}

#[tokio::test]
async fn conflicting_transaction_commit_fails_and_rolls_back() {
    let store = Arc::new(Datastore::new());

    let uow = UnitOfWork::new(Arc::clone(&store));
    uow.begin_transaction().await.unwrap();
    let contact = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
    uow.save_changes().await.unwrap();

    // The same id lands through another request before the commit.
    let rival = UnitOfWork::new(Arc::clone(&store));
    rival.repo::<Contact>().add(contact.clone()).await.unwrap();
    rival.save_changes().await.unwrap();

    let err = uow.commit_transaction().await.unwrap_err();
    match err {
        StoreError::DuplicateId { record, .. } => assert_eq!(record, "contact"),
        other => panic!("expected DuplicateId, got {other:?}"),
    }
    assert_eq!(uow.txn_state(), TxnState::RolledBack);

    // The rival's record is intact.
    let check = UnitOfWork::new(store);
    let all = check.repo::<Contact>().query(&Specification::new()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn dropping_an_open_transaction_rolls_back() {
    let store = Arc::new(Datastore::new());

    let id = {
        let uow = UnitOfWork::new(Arc::clone(&store));
        uow.begin_transaction().await.unwrap();
        let contact = uow.repo::<Contact>().add(Contact::new("Ada")).await.unwrap();
        uow.save_changes().await.unwrap();
        contact.id()
    };

    let check = UnitOfWork::new(store);
    assert!(!check.repo::<Contact>().exists(id).await.unwrap());
}

#[tokio::test]
async fn transaction_state_machine_rejects_misuse() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(store);

    // Commit and rollback require an open transaction.
    for err in [
        uow.commit_transaction().await.unwrap_err(),
        uow.rollback_transaction().await.unwrap_err(),
    ] {
        match err {
            StoreError::InvalidState(_) => {}
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    uow.begin_transaction().await.unwrap();
    match uow.begin_transaction().await.unwrap_err() {
        StoreError::InvalidState(_) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }

    uow.commit_transaction().await.unwrap();

    // Terminal states stay terminal.
    for err in [
        uow.commit_transaction().await.unwrap_err(),
        uow.begin_transaction().await.unwrap_err(),
    ] {
        match err {
            StoreError::InvalidState(_) => {}
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn find_filters_without_ordering_guarantees() {
    let store = Arc::new(Datastore::new());
    let uow = UnitOfWork::new(store);
    let repo = uow.repo::<Pledge>();

    let contact_id = RecordId::new();
    repo.add_range(vec![
        Pledge::new(contact_id, 100),
        Pledge::new(contact_id, 900),
        Pledge::new(RecordId::new(), 900),
    ])
    .await
    .unwrap();
    uow.save_changes().await.unwrap();

    let big = repo.find(|p| p.amount >= 900, &[]).await.unwrap();
    assert_eq!(big.len(), 2);

    let of_contact = repo
        .find(move |p| p.contact_id == contact_id, &[])
        .await
        .unwrap();
    assert_eq!(of_contact.len(), 2);
}

#[tokio::test]
async fn add_range_rejects_empty_batches() {
    let uow = UnitOfWork::new(Arc::new(Datastore::new()));
    let err = uow.repo::<Contact>().add_range(vec![]).await.unwrap_err();
    match err {
        StoreError::InvalidArgument(_) => {}
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}
