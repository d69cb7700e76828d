//! User account flow through the dispatcher.

use std::sync::Arc;

use givebook_core::{DomainError, DomainResult, StoredRecord};
use givebook_pipeline::{Dispatcher, RequestError};
use givebook_store::Datastore;
use givebook_users::{
    ChangePassword, DeleteUser, GetUser, InMemoryResetTokenStore, ListUsers, PasswordHasher,
    RegisterUser, RequestPasswordReset, ResetPassword, Role, UpdateUser, User,
};

/// Reversible stand-in so assertions can see through the "hash".
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> DomainResult<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> DomainResult<bool> {
        Ok(hash == format!("plain:{password}"))
    }
}

fn setup() -> Dispatcher {
    let store = Arc::new(Datastore::new());
    givebook_users::register(
        Dispatcher::builder(),
        &store,
        Arc::new(PlainHasher),
        Arc::new(InMemoryResetTokenStore::new()),
    )
    .build()
    .unwrap()
}

fn registration(email: &str) -> RegisterUser {
    RegisterUser {
        first_name: "Deniz".to_string(),
        last_name: "Kaya".to_string(),
        email: email.to_string(),
        password: "correct horse".to_string(),
        role: Role::Staff,
    }
}

async fn register(dispatcher: &Dispatcher, email: &str) -> User {
    dispatcher.dispatch(registration(email)).await.unwrap()
}

#[tokio::test]
async fn register_hashes_and_normalizes() {
    let dispatcher = setup();
    let user = register(&dispatcher, "Deniz@Example.com").await;

    assert_eq!(user.email.as_str(), "deniz@example.com");
    assert_eq!(user.password_hash, "plain:correct horse");
    assert_eq!(user.full_name(), "Deniz Kaya");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let dispatcher = setup();
    register(&dispatcher, "deniz@example.com").await;

    // Same address, different case.
    let err = dispatcher
        .dispatch(registration("DENIZ@example.com"))
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn weak_registration_collects_field_errors() {
    let dispatcher = setup();
    let err = dispatcher
        .dispatch(RegisterUser {
            first_name: String::new(),
            last_name: "Kaya".to_string(),
            email: "not-an-address".to_string(),
            password: "short".to_string(),
            role: Role::Staff,
        })
        .await
        .unwrap_err();

    let errors = err.field_errors().expect("validation error");
    assert_eq!(
        errors.fields().collect::<Vec<_>>(),
        vec!["email", "first_name", "password"]
    );
}

#[tokio::test]
async fn update_changes_names_and_role() {
    let dispatcher = setup();
    let user = register(&dispatcher, "deniz@example.com").await;

    let updated = dispatcher
        .dispatch(UpdateUser {
            id: user.id(),
            first_name: "Deniz".to_string(),
            last_name: "Kaya Aydın".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.full_name(), "Deniz Kaya Aydın");
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let dispatcher = setup();
    let user = register(&dispatcher, "deniz@example.com").await;

    let err = dispatcher
        .dispatch(ChangePassword {
            id: user.id(),
            current_password: "wrong guess".to_string(),
            new_password: "even better pass".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::Validation(_)) => {}
        other => panic!("expected Validation, got {other:?}"),
    }

    dispatcher
        .dispatch(ChangePassword {
            id: user.id(),
            current_password: "correct horse".to_string(),
            new_password: "even better pass".to_string(),
        })
        .await
        .unwrap();

    let fetched = dispatcher.dispatch(GetUser { id: user.id() }).await.unwrap();
    assert_eq!(fetched.password_hash, "plain:even better pass");
}

#[tokio::test]
async fn reset_token_round_trip() {
    let dispatcher = setup();
    let user = register(&dispatcher, "deniz@example.com").await;

    let token = dispatcher
        .dispatch(RequestPasswordReset {
            email: "deniz@example.com".to_string(),
        })
        .await
        .unwrap();

    dispatcher
        .dispatch(ResetPassword {
            token: token.clone(),
            new_password: "brand new pass".to_string(),
        })
        .await
        .unwrap();

    let fetched = dispatcher.dispatch(GetUser { id: user.id() }).await.unwrap();
    assert_eq!(fetched.password_hash, "plain:brand new pass");

    // Tokens are single use.
    let err = dispatcher
        .dispatch(ResetPassword {
            token,
            new_password: "another new pass".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::InvalidArgument(_)) => {}
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}

#[tokio::test]
async fn reset_for_unknown_email_is_not_found() {
    let dispatcher = setup();
    let err = dispatcher
        .dispatch(RequestPasswordReset {
            email: "nobody@example.com".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        RequestError::Domain(DomainError::NotFound) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn deleted_users_disappear_from_listing() {
    let dispatcher = setup();
    let a = register(&dispatcher, "a@example.com").await;
    register(&dispatcher, "b@example.com").await;

    dispatcher.dispatch(DeleteUser { id: a.id() }).await.unwrap();

    let page = dispatcher
        .dispatch(ListUsers {
            page_number: 1,
            page_size: 10,
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].email.as_str(), "b@example.com");
}
