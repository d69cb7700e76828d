//! User commands: registration, profile changes, credentials.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use givebook_core::{DomainError, Email, RecordId, StoredRecord};
use givebook_pipeline::rules;
use givebook_pipeline::{FieldError, Handler, Request, RequestKind, Validator};
use givebook_store::{Datastore, UnitOfWork};

use crate::ports::{PasswordHasher, ResetTokenStore};
use crate::user::{Role, User, MAX_NAME_LEN, MIN_PASSWORD_LEN};

#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl Request for RegisterUser {
    type Output = User;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "register_user";
}

#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl Request for UpdateUser {
    type Output = User;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "update_user";
}

#[derive(Debug, Clone)]
pub struct DeleteUser {
    pub id: RecordId,
}

impl Request for DeleteUser {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "delete_user";
}

#[derive(Debug, Clone)]
pub struct ChangePassword {
    pub id: RecordId,
    pub current_password: String,
    pub new_password: String,
}

impl Request for ChangePassword {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "change_password";
}

/// Mint a reset token for the account behind `email`.
#[derive(Debug, Clone)]
pub struct RequestPasswordReset {
    pub email: String,
}

impl Request for RequestPasswordReset {
    type Output = String;
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "request_password_reset";
}

/// Redeem a reset token and set a new password.
#[derive(Debug, Clone)]
pub struct ResetPassword {
    pub token: String,
    pub new_password: String,
}

impl Request for ResetPassword {
    type Output = ();
    const KIND: RequestKind = RequestKind::Command;
    const NAME: &'static str = "reset_password";
}

fn name_errors(first_name: &str, last_name: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    errors.extend(rules::required("first_name", first_name));
    errors.extend(rules::max_len("first_name", first_name, MAX_NAME_LEN));
    errors.extend(rules::required("last_name", last_name));
    errors.extend(rules::max_len("last_name", last_name, MAX_NAME_LEN));
    errors
}

fn password_error(field: &str, password: &str) -> Option<FieldError> {
    rules::min_len(field, password, MIN_PASSWORD_LEN)
}

pub struct RegisterUserRules;

#[async_trait]
impl Validator<RegisterUser> for RegisterUserRules {
    async fn validate(&self, request: &RegisterUser) -> Vec<FieldError> {
        let mut errors = name_errors(&request.first_name, &request.last_name);
        if Email::new(&request.email).is_err() {
            errors.push(FieldError::new("email", "email is not a valid address"));
        }
        errors.extend(password_error("password", &request.password));
        errors
    }
}

pub struct UpdateUserRules;

#[async_trait]
impl Validator<UpdateUser> for UpdateUserRules {
    async fn validate(&self, request: &UpdateUser) -> Vec<FieldError> {
        name_errors(&request.first_name, &request.last_name)
    }
}

pub struct ChangePasswordRules;

#[async_trait]
impl Validator<ChangePassword> for ChangePasswordRules {
    async fn validate(&self, request: &ChangePassword) -> Vec<FieldError> {
        password_error("new_password", &request.new_password)
            .into_iter()
            .collect()
    }
}

pub struct ResetPasswordRules;

#[async_trait]
impl Validator<ResetPassword> for ResetPasswordRules {
    async fn validate(&self, request: &ResetPassword) -> Vec<FieldError> {
        let mut errors = Vec::new();
        errors.extend(rules::required("token", &request.token));
        errors.extend(password_error("new_password", &request.new_password));
        errors
    }
}

async fn find_by_email(uow: &UnitOfWork, email: &Email) -> Result<Option<User>, DomainError> {
    let email = email.clone();
    let mut matches = uow
        .repo::<User>()
        .find(move |u: &User| u.email == email, &[])
        .await?;
    Ok(matches.pop())
}

pub struct RegisterUserHandler {
    store: Arc<Datastore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl RegisterUserHandler {
    pub fn new(store: Arc<Datastore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }
}

#[async_trait]
impl Handler<RegisterUser> for RegisterUserHandler {
    async fn handle(&self, request: RegisterUser) -> Result<User, DomainError> {
        let email = Email::new(&request.email)?;

        let uow = UnitOfWork::new(Arc::clone(&self.store));
        if find_by_email(&uow, &email).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "a user with email {email} already exists"
            )));
        }

        let user = User::new(
            request.first_name,
            request.last_name,
            email,
            self.hasher.hash(&request.password)?,
            request.role,
        )?;
        let user = uow.repo::<User>().add(user).await?;
        uow.save_changes().await?;

        tracing::debug!(user = %user.id(), "user registered");
        Ok(user)
    }
}

pub struct UpdateUserHandler {
    store: Arc<Datastore>,
}

impl UpdateUserHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<UpdateUser> for UpdateUserHandler {
    async fn handle(&self, request: UpdateUser) -> Result<User, DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let repo = uow.repo::<User>();

        let mut user = repo
            .get_by_id(request.id)
            .await?
            .ok_or(DomainError::NotFound)?;
        user.set_names(request.first_name, request.last_name)?;
        user.role = request.role;

        repo.update(user.clone()).await?;
        uow.save_changes().await?;
        Ok(user)
    }
}

pub struct DeleteUserHandler {
    store: Arc<Datastore>,
}

impl DeleteUserHandler {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler<DeleteUser> for DeleteUserHandler {
    async fn handle(&self, request: DeleteUser) -> Result<(), DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.repo::<User>().delete(request.id).await?;
        uow.save_changes().await?;
        Ok(())
    }
}

pub struct ChangePasswordHandler {
    store: Arc<Datastore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl ChangePasswordHandler {
    pub fn new(store: Arc<Datastore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }
}

#[async_trait]
impl Handler<ChangePassword> for ChangePasswordHandler {
    async fn handle(&self, request: ChangePassword) -> Result<(), DomainError> {
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let repo = uow.repo::<User>();

        let mut user = repo
            .get_by_id(request.id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !self
            .hasher
            .verify(&request.current_password, &user.password_hash)?
        {
            return Err(DomainError::validation("current password does not match"));
        }

        user.password_hash = self.hasher.hash(&request.new_password)?;
        repo.update(user).await?;
        uow.save_changes().await?;

        tracing::debug!(user = %request.id, "password changed");
        Ok(())
    }
}

pub struct RequestPasswordResetHandler {
    store: Arc<Datastore>,
    tokens: Arc<dyn ResetTokenStore>,
}

impl RequestPasswordResetHandler {
    pub fn new(store: Arc<Datastore>, tokens: Arc<dyn ResetTokenStore>) -> Self {
        Self { store, tokens }
    }
}

#[async_trait]
impl Handler<RequestPasswordReset> for RequestPasswordResetHandler {
    async fn handle(&self, request: RequestPasswordReset) -> Result<String, DomainError> {
        let email = Email::new(&request.email)?;
        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let user = find_by_email(&uow, &email)
            .await?
            .ok_or(DomainError::NotFound)?;

        let token = self.tokens.issue(user.id(), Utc::now())?;
        tracing::debug!(user = %user.id(), "reset token issued");
        Ok(token)
    }
}

pub struct ResetPasswordHandler {
    store: Arc<Datastore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn ResetTokenStore>,
}

impl ResetPasswordHandler {
    pub fn new(
        store: Arc<Datastore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn ResetTokenStore>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }
}

#[async_trait]
impl Handler<ResetPassword> for ResetPasswordHandler {
    async fn handle(&self, request: ResetPassword) -> Result<(), DomainError> {
        let user_id = self
            .tokens
            .redeem(&request.token, Utc::now())?
            .ok_or_else(|| DomainError::invalid_argument("reset token is invalid or expired"))?;

        let uow = UnitOfWork::new(Arc::clone(&self.store));
        let repo = uow.repo::<User>();
        let mut user = repo.get_by_id(user_id).await?.ok_or(DomainError::NotFound)?;
        user.password_hash = self.hasher.hash(&request.new_password)?;
        repo.update(user).await?;
        uow.save_changes().await?;

        tracing::debug!(user = %user_id, "password reset");
        Ok(())
    }
}
