//! `givebook-users` — staff accounts, credentials and password reset.

pub mod commands;
pub mod ports;
pub mod queries;
pub mod user;

pub use commands::{
    ChangePassword, DeleteUser, RegisterUser, RequestPasswordReset, ResetPassword, UpdateUser,
};
pub use ports::{InMemoryResetTokenStore, PasswordHasher, ResetTokenStore};
pub use queries::{GetUser, ListUsers};
pub use user::{Role, User};

use std::sync::Arc;

use givebook_pipeline::DispatcherBuilder;
use givebook_store::Datastore;

/// Wire every user request into the dispatcher.
pub fn register(
    builder: DispatcherBuilder,
    store: &Arc<Datastore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn ResetTokenStore>,
) -> DispatcherBuilder {
    builder
        .handle(commands::RegisterUserHandler::new(
            Arc::clone(store),
            Arc::clone(&hasher),
        ))
        .validate(commands::RegisterUserRules)
        .handle(commands::UpdateUserHandler::new(Arc::clone(store)))
        .validate(commands::UpdateUserRules)
        .handle(commands::DeleteUserHandler::new(Arc::clone(store)))
        .handle(commands::ChangePasswordHandler::new(
            Arc::clone(store),
            Arc::clone(&hasher),
        ))
        .validate(commands::ChangePasswordRules)
        .handle(commands::RequestPasswordResetHandler::new(
            Arc::clone(store),
            Arc::clone(&tokens),
        ))
        .handle(commands::ResetPasswordHandler::new(
            Arc::clone(store),
            hasher,
            tokens,
        ))
        .validate(commands::ResetPasswordRules)
        .handle(queries::GetUserHandler::new(Arc::clone(store)))
        .handle(queries::ListUsersHandler::new(Arc::clone(store)))
        .validate(queries::ListUsersRules)
}
