//! `givebook-donors` — donor records and their commands/queries.

pub mod commands;
pub mod donor;
pub mod queries;

pub use commands::{CreateDonor, DeleteDonor, UpdateDonor};
pub use donor::Donor;
pub use queries::{GetDonor, ListDonors};

use std::sync::Arc;

use givebook_pipeline::DispatcherBuilder;
use givebook_store::Datastore;

/// Wire every donor request into the dispatcher.
pub fn register(builder: DispatcherBuilder, store: &Arc<Datastore>) -> DispatcherBuilder {
    builder
        .handle(commands::CreateDonorHandler::new(Arc::clone(store)))
        .validate(commands::CreateDonorRules)
        .handle(commands::UpdateDonorHandler::new(Arc::clone(store)))
        .validate(commands::UpdateDonorRules)
        .handle(commands::DeleteDonorHandler::new(Arc::clone(store)))
        .handle(queries::GetDonorHandler::new(Arc::clone(store)))
        .handle(queries::ListDonorsHandler::new(Arc::clone(store)))
        .validate(queries::ListDonorsRules)
}
