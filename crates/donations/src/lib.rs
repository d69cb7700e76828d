//! `givebook-donations` — donation records, reporting filters and their
//! commands/queries.

pub mod commands;
pub mod donation;
pub mod filters;
pub mod queries;

pub use commands::{CreateDonation, DeleteDonation, UpdateDonation};
pub use donation::{Donation, DonationKind};
pub use queries::{
    DonationsByDonor, DonationsByKind, DonationsInAmountRange, DonationsInRange,
    GetDonationDetail, ListDonations,
};

use std::sync::Arc;

use givebook_pipeline::DispatcherBuilder;
use givebook_store::Datastore;

/// Wire every donation request into the dispatcher.
pub fn register(builder: DispatcherBuilder, store: &Arc<Datastore>) -> DispatcherBuilder {
    builder
        .handle(commands::CreateDonationHandler::new(Arc::clone(store)))
        .validate(commands::CreateDonationRules)
        .handle(commands::UpdateDonationHandler::new(Arc::clone(store)))
        .validate(commands::UpdateDonationRules)
        .handle(commands::DeleteDonationHandler::new(Arc::clone(store)))
        .handle(queries::GetDonationDetailHandler::new(Arc::clone(store)))
        .handle(queries::ListDonationsHandler::new(Arc::clone(store)))
        .validate(queries::ListDonationsRules)
        .handle(queries::DonationsByDonorHandler::new(Arc::clone(store)))
        .handle(queries::DonationsInRangeHandler::new(Arc::clone(store)))
        .validate(queries::DonationsInRangeRules)
        .handle(queries::DonationsByKindHandler::new(Arc::clone(store)))
        .handle(queries::DonationsInAmountRangeHandler::new(Arc::clone(store)))
}
