//! Canned donation specifications, one per reporting question.

use chrono::{DateTime, Utc};

use givebook_core::RecordId;
use givebook_store::Specification;

use crate::donation::{Donation, DonationKind};

/// Everything a donor gave, donor attached, newest first.
pub fn by_donor(donor_id: RecordId) -> Specification<Donation> {
    Specification::new()
        .filter(move |d: &Donation| d.donor_id == donor_id)
        .include("donor")
        .order_by_descending(|d: &Donation| d.donated_at)
}

/// Donations inside `[from, to]`, newest first.
pub fn in_date_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Specification<Donation> {
    Specification::new()
        .filter(move |d: &Donation| d.donated_at >= from && d.donated_at <= to)
        .order_by_descending(|d: &Donation| d.donated_at)
}

/// Donations of one kind, newest first.
pub fn of_kind(kind: DonationKind) -> Specification<Donation> {
    Specification::new()
        .filter(move |d: &Donation| d.kind == kind)
        .order_by_descending(|d: &Donation| d.donated_at)
}

/// Donations whose amount falls inside `[min, max]` minor units, smallest first.
pub fn amount_between(min: i64, max: i64) -> Specification<Donation> {
    Specification::new()
        .filter(move |d: &Donation| {
            let minor = d.amount.amount();
            minor >= min && minor <= max
        })
        .order_by(|d: &Donation| d.amount.amount())
}
