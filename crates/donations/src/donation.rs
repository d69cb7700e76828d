//! The donation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use givebook_core::{
    DomainError, DomainEventRecord, DomainResult, Money, RecordId, RecordMeta, StoredRecord,
};
use givebook_donors::Donor;
use givebook_store::{HasRelations, RelationView, StoreError, StoreResult};

pub const MAX_NOTE_LEN: usize = 500;

/// Upper bound on a single donation, in minor units (1,000,000.00 TRY).
pub const MAX_AMOUNT_MINOR: i64 = 100_000_000;

/// What was given.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonationKind {
    Cash,
    Goods,
    Services,
}

impl core::fmt::Display for DonationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Cash => "cash",
            Self::Goods => "goods",
            Self::Services => "services",
        };
        f.write_str(label)
    }
}

/// A single gift from a donor.
///
/// `donor_id` is the persistent link; `donor` is a navigation value populated
/// only when a read asks for the "donor" include.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub meta: RecordMeta,
    pub kind: DonationKind,
    pub amount: Money,
    pub donated_at: DateTime<Utc>,
    pub note: Option<String>,
    pub donor_id: RecordId,
    #[serde(skip)]
    pub donor: Option<Donor>,
}

impl Donation {
    pub fn new(
        donor_id: RecordId,
        kind: DonationKind,
        amount: Money,
        donated_at: DateTime<Utc>,
        note: Option<String>,
    ) -> DomainResult<Self> {
        check_amount(&amount)?;
        let note = normalize_note(note)?;
        let mut meta = RecordMeta::new();
        meta.record_event(DomainEventRecord::new(
            "donation.recorded",
            donated_at,
            serde_json::json!({
                "donor_id": donor_id.to_string(),
                "kind": kind.to_string(),
                "amount_minor": amount.amount(),
                "currency": amount.currency(),
            }),
        ));
        Ok(Self {
            meta,
            kind,
            amount,
            donated_at,
            note,
            donor_id,
            donor: None,
        })
    }

    pub fn set_amount(&mut self, amount: Money) -> DomainResult<()> {
        check_amount(&amount)?;
        self.amount = amount;
        Ok(())
    }

    pub fn set_note(&mut self, note: Option<String>) -> DomainResult<()> {
        self.note = normalize_note(note)?;
        Ok(())
    }
}

fn check_amount(amount: &Money) -> DomainResult<()> {
    if amount.amount() == 0 {
        return Err(DomainError::validation("amount must be greater than zero"));
    }
    if amount.amount() >= MAX_AMOUNT_MINOR {
        return Err(DomainError::validation(format!(
            "amount must be less than {MAX_AMOUNT_MINOR} minor units"
        )));
    }
    Ok(())
}

fn normalize_note(note: Option<String>) -> DomainResult<Option<String>> {
    match note {
        None => Ok(None),
        Some(note) => {
            let note = note.trim().to_string();
            if note.is_empty() {
                return Ok(None);
            }
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(DomainError::validation(format!(
                    "note must be at most {MAX_NOTE_LEN} characters"
                )));
            }
            Ok(Some(note))
        }
    }
}

impl StoredRecord for Donation {
    const RECORD_TYPE: &'static str = "donation";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for Donation {
    fn relations() -> &'static [&'static str] {
        &["donor"]
    }

    fn attach_relation(&mut self, relation: &str, view: &RelationView<'_>) -> StoreResult<()> {
        match relation {
            "donor" => {
                self.donor = view.get(self.donor_id);
                Ok(())
            }
            other => Err(StoreError::UnknownRelation {
                record: Self::RECORD_TYPE,
                relation: other.to_string(),
            }),
        }
    }
}
