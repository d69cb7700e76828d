//! The donor record.

use serde::{Deserialize, Serialize};

use givebook_core::{DomainResult, Email, RecordMeta, StoredRecord};
use givebook_store::HasRelations;

pub const MAX_NAME_LEN: usize = 100;

/// A person or organization that gives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub meta: RecordMeta,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<Email>,
}

impl Donor {
    pub fn new(
        full_name: impl Into<String>,
        phone: Option<String>,
        email: Option<Email>,
    ) -> DomainResult<Self> {
        let full_name = normalize_name(full_name.into())?;
        Ok(Self {
            meta: RecordMeta::new(),
            full_name,
            phone,
            email,
        })
    }

    pub fn rename(&mut self, full_name: impl Into<String>) -> DomainResult<()> {
        self.full_name = normalize_name(full_name.into())?;
        Ok(())
    }
}

fn normalize_name(name: String) -> DomainResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(givebook_core::DomainError::validation(
            "full_name is required",
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(givebook_core::DomainError::validation(format!(
            "full_name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

impl StoredRecord for Donor {
    const RECORD_TYPE: &'static str = "donor";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for Donor {}

#[cfg(test)]
mod tests {
    use super::*;
    use givebook_core::DomainError;

    #[test]
    fn name_is_trimmed_and_bounded() {
        let donor = Donor::new("  Ayşe Yılmaz  ", None, None).unwrap();
        assert_eq!(donor.full_name, "Ayşe Yılmaz");
        assert!(donor.meta.is_active());

        let err = Donor::new("x".repeat(MAX_NAME_LEN + 1), None, None).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(Donor::new("   ", None, None).is_err());
    }
}
