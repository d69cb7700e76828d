//! The user record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use givebook_core::{DomainError, DomainResult, Email, RecordMeta, StoredRecord};
use givebook_store::HasRelations;

pub const MAX_NAME_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Staff,
}

/// A staff member who can sign in.
///
/// `password_hash` is an opaque string produced by the configured
/// [`crate::ports::PasswordHasher`]; plain passwords never reach the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub meta: RecordMeta,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Email,
        password_hash: String,
        role: Role,
    ) -> DomainResult<Self> {
        Ok(Self {
            meta: RecordMeta::new(),
            first_name: normalize_name("first_name", first_name.into())?,
            last_name: normalize_name("last_name", last_name.into())?,
            email,
            password_hash,
            role,
            registered_at: Utc::now(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn set_names(
        &mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> DomainResult<()> {
        self.first_name = normalize_name("first_name", first_name.into())?;
        self.last_name = normalize_name("last_name", last_name.into())?;
        Ok(())
    }
}

fn normalize_name(field: &str, name: String) -> DomainResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

impl StoredRecord for User {
    const RECORD_TYPE: &'static str = "user";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl HasRelations for User {}
