//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; to
/// "modify" one, construct a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Monetary amount in the smallest unit (e.g. kuruş, cents) plus a currency code.
///
/// Amounts are never negative; arithmetic on mismatched currencies is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: String,
}

impl Money {
    pub const DEFAULT_CURRENCY: &'static str = "TRY";

    pub fn new(amount: i64, currency: impl Into<String>) -> DomainResult<Self> {
        if amount < 0 {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(DomainError::validation("currency cannot be empty"));
        }
        Ok(Self {
            amount,
            currency: currency.to_uppercase(),
        })
    }

    /// Amount in the default currency.
    pub fn from_minor(amount: i64) -> DomainResult<Self> {
        Self::new(amount, Self::DEFAULT_CURRENCY)
    }

    pub fn zero(currency: impl Into<String>) -> DomainResult<Self> {
        Self::new(0, currency)
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn checked_add(&self, other: &Money) -> DomainResult<Money> {
        self.require_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::validation("amount overflow"))?;
        Money::new(amount, self.currency.clone())
    }

    pub fn checked_sub(&self, other: &Money) -> DomainResult<Money> {
        self.require_same_currency(other)?;
        if other.amount > self.amount {
            return Err(DomainError::validation("result cannot be negative"));
        }
        Money::new(self.amount - other.amount, self.currency.clone())
    }

    fn require_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::validation(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Normalized e-mail address.
///
/// Stored lowercased; construction rejects empty or malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value: String = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }
        if !Self::is_valid(&value) {
            return Err(DomainError::validation(format!(
                "invalid email format: {value}"
            )));
        }
        Ok(Self(value.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // local@domain.tld with non-empty parts and a dotted domain. Intentionally
    // conservative; anything stricter belongs to a mail collaborator.
    fn is_valid(value: &str) -> bool {
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return false;
        }
        let Some((host, tld)) = domain.rsplit_once('.') else {
            return false;
        };
        if host.is_empty() || tld.len() < 2 {
            return false;
        }
        value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-@".contains(c))
    }
}

impl ValueObject for Email {}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
