//! Collaborator ports for credential handling.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use givebook_core::{DomainResult, RecordId};

/// Hashes and verifies passwords. Production wires a real KDF; tests use a
/// transparent stand-in.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> DomainResult<String>;
    fn verify(&self, password: &str, hash: &str) -> DomainResult<bool>;
}

/// Issues and redeems single-use password-reset tokens.
pub trait ResetTokenStore: Send + Sync {
    /// Mint a token for `user_id`, valid from `now` for the store's lifetime.
    fn issue(&self, user_id: RecordId, now: DateTime<Utc>) -> DomainResult<String>;

    /// Redeem a token: returns the user it was minted for and consumes it.
    /// Unknown, already-used and expired tokens all return `None`.
    fn redeem(&self, token: &str, now: DateTime<Utc>) -> DomainResult<Option<RecordId>>;
}

/// In-process reset tokens with a fixed time-to-live (one hour by default).
pub struct InMemoryResetTokenStore {
    ttl: Duration,
    tokens: Mutex<HashMap<String, (RecordId, DateTime<Utc>)>>,
}

impl InMemoryResetTokenStore {
    pub const DEFAULT_TTL_HOURS: i64 = 1;

    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(Self::DEFAULT_TTL_HOURS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Drop every expired token. Issue and redeem stay correct without this;
    /// it only bounds memory on a long-lived store.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut tokens = match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = tokens.len();
        tokens.retain(|_, (_, expires_at)| *expires_at > now);
        before - tokens.len()
    }

    pub fn active_count(&self) -> usize {
        self.tokens.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl Default for InMemoryResetTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetTokenStore for InMemoryResetTokenStore {
    fn issue(&self, user_id: RecordId, now: DateTime<Utc>) -> DomainResult<String> {
        let token = Uuid::now_v7().simple().to_string();
        let mut tokens = match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens.insert(token.clone(), (user_id, now + self.ttl));
        Ok(token)
    }

    fn redeem(&self, token: &str, now: DateTime<Utc>) -> DomainResult<Option<RecordId>> {
        let mut tokens = match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match tokens.remove(token) {
            Some((user_id, expires_at)) if expires_at > now => Ok(Some(user_id)),
            _ => Ok(None),
        }
    }
}
