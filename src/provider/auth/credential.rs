//! # Resolved Credential
//!
//! Opaque credential handle produced by the resolver. Secret material is wiped
//! on drop and never printed.

use chrono::{DateTime, Utc};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Credential lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Long-lived static key
    Never,
    /// Temporary credential valid until the given instant
    At(DateTime<Utc>),
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ResolvedCredential {
    secret_id: String,
    secret_key: String,
    token: Option<String>,
    #[zeroize(skip)]
    expiry: Expiry,
}

impl ResolvedCredential {
    /// Long-lived access key pair
    #[must_use]
    pub fn static_key(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            token: None,
            expiry: Expiry::Never,
        }
    }

    /// Temporary credential returned by a role exchange
    #[must_use]
    pub fn temporary(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            token: Some(token.into()),
            expiry: Expiry::At(expires_at),
        }
    }

    #[must_use]
    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Session token, present for temporary credentials only
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Expiry::Never => false,
            Expiry::At(at) => at <= now,
        }
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("expiry", &self.expiry)
            .finish()
    }
}
