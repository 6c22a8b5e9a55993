//! Issued access grant and its expiry rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Access/refresh token pair issued by the OAuth token endpoint.
///
/// A credential never changes after issuance; a refresh produces a new value.
///
/// # Example
/// ```
/// use robinstock::auth::Credential;
/// use chrono::Utc;
///
/// let credential = Credential {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
///     token_type: "Bearer".to_string(),
///     device_token: "0a1b2c3d-0000-1111-2222-333344445555".to_string(),
///     expires_in: 86400,
///     issued_at: Some(Utc::now()),
/// };
/// assert!(!credential.is_expired());
/// assert_eq!(credential.authorization_header(), "Bearer access");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub device_token: String,
    /// Lifetime in seconds. Zero means the credential never expires.
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Whether the credential has expired as of now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.expires_in == 0 {
            return false;
        }
        match self.issued_at {
            Some(issued_at) => is_expired(issued_at, self.expires_in, now),
            // never stamped: no way to prove it is still live
            None => true,
        }
    }

    /// Instant after which the credential is no longer valid, if it expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_in == 0 {
            return None;
        }
        self.issued_at
            .and_then(|issued_at| expiry_instant(issued_at, self.expires_in))
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let token_type = if self.token_type.trim().is_empty() {
            DEFAULT_TOKEN_TYPE
        } else {
            self.token_type.as_str()
        };
        format!("{token_type} {}", self.access_token)
    }

    /// Copy of this credential with `issued_at` set to `now` when missing.
    pub fn stamped(&self, now: DateTime<Utc>) -> Self {
        let mut stamped = self.clone();
        stamped.issued_at.get_or_insert(now);
        stamped
    }
}

/// Expiry predicate shared by the store and the credential itself.
///
/// True iff `expires_in > 0` and `now >= issued_at + expires_in`.
pub fn is_expired(issued_at: DateTime<Utc>, expires_in: u64, now: DateTime<Utc>) -> bool {
    if expires_in == 0 {
        return false;
    }
    // lifetimes past chrono's range are effectively unbounded
    expiry_instant(issued_at, expires_in).is_some_and(|expires_at| now >= expires_at)
}

fn expiry_instant(issued_at: DateTime<Utc>, expires_in: u64) -> Option<DateTime<Utc>> {
    let lifetime = Duration::try_seconds(i64::try_from(expires_in).ok()?)?;
    issued_at.checked_add_signed(lifetime)
}
