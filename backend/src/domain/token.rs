//! Credential tokens issued on login.
//!
//! A token is base64-wrapped JSON claims `{"principalId": .., "exp": ..}`
//! where `exp` is milliseconds since the Unix epoch. It is a local encoding
//! only: nothing is signed, so it must never be trusted as a credential by
//! anything other than this process.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use super::PrincipalId;

/// Default validity window of a freshly issued token, in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Failure to decode a persisted token.
///
/// Never surfaced to session callers; the store folds it into
/// "not authenticated".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The value is not base64 or the payload is not valid claims JSON.
    #[error("corrupt token: {message}")]
    Corrupt { message: String },
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    principal_id: PrincipalId,
    exp: i64,
}

impl TokenClaims {
    /// Build claims for `principal_id` expiring at `expires_at`.
    pub fn new(principal_id: PrincipalId, expires_at: DateTime<Utc>) -> Self {
        Self {
            principal_id,
            exp: expires_at.timestamp_millis(),
        }
    }

    /// Principal the token was issued to.
    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    /// Expiry in milliseconds since the Unix epoch.
    pub fn exp(&self) -> i64 {
        self.exp
    }

    /// Expiry as a timestamp, when representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.exp)
    }

    /// A token is valid strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.exp > now.timestamp_millis()
    }
}

/// Opaque encoded token as stored under the `token` persistence key.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use clinic_session::domain::{CredentialToken, PrincipalId};
///
/// let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
/// let id = PrincipalId::new("user1").unwrap();
/// let token = CredentialToken::issue(&id, now, TimeDelta::hours(24));
///
/// let claims = token.decode().unwrap();
/// assert_eq!(claims.principal_id(), &id);
/// assert!(claims.is_valid_at(now));
/// assert!(!claims.is_valid_at(now + TimeDelta::hours(24)));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialToken(String);

impl CredentialToken {
    /// Issue a fresh token valid for `ttl` from `issued_at`.
    pub fn issue(principal_id: &PrincipalId, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::encode(&TokenClaims::new(principal_id.clone(), expires_at))
    }

    /// Encode claims into their opaque form.
    pub fn encode(claims: &TokenClaims) -> Self {
        let payload = json!({
            "principalId": claims.principal_id.as_ref(),
            "exp": claims.exp,
        });
        Self(STANDARD.encode(payload.to_string()))
    }

    /// Wrap a raw persisted value without checking it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw encoded form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Decode the claims. Expiry is not checked here.
    pub fn decode(&self) -> Result<TokenClaims, TokenError> {
        let bytes = STANDARD
            .decode(self.0.trim())
            .map_err(|err| TokenError::Corrupt {
                message: format!("invalid base64: {err}"),
            })?;
        serde_json::from_slice(&bytes).map_err(|err| TokenError::Corrupt {
            message: format!("invalid claims: {err}"),
        })
    }
}

impl fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CredentialToken").field(&"<opaque>").finish()
    }
}
