//! In-memory session state and the fixed persistence keys that mirror it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CredentialToken, Principal};

/// Persistence key holding the encoded [`CredentialToken`].
pub const TOKEN_KEY: &str = "token";
/// Persistence key holding the JSON [`Principal`] record.
pub const PRINCIPAL_KEY: &str = "currentPrincipal";

/// Process-wide authentication state.
///
/// ## Invariants
/// - `is_authenticated` is `true` only while both `principal` and `token`
///   are present. Fields change together through [`Session::establish`] and
///   [`Session::clear`]; there is no partial setter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    is_authenticated: bool,
    current_principal: Option<Principal>,
    #[serde(skip)]
    token: Option<CredentialToken>,
}

impl Session {
    /// Empty, unauthenticated session.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the whole session with an authenticated one.
    pub fn establish(&mut self, principal: Principal, token: CredentialToken) {
        self.is_authenticated = true;
        self.current_principal = Some(principal);
        self.token = Some(token);
    }

    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Swap the principal of an established session, keeping its token.
    ///
    /// Returns `false` (and changes nothing) when no session is established.
    pub fn replace_principal(&mut self, principal: Principal) -> bool {
        if !self.is_authenticated {
            return false;
        }
        self.current_principal = Some(principal);
        true
    }

    /// In-memory authentication flag. Does not look at the clock.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Principal held in memory.
    pub fn current_principal(&self) -> Option<&Principal> {
        self.current_principal.as_ref()
    }

    /// Token held in memory.
    pub fn token(&self) -> Option<&CredentialToken> {
        self.token.as_ref()
    }

    /// Whether the held token decodes and has not expired at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated
            && self
                .token
                .as_ref()
                .and_then(|token| token.decode().ok())
                .is_some_and(|claims| claims.is_valid_at(now))
    }
}
