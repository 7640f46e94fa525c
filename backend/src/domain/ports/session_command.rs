//! Driving port for session mutations.
//!
//! Views wire their login form, logout button, and profile editor to this
//! port. They branch on the returned result to render a message; nothing
//! here panics or raises.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{CredentialToken, Error, Principal, ProfileUpdate};

/// Successful login payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    /// The matched principal.
    pub principal: Principal,
    /// Freshly issued token.
    pub token: CredentialToken,
}

/// Domain use-case port for session lifecycle changes.
#[async_trait]
pub trait SessionCommand: Send + Sync {
    /// Authenticate by exact email and password, then persist the session.
    ///
    /// Fails with `InvalidCredentials` and leaves every piece of state
    /// untouched when the email is unknown or the password is wrong.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, Error>;

    /// Clear the session in memory and in persistence. Idempotent.
    async fn logout(&self);

    /// Shallow-merge `update` onto the active principal.
    ///
    /// Fails with `NotAuthenticated` when there is no live session.
    async fn update_profile(&self, update: ProfileUpdate) -> Result<Principal, Error>;

    /// Rehydrate the in-memory session from persistence.
    ///
    /// Returns `true` when a valid persisted session was restored. Invalid
    /// persisted state is removed.
    async fn restore(&self) -> bool;
}
