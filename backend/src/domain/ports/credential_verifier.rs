//! Driven port that decides whether a password unlocks a principal.
//!
//! The clinic dashboard ships with a mock check: every principal shares one
//! configured secret. A real verifier (password hashes, an identity
//! provider) plugs in behind the same async, single-attempt contract.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{LoginCredentials, Principal};

/// Shared secret accepted by the fixture verifier unless configured.
pub const DEFAULT_SHARED_SECRET: &str = "password123";

/// Domain port for credential checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Return whether `credentials` authenticate `principal`.
    async fn verify(&self, principal: &Principal, credentials: &LoginCredentials) -> bool;
}

/// Mock verifier comparing every password with one shared secret.
///
/// No lockout and no rate-limiting.
#[derive(Clone)]
pub struct SharedSecretVerifier {
    secret: Zeroizing<String>,
}

impl SharedSecretVerifier {
    /// Accept `secret` for every principal.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }
}

impl Default for SharedSecretVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_SHARED_SECRET)
    }
}

impl std::fmt::Debug for SharedSecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CredentialVerifier for SharedSecretVerifier {
    async fn verify(&self, _principal: &Principal, credentials: &LoginCredentials) -> bool {
        credentials.password() == self.secret.as_str()
    }
}
