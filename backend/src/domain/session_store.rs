//! Session store: issues, validates, persists, and tears down sessions.
//!
//! The store implements both driving ports. In-memory state sits behind a
//! mutex that is never held across an await, so overlapping calls resolve
//! as last-write-wins. The persistence mirror is the source of truth for
//! [`SessionQuery::is_authenticated`] and survives process restarts; the
//! in-memory session stays empty until [`SessionCommand::restore`] runs.
//!
//! Whenever a read observes an expired or corrupt persisted token, the
//! in-memory session is cleared and both persisted entries are removed, so
//! the in-memory flag never outlives the token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CredentialVerifier, LatencySimulator, LoginOutcome, PrincipalDirectory,
    PrincipalDirectoryError, SessionCommand, SessionQuery, SessionStorage, SessionStorageError,
    TokioLatency,
};
use crate::domain::{
    CredentialToken, DEFAULT_TOKEN_TTL_HOURS, Error, LoginCredentials, PRINCIPAL_KEY, Principal,
    ProfileUpdate, Session, TOKEN_KEY, TokenClaims, TokenError,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Timing rules applied by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Validity window of each issued token.
    pub token_ttl: TimeDelta,
    /// Simulated round trip before `login` resolves.
    pub login_latency: Duration,
    /// Simulated round trip before `update_profile` resolves.
    pub update_latency: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            token_ttl: TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS),
            login_latency: Duration::from_millis(1000),
            update_latency: Duration::from_millis(500),
        }
    }
}

/// What the persisted `token` entry currently holds.
#[derive(Debug)]
enum PersistedToken {
    Missing,
    Live {
        token: CredentialToken,
        claims: TokenClaims,
    },
    Expired(TokenClaims),
    Corrupt(TokenError),
    Unreadable(SessionStorageError),
}

/// Session store implementing [`SessionCommand`] and [`SessionQuery`].
pub struct SessionStore<S, D, V> {
    storage: Arc<S>,
    directory: Arc<D>,
    verifier: Arc<V>,
    clock: Arc<dyn Clock>,
    latency: Arc<dyn LatencySimulator>,
    policy: SessionPolicy,
    state: Mutex<Session>,
}

impl<S, D, V> SessionStore<S, D, V> {
    /// Create an empty store with the default policy and Tokio latency.
    pub fn new(storage: Arc<S>, directory: Arc<D>, verifier: Arc<V>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            directory,
            verifier,
            clock,
            latency: Arc::new(TokioLatency),
            policy: SessionPolicy::default(),
            state: Mutex::new(Session::empty()),
        }
    }

    /// Replace the timing policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the latency implementation.
    #[must_use]
    pub fn with_latency(mut self, latency: Arc<dyn LatencySimulator>) -> Self {
        self.latency = latency;
        self
    }

    /// Active timing policy.
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    fn lock_state(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, D, V> SessionStore<S, D, V>
where
    S: SessionStorage,
    D: PrincipalDirectory,
    V: CredentialVerifier,
{
    fn map_storage_error(error: SessionStorageError) -> Error {
        match error {
            SessionStorageError::Unavailable { message } => {
                Error::service_unavailable(format!("session storage unavailable: {message}"))
            }
            SessionStorageError::Io { key, message } => {
                Error::service_unavailable(format!("session storage failed for {key}: {message}"))
            }
        }
    }

    fn map_directory_error(error: PrincipalDirectoryError) -> Error {
        match error {
            PrincipalDirectoryError::Query { message } => {
                Error::service_unavailable(format!("principal directory unavailable: {message}"))
            }
            PrincipalDirectoryError::DuplicateEmail { email } => {
                Error::invalid_request(format!("email {email} is already in use"))
                    .with_details(json!({ "field": "email" }))
            }
            PrincipalDirectoryError::DuplicateId { id } => {
                Error::internal(format!("principal id {id} is registered twice"))
            }
        }
    }

    fn read_token(&self) -> PersistedToken {
        let raw = match self.storage.get(TOKEN_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return PersistedToken::Missing,
            Err(error) => return PersistedToken::Unreadable(error),
        };
        let token = CredentialToken::from_raw(raw);
        match token.decode() {
            Ok(claims) if claims.is_valid_at(self.clock.utc()) => {
                PersistedToken::Live { token, claims }
            }
            Ok(claims) => PersistedToken::Expired(claims),
            Err(error) => PersistedToken::Corrupt(error),
        }
    }

    fn read_principal(&self) -> Option<Principal> {
        let raw = match self.storage.get(PRINCIPAL_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(error = %error, "failed to read persisted principal");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(principal) => Some(principal),
            Err(error) => {
                warn!(error = %error, "ignoring malformed persisted principal");
                None
            }
        }
    }

    fn write_principal(&self, principal: &Principal) -> Result<(), Error> {
        let record = serde_json::to_string(principal)
            .map_err(|err| Error::internal(format!("failed to serialize principal: {err}")))?;
        self.storage
            .set(PRINCIPAL_KEY, &record)
            .map_err(Self::map_storage_error)
    }

    fn persist(&self, principal: &Principal, token: &CredentialToken) -> Result<(), Error> {
        self.storage
            .set(TOKEN_KEY, token.as_str())
            .map_err(Self::map_storage_error)?;
        if let Err(error) = self.write_principal(principal) {
            // Never leave a token without its principal.
            if let Err(cleanup) = self.storage.remove(TOKEN_KEY) {
                warn!(error = %cleanup, "failed to roll back token after principal write failure");
            }
            return Err(error);
        }
        Ok(())
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, PRINCIPAL_KEY] {
            if let Err(error) = self.storage.remove(key) {
                warn!(key, error = %error, "failed to remove persisted session entry");
            }
        }
    }

    /// Clear memory and persistence after spotting an unusable token.
    fn invalidate(&self, reason: &str) {
        warn!(reason, "discarding persisted session");
        self.lock_state().clear();
        self.remove_persisted();
    }

    fn has_persisted_principal(&self) -> bool {
        self.storage
            .get(PRINCIPAL_KEY)
            .is_ok_and(|raw| raw.is_some())
    }

    fn live_claims(&self) -> Option<(CredentialToken, TokenClaims)> {
        self.settle(self.read_token())
    }

    /// Settle a persisted token read, clearing state when it is unusable.
    fn settle(&self, persisted: PersistedToken) -> Option<(CredentialToken, TokenClaims)> {
        match persisted {
            PersistedToken::Live { token, claims } => Some((token, claims)),
            PersistedToken::Missing => {
                self.lock_state().clear();
                None
            }
            PersistedToken::Expired(claims) => {
                debug!(principal_id = %claims.principal_id(), exp = claims.exp(), "token expired");
                self.invalidate("token expired");
                None
            }
            PersistedToken::Corrupt(error) => {
                debug!(error = %error, "token failed to decode");
                self.invalidate("token corrupt");
                None
            }
            PersistedToken::Unreadable(error) => {
                warn!(error = %error, "failed to read persisted token");
                None
            }
        }
    }
}

#[async_trait]
impl<S, D, V> SessionCommand for SessionStore<S, D, V>
where
    S: SessionStorage,
    D: PrincipalDirectory,
    V: CredentialVerifier,
{
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, Error> {
        self.latency.pause(self.policy.login_latency).await;

        let credentials = match LoginCredentials::try_from_parts(email, password) {
            Ok(credentials) => credentials,
            Err(error) => {
                debug!(error = %error, "rejected malformed credentials");
                return Err(Error::invalid_credentials(INVALID_CREDENTIALS));
            }
        };

        let Some(principal) = self
            .directory
            .find_by_email(credentials.email())
            .await
            .map_err(Self::map_directory_error)?
        else {
            debug!("login rejected: unknown email");
            return Err(Error::invalid_credentials(INVALID_CREDENTIALS));
        };

        if !self.verifier.verify(&principal, &credentials).await {
            debug!(principal_id = %principal.id(), "login rejected: wrong secret");
            return Err(Error::invalid_credentials(INVALID_CREDENTIALS));
        }

        let token = CredentialToken::issue(principal.id(), self.clock.utc(), self.policy.token_ttl);
        self.persist(&principal, &token)?;
        self.lock_state().establish(principal.clone(), token.clone());
        info!(principal_id = %principal.id(), role = %principal.role(), "session established");

        Ok(LoginOutcome { principal, token })
    }

    async fn logout(&self) {
        self.lock_state().clear();
        self.remove_persisted();
        info!("session cleared");
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<Principal, Error> {
        self.latency.pause(self.policy.update_latency).await;

        let now = self.clock.utc();
        let (current, stale) = {
            let state = self.lock_state();
            if state.is_live_at(now) {
                (state.current_principal().cloned(), false)
            } else {
                (None, state.is_authenticated())
            }
        };
        if stale {
            self.invalidate("token expired before profile update");
        }
        let Some(current) = current else {
            return Err(Error::not_authenticated(
                "log in before updating the profile",
            ));
        };

        let merged = update
            .apply_to(&current)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.directory
            .upsert(&merged)
            .await
            .map_err(Self::map_directory_error)?;
        if let Err(error) = self.write_principal(&merged) {
            // Keep the directory in step with the persisted record.
            if let Err(rollback) = self.directory.upsert(&current).await {
                warn!(error = %rollback, "failed to roll back directory after principal write failure");
            }
            return Err(error);
        }

        if !self.lock_state().replace_principal(merged.clone()) {
            debug!(principal_id = %merged.id(), "session ended while the profile update was in flight");
        }
        info!(
            principal_id = %merged.id(),
            fields = ?update.keys().collect::<Vec<_>>(),
            "profile updated"
        );
        Ok(merged)
    }

    async fn restore(&self) -> bool {
        let persisted = self.read_token();
        if matches!(persisted, PersistedToken::Missing) && self.has_persisted_principal() {
            self.invalidate("principal persisted without a token");
            return false;
        }
        let Some((token, claims)) = self.settle(persisted) else {
            return false;
        };
        match self.read_principal() {
            Some(principal) if principal.id() == claims.principal_id() => {
                info!(principal_id = %principal.id(), "session restored");
                self.lock_state().establish(principal, token);
                true
            }
            _ => {
                self.invalidate("persisted principal missing or does not match token");
                false
            }
        }
    }
}

impl<S, D, V> SessionQuery for SessionStore<S, D, V>
where
    S: SessionStorage,
    D: PrincipalDirectory,
    V: CredentialVerifier,
{
    fn is_authenticated(&self) -> bool {
        self.live_claims().is_some()
    }

    fn current_principal(&self) -> Option<Principal> {
        self.read_principal()
    }

    fn verified_principal(&self) -> Option<Principal> {
        let (_, claims) = self.live_claims()?;
        self.read_principal()
            .filter(|principal| principal.id() == claims.principal_id())
    }

    fn snapshot(&self) -> Session {
        self.lock_state().clone()
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
