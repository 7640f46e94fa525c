//! Driving port for reading session state.

use crate::domain::{Principal, Session};

/// Domain use-case port for session reads.
///
/// Reads are synchronous because the persistence port is.
pub trait SessionQuery: Send + Sync {
    /// Whether the persisted token decodes and has not expired.
    ///
    /// Works straight after a cold start, without a prior `restore`.
    fn is_authenticated(&self) -> bool;

    /// Last known principal from persistence, without any expiry check.
    fn current_principal(&self) -> Option<Principal>;

    /// Persisted principal, only while the persisted token is valid and
    /// was issued to that principal.
    fn verified_principal(&self) -> Option<Principal>;

    /// Copy of the in-memory session.
    fn snapshot(&self) -> Session;
}
