//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_verifier;
mod latency;
mod principal_directory;
mod session_command;
mod session_query;
mod session_storage;

#[cfg(test)]
pub use credential_verifier::MockCredentialVerifier;
pub use credential_verifier::{CredentialVerifier, DEFAULT_SHARED_SECRET, SharedSecretVerifier};
pub use latency::{LatencySimulator, NoLatency, TokioLatency};
#[cfg(test)]
pub use principal_directory::MockPrincipalDirectory;
pub use principal_directory::{
    PrincipalDirectory, PrincipalDirectoryError, ensure_email_available,
};
pub use session_command::{LoginOutcome, SessionCommand};
pub use session_query::SessionQuery;
#[cfg(test)]
pub use session_storage::MockSessionStorage;
pub use session_storage::{SessionStorage, SessionStorageError};
