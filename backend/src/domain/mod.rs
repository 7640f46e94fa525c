//! Domain primitives, aggregates, and the session service.
//!
//! Purpose: define strongly typed session and identity entities, the port
//! traits that decouple them from storage, and the [`SessionStore`] that
//! ties them together. Keep types immutable where possible and document
//! invariants and serialisation contracts in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::DomainError`): transport-agnostic failure.
//! - ErrorCode: stable failure category.
//! - Principal and its validated parts: the authenticated clinic user.
//! - CredentialToken / TokenClaims: the opaque expiring credential.
//! - Session: in-memory authentication state.
//! - ProfileUpdate: shallow patch applied to the active principal.
//! - SessionStore: implements the `SessionCommand` and `SessionQuery` ports.

pub mod auth;
pub mod error;
pub mod ports;
pub mod principal;
pub mod profile;
pub mod session;
pub mod session_store;
pub mod token;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{DomainError, DomainError as Error, DomainErrorValidationError, ErrorCode};
pub use self::principal::{
    DisplayName, Email, Principal, PrincipalId, PrincipalValidationError,
    RESERVED_KEYS, Role,
};
pub use self::profile::{ProfileUpdate, ProfileUpdateError};
pub use self::session::{PRINCIPAL_KEY, Session, TOKEN_KEY};
pub use self::session_store::{SessionPolicy, SessionStore};
pub use self::token::{CredentialToken, DEFAULT_TOKEN_TTL_HOURS, TokenClaims, TokenError};
