//! Port abstraction for the known principal set.
//!
//! Login resolves principals by exact email; profile updates write the
//! merged record back by identifier.
use async_trait::async_trait;

use crate::domain::{Email, Principal, PrincipalId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by principal directory adapters.
    pub enum PrincipalDirectoryError {
        /// Lookup or write failed during execution.
        Query { message: String } => "principal directory query failed: {message}",
        /// Another principal already owns the email.
        DuplicateEmail { email: String } => "email {email} is already registered",
        /// Two records share the same identifier.
        DuplicateId { id: String } => "principal id {id} is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Fetch the principal whose email matches exactly.
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Principal>, PrincipalDirectoryError>;

    /// Insert or replace the record with the same identifier.
    ///
    /// Fails with [`PrincipalDirectoryError::DuplicateEmail`] when the email
    /// belongs to a different identifier.
    async fn upsert(&self, principal: &Principal) -> Result<(), PrincipalDirectoryError>;

    /// All known principals, in a stable order.
    async fn list(&self) -> Result<Vec<Principal>, PrincipalDirectoryError>;
}

/// Check that `email` is free for `owner`, given the current record set.
pub fn ensure_email_available<'a>(
    mut principals: impl Iterator<Item = &'a Principal>,
    email: &Email,
    owner: &PrincipalId,
) -> Result<(), PrincipalDirectoryError> {
    if principals.any(|existing| existing.email() == email && existing.id() != owner) {
        return Err(PrincipalDirectoryError::duplicate_email(email.as_ref()));
    }
    Ok(())
}
