//! Partial principal updates and their merge rule.
//!
//! Merging is shallow: every top-level key in the update replaces the
//! principal's value for that key wholesale, and absent keys keep their
//! prior value. Nested objects such as `preferences` are replaced, never
//! merged field by field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{Principal, PrincipalValidationError};

/// Reasons a profile update cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileUpdateError {
    /// The update tried to change the principal identifier.
    #[error("principal id cannot be changed (current {current})")]
    IdentifierChange { current: String },
    /// The merged record is no longer a valid principal.
    #[error("updated profile is invalid: {0}")]
    InvalidPrincipal(#[from] PrincipalValidationError),
}

/// A partial principal: any subset of core fields and attributes.
///
/// # Examples
/// ```
/// use clinic_session::domain::ProfileUpdate;
/// use serde_json::json;
///
/// let update = ProfileUpdate::new()
///     .set("name", json!("Sarah J."))
///     .set("preferences", json!({"theme": "dark"}));
/// assert_eq!(update.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileUpdate(Map<String, Value>);

impl ProfileUpdate {
    /// Empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level key, replacing any earlier value for it.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Number of keys in the update.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the update touches nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys the update will overwrite.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Shallow-merge the update onto `principal`, returning the new record.
    ///
    /// An `id` key is allowed only when it repeats the current identifier.
    pub fn apply_to(&self, principal: &Principal) -> Result<Principal, ProfileUpdateError> {
        let changes_id = self
            .0
            .get("id")
            .is_some_and(|requested| requested.as_str() != Some(principal.id().as_ref()));
        if changes_id {
            return Err(ProfileUpdateError::IdentifierChange {
                current: principal.id().to_string(),
            });
        }

        let mut record = principal.to_record();
        for (key, value) in &self.0 {
            record.insert(key.clone(), value.clone());
        }
        Ok(Principal::try_from_record(record)?)
    }
}

impl From<Map<String, Value>> for ProfileUpdate {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}
