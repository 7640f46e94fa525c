//! In-memory principal directory seeded from JSON.
//!
//! The clinic ships a fixed principal set; [`InMemoryPrincipalDirectory::bundled`]
//! loads the copy compiled into the binary, while
//! [`InMemoryPrincipalDirectory::load`] reads an operator-supplied file with
//! the same shape (a JSON array of principal records).

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::domain::ports::{PrincipalDirectory, PrincipalDirectoryError, ensure_email_available};
use crate::domain::Principal;

const BUNDLED_PRINCIPALS: &str = include_str!("../../fixtures/principals.json");

/// Principal directory held in process memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalDirectory {
    principals: Mutex<Vec<Principal>>,
}

impl InMemoryPrincipalDirectory {
    /// Build a directory, rejecting duplicate identifiers or emails.
    pub fn from_principals(principals: Vec<Principal>) -> Result<Self, PrincipalDirectoryError> {
        for (index, principal) in principals.iter().enumerate() {
            if principals
                .iter()
                .take(index)
                .any(|other| other.id() == principal.id())
            {
                return Err(PrincipalDirectoryError::duplicate_id(principal.id().as_ref()));
            }
            ensure_email_available(
                principals.iter().take(index),
                principal.email(),
                principal.id(),
            )?;
        }
        Ok(Self {
            principals: Mutex::new(principals),
        })
    }

    /// Parse a JSON array of principal records.
    pub fn from_json(json: &str) -> Result<Self, PrincipalDirectoryError> {
        let principals: Vec<Principal> = serde_json::from_str(json).map_err(|err| {
            PrincipalDirectoryError::query(format!("invalid principal records: {err}"))
        })?;
        Self::from_principals(principals)
    }

    /// Directory over the principal set compiled into the crate.
    pub fn bundled() -> Result<Self, PrincipalDirectoryError> {
        Self::from_json(BUNDLED_PRINCIPALS)
    }

    /// Read principal records from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self, PrincipalDirectoryError> {
        let file_name = path.file_name().ok_or_else(|| {
            PrincipalDirectoryError::query(format!("{path} does not name a file"))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| PrincipalDirectoryError::query(format!("cannot open {parent}: {err}")))?;
        let json = dir
            .read_to_string(file_name)
            .map_err(|err| PrincipalDirectoryError::query(format!("cannot read {path}: {err}")))?;
        let directory = Self::from_json(&json)?;
        debug!(%path, count = directory.lock().len(), "loaded principal directory");
        Ok(directory)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Principal>> {
        self.principals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryPrincipalDirectory {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Principal>, PrincipalDirectoryError> {
        Ok(self
            .lock()
            .iter()
            .find(|principal| principal.email().as_ref() == email)
            .cloned())
    }

    async fn upsert(&self, principal: &Principal) -> Result<(), PrincipalDirectoryError> {
        let mut principals = self.lock();
        ensure_email_available(principals.iter(), principal.email(), principal.id())?;
        match principals
            .iter_mut()
            .find(|existing| existing.id() == principal.id())
        {
            Some(existing) => *existing = principal.clone(),
            None => principals.push(principal.clone()),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Principal>, PrincipalDirectoryError> {
        Ok(self.lock().clone())
    }
}
