//! Process-local session storage, the fake used by tests and demos.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ports::{SessionStorage, SessionStorageError};

/// Key-value map guarded by a mutex.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemorySessionStorage {
    /// Copy of every stored entry, ordered by key.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStorageError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionStorageError> {
        self.lock().remove(key);
        Ok(())
    }
}
