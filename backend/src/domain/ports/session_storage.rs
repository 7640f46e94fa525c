//! Driven port for the durable key-value store that mirrors session state.
//!
//! The session core only ever touches two fixed keys, but the port is a
//! plain string map so browser-storage style backends, files, or an
//! in-memory fake can all sit behind it. Calls are synchronous: the store
//! is treated as always available and local.

use super::define_port_error;

define_port_error! {
    /// Errors raised by session storage adapters.
    pub enum SessionStorageError {
        /// The backing store cannot be reached or opened.
        Unavailable { message: String } => "session storage unavailable: {message}",
        /// A read, write, or removal failed part way.
        Io { key: String, message: String } => "session storage i/o failed for {key}: {message}",
    }
}

/// Port for get/set/remove by key.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStorage: Send + Sync {
    /// Read the value under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, SessionStorageError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionStorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), SessionStorageError>;
}
