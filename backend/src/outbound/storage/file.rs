//! File-backed session storage.
//!
//! Each key is a file inside one capability-scoped directory. Writes go to a
//! hidden temporary file that is then renamed over the target, so a crash
//! never leaves a half-written value behind. Nothing spans the two session
//! keys: a crash between the token and principal writes leaves them out of
//! step, and the session store treats that pair as invalid on restore.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};

use crate::domain::ports::{SessionStorage, SessionStorageError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Session storage rooted at a directory on disk.
#[derive(Debug)]
pub struct FileSessionStorage {
    root: Utf8PathBuf,
    dir: Dir,
}

impl FileSessionStorage {
    /// Open (creating if needed) the storage directory at `root`.
    pub fn open(root: &Utf8Path) -> Result<Self, SessionStorageError> {
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(|err| {
            SessionStorageError::unavailable(format!("cannot create {root}: {err}"))
        })?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|err| {
            SessionStorageError::unavailable(format!("cannot open {root}: {err}"))
        })?;
        Ok(Self {
            root: root.to_owned(),
            dir,
        })
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn write_atomic(&self, file_name: &str, contents: &str) -> io::Result<()> {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let tmp_name = format!(
            ".{file_name}.tmp.{}.{suffix}.{counter}",
            std::process::id()
        );

        if let Err(err) = self.write_temp(&tmp_name, contents) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(err);
        }
        if let Err(err) = self.dir.rename(&tmp_name, &self.dir, file_name) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(err);
        }
        // Best-effort directory sync.
        drop(self.dir.open(".").and_then(|dir| dir.sync_all()));
        Ok(())
    }

    fn write_temp(&self, tmp_name: &str, contents: &str) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = self.dir.open_with(tmp_name, &options)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    }
}

// Keys become file names, so only a conservative character set passes.
fn file_name_for(key: &str) -> Result<&str, SessionStorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(key)
    } else {
        Err(SessionStorageError::io(
            key,
            "key must be ASCII letters, digits, '_' or '-'",
        ))
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStorageError> {
        let file_name = file_name_for(key)?;
        match self.dir.read_to_string(file_name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SessionStorageError::io(key, err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStorageError> {
        let file_name = file_name_for(key)?;
        self.write_atomic(file_name, value)
            .map_err(|err| SessionStorageError::io(key, err.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), SessionStorageError> {
        let file_name = file_name_for(key)?;
        match self.dir.remove_file(file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionStorageError::io(key, err.to_string())),
        }
    }
}
