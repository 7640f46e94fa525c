//! Test utilities for the session crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with
//! the `test-support` feature.

pub mod clock {
    //! Controllable clock for expiry scenarios.

    use std::sync::Mutex;

    use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
    use mockable::Clock;

    /// Clock whose current instant only moves when a test moves it.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        /// Start the clock at `now`.
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        /// Start the clock at a fixed morning appointment slot.
        pub fn at_clinic_opening() -> Self {
            let opening = match Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single() {
                Some(instant) => instant,
                None => panic!("fixture timestamp must be unambiguous"),
            };
            Self::new(opening)
        }

        /// Move the clock forward by `delta`.
        pub fn advance(&self, delta: TimeDelta) {
            *self.lock_clock() += delta;
        }

        /// Move the clock forward by whole hours.
        pub fn advance_hours(&self, hours: i64) {
            self.advance(TimeDelta::hours(hours));
        }

        fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.lock_clock()
        }
    }
}

pub mod latency {
    //! Latency doubles.

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::domain::ports::LatencySimulator;

    /// Records every requested pause and resumes immediately.
    #[derive(Default)]
    pub struct RecordingLatency(Mutex<Vec<Duration>>);

    impl RecordingLatency {
        /// Pauses requested so far, in call order.
        pub fn pauses(&self) -> Vec<Duration> {
            match self.0.lock() {
                Ok(entries) => entries.clone(),
                Err(_) => panic!("latency mutex"),
            }
        }
    }

    #[async_trait]
    impl LatencySimulator for RecordingLatency {
        async fn pause(&self, duration: Duration) {
            match self.0.lock() {
                Ok(mut entries) => entries.push(duration),
                Err(_) => panic!("latency mutex"),
            }
        }
    }
}

pub mod state_dir {
    //! Throwaway state directories for file-backed storage.

    use camino::{Utf8Path, Utf8PathBuf};
    use tempfile::TempDir;

    /// Temporary directory with a UTF-8 `state` subdirectory path.
    ///
    /// The subdirectory is not created, so opening storage over it also
    /// exercises directory creation. Everything is removed on drop.
    pub struct TempStateDir {
        _temp: TempDir,
        root: Utf8PathBuf,
    }

    impl TempStateDir {
        /// Allocate a fresh temporary directory.
        pub fn new() -> std::io::Result<Self> {
            let temp = TempDir::new()?;
            let root = Utf8PathBuf::from_path_buf(temp.path().join("state")).map_err(|path| {
                std::io::Error::other(format!("{} is not valid UTF-8", path.display()))
            })?;
            Ok(Self { _temp: temp, root })
        }

        /// Path of the state directory.
        pub fn root(&self) -> &Utf8Path {
            &self.root
        }
    }
}

pub mod fixtures {
    //! Canned principals and a ready-wired in-memory store.

    use std::sync::Arc;

    use crate::domain::ports::{NoLatency, SharedSecretVerifier};
    use crate::domain::{SessionPolicy, SessionStore};
    use crate::outbound::directory::InMemoryPrincipalDirectory;
    use crate::outbound::storage::InMemorySessionStorage;

    use super::clock::MutableClock;

    /// Shared secret accepted by the fixture verifier.
    pub const SECRET: &str = "password123";
    /// Email of the fixture patient `user1`.
    pub const PATIENT_EMAIL: &str = "sarah.johnson@email.com";

    /// In-memory store type used across tests.
    pub type MemoryStore =
        SessionStore<InMemorySessionStorage, InMemoryPrincipalDirectory, SharedSecretVerifier>;

    /// Handles kept by tests to inspect and steer a store.
    pub struct StoreHarness {
        /// Store under test.
        pub store: MemoryStore,
        /// Persistence mirror shared with the store.
        pub storage: Arc<InMemorySessionStorage>,
        /// Principal set shared with the store.
        pub directory: Arc<InMemoryPrincipalDirectory>,
        /// Clock driving token expiry.
        pub clock: Arc<MutableClock>,
    }

    impl StoreHarness {
        /// Build another store over the same storage, directory, and clock,
        /// as a restarted process would.
        pub fn restart(&self) -> MemoryStore {
            build_store(
                Arc::clone(&self.storage),
                Arc::clone(&self.directory),
                Arc::clone(&self.clock),
            )
        }
    }

    fn build_store(
        storage: Arc<InMemorySessionStorage>,
        directory: Arc<InMemoryPrincipalDirectory>,
        clock: Arc<MutableClock>,
    ) -> MemoryStore {
        SessionStore::new(
            storage,
            directory,
            Arc::new(SharedSecretVerifier::default()),
            clock,
        )
        .with_policy(SessionPolicy::default())
        .with_latency(Arc::new(NoLatency))
    }

    /// Store over the bundled clinic principals with no latency.
    pub fn clinic_store() -> StoreHarness {
        let directory = match InMemoryPrincipalDirectory::bundled() {
            Ok(directory) => directory,
            Err(error) => panic!("bundled principals must load: {error}"),
        };
        let storage = Arc::new(InMemorySessionStorage::default());
        let directory = Arc::new(directory);
        let clock = Arc::new(MutableClock::at_clinic_opening());
        StoreHarness {
            store: build_store(
                Arc::clone(&storage),
                Arc::clone(&directory),
                Arc::clone(&clock),
            ),
            storage,
            directory,
            clock,
        }
    }
}
