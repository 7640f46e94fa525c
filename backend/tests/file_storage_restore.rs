//! Restart coverage for the file-backed session storage.
//!
//! Each test builds a fresh store over the same state directory, the way
//! successive `clinic-session` invocations do.

use std::sync::Arc;

use clinic_session::domain::ports::{NoLatency, SessionCommand, SessionQuery, SharedSecretVerifier};
use clinic_session::domain::{PRINCIPAL_KEY, ProfileUpdate, SessionStore, TOKEN_KEY};
use clinic_session::outbound::directory::InMemoryPrincipalDirectory;
use clinic_session::outbound::storage::FileSessionStorage;
use clinic_session::test_support::clock::MutableClock;
use clinic_session::test_support::fixtures::{PATIENT_EMAIL, SECRET};
use clinic_session::test_support::state_dir::TempStateDir;
use rstest::{fixture, rstest};
use serde_json::json;

type FileStore = SessionStore<FileSessionStorage, InMemoryPrincipalDirectory, SharedSecretVerifier>;

struct StateDir {
    dir: TempStateDir,
    clock: Arc<MutableClock>,
}

impl StateDir {
    fn open_store(&self) -> FileStore {
        let storage = FileSessionStorage::open(self.dir.root()).expect("open state dir");
        let directory = InMemoryPrincipalDirectory::bundled().expect("bundled principals");
        SessionStore::new(
            Arc::new(storage),
            Arc::new(directory),
            Arc::new(SharedSecretVerifier::default()),
            Arc::clone(&self.clock) as Arc<dyn mockable::Clock>,
        )
        .with_latency(Arc::new(NoLatency))
    }

    fn exists(&self, key: &str) -> bool {
        self.dir.root().join(key).exists()
    }
}

#[fixture]
fn state_dir() -> StateDir {
    StateDir {
        dir: TempStateDir::new().expect("temp state dir"),
        clock: Arc::new(MutableClock::at_clinic_opening()),
    }
}

#[rstest]
#[tokio::test]
async fn login_in_one_process_is_restored_in_the_next(state_dir: StateDir) {
    let first = state_dir.open_store();
    first.login(PATIENT_EMAIL, SECRET).await.expect("login");
    drop(first);

    let second = state_dir.open_store();
    assert!(second.restore().await);
    assert!(second.is_authenticated());
    let principal = second.verified_principal().expect("verified principal");
    assert_eq!(principal.email().as_ref(), PATIENT_EMAIL);
}

#[rstest]
#[tokio::test]
async fn profile_edits_persist_across_processes(state_dir: StateDir) {
    let first = state_dir.open_store();
    first.login(PATIENT_EMAIL, SECRET).await.expect("login");
    first
        .update_profile(ProfileUpdate::new().set("phone", json!("+1 (555) 000-1111")))
        .await
        .expect("update");
    drop(first);

    let second = state_dir.open_store();
    assert!(second.restore().await);
    let principal = second.current_principal().expect("principal");
    assert_eq!(principal.attribute("phone"), Some(&json!("+1 (555) 000-1111")));
}

#[rstest]
#[tokio::test]
async fn logout_removes_both_files(state_dir: StateDir) {
    let first = state_dir.open_store();
    first.login(PATIENT_EMAIL, SECRET).await.expect("login");
    assert!(state_dir.exists(TOKEN_KEY));
    assert!(state_dir.exists(PRINCIPAL_KEY));

    let second = state_dir.open_store();
    assert!(second.restore().await);
    second.logout().await;

    assert!(!state_dir.exists(TOKEN_KEY));
    assert!(!state_dir.exists(PRINCIPAL_KEY));
    assert!(!state_dir.open_store().restore().await);
}

#[rstest]
#[tokio::test]
async fn expired_files_are_cleared_on_restore(state_dir: StateDir) {
    let first = state_dir.open_store();
    first.login(PATIENT_EMAIL, SECRET).await.expect("login");
    drop(first);
    state_dir.clock.advance_hours(48);

    let second = state_dir.open_store();
    assert!(!second.restore().await);
    assert!(!state_dir.exists(TOKEN_KEY));
    assert!(!state_dir.exists(PRINCIPAL_KEY));
}

#[rstest]
#[tokio::test]
async fn tampered_token_file_is_discarded(state_dir: StateDir) {
    let first = state_dir.open_store();
    first.login(PATIENT_EMAIL, SECRET).await.expect("login");
    drop(first);
    std::fs::write(state_dir.dir.root().join(TOKEN_KEY), "garbage").expect("tamper");

    let second = state_dir.open_store();
    assert!(!second.is_authenticated());
    assert!(!state_dir.exists(PRINCIPAL_KEY));
}
