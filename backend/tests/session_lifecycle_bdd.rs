//! Behaviour tests for the clinic session lifecycle.
//!
//! These scenarios walk a patient through login, restart, profile edits,
//! expiry, and logout against the in-memory adapters.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::RefCell;

use clinic_session::domain::ports::{SessionCommand, SessionQuery};
use clinic_session::domain::{Error, ProfileUpdate};
use clinic_session::test_support::fixtures::{PATIENT_EMAIL, StoreHarness, clinic_store};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

struct SessionWorld {
    runtime: Runtime,
    harness: RefCell<StoreHarness>,
    last_error: RefCell<Option<Error>>,
}

impl SessionWorld {
    fn new() -> Self {
        Self {
            runtime: Runtime::new().expect("tokio runtime should initialize"),
            harness: RefCell::new(clinic_store()),
            last_error: RefCell::new(None),
        }
    }

    fn record<T>(&self, result: Result<T, Error>) {
        *self.last_error.borrow_mut() = result.err();
    }

    fn login(&self, password: &str) {
        let harness = self.harness.borrow();
        let result = self
            .runtime
            .block_on(harness.store.login(PATIENT_EMAIL, password));
        self.record(result);
    }
}

#[fixture]
fn world() -> SessionWorld {
    SessionWorld::new()
}

#[given("a clinic session store")]
fn a_clinic_session_store(world: &SessionWorld) {
    assert!(!world.harness.borrow().store.is_authenticated());
}

#[given("the patient has logged in")]
fn the_patient_has_logged_in(world: &SessionWorld) {
    world.login("password123");
    assert!(world.last_error.borrow().is_none(), "fixture login failed");
}

#[when("the patient logs in with password {password}")]
fn the_patient_logs_in_with_password(world: &SessionWorld, password: String) {
    world.login(&password);
}

#[when("the dashboard restarts and restores the session")]
fn the_dashboard_restarts(world: &SessionWorld) {
    let mut harness = world.harness.borrow_mut();
    let restarted = harness.restart();
    harness.store = restarted;
    let restored = world.runtime.block_on(harness.store.restore());
    assert!(restored, "restore should find the persisted session");
}

#[when("{hours} hours pass")]
fn hours_pass(world: &SessionWorld, hours: i64) {
    world.harness.borrow().clock.advance_hours(hours);
}

#[when("the patient switches to the dark theme")]
fn the_patient_switches_to_the_dark_theme(world: &SessionWorld) {
    let harness = world.harness.borrow();
    let update = ProfileUpdate::new().set("preferences", json!({"theme": "dark"}));
    let result = world.runtime.block_on(harness.store.update_profile(update));
    world.record(result);
}

#[when("the patient logs out")]
fn the_patient_logs_out(world: &SessionWorld) {
    let harness = world.harness.borrow();
    world.runtime.block_on(harness.store.logout());
}

#[then("the session is authenticated")]
fn the_session_is_authenticated(world: &SessionWorld) {
    assert!(world.harness.borrow().store.is_authenticated());
}

#[then("the session is not authenticated")]
fn the_session_is_not_authenticated(world: &SessionWorld) {
    assert!(!world.harness.borrow().store.is_authenticated());
}

#[then("the current principal is {id}")]
fn the_current_principal_is(world: &SessionWorld, id: String) {
    let principal = world
        .harness
        .borrow()
        .store
        .current_principal()
        .expect("principal should be persisted");
    assert_eq!(principal.id().as_ref(), id);
}

#[then("the in-memory session belongs to {id}")]
fn the_in_memory_session_belongs_to(world: &SessionWorld, id: String) {
    let snapshot = world.harness.borrow().store.snapshot();
    assert!(snapshot.is_authenticated());
    let principal = snapshot
        .current_principal()
        .expect("principal should be held in memory");
    assert_eq!(principal.id().as_ref(), id);
}

#[then("the in-memory session is empty")]
fn the_in_memory_session_is_empty(world: &SessionWorld) {
    let snapshot = world.harness.borrow().store.snapshot();
    assert!(!snapshot.is_authenticated());
    assert!(snapshot.current_principal().is_none());
    assert!(snapshot.token().is_none());
}

#[then("the last call failed with {code}")]
fn the_last_call_failed_with(world: &SessionWorld, code: String) {
    let error = world.last_error.borrow();
    let error = error.as_ref().expect("the last call should have failed");
    let actual = serde_json::to_value(error.code()).expect("error code serializes");
    assert_eq!(actual, Value::String(code));
}

#[then("nothing is persisted")]
fn nothing_is_persisted(world: &SessionWorld) {
    assert!(world.harness.borrow().storage.entries().is_empty());
}

#[then("the preferences only hold the dark theme")]
fn the_preferences_only_hold_the_dark_theme(world: &SessionWorld) {
    assert!(world.last_error.borrow().is_none(), "update should succeed");
    let principal = world
        .harness
        .borrow()
        .store
        .current_principal()
        .expect("principal should be persisted");
    assert_eq!(
        principal.attribute("preferences"),
        Some(&json!({"theme": "dark"}))
    );
}

#[then("the constitution is still {constitution}")]
fn the_constitution_is_still(world: &SessionWorld, constitution: String) {
    let principal = world
        .harness
        .borrow()
        .store
        .current_principal()
        .expect("principal should be persisted");
    assert_eq!(
        principal.attribute("constitution"),
        Some(&Value::String(constitution))
    );
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Patient signs in with the shared secret"
)]
fn patient_signs_in_with_the_shared_secret(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Wrong password leaves the session untouched"
)]
fn wrong_password_leaves_the_session_untouched(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Session survives a restart"
)]
fn session_survives_a_restart(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Expired token signs the patient out"
)]
fn expired_token_signs_the_patient_out(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Switching theme replaces the whole preferences object"
)]
fn switching_theme_replaces_the_whole_preferences_object(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Profile edits require a session"
)]
fn profile_edits_require_a_session(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Logout clears the persisted session"
)]
fn logout_clears_the_persisted_session(world: SessionWorld) {
    drop(world);
}
