//! Behavioural coverage for the session store over in-memory adapters.
//!
//! These tests drive the public ports only, the way a dashboard view would,
//! and inspect the persistence mirror through the shared storage handle.

use chrono::TimeDelta;
use clinic_session::domain::ports::{
    PrincipalDirectory, SessionCommand, SessionQuery, SessionStorage,
};
use clinic_session::domain::{
    CredentialToken, ErrorCode, PRINCIPAL_KEY, ProfileUpdate, TOKEN_KEY, TokenClaims,
};
use clinic_session::test_support::fixtures::{PATIENT_EMAIL, SECRET, StoreHarness, clinic_store};
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> StoreHarness {
    clinic_store()
}

async fn logged_in(harness: StoreHarness) -> StoreHarness {
    harness
        .store
        .login(PATIENT_EMAIL, SECRET)
        .await
        .expect("fixture patient logs in");
    harness
}

#[rstest]
#[tokio::test]
async fn every_known_principal_can_log_in(harness: StoreHarness) {
    let principals = harness.directory.list().await.expect("list principals");
    assert!(!principals.is_empty());

    for principal in principals {
        let outcome = harness
            .store
            .login(principal.email().as_ref(), SECRET)
            .await
            .expect("login succeeds");
        let claims = outcome.token.decode().expect("token decodes");

        assert_eq!(claims.principal_id(), principal.id());
        assert!(claims.is_valid_at(harness.clock.utc()));
        assert_eq!(outcome.principal, principal);
    }
}

#[rstest]
#[case("nobody@wellness.clinic", SECRET)]
#[case(PATIENT_EMAIL, "wrong")]
#[case("  sarah.johnson@email.com\n", SECRET)]
#[case("SARAH.JOHNSON@email.com", SECRET)]
#[tokio::test]
async fn failed_login_leaves_persisted_state_alone(
    harness: StoreHarness,
    #[case] email: &str,
    #[case] password: &str,
) {
    let harness = logged_in(harness).await;
    let before = harness.storage.entries();

    let err = harness
        .store
        .login(email, password)
        .await
        .expect_err("login rejected");

    assert_eq!(err.code(), ErrorCode::InvalidCredentials);
    assert_eq!(harness.storage.entries(), before);
    assert!(harness.store.is_authenticated());
}

#[rstest]
#[tokio::test]
async fn fresh_store_is_not_authenticated(harness: StoreHarness) {
    assert!(!harness.store.is_authenticated());
    assert!(harness.store.current_principal().is_none());
    assert!(!harness.store.snapshot().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn logout_clears_memory_and_persistence(harness: StoreHarness) {
    let harness = logged_in(harness).await;

    harness.store.logout().await;
    harness.store.logout().await;

    assert!(!harness.store.is_authenticated());
    assert!(harness.storage.entries().is_empty());
    assert!(!harness.store.snapshot().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn expired_token_decodes_but_is_not_authenticated(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    let principal = harness.store.current_principal().expect("principal persisted");
    let past = harness.clock.utc() - TimeDelta::minutes(1);
    let expired = CredentialToken::encode(&TokenClaims::new(principal.id().clone(), past));
    assert!(expired.decode().is_ok());
    harness
        .storage
        .set(TOKEN_KEY, expired.as_str())
        .expect("overwrite token");

    assert!(!harness.store.is_authenticated());
    assert!(harness.storage.entries().is_empty());
    assert!(!harness.store.snapshot().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn tokens_expire_after_the_validity_window(harness: StoreHarness) {
    let harness = logged_in(harness).await;

    harness.clock.advance(TimeDelta::hours(24) - TimeDelta::milliseconds(1));
    assert!(harness.store.is_authenticated());

    harness.clock.advance(TimeDelta::milliseconds(1));
    assert!(!harness.store.is_authenticated());
}

#[rstest]
#[tokio::test]
async fn last_known_identity_outlives_verification(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    let principal = harness.store.verified_principal().expect("verified");

    // Expire the token without any read settling the state first.
    harness.clock.advance_hours(25);
    assert_eq!(harness.store.current_principal(), Some(principal));
    assert!(harness.store.verified_principal().is_none());
    assert!(harness.store.current_principal().is_none());
}

#[rstest]
#[tokio::test]
async fn renaming_keeps_every_other_field(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    let before = harness.store.current_principal().expect("principal");

    let updated = harness
        .store
        .update_profile(ProfileUpdate::new().set("name", json!("X")))
        .await
        .expect("update succeeds");

    let after = harness.store.current_principal().expect("principal");
    assert_eq!(updated, after);
    assert_eq!(after.name().as_ref(), "X");
    assert_eq!(after.id(), before.id());
    assert_eq!(after.email(), before.email());
    assert_eq!(after.role(), before.role());
    assert_eq!(after.attributes(), before.attributes());
    assert_eq!(
        harness.store.snapshot().current_principal(),
        Some(&after)
    );
}

#[rstest]
#[tokio::test]
async fn nested_preferences_are_replaced_wholesale(harness: StoreHarness) {
    let harness = logged_in(harness).await;

    let updated = harness
        .store
        .update_profile(ProfileUpdate::new().set("preferences", json!({"theme": "dark"})))
        .await
        .expect("update succeeds");

    assert_eq!(updated.attribute("preferences"), Some(&json!({"theme": "dark"})));
    assert_eq!(updated.attribute("constitution"), Some(&json!("Vata-Pitta")));

    let directory_copy = harness
        .directory
        .find_by_email(updated.email().as_ref())
        .await
        .expect("lookup")
        .expect("principal present");
    assert_eq!(directory_copy, updated);
}

#[rstest]
#[tokio::test]
async fn update_without_login_changes_nothing(harness: StoreHarness) {
    let err = harness
        .store
        .update_profile(ProfileUpdate::new().set("name", json!("X")))
        .await
        .expect_err("not logged in");

    assert_eq!(err.code(), ErrorCode::NotAuthenticated);
    assert!(harness.storage.entries().is_empty());
}

#[rstest]
#[tokio::test]
async fn invalid_merged_record_is_rejected(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    let before = harness.storage.entries();

    let err = harness
        .store
        .update_profile(ProfileUpdate::new().set("email", json!("")))
        .await
        .expect_err("empty email");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(harness.storage.entries(), before);
}

#[rstest]
#[case("name", json!("A".repeat(81)))]
#[case("email", json!("sarah"))]
#[tokio::test]
async fn free_form_core_values_are_accepted(
    harness: StoreHarness,
    #[case] key: &str,
    #[case] value: serde_json::Value,
) {
    let harness = logged_in(harness).await;

    let updated = harness
        .store
        .update_profile(ProfileUpdate::new().set(key, value.clone()))
        .await
        .expect("update succeeds");

    assert_eq!(updated.to_record().get(key), Some(&value));
    assert_eq!(harness.store.current_principal(), Some(updated));
}

#[rstest]
#[tokio::test]
async fn email_collision_names_the_conflicting_field(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    let before = harness.storage.entries();

    let err = harness
        .store
        .update_profile(ProfileUpdate::new().set("email", json!("admin@wellness.clinic")))
        .await
        .expect_err("email owned by admin1");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details(), Some(&json!({"field": "email"})));
    assert_eq!(harness.storage.entries(), before);
}

#[rstest]
#[tokio::test]
async fn login_round_trips_the_matched_identifier(harness: StoreHarness) {
    let matched = harness
        .directory
        .find_by_email(PATIENT_EMAIL)
        .await
        .expect("lookup")
        .expect("patient present");

    harness
        .store
        .login(PATIENT_EMAIL, SECRET)
        .await
        .expect("login succeeds");

    let current = harness.store.current_principal().expect("principal");
    assert_eq!(current.id(), matched.id());
    assert!(harness.storage.entries().contains_key(PRINCIPAL_KEY));
}

#[rstest]
#[tokio::test]
async fn restart_restores_a_live_session(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    let restarted = harness.restart();

    assert!(!restarted.snapshot().is_authenticated());
    assert!(restarted.is_authenticated());
    assert!(restarted.restore().await);
    assert!(restarted.snapshot().is_authenticated());
    assert_eq!(
        restarted.snapshot().current_principal().map(|p| p.id().to_string()),
        Some("user1".to_owned())
    );
}

#[rstest]
#[tokio::test]
async fn restart_after_expiry_clears_everything(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    harness.clock.advance_hours(30);
    let restarted = harness.restart();

    assert!(!restarted.restore().await);
    assert!(harness.storage.entries().is_empty());
    assert!(!restarted.snapshot().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn malformed_principal_entry_reads_as_absent(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    harness
        .storage
        .set(PRINCIPAL_KEY, "{not json")
        .expect("overwrite principal");

    assert!(harness.store.current_principal().is_none());
    assert!(harness.store.verified_principal().is_none());

    let restarted = harness.restart();
    assert!(!restarted.restore().await);
    assert!(harness.storage.entries().is_empty());
    assert!(!restarted.snapshot().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn orphaned_principal_is_discarded_on_restore(harness: StoreHarness) {
    let harness = logged_in(harness).await;
    harness.storage.remove(TOKEN_KEY).expect("drop token");
    let restarted = harness.restart();

    assert!(!restarted.restore().await);
    assert!(harness.storage.entries().is_empty());
}
