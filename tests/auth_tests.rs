//! Authentication and authorization integration tests
//!
//! Run with: cargo test --test auth_tests

use chrono::{Duration, TimeZone, Utc};
use demoyork::auth::{
    require, require_all, AuthError, AuthService, AuthorizationRequirement, Decision, DenyReason,
    DuplicateField, Pipeline, RequestContext, Role, SessionCodec, SignupCandidate, SignupPolicy,
    Step,
};
use demoyork::store::{seed_roles, CredentialStore, MemoryStore};
use demoyork::Error;
use std::sync::Arc;

fn codec() -> SessionCodec {
    SessionCodec::new(b"integration-secret", Duration::hours(1))
}

async fn service() -> (AuthService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    seed_roles(store.as_ref()).await.unwrap();
    let auth = AuthService::new(codec(), store.clone(), SignupPolicy::default(), 4);
    (auth, store)
}

fn candidate(username: &str, email: &str, role: &str) -> SignupCandidate {
    SignupCandidate {
        username: username.to_string(),
        email: email.to_string(),
        password: "s3cret-pass".to_string(),
        role: role.to_string(),
    }
}

fn expect_auth(err: Error) -> AuthError {
    match err {
        Error::Auth(auth) => auth,
        other => panic!("expected an auth error, got {:?}", other),
    }
}

// ============================================================================
// Session codec
// ============================================================================

#[test]
fn test_session_roundtrip_within_ttl() {
    let codec = codec();
    let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let token = codec.issue_at("user-42", issued).unwrap();

    for offset in [0, 1, 1800, 3599, 3600] {
        let now = issued + Duration::seconds(offset);
        assert_eq!(codec.parse_at(&token, now).unwrap(), "user-42");
    }
}

#[test]
fn test_session_expires_after_ttl() {
    let codec = codec();
    let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let token = codec.issue_at("user-42", issued).unwrap();

    let later = issued + Duration::seconds(3601);
    assert_eq!(
        codec.parse_at(&token, later).unwrap_err(),
        AuthError::ExpiredSession
    );
}

#[test]
fn test_session_from_other_secret_is_invalid() {
    let issued = Utc::now();
    let token = SessionCodec::new(b"another-secret", Duration::hours(1))
        .issue_at("user-42", issued)
        .unwrap();

    assert_eq!(
        codec().parse_at(&token, issued).unwrap_err(),
        AuthError::InvalidSession
    );
}

#[test]
fn test_tampered_session_is_invalid() {
    let codec = codec();
    let token = codec.issue("user-42").unwrap();

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    parts[1] = parts[1].chars().rev().collect();
    let tampered = parts.join(".");

    assert_eq!(codec.parse(&tampered).unwrap_err(), AuthError::InvalidSession);
    assert_eq!(codec.parse("").unwrap_err(), AuthError::InvalidSession);
    assert_eq!(
        codec.parse("definitely.not.ajwt").unwrap_err(),
        AuthError::InvalidSession
    );
}

#[test]
fn test_claims_carry_ttl() {
    let codec = codec();
    let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let token = codec.issue_at("abc", issued).unwrap();

    let claims = codec.parse_claims_at(&token, issued).unwrap();
    assert_eq!(claims.sub, "abc");
    assert_eq!(claims.exp - claims.iat, 3600);
}

// ============================================================================
// Authorization gate
// ============================================================================

#[test]
fn test_min_level_is_monotonic() {
    let roles = Role::seed();
    for threshold in 0..=6 {
        for role in &roles {
            let decision = require(&AuthorizationRequirement::min_level(threshold), role);
            assert_eq!(
                decision.is_allowed(),
                role.level >= threshold,
                "{} against level >= {}",
                role,
                threshold
            );
        }
    }
}

#[test]
fn test_named_role_ignores_level() {
    let superuser = Role::new("superuser", 99, "Not an admin by name");
    let decision = require(&AuthorizationRequirement::admin(), &superuser);

    assert_eq!(
        decision,
        Decision::Deny(DenyReason::WrongRole {
            required: "admin".to_string(),
            actual: "superuser".to_string(),
        })
    );
}

#[test]
fn test_require_all_is_a_conjunction() {
    let roles = Role::seed();
    let admin = roles.iter().find(|r| r.name == "admin").unwrap();
    let user = roles.iter().find(|r| r.name == "user").unwrap();
    let requirements = [
        AuthorizationRequirement::user_or_above(),
        AuthorizationRequirement::admin(),
    ];

    assert!(require_all(&requirements, admin).is_ok());
    assert!(matches!(
        require_all(&requirements, user),
        Err(AuthError::Forbidden(DenyReason::WrongRole { .. }))
    ));
    assert!(require_all(&[], user).is_ok());
}

// ============================================================================
// Pipelines
// ============================================================================

#[tokio::test]
async fn test_write_pipeline_resolves_then_gates() {
    let (auth, store) = service().await;
    let role = store.find_role_by_name("user").await.unwrap().unwrap();
    let alice = auth
        .create_account(&candidate("alice", "alice@example.com", "user"), &role)
        .await
        .unwrap();
    let token = auth.codec().issue(&alice.id).unwrap();

    let ctx = Pipeline::write(AuthorizationRequirement::user_or_above())
        .run(&auth, RequestContext::with_session(Some(token.clone())))
        .await
        .unwrap();
    assert_eq!(ctx.username(), "alice");
    assert_eq!(ctx.role.unwrap().level, 3);

    let err = Pipeline::write(AuthorizationRequirement::admin())
        .run(&auth, RequestContext::with_session(Some(token)))
        .await
        .unwrap_err();
    assert!(matches!(expect_auth(err), AuthError::Forbidden(_)));
}

#[tokio::test]
async fn test_pipeline_stops_at_first_failure() {
    let (auth, _store) = service().await;

    // No session: the gate never sees the request, so the failure is 401 not 403
    let err = Pipeline::write(AuthorizationRequirement::admin())
        .run(&auth, RequestContext::with_session(None))
        .await
        .unwrap_err();
    assert_eq!(expect_auth(err), AuthError::MissingSession);
}

#[tokio::test]
async fn test_gate_without_identity_fails_closed() {
    let (auth, _store) = service().await;
    let pipeline = Pipeline::new("gate-only").then(Step::require(AuthorizationRequirement::min_level(0)));

    let err = pipeline
        .run(&auth, RequestContext::default())
        .await
        .unwrap_err();
    assert_eq!(expect_auth(err), AuthError::MissingSession);
}

#[tokio::test]
async fn test_signup_pipeline_checks_duplicates_before_role() {
    let (auth, store) = service().await;
    let role = store.find_role_by_name("user").await.unwrap().unwrap();
    auth.create_account(&candidate("alice", "alice@example.com", "user"), &role)
        .await
        .unwrap();

    // Both the identity and the role are bad; the duplicate is reported
    let err = auth
        .sign_up(candidate("alice", "other@example.com", "wizard"))
        .await
        .unwrap_err();
    assert_eq!(expect_auth(err), AuthError::Conflict(DuplicateField::Username));
}

#[tokio::test]
async fn test_signup_role_allow_list() {
    let (auth, store) = service().await;

    let err = auth
        .sign_up(candidate("mallory", "mallory@example.com", "admin"))
        .await
        .unwrap_err();
    assert_eq!(
        expect_auth(err),
        AuthError::RoleNotSelfService("admin".to_string())
    );

    let (user, role) = auth
        .sign_up(candidate("carol", "carol@example.com", "user"))
        .await
        .unwrap();
    assert_eq!(role.name, "user");
    assert_eq!(user.role_id, role.id);
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn test_sign_in_does_not_reveal_which_part_failed() {
    let (auth, store) = service().await;
    let role = store.find_role_by_name("customer").await.unwrap().unwrap();
    auth.create_account(&candidate("bob", "bob@example.com", "customer"), &role)
        .await
        .unwrap();

    let wrong_password = expect_auth(auth.sign_in("bob", "nope").await.unwrap_err());
    let unknown_user = expect_auth(auth.sign_in("nobody", "nope").await.unwrap_err());
    assert_eq!(wrong_password, AuthError::InvalidCredentials);
    assert_eq!(wrong_password, unknown_user);

    let signed_in = auth.sign_in("bob", "s3cret-pass").await.unwrap();
    assert_eq!(auth.codec().parse(&signed_in.token).unwrap(), signed_in.user.id);
}
