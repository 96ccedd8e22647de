//! Integration tests for the identity gateway against a real PostgreSQL
//! database. Each test creates an isolated temporary database.

use chrono::Utc;

use clarity_core::auth::{AuthError, AuthState, IdentityGateway, SessionConfig};
use clarity_test_utils::{create_test_db, drop_test_db};

fn session_config() -> SessionConfig {
    SessionConfig::new(b"gateway-test-secret".to_vec())
}

#[tokio::test]
async fn signup_establishes_a_session() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    let session = gateway.signup("alice@example.com", "hunter42").await.unwrap();
    assert_eq!(session.user.email, "alice@example.com");
    assert!(session.token.starts_with("clarity_st_"));

    // The gateway's auth stream resolves to the new identity.
    assert_eq!(
        gateway.current_state().user().map(|u| u.id),
        Some(session.user.id)
    );

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    gateway.signup("alice@example.com", "hunter42").await.unwrap();
    let err = gateway
        .signup("Alice@Example.com ", "different-pw")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailAlreadyInUse));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn login_with_correct_password_succeeds() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    let created = gateway.signup("alice@example.com", "hunter42").await.unwrap();
    let session = gateway.login("alice@example.com", "hunter42").await.unwrap();
    assert_eq!(session.user.id, created.user.id);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    gateway.signup("alice@example.com", "hunter42").await.unwrap();

    // Wrong password and unknown account produce the same error.
    let wrong_pw = gateway.login("alice@example.com", "wrong").await.unwrap_err();
    let unknown = gateway.login("nobody@example.com", "hunter42").await.unwrap_err();
    assert!(matches!(wrong_pw, AuthError::InvalidCredential));
    assert!(matches!(unknown, AuthError::InvalidCredential));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn weak_password_is_rejected_before_any_write() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool.clone(), session_config());

    let err = gateway.signup("alice@example.com", "12345").await.unwrap_err();
    assert!(matches!(err, AuthError::WeakPassword));

    let stored = clarity_db::queries::users::get_user_by_email(&pool, "alice@example.com")
        .await
        .unwrap();
    assert!(stored.is_none());

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn issued_token_authenticates_back_to_the_user() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    let session = gateway.signup("alice@example.com", "hunter42").await.unwrap();
    let user = gateway.authenticate(&session.token).await.unwrap();
    assert_eq!(user.id, session.user.id);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    let session = gateway.signup("alice@example.com", "hunter42").await.unwrap();
    let mut token = session.token.clone();
    token.push('0');

    let err = gateway.authenticate(&token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredential));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn token_for_deleted_user_is_rejected() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool.clone(), session_config());

    let session = gateway.signup("alice@example.com", "hunter42").await.unwrap();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(session.user.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = gateway.authenticate(&session.token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredential));

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn logout_publishes_signed_out() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    let mut rx = gateway.subscribe();
    assert_eq!(*rx.borrow(), AuthState::SignedOut);

    gateway.signup("alice@example.com", "hunter42").await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow().is_signed_in());

    gateway.logout();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), AuthState::SignedOut);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn created_at_is_server_assigned() {
    let (pool, db_name) = create_test_db().await;
    let gateway = IdentityGateway::new(pool, session_config());

    let before = Utc::now();
    let session = gateway.signup("alice@example.com", "hunter42").await.unwrap();
    let after = Utc::now();

    // Generous bounds: the database clock may drift slightly from ours.
    assert!(session.user.created_at >= before - chrono::Duration::minutes(5));
    assert!(session.user.created_at <= after + chrono::Duration::minutes(5));

    drop_test_db(&db_name).await;
}
