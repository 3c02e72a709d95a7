//! Integration tests for login, profile, logout and the role guard.

mod common;

use common::{bearer, jwt, Harness};
use finwatch_auth::{ApiRequest, AuthError, Role, SessionEvent, UserProfile};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_login(harness: &Harness, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "keeper@example.com", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh_token=r1; Path=/; HttpOnly")
                .set_body_json(json!({ "data": { "access_token": token } })),
        )
        .mount(&harness.server)
        .await;
}

async fn mount_profile(harness: &Harness, token: &str, role: &str) {
    Mock::given(method("GET"))
        .and(path("/api/auth/profile"))
        .and(header("authorization", bearer(token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 7,
                "email": "keeper@example.com",
                "username": "Tank Keeper",
                "role": role,
                "farm": "north pond"
            }
        })))
        .mount(&harness.server)
        .await;
}

#[tokio::test]
async fn test_login_stores_token_and_profile() {
    let harness = Harness::start().await;
    let token = jwt("login");
    mount_login(&harness, &token).await;
    mount_profile(&harness, &token, "admin").await;
    let mut events = harness.gateway.subscribe();

    let profile = harness
        .gateway
        .login("keeper@example.com", "hunter2")
        .await
        .unwrap();

    assert_eq!(profile.id, "7");
    assert_eq!(profile.role, Role::Admin);
    assert_eq!(profile.display_name(), "Tank Keeper");
    assert_eq!(profile.extra["farm"], "north pond");

    let credentials = harness.gateway.credentials();
    assert_eq!(credentials.load().as_deref(), Some(token.as_str()));
    assert_eq!(credentials.load_profile::<UserProfile>(), Some(profile));

    let status = harness.gateway.status();
    assert!(status.authenticated);
    assert!(!status.expired);

    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::LoggedIn {
            user_id: "7".to_string()
        }
    );
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Incorrect email or password" })),
        )
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    match harness.gateway.login("keeper@example.com", "wrong").await {
        Err(AuthError::InvalidCredentials(message)) => {
            assert_eq!(message, "Incorrect email or password")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(harness.gateway.credentials().load(), None);

    harness.server.verify().await;
}

#[tokio::test]
async fn test_login_server_error_is_status() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&harness.server)
        .await;

    let err = harness
        .gateway
        .login("keeper@example.com", "hunter2")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Status { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_login_with_malformed_token_stores_nothing() {
    let harness = Harness::start().await;
    mount_login(&harness, "not-a-jwt").await;

    let err = harness
        .gateway
        .login("keeper@example.com", "hunter2")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedToken(_)));
    assert_eq!(harness.gateway.credentials().load(), None);
}

#[tokio::test]
async fn test_refresh_sends_login_cookie() {
    let harness = Harness::start().await;
    let token = jwt("login");
    let refreshed = jwt("refreshed");
    mount_login(&harness, &token).await;
    mount_profile(&harness, &token, "user").await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(header("authorization", bearer(&token).as_str()))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(header("authorization", bearer(&refreshed).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(header("cookie", "refresh_token=r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "access_token": refreshed } })),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    harness
        .gateway
        .login("keeper@example.com", "hunter2")
        .await
        .unwrap();
    let response = harness.gateway.send(ApiRequest::get("/devices")).await.unwrap();
    assert_eq!(response.status(), 200);

    harness.server.verify().await;
}

#[tokio::test]
async fn test_logout_clears_local_state_even_if_backend_fails() {
    let harness = Harness::start().await;
    let token = jwt("t1");
    harness.gateway.credentials().save(&token);
    let mut events = harness.gateway.subscribe();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", bearer(&token).as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&harness.server)
        .await;

    harness.gateway.logout().await;

    assert_eq!(harness.gateway.credentials().load(), None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);

    harness.server.verify().await;
}

#[tokio::test]
async fn test_role_guard_after_login() {
    let harness = Harness::start().await;
    let token = jwt("login");
    mount_login(&harness, &token).await;
    mount_profile(&harness, &token, "user").await;

    assert!(matches!(
        harness.gateway.require_role(Role::User),
        Err(AuthError::NotLoggedIn)
    ));

    harness
        .gateway
        .login("keeper@example.com", "hunter2")
        .await
        .unwrap();

    assert!(harness.gateway.require_role(Role::User).is_ok());
    assert!(matches!(
        harness.gateway.require_role(Role::Admin),
        Err(AuthError::Forbidden {
            required: Role::Admin,
            actual: Role::User
        })
    ));

    harness.gateway.logout().await;
    assert!(matches!(
        harness.gateway.require_role(Role::User),
        Err(AuthError::NotLoggedIn)
    ));
}
