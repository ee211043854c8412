//! Login throttling, session lifetime and the admin guard over HTTP.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Duration;
use common::{TestApp, ADMIN_PASS, ADMIN_USER};

#[tokio::test]
async fn login_returns_a_token_the_guard_accepts() {
    let app = TestApp::new();
    let token = app.login().await;
    assert_eq!(token.len(), 48);

    let (status, body) = app.delete("/api/events/1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn credentials_are_trimmed() {
    let app = TestApp::new();
    let (status, body) = app
        .login_from("10.0.0.2", &format!("  {ADMIN_USER} "), &format!("{ADMIN_PASS}\n"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn wrong_password_is_unauthorized_with_a_json_error() {
    let app = TestApp::new();
    let (status, body) = app.login_from("10.0.0.3", ADMIN_USER, "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn eleventh_attempt_in_the_window_is_throttled() {
    let app = TestApp::new();
    for _ in 0..10 {
        let (status, _) = app.login_from("203.0.113.9", ADMIN_USER, "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = app.login_from("203.0.113.9", ADMIN_USER, ADMIN_PASS).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());

    // Other clients keep their own budget.
    let (status, _) = app.login_from("198.51.100.1", ADMIN_USER, ADMIN_PASS).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::minutes(10) + Duration::seconds(1));
    let (status, _) = app.login_from("203.0.113.9", ADMIN_USER, ADMIN_PASS).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn guarded_routes_need_a_bearer_token() {
    let app = TestApp::new();

    let (status, body) = app.delete("/api/events/1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.delete("/api/announcements/1", Some("not-a-session")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_expires_after_twelve_hours() {
    let app = TestApp::new();
    let token = app.login().await;

    app.clock.advance(Duration::hours(12));
    let (status, _) = app.delete("/api/events/1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::seconds(1));
    let (status, body) = app.delete("/api/events/1", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("expired"));

    // Evicted on the first look; now it is simply unknown.
    let (status, body) = app.delete("/api/events/1", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!body["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn logout_revokes_and_always_succeeds() {
    let app = TestApp::new();
    let token = app.login().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/logout")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, _) = app.delete("/api/events/1", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let anonymous = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/logout")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(anonymous).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn malformed_login_body_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_is_plain_ok() {
    let app = TestApp::new();
    let (status, bytes) = app
        .send_raw(Request::get("/api/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"ok");
}
