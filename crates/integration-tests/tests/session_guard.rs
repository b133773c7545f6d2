//! Integration tests for the admin session guard, login, and logout.
//!
//! Run with: cargo test -p folio-integration-tests --test `session_guard`

#![allow(clippy::unwrap_used)]

use axum::{body::Body, http::Request, http::StatusCode};
use chrono::Duration;
use folio_core::AdminRole;
use folio_integration_tests::{ADMIN_PASSWORD, TestContext, location, set_cookies};
use folio_site::testing::StubRelay;

fn admin_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/admin");
    if let Some(value) = cookie {
        builder = builder.header("cookie", format!("admin_session={value}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn login_request(password: &str) -> Request<Body> {
    Request::post("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(format!("password={password}")))
        .unwrap()
}

fn clears_session(response: &axum::http::Response<Body>) -> bool {
    set_cookies(response)
        .iter()
        .any(|c| c.starts_with("admin_session=") && c.contains("Max-Age=0"))
}

// ============================================================================
// Guard
// ============================================================================

#[tokio::test]
async fn test_no_cookie_redirects_without_clearing() {
    let ctx = TestContext::new(StubRelay::healthy());

    let response = ctx.send(admin_request(None)).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_valid_session_passes() {
    let ctx = TestContext::new(StubRelay::healthy());
    let token = TestContext::token(AdminRole::Admin, Duration::hours(1));

    let response = ctx.send(admin_request(Some(&token))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_expired_session_redirects_and_clears_cookie() {
    let ctx = TestContext::new(StubRelay::healthy());
    let token = TestContext::token(AdminRole::Admin, Duration::hours(-1));

    let response = ctx.send(admin_request(Some(&token))).await;

    assert!(response.status().is_redirection());
    assert!(location(&response).unwrap().starts_with("/login"));
    assert!(clears_session(&response));
}

#[tokio::test]
async fn test_garbage_cookie_redirects_and_clears_cookie() {
    let ctx = TestContext::new(StubRelay::healthy());

    let response = ctx.send(admin_request(Some("not-a-session"))).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));
    assert!(clears_session(&response));
}

#[tokio::test]
async fn test_forged_signature_is_malformed() {
    let ctx = TestContext::new(StubRelay::healthy());
    let token = TestContext::token(AdminRole::Admin, Duration::hours(1));
    let (payload, _) = token.split_once('.').unwrap();
    let forged = format!("{payload}.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");

    let response = ctx.send(admin_request(Some(&forged))).await;

    assert!(response.status().is_redirection());
    assert!(clears_session(&response));
}

#[tokio::test]
async fn test_viewer_role_is_refused() {
    let ctx = TestContext::new(StubRelay::healthy());
    let token = TestContext::token(AdminRole::Viewer, Duration::hours(1));

    let response = ctx.send(admin_request(Some(&token))).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));
    assert!(clears_session(&response));
}

#[tokio::test]
async fn test_public_routes_ignore_bad_cookie() {
    let ctx = TestContext::new(StubRelay::healthy());

    let request = Request::get("/health")
        .header("cookie", "admin_session=garbage")
        .body(Body::empty())
        .unwrap();
    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

// ============================================================================
// Login / logout
// ============================================================================

#[tokio::test]
async fn test_login_issues_usable_session() {
    let ctx = TestContext::new(StubRelay::healthy());

    let response = ctx.send(login_request(ADMIN_PASSWORD)).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/admin"));

    let cookie = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with("admin_session="))
        .expect("session cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=86400"));

    let token = cookie
        .trim_start_matches("admin_session=")
        .split(';')
        .next()
        .unwrap();
    let response = ctx.send(admin_request(Some(token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_redirects_with_error() {
    let ctx = TestContext::new(StubRelay::healthy());

    let response = ctx.send(login_request("wrong-password")).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login?error=credentials"));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let ctx = TestContext::new(StubRelay::healthy());

    let mut statuses = Vec::new();
    for _ in 0..8 {
        statuses.push(ctx.send(login_request("wrong-password")).await.status());
    }

    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::new(StubRelay::healthy());
    let token = TestContext::token(AdminRole::Admin, Duration::hours(1));

    let request = Request::post("/logout")
        .header("cookie", format!("admin_session={token}"))
        .body(Body::empty())
        .unwrap();
    let response = ctx.send(request).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/login"));
    assert!(clears_session(&response));
}
