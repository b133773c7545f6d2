//! Integration tests for Folio.
//!
//! Tests drive the full site router in-process with `tower::ServiceExt`, so
//! no server, relay, or network is needed. Outbound mail goes to a
//! [`StubRelay`] that records what would have been sent.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p folio-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `contact_api` - `POST /api/contact` validation, dispatch, and failures
//! - `session_guard` - Admin cookie classification, login, and logout

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use chrono::{Duration, Utc};
use folio_core::{AdminRole, Email, SessionRecord, SessionUser};
use folio_site::config::{AdminConfig, RelayConfig, SiteConfig};
use folio_site::routes;
use folio_site::services::SessionCodec;
use folio_site::state::AppState;
use folio_site::testing::StubRelay;
use secrecy::SecretString;
use tower::ServiceExt;

pub use folio_site::testing::SentMessage;

/// Signing secret shared by the test config and [`TestContext::token`].
pub const SESSION_SECRET: &str = "Zq8#vN2!kR5@wT9$mB3^xL6&pF1*hD4%";

/// Admin password accepted by the test config.
pub const ADMIN_PASSWORD: &str = "Gx7!pW3#rQ9$zK1@";

/// Address that receives contact notifications.
pub const OWNER_ADDRESS: &str = "owner@folio.test";

/// Address both messages are sent from.
pub const FROM_ADDRESS: &str = "noreply@folio.test";

/// Site configuration with a relay section pointing nowhere.
#[must_use]
pub fn test_config() -> SiteConfig {
    SiteConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        site_name: "Folio".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        admin: AdminConfig {
            name: "Site Owner".to_string(),
            password: SecretString::from(ADMIN_PASSWORD),
        },
        relay: Some(RelayConfig {
            smtp_host: "smtp.folio.test".to_string(),
            smtp_port: 587,
            smtp_username: "relay-user".to_string(),
            smtp_password: SecretString::from("relay-password"),
            from_address: Email::parse(FROM_ADDRESS).unwrap(),
            owner_address: Email::parse(OWNER_ADDRESS).unwrap(),
        }),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A router wired to a [`StubRelay`].
pub struct TestContext {
    pub relay: Arc<StubRelay>,
    app: Router,
}

impl TestContext {
    /// Build the app around `relay` with [`test_config`].
    #[must_use]
    pub fn new(relay: StubRelay) -> Self {
        Self::with_config(test_config(), relay)
    }

    /// Build the app around `relay` with a custom config.
    #[must_use]
    pub fn with_config(config: SiteConfig, relay: StubRelay) -> Self {
        let relay = Arc::new(relay);
        let state = AppState::with_relay(config, relay.clone());
        Self {
            relay,
            app: routes::app(state),
        }
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Sign a session for `role` that expires `ttl` from now.
    #[must_use]
    pub fn token(role: AdminRole, ttl: Duration) -> String {
        let record = SessionRecord::issue(SessionUser::new("Site Owner", role), ttl, Utc::now());
        SessionCodec::new(SecretString::from(SESSION_SECRET))
            .encode(&record)
            .unwrap()
    }
}

/// Build a JSON `POST` request.
#[must_use]
pub fn json_post(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}

/// All `Set-Cookie` header values.
#[must_use]
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_owned))
        .collect()
}
