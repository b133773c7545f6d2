//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Page handlers return `Result<T, AppError>`; the
//! contact API returns [`ContactError`], which renders as JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::routes::contact::ContactResponse;
use crate::services::{ContactError, SessionTokenError};

/// Application-level error type for page handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// A session token could not be produced.
    #[error("Session error: {0}")]
    Session(#[from] SessionTokenError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every variant is a server error: capture to Sentry
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Request error"
        );

        // Don't expose internal error details to clients
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        if !matches!(self, Self::Validation(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Contact dispatch failed"
            );
        }

        let (status, body) = match self {
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ContactResponse::failure("validation", message),
            ),
            // Operator-facing: the site owner is the one who sees this.
            Self::Configuration(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ContactResponse::failure(
                    "configuration",
                    format!("Email service configuration error: {detail}"),
                ),
            ),
            Self::Auth(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ContactResponse::failure(
                    "authentication",
                    "Email service authentication failed. Please try again later.",
                ),
            ),
            Self::Delivery { fallback, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ContactResponse::failure(
                    "delivery",
                    format!("Your message could not be delivered. Please email {fallback} directly."),
                )
                .with_fallback(fallback.into_inner()),
            ),
            Self::Compose(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ContactResponse::failure("internal", "Something went wrong. Please try again."),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for an admin session.
///
/// Call this after a successful login to associate errors with the session.
pub fn set_sentry_user(session_id: &impl ToString, name: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(session_id.to_string()),
            username: Some(name.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the session.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("contact", "Submitted contact form", Some(&[("subject", "Branding")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::Email;

    use super::*;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_session_error_hides_detail() {
        let err = AppError::from(SessionTokenError::BadSignature);
        assert_eq!(err.to_string(), "Session error: token signature does not match");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), b"Internal server error");
    }

    #[tokio::test]
    async fn test_contact_validation_is_400_json() {
        let response = ContactError::Validation("Name is required.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "validation");
        assert_eq!(body["message"], "Name is required.");
        assert!(body.get("fallback").is_none());
    }

    #[tokio::test]
    async fn test_contact_auth_hides_relay_detail() {
        let response =
            ContactError::Auth("535 5.7.8 user relay-user rejected".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["error"], "authentication");
        assert!(!body["message"].as_str().unwrap().contains("relay-user"));
    }

    #[tokio::test]
    async fn test_contact_delivery_carries_fallback() {
        let response = ContactError::Delivery {
            detail: "550 spam".to_string(),
            fallback: Email::parse("owner@folio.test").unwrap(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["error"], "delivery");
        assert_eq!(body["fallback"], "owner@folio.test");
    }

    #[tokio::test]
    async fn test_contact_configuration_includes_detail() {
        let response =
            ContactError::Configuration("connection refused".to_string()).into_response();
        let body = json_body(response).await;
        assert_eq!(body["error"], "configuration");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("connection refused")
        );
    }
}
