//! Contact form route handler.
//!
//! `POST /api/contact` validates the submission and sends the owner
//! notification and the submitter auto-reply through the mail relay.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::services::{ContactError, ContactForm};
use crate::state::AppState;

/// Response body for form submission, success or failure.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    /// Machine-readable failure kind (`validation`, `configuration`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub message: String,
    /// Address the visitor can write to when delivery failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl ContactResponse {
    /// A successful acknowledgement.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            message: message.into(),
            fallback: None,
        }
    }

    /// A failure of the given kind.
    #[must_use]
    pub fn failure(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(kind),
            message: message.into(),
            fallback: None,
        }
    }

    /// Attach a fallback contact address.
    #[must_use]
    pub fn with_fallback(mut self, fallback: String) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Submit the contact form.
///
/// POST /api/contact
///
/// Accepts JSON `{name, email, phone?, subject?, message}` (`service` is read
/// as `subject`). Missing or malformed fields are a 400; relay failures are a
/// 500 describing the failure kind.
#[instrument(skip_all, fields(email = tracing::field::Empty))]
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<ContactResponse>, ContactError> {
    let Json(form) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unreadable contact payload");
        ContactError::Validation("Request body must be a JSON contact form.".to_string())
    })?;

    let submission = form.validate()?;
    tracing::Span::current().record("email", tracing::field::display(&submission.email));

    let Some(dispatcher) = state.contact() else {
        return Err(ContactError::Configuration(
            "mail relay is not configured (set SMTP_HOST)".to_string(),
        ));
    };

    add_breadcrumb(
        "contact",
        "Submitted contact form",
        Some(&[("subject", submission.subject_or_default())]),
    );

    dispatcher.dispatch(&submission).await?;

    Ok(Json(ContactResponse::success(format!(
        "Thanks, {}! Your message has been sent and a confirmation is on its way to {}.",
        submission.name, submission.email
    ))))
}

/// Answer any method other than `POST` on the contact endpoint.
///
/// Same JSON shape as the other failures, with `Allow: POST`.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(ALLOW, HeaderValue::from_static("POST"))],
        Json(ContactResponse::failure(
            "method_not_allowed",
            "Contact submissions must be sent with POST.",
        )),
    )
        .into_response()
}
