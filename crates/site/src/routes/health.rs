//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the mail relay before returning OK.
/// Returns 503 Service Unavailable if the relay is missing or unreachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(contact) = state.contact() else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };

    match contact.verify().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
