//! Admin area.
//!
//! The content management screens are disabled; the dashboard only confirms
//! who is signed in and when the session ends.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::middleware::CurrentAdmin;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    /// Session user's display name.
    pub name: String,
    /// Initials shown in the header badge.
    pub initials: String,
    pub session_id: String,
    /// Expiry, already formatted for display.
    pub expires_at: String,
}

/// Display the admin dashboard.
///
/// Only reachable through the session guard.
pub async fn dashboard(CurrentAdmin(session): CurrentAdmin) -> impl IntoResponse {
    let expires_at = session.expires_at().map_or_else(
        || "at an unknown time".to_string(),
        |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );

    DashboardTemplate {
        name: session.user.name,
        initials: session.user.initials,
        session_id: session.id.to_string(),
        expires_at,
    }
}
