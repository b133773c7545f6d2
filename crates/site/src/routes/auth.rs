//! Admin login and logout.
//!
//! Login checks the configured admin password (hashed, constant-time) and,
//! on success, issues a signed `admin_session` cookie valid for 24 hours.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use folio_core::{AdminRole, SessionRecord, SessionUser};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{LOGIN_PATH, removal_cookie, session_cookie};
use crate::services::session::{SESSION_TTL_HOURS, password_matches};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(error_message),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let admin = &state.config().admin;

    if !password_matches(&form.password, &admin.password) {
        tracing::warn!("Admin login failed");
        return Ok(Redirect::to(&format!("{LOGIN_PATH}?error=credentials")).into_response());
    }

    let record = SessionRecord::issue(
        SessionUser::new(admin.name.clone(), AdminRole::Admin),
        Duration::hours(SESSION_TTL_HOURS),
        Utc::now(),
    );
    let token = state.sessions().encode(&record)?;

    set_sentry_user(&record.id, &record.user.name);
    tracing::info!(session_id = %record.id, "Admin session issued");

    let cookie = session_cookie(token, state.config().secure_cookies());
    Ok((jar.add(cookie), Redirect::to("/admin")).into_response())
}

/// Clear the session cookie and return to the login page.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    clear_sentry_user();
    (jar.remove(removal_cookie()), Redirect::to(LOGIN_PATH))
}

fn error_message(code: &str) -> String {
    match code {
        "credentials" => "Incorrect password.",
        "expired" => "Your session expired. Please sign in again.",
        _ => "Please sign in.",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_codes() {
        assert_eq!(error_message("credentials"), "Incorrect password.");
        assert!(error_message("expired").contains("expired"));
        assert_eq!(error_message("<script>"), "Please sign in.");
    }
}
