//! Admin session guard.
//!
//! [`require_admin_session`] gates the admin routes on the `admin_session`
//! cookie. Every request is classified on its own; nothing is looked up
//! server-side.
//!
//! | cookie state | outcome |
//! |---|---|
//! | valid | request continues, record in extensions |
//! | absent | redirect to `/login` |
//! | expired | redirect to `/login`, cookie cleared |
//! | malformed | redirect to `/login`, cookie cleared |

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use folio_core::SessionRecord;

use crate::services::session::{SESSION_COOKIE_NAME, SESSION_TTL_HOURS, SessionState};
use crate::state::AppState;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login";

/// Middleware that only lets requests with a valid admin session through.
///
/// Apply with `axum::middleware::from_fn_with_state` on the admin router.
pub async fn require_admin_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session = state.sessions().classify(
        jar.get(SESSION_COOKIE_NAME).map(Cookie::value),
        Utc::now(),
    );

    match session {
        SessionState::Valid(record) => {
            tracing::Span::current().record("session_id", tracing::field::display(&record.id));
            request.extensions_mut().insert(record);
            next.run(request).await
        }
        SessionState::NoSession => Redirect::to(LOGIN_PATH).into_response(),
        SessionState::Expired => {
            tracing::info!(path = %request.uri().path(), "Admin session expired");
            (
                jar.remove(removal_cookie()),
                Redirect::to(&format!("{LOGIN_PATH}?error=expired")),
            )
                .into_response()
        }
        SessionState::Malformed => {
            tracing::warn!(path = %request.uri().path(), "Rejected malformed admin session");
            (jar.remove(removal_cookie()), Redirect::to(LOGIN_PATH)).into_response()
        }
    }
}

/// Extractor for the session record placed by [`require_admin_session`].
///
/// Redirects to the login page if the guard did not run.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(CurrentAdmin(session): CurrentAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", session.user.name)
/// }
/// ```
pub struct CurrentAdmin(pub SessionRecord);

impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionRecord>()
            .cloned()
            .map(Self)
            .ok_or_else(|| Redirect::to(LOGIN_PATH))
    }
}

/// Build the cookie carrying a freshly signed session token.
#[must_use]
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(SESSION_TTL_HOURS))
        .build()
}

/// Cookie handed to `CookieJar::remove` to clear the session.
///
/// Path must match [`session_cookie`] or browsers keep the original.
#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_removal_cookie_matches_path() {
        let cookie = removal_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.path(), Some("/"));
    }
}
