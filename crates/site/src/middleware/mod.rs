//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request span with `request_id` and `session_id` fields)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Route-level: session guard on `/admin`, rate limiting on `POST /login`

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session_guard;

pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session_guard::{
    CurrentAdmin, LOGIN_PATH, removal_cookie, require_admin_session, session_cookie,
};
