//! Services backing the route handlers.
//!
//! - [`relay`] - SMTP relay seam and lettre implementation
//! - [`contact`] - Contact form validation and dual-message dispatch
//! - [`session`] - Signed admin session tokens

pub mod contact;
pub mod relay;
pub mod session;

pub use contact::{ContactDispatcher, ContactError, ContactForm, ContactSubmission};
pub use relay::{Relay, RelayError, SmtpRelay};
pub use session::{SESSION_COOKIE_NAME, SessionCodec, SessionState, SessionTokenError};
