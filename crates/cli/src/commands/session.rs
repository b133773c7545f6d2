//! Admin session commands.
//!
//! Tokens are signed with `SITE_SESSION_SECRET`, so a minted token is only
//! accepted by servers sharing that secret.

use chrono::{Duration, Utc};
use folio_core::{AdminRole, SessionRecord, SessionUser};
use folio_site::config::{ConfigError, SiteConfig};
use folio_site::services::{SessionCodec, SessionState, SessionTokenError};
use thiserror::Error;

/// Errors that can occur during session commands.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, viewer")]
    InvalidRole(String),

    /// The token could not be produced or read.
    #[error(transparent)]
    Token(#[from] SessionTokenError),

    /// The record could not be printed.
    #[error("Could not render session record: {0}")]
    Render(#[from] serde_json::Error),
}

fn codec() -> Result<(SiteConfig, SessionCodec), SessionError> {
    let config = SiteConfig::from_env()?;
    let codec = SessionCodec::new(config.session_secret.clone());
    Ok((config, codec))
}

/// Mint a signed session token.
///
/// # Arguments
///
/// * `name` - Display name; `ADMIN_NAME` when `None`
/// * `role` - Role name (`admin` or `viewer`)
/// * `hours` - Lifetime from now; may be negative
///
/// # Errors
///
/// Returns an error if configuration is missing or the role is unknown.
pub fn mint(name: Option<&str>, role: &str, hours: i64) -> Result<String, SessionError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| SessionError::InvalidRole(role.to_owned()))?;
    let (config, codec) = codec()?;

    let user = SessionUser::new(name.unwrap_or(&config.admin.name), role);
    let record = SessionRecord::issue(user, Duration::hours(hours), Utc::now());
    tracing::info!(
        session_id = %record.id,
        role = %record.user.role,
        expires_at = %record.expires_at().map_or_else(|| "invalid".to_owned(), |t| t.to_rfc3339()),
        "Minted admin session"
    );

    Ok(codec.encode(&record)?)
}

/// Decode a token and print the record and how the guard would classify it.
///
/// # Errors
///
/// Returns an error if configuration is missing or the record cannot be
/// rendered. A token that fails verification is reported, not returned as an
/// error.
#[allow(clippy::print_stdout)]
pub fn inspect(token: &str) -> Result<(), SessionError> {
    let (_, codec) = codec()?;

    match codec.decode(token) {
        Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        Err(e) => println!("Token rejected: {e}"),
    }

    let state = match codec.classify(Some(token), Utc::now()) {
        SessionState::NoSession => "no session",
        SessionState::Valid(_) => "valid",
        SessionState::Expired => "expired (cookie would be cleared)",
        SessionState::Malformed => "malformed (cookie would be cleared)",
    };
    println!("Classification: {state}");
    Ok(())
}
