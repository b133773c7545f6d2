//! Mail relay commands.
//!
//! # Environment Variables
//!
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD` - Relay connection
//! - `SMTP_FROM` - Sender address
//! - `CONTACT_TO` - Owner address receiving the notification
//! - `SITE_NAME` - Used in the test message subjects (optional)
//!
//! Site and admin variables are not read, so these commands work on a
//! machine that only holds relay credentials.

use std::sync::Arc;

use folio_site::config::{ConfigError, RelayConfig, site_name_from_env};
use folio_site::services::{
    ContactDispatcher, ContactError, ContactForm, Relay, RelayError, SmtpRelay,
};
use thiserror::Error;

/// Errors that can occur during mail commands.
#[derive(Debug, Error)]
pub enum MailError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `SMTP_HOST` is not set.
    #[error("No mail relay configured (set SMTP_HOST)")]
    NotConfigured,

    /// The relay refused the connection or credentials.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Validation or dispatch of the sample submission failed.
    #[error(transparent)]
    Contact(#[from] ContactError),
}

fn load_relay() -> Result<(RelayConfig, Arc<dyn Relay>), MailError> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    let config = RelayConfig::from_env()?.ok_or(MailError::NotConfigured)?;
    tracing::info!(
        host = %config.smtp_host,
        port = config.smtp_port,
        implicit_tls = config.implicit_tls(),
        "Using mail relay"
    );
    let relay: Arc<dyn Relay> = Arc::new(SmtpRelay::new(&config)?);
    Ok((config, relay))
}

/// Connect to the relay and authenticate.
///
/// # Errors
///
/// Returns an error if configuration is missing or the relay refuses us.
pub async fn check() -> Result<(), MailError> {
    let (_, relay) = load_relay()?;
    relay.verify().await?;
    tracing::info!("Mail relay verified");
    Ok(())
}

/// Dispatch a sample submission from `email` through the contact path.
///
/// # Errors
///
/// Returns an error if configuration is missing, the address is invalid, or
/// either message fails to send.
pub async fn send_test(email: &str, name: &str) -> Result<(), MailError> {
    let (relay_config, relay) = load_relay()?;

    let submission = ContactForm {
        name: name.to_owned(),
        email: email.to_owned(),
        phone: None,
        subject: Some("Relay test".to_owned()),
        message: "This is a test submission sent by the folio CLI.".to_owned(),
    }
    .validate()?;

    let dispatcher = ContactDispatcher::new(
        relay,
        relay_config.from_address.clone(),
        relay_config.owner_address.clone(),
        site_name_from_env(),
    );
    dispatcher.dispatch(&submission).await?;

    tracing::info!(
        owner = %relay_config.owner_address,
        submitter = %submission.email,
        "Test notification and auto-reply sent"
    );
    Ok(())
}
