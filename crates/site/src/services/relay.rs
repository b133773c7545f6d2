//! Outbound mail relay.
//!
//! The [`Relay`] trait is the seam between contact dispatch and SMTP. The
//! production implementation, [`SmtpRelay`], wraps lettre's async SMTP
//! transport; tests substitute a recording stub.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::RelayConfig;

/// SMTP reply codes that mean the relay refused our credentials.
const AUTH_FAILURE_CODES: &[&str] = &["530", "534", "535"];

/// Errors reported by a mail relay.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// The relay could not be reached or is misconfigured.
    #[error("relay connection failed: {0}")]
    Connection(String),

    /// The relay rejected the configured credentials.
    #[error("relay rejected credentials: {0}")]
    Authentication(String),

    /// The relay refused to accept a message.
    #[error("relay rejected message: {0}")]
    Rejected(String),
}

/// An outbound mail relay.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Check that the relay is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), RelayError>;

    /// Deliver one message.
    async fn send(&self, message: Message) -> Result<(), RelayError>;
}

/// SMTP relay backed by lettre.
#[derive(Clone)]
pub struct SmtpRelay {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpRelay {
    /// Build a relay from configuration.
    ///
    /// Port 465 uses implicit TLS; every other port upgrades with STARTTLS.
    /// No connection is opened here.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Connection`] if the TLS parameters for the host
    /// cannot be built.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| RelayError::Connection(e.to_string()))?;

        let mailer = builder
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            host: config.smtp_host.clone(),
        })
    }
}

#[async_trait]
impl Relay for SmtpRelay {
    async fn verify(&self) -> Result<(), RelayError> {
        match self.mailer.test_connection().await {
            Ok(true) => {
                tracing::debug!(host = %self.host, "SMTP relay verified");
                Ok(())
            }
            Ok(false) => Err(RelayError::Connection(format!(
                "{} did not accept the connection",
                self.host
            ))),
            Err(e) => Err(classify(&e, RelayError::Connection)),
        }
    }

    async fn send(&self, message: Message) -> Result<(), RelayError> {
        self.mailer
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| classify(&e, RelayError::Rejected))
    }
}

/// Sort an SMTP error into a [`RelayError`].
///
/// Credential rejections are recognized by reply code; everything else is
/// wrapped with `otherwise`.
fn classify(err: &SmtpError, otherwise: fn(String) -> RelayError) -> RelayError {
    let code = err.status().map(|code| code.to_string());
    if code
        .as_deref()
        .is_some_and(|code| AUTH_FAILURE_CODES.contains(&code))
    {
        return RelayError::Authentication(err.to_string());
    }
    otherwise(err.to_string())
}
