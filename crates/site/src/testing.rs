//! Test doubles shared by unit and integration tests.
//!
//! Enabled for this crate's own tests and, for other crates, through the
//! `testing` feature.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use lettre::Message;

use crate::services::relay::{Relay, RelayError};

/// A message captured by [`StubRelay`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Envelope recipients.
    pub to: Vec<String>,
    /// Full RFC 5322 text as it would go on the wire.
    pub raw: String,
}

/// Relay that records messages instead of delivering them.
#[derive(Debug)]
pub struct StubRelay {
    verify_error: Option<RelayError>,
    send_error: Option<RelayError>,
    sent: Mutex<Vec<SentMessage>>,
}

impl StubRelay {
    /// A relay that verifies and accepts every message.
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            verify_error: None,
            send_error: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A relay whose `verify` fails with `err`.
    #[must_use]
    pub const fn failing_verify(err: RelayError) -> Self {
        Self {
            verify_error: Some(err),
            send_error: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A relay that verifies but rejects every message with `err`.
    #[must_use]
    pub const fn failing_send(err: RelayError) -> Self {
        Self {
            verify_error: None,
            send_error: Some(err),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Relay for StubRelay {
    async fn verify(&self) -> Result<(), RelayError> {
        self.verify_error.clone().map_or(Ok(()), Err)
    }

    async fn send(&self, message: Message) -> Result<(), RelayError> {
        if let Some(err) = &self.send_error {
            return Err(err.clone());
        }

        let to = message
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage { to, raw });
        Ok(())
    }
}
