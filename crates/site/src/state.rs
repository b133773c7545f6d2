//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::services::{ContactDispatcher, Relay, RelayError, SessionCodec, SmtpRelay};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, the session codec, and the contact dispatcher.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    sessions: SessionCodec,
    contact: Option<ContactDispatcher>,
}

impl AppState {
    /// Create application state, connecting contact dispatch to the SMTP
    /// relay described in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be built.
    pub fn new(config: SiteConfig) -> Result<Self, RelayError> {
        let relay: Option<Arc<dyn Relay>> = match &config.relay {
            Some(relay_config) => Some(Arc::new(SmtpRelay::new(relay_config)?)),
            None => None,
        };
        Ok(Self::build(config, relay))
    }

    /// Create application state around an existing relay.
    ///
    /// The relay is ignored when `config.relay` is `None`, since the sender
    /// and owner addresses come from there.
    #[must_use]
    pub fn with_relay(config: SiteConfig, relay: Arc<dyn Relay>) -> Self {
        Self::build(config, Some(relay))
    }

    fn build(config: SiteConfig, relay: Option<Arc<dyn Relay>>) -> Self {
        let contact = config
            .relay
            .as_ref()
            .zip(relay)
            .map(|(relay_config, relay)| {
                ContactDispatcher::new(
                    relay,
                    relay_config.from_address.clone(),
                    relay_config.owner_address.clone(),
                    config.site_name.clone(),
                )
            });
        let sessions = SessionCodec::new(config.session_secret.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                contact,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the admin session codec.
    #[must_use]
    pub fn sessions(&self) -> &SessionCodec {
        &self.inner.sessions
    }

    /// Get the contact dispatcher, if a mail relay is configured.
    #[must_use]
    pub fn contact(&self) -> Option<&ContactDispatcher> {
        self.inner.contact.as_ref()
    }
}
