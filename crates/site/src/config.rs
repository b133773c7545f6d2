//! Site configuration loaded from environment variables.
//!
//! Built once at process start and handed to [`AppState`](crate::state::AppState);
//! handlers never read the environment themselves.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SITE_BASE_URL` - Public URL for the site (https enables `Secure` cookies)
//! - `SITE_SESSION_SECRET` - Admin session signing secret (min 32 chars, high entropy)
//! - `ADMIN_PASSWORD` - Password accepted by `POST /login`
//!
//! ## Mail relay (all required once `SMTP_HOST` is set)
//! - `SMTP_HOST` - SMTP relay hostname; leave unset to disable the contact form
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM` - Sender address for both outgoing messages
//! - `CONTACT_TO` - Owner address that receives contact notifications
//!
//! ## Optional
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `SITE_NAME` - Site name used in email subjects (default: Folio)
//! - `ADMIN_NAME` - Display name for the admin session (default: Admin)
//! - `SMTP_PORT` - SMTP port (default: 587; 465 selects implicit TLS)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use folio_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Site name used when `SITE_NAME` is unset.
pub const DEFAULT_SITE_NAME: &str = "Folio";

/// Submission port used when `SMTP_PORT` is unset.
const DEFAULT_SMTP_PORT: u16 = 587;

/// Port on which SMTP relays expect implicit TLS (SMTPS).
pub const SMTPS_PORT: u16 = 465;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Site name used in email subjects and greetings
    pub site_name: String,
    /// Admin session signing secret
    pub session_secret: SecretString,
    /// Admin login configuration
    pub admin: AdminConfig,
    /// Outbound mail relay; `None` disables contact dispatch
    pub relay: Option<RelayConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Admin login configuration.
#[derive(Clone)]
pub struct AdminConfig {
    /// Display name placed in issued sessions
    pub name: String,
    /// Password accepted by the login form
    pub password: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("name", &self.name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the relay password.
#[derive(Clone)]
pub struct RelayConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Sender address (From header) for both messages
    pub from_address: Email,
    /// Owner address that receives contact notifications
    pub owner_address: Email,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("owner_address", &self.owner_address)
            .finish()
    }
}

impl RelayConfig {
    /// Whether the relay connection uses implicit TLS.
    ///
    /// Derived from the port: 465 means SMTPS, anything else upgrades
    /// with STARTTLS.
    #[must_use]
    pub const fn implicit_tls(&self) -> bool {
        self.smtp_port == SMTPS_PORT
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SITE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SITE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SITE_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_BASE_URL".to_string(), e.to_string()))?;
        let session_secret = get_validated_secret("SITE_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SITE_SESSION_SECRET")?;

        let admin = AdminConfig::from_env()?;
        let relay = RelayConfig::from_env()?;
        if relay.is_none() {
            tracing::warn!("SMTP_HOST not set; contact form submissions will be rejected");
        }

        Ok(Self {
            host,
            port,
            base_url,
            site_name: site_name_from_env(),
            session_secret,
            admin,
            relay,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            name: get_env_or_default("ADMIN_NAME", "Admin"),
            password: get_validated_secret("ADMIN_PASSWORD")?,
        })
    }
}

impl RelayConfig {
    /// Load only the relay section from environment variables.
    ///
    /// Needs none of the site or admin variables, so mail tooling can run
    /// with just the `SMTP_*` and `CONTACT_TO` settings. Returns `None` when
    /// `SMTP_HOST` is unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SMTP_HOST` is set but another relay
    /// variable is missing or invalid.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the relay section from any key/value source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = lookup("SMTP_HOST").filter(|v| !v.trim().is_empty()) else {
            return Ok(None);
        };
        let required = |key: &str| {
            lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let email = |key: &str| {
            let value = required(key)?;
            Email::parse(value.trim())
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        };

        let smtp_port = lookup("SMTP_PORT")
            .unwrap_or_else(|| DEFAULT_SMTP_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        // Relay passwords are issued by the provider, so they skip the entropy check.
        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username: required("SMTP_USERNAME")?,
            smtp_password: SecretString::from(required("SMTP_PASSWORD")?),
            from_address: email("SMTP_FROM")?,
            owner_address: email("CONTACT_TO")?,
        }))
    }
}

/// Site name from `SITE_NAME`, or [`DEFAULT_SITE_NAME`].
#[must_use]
pub fn site_name_from_env() -> String {
    get_env_or_default("SITE_NAME", DEFAULT_SITE_NAME)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
