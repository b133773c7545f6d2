//! Signed admin session tokens.
//!
//! The `admin_session` cookie carries the whole [`SessionRecord`]; no
//! server-side table exists. To stop clients from forging a record, the
//! cookie value is signed:
//!
//! ```text
//! base64url(json(record)) "." base64url(hmac_sha256(secret, base64url(json(record))))
//! ```
//!
//! Tokens minted by a client without the secret fail verification and are
//! treated as malformed.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use folio_core::SessionRecord;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie holding the admin session.
pub const SESSION_COOKIE_NAME: &str = "admin_session";

/// Lifetime of a freshly issued session, in hours.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Errors decoding a session token.
#[derive(Debug, Error)]
pub enum SessionTokenError {
    /// The token has no `.` separating payload and signature.
    #[error("token is missing its signature")]
    MissingSignature,

    /// A token segment is not valid base64url.
    #[error("token encoding is invalid: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The signature does not match the payload.
    #[error("token signature does not match")]
    BadSignature,

    /// The payload is not a session record.
    #[error("token payload is invalid: {0}")]
    Payload(#[from] serde_json::Error),

    /// The signing key was refused by the MAC.
    #[error("signing key rejected: {0}")]
    Key(#[from] hmac::digest::InvalidLength),
}

/// Classification of an incoming request's session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No `admin_session` cookie was sent.
    NoSession,
    /// The record verifies, is unexpired, and carries the admin role.
    Valid(SessionRecord),
    /// The record verifies but its expiry has passed.
    Expired,
    /// The token could not be decoded, was not signed by us, or does not
    /// grant admin access.
    Malformed,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct SessionCodec {
    secret: SecretString,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SessionCodec {
    /// Create a codec keyed with the session signing secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Serialize and sign a record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionTokenError::Payload`] if the record cannot be
    /// serialized, or [`SessionTokenError::Key`] if the secret is unusable.
    pub fn encode(&self, record: &SessionRecord) -> Result<String, SessionTokenError> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(record)?);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify and deserialize a token.
    ///
    /// The signature is checked in constant time before the payload is
    /// parsed.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionTokenError`] describing why the token was refused.
    pub fn decode(&self, token: &str) -> Result<SessionRecord, SessionTokenError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or(SessionTokenError::MissingSignature)?;

        let signature = URL_SAFE_NO_PAD.decode(signature)?;
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| SessionTokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Classify a cookie value at `now`.
    #[must_use]
    pub fn classify(&self, cookie: Option<&str>, now: DateTime<Utc>) -> SessionState {
        let Some(token) = cookie else {
            return SessionState::NoSession;
        };

        let record = match self.decode(token) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected admin session token");
                return SessionState::Malformed;
            }
        };

        if record.is_expired_at(now) {
            return SessionState::Expired;
        }

        if !record.is_valid_at(now) {
            tracing::debug!(role = %record.user.role, "Session role cannot access admin");
            return SessionState::Malformed;
        }

        SessionState::Valid(record)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, SessionTokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

/// Compare a submitted password with the configured one.
///
/// Both sides are hashed first so the comparison is fixed-length and its
/// timing reveals neither content nor length.
#[must_use]
pub fn password_matches(candidate: &str, expected: &SecretString) -> bool {
    let candidate = Sha256::digest(candidate.as_bytes());
    let expected = Sha256::digest(expected.expose_secret().as_bytes());
    candidate.as_slice().ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use folio_core::{AdminRole, SessionUser};

    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new(SecretString::from("k3Y!9vQ#2mZ@7pL$4xW^8nR&1tB*6cH%"))
    }

    fn record(role: AdminRole, ttl: Duration) -> SessionRecord {
        SessionRecord::issue(SessionUser::new("Site Owner", role), ttl, Utc::now())
    }

    #[test]
    fn test_encode_then_decode() {
        let original = record(AdminRole::Admin, Duration::hours(1));
        let token = codec().encode(&original).unwrap();
        assert_eq!(codec().decode(&token).unwrap(), original);
    }

    #[test]
    fn test_decode_rejects_other_key() {
        let token = codec()
            .encode(&record(AdminRole::Admin, Duration::hours(1)))
            .unwrap();
        let other = SessionCodec::new(SecretString::from("a-different-signing-key-entirely"));
        assert!(matches!(
            other.decode(&token),
            Err(SessionTokenError::BadSignature)
        ));
    }

    #[test]
    fn test_decode_rejects_tampered_payload() {
        let token = codec()
            .encode(&record(AdminRole::Viewer, Duration::hours(1)))
            .unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = record(AdminRole::Admin, Duration::hours(1));
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{forged_payload}.{signature}");

        assert!(matches!(
            codec().decode(&forged_token),
            Err(SessionTokenError::BadSignature)
        ));
    }

    #[test]
    fn test_decode_rejects_unsigned_json() {
        let json = serde_json::to_string(&record(AdminRole::Admin, Duration::hours(1))).unwrap();
        assert!(matches!(
            codec().decode(&json),
            Err(SessionTokenError::MissingSignature | SessionTokenError::Encoding(_))
        ));
    }

    #[test]
    fn test_classify_states() {
        let codec = codec();
        let now = Utc::now();

        assert_eq!(codec.classify(None, now), SessionState::NoSession);
        assert_eq!(codec.classify(Some("garbage"), now), SessionState::Malformed);

        let valid = record(AdminRole::Admin, Duration::hours(1));
        let token = codec.encode(&valid).unwrap();
        assert_eq!(
            codec.classify(Some(&token), now),
            SessionState::Valid(valid)
        );

        let expired = record(AdminRole::Admin, Duration::hours(-1));
        let token = codec.encode(&expired).unwrap();
        assert_eq!(codec.classify(Some(&token), now), SessionState::Expired);

        let viewer = record(AdminRole::Viewer, Duration::hours(1));
        let token = codec.encode(&viewer).unwrap();
        assert_eq!(codec.classify(Some(&token), now), SessionState::Malformed);
    }

    #[test]
    fn test_codec_debug_redacts_secret() {
        let debug_output = format!("{:?}", codec());
        assert!(!debug_output.contains("k3Y!"));
    }

    #[test]
    fn test_password_matches() {
        let expected = SecretString::from("Gx7!pW3#rQ9$zK1@");
        assert!(password_matches("Gx7!pW3#rQ9$zK1@", &expected));
        assert!(!password_matches("Gx7!pW3#rQ9$zK1!", &expected));
        assert!(!password_matches("Gx7!", &expected));
        assert!(!password_matches("", &expected));
    }
}
