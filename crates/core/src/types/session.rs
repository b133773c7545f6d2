//! Admin session record.
//!
//! The record lives entirely on the client, inside the `admin_session`
//! cookie. Nothing here touches storage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::id::SessionId;
use super::role::AdminRole;

/// Identity of the user a session was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Display name.
    pub name: String,
    /// Access role.
    pub role: AdminRole,
    /// Up to two upper-case initials derived from `name`.
    pub initials: String,
}

impl SessionUser {
    /// Create a session user, deriving initials from the name.
    #[must_use]
    pub fn new(name: impl Into<String>, role: AdminRole) -> Self {
        let name = name.into();
        let initials = initials_for(&name);
        Self {
            name,
            role,
            initials,
        }
    }
}

/// Session record as stored in the `admin_session` cookie.
///
/// `expires` is a Unix timestamp in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Who the session was issued to.
    pub user: SessionUser,
    /// Random ID, used to correlate logs and Sentry events.
    pub id: SessionId,
    /// Expiry, Unix epoch milliseconds.
    pub expires: i64,
}

impl SessionRecord {
    /// Issue a new record for `user`, valid for `ttl` from `now`.
    #[must_use]
    pub fn issue(user: SessionUser, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            user,
            id: SessionId::generate(),
            expires: (now + ttl).timestamp_millis(),
        }
    }

    /// Whether the record has expired at `now`.
    ///
    /// A record expiring exactly at `now` is expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now.timestamp_millis()
    }

    /// Whether the record grants admin access at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && self.user.role.can_access_admin()
    }

    /// Expiry as a `DateTime`, if the stored millis are in range.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires)
    }
}

fn initials_for(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn admin() -> SessionUser {
        SessionUser::new("ada lovelace", AdminRole::Admin)
    }

    #[test]
    fn test_initials() {
        assert_eq!(admin().initials, "AL");
        assert_eq!(SessionUser::new("Admin", AdminRole::Admin).initials, "A");
        assert_eq!(
            SessionUser::new("Grace Brewster Hopper", AdminRole::Admin).initials,
            "GB"
        );
        assert_eq!(SessionUser::new("   ", AdminRole::Admin).initials, "");
    }

    #[test]
    fn test_issue_sets_expiry() {
        let now = Utc::now();
        let record = SessionRecord::issue(admin(), Duration::hours(24), now);
        assert_eq!(
            record.expires,
            now.timestamp_millis() + 24 * 60 * 60 * 1000
        );
        assert!(record.is_valid_at(now));
    }

    #[test]
    fn test_expired_record_is_invalid() {
        let now = Utc::now();
        let record = SessionRecord::issue(admin(), Duration::minutes(5), now);
        assert!(record.is_expired_at(now + Duration::minutes(5)));
        assert!(!record.is_valid_at(now + Duration::minutes(6)));
    }

    #[test]
    fn test_viewer_is_never_valid() {
        let now = Utc::now();
        let user = SessionUser::new("Guest", AdminRole::Viewer);
        let record = SessionRecord::issue(user, Duration::hours(1), now);
        assert!(!record.is_expired_at(now));
        assert!(!record.is_valid_at(now));
    }

    #[test]
    fn test_json_shape() {
        let record = SessionRecord::issue(admin(), Duration::hours(1), Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["user"]["role"], "admin");
        assert_eq!(value["user"]["initials"], "AL");
        assert!(value["id"].is_string());
        assert!(value["expires"].is_i64());
    }
}
