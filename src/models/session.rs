//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Login session; `id` is the opaque token carried in the `session` cookie
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// New session for `user_id` with a random token, valid for `ttl`
    pub fn new(user_id: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Seconds until expiry, clamped at zero; used for the cookie Max-Age
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_valid() {
        let session = Session::new(1, Duration::days(7));
        assert!(!session.is_expired());
        assert!(session.remaining_secs() > 6 * 24 * 3600);
        assert_eq!(session.id.len(), 36);
    }

    #[test]
    fn test_expired_session() {
        let session = Session::new(1, Duration::seconds(-5));
        assert!(session.is_expired());
        assert_eq!(session.remaining_secs(), 0);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = Session::new(1, Duration::days(1));
        let b = Session::new(1, Duration::days(1));
        assert_ne!(a.id, b.id);
    }
}
