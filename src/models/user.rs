//! Admin user model

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Administrator account.
///
/// The password is only ever held as an Argon2id PHC string; see
/// `services::password`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build an unsaved user from an already hashed password
    pub fn new(username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}
