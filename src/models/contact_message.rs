//! Contact form submissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A visitor inquiry. Immutable once stored.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Contact form fields as posted by the browser
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactMessageInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: String,
}
