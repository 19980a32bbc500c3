//! Contact message repository
//!
//! Messages are append-only: the site only ever inserts and lists them.

use crate::config::DatabaseDriver;
use crate::db::{require_mysql, require_sqlite, DynDatabasePool};
use crate::models::ContactMessage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const LIST_SQL: &str = r#"
    SELECT id, name, email, company, message, created_at
    FROM contact_messages
    ORDER BY created_at DESC, id DESC
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO contact_messages (name, email, company, message, created_at)
    VALUES (?, ?, ?, ?, ?)
"#;

#[async_trait]
pub trait ContactMessageRepository: Send + Sync {
    /// Persist a message; `id` on the argument is ignored
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage>;

    /// All messages, newest first
    async fn list(&self) -> Result<Vec<ContactMessage>>;
}

pub struct SqlxContactMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxContactMessageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactMessageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactMessageRepository for SqlxContactMessageRepository {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(require_sqlite(&self.pool)?, message).await,
            DatabaseDriver::Mysql => create_mysql(require_mysql(&self.pool)?, message).await,
        }
    }

    async fn list(&self) -> Result<Vec<ContactMessage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(LIST_SQL)
                    .fetch_all(require_sqlite(&self.pool)?)
                    .await
                    .context("Failed to list contact messages")?;
                Ok(rows.iter().map(row_to_message_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(LIST_SQL)
                    .fetch_all(require_mysql(&self.pool)?)
                    .await
                    .context("Failed to list contact messages")?;
                Ok(rows.iter().map(row_to_message_mysql).collect())
            }
        }
    }
}

async fn create_sqlite(pool: &SqlitePool, message: &ContactMessage) -> Result<ContactMessage> {
    let result = sqlx::query(INSERT_SQL)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.company)
        .bind(&message.message)
        .bind(message.created_at)
        .execute(pool)
        .await
        .context("Failed to create contact message")?;

    Ok(ContactMessage {
        id: result.last_insert_rowid(),
        ..message.clone()
    })
}

fn row_to_message_sqlite(row: &sqlx::sqlite::SqliteRow) -> ContactMessage {
    ContactMessage {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        company: row.get("company"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}

async fn create_mysql(pool: &MySqlPool, message: &ContactMessage) -> Result<ContactMessage> {
    let result = sqlx::query(INSERT_SQL)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.company)
        .bind(&message.message)
        .bind(message.created_at)
        .execute(pool)
        .await
        .context("Failed to create contact message")?;

    Ok(ContactMessage {
        id: result.last_insert_id() as i64,
        ..message.clone()
    })
}

fn row_to_message_mysql(row: &sqlx::mysql::MySqlRow) -> ContactMessage {
    ContactMessage {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        company: row.get("company"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}
