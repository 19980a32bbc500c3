//! Blog post repository
//!
//! Database operations for blog posts.
//!
//! - `BlogPostRepository` trait defining the interface for post data access
//! - `SqlxBlogPostRepository` implementing the trait for SQLite and MySQL
//!
//! Listings are ordered newest first (`created_at DESC, id DESC`).

use crate::config::DatabaseDriver;
use crate::db::{require_mysql, require_sqlite, DynDatabasePool};
use crate::models::{BlogPost, ContentFormat};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COLUMNS: &str = "id, title, slug, content, content_format, thumbnail, embed_url, \
                       embed_type, is_published, created_at, updated_at";

#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    /// Insert a post and return it with its assigned id
    async fn create(&self, post: &BlogPost) -> Result<BlogPost>;

    /// Overwrite every mutable column of the post identified by `post.id`
    async fn update(&self, post: &BlogPost) -> Result<BlogPost>;

    /// Returns false if no post had that id
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// Whether `slug` is taken by any post other than `exclude_id`
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Posts newest first, optionally only the published ones
    async fn list(&self, published_only: bool) -> Result<Vec<BlogPost>>;
}

pub struct SqlxBlogPostRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogPostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogPostRepository for SqlxBlogPostRepository {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(require_sqlite(&self.pool)?, post).await,
            DatabaseDriver::Mysql => create_post_mysql(require_mysql(&self.pool)?, post).await,
        }
    }

    async fn update(&self, post: &BlogPost) -> Result<BlogPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(require_sqlite(&self.pool)?, post).await,
            DatabaseDriver::Mysql => update_post_mysql(require_mysql(&self.pool)?, post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        const SQL: &str = "DELETE FROM blog_posts WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .bind(id)
                .execute(require_sqlite(&self.pool)?)
                .await
                .context("Failed to delete blog post")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .bind(id)
                .execute(require_mysql(&self.pool)?)
                .await
                .context("Failed to delete blog post")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts WHERE id = ?", COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(require_sqlite(&self.pool)?)
                    .await
                    .context("Failed to get blog post by ID")?;
                Ok(row.as_ref().map(row_to_post_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(require_mysql(&self.pool)?)
                    .await
                    .context("Failed to get blog post by ID")?;
                Ok(row.as_ref().map(row_to_post_mysql))
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts WHERE slug = ?", COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(require_sqlite(&self.pool)?)
                    .await
                    .context("Failed to get blog post by slug")?;
                Ok(row.as_ref().map(row_to_post_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(require_mysql(&self.pool)?)
                    .await
                    .context("Failed to get blog post by slug")?;
                Ok(row.as_ref().map(row_to_post_mysql))
            }
        }
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        const SQL: &str = "SELECT COUNT(*) AS count FROM blog_posts WHERE slug = ? AND id != ?";
        // Real ids start at 1, so 0 excludes nothing.
        let exclude = exclude_id.unwrap_or(0);
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .bind(slug)
                .bind(exclude)
                .fetch_one(require_sqlite(&self.pool)?)
                .await
                .context("Failed to check slug")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .bind(slug)
                .bind(exclude)
                .fetch_one(require_mysql(&self.pool)?)
                .await
                .context("Failed to check slug")?
                .get("count"),
        };
        Ok(count > 0)
    }

    async fn list(&self, published_only: bool) -> Result<Vec<BlogPost>> {
        let filter = if published_only {
            "WHERE is_published = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM blog_posts {} ORDER BY created_at DESC, id DESC",
            COLUMNS, filter
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut query = sqlx::query(&sql);
                if published_only {
                    query = query.bind(true);
                }
                let rows = query
                    .fetch_all(require_sqlite(&self.pool)?)
                    .await
                    .context("Failed to list blog posts")?;
                Ok(rows.iter().map(row_to_post_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let mut query = sqlx::query(&sql);
                if published_only {
                    query = query.bind(true);
                }
                let rows = query
                    .fetch_all(require_mysql(&self.pool)?)
                    .await
                    .context("Failed to list blog posts")?;
                Ok(rows.iter().map(row_to_post_mysql).collect())
            }
        }
    }
}

const INSERT_SQL: &str = r#"
    INSERT INTO blog_posts
        (title, slug, content, content_format, thumbnail, embed_url, embed_type,
         is_published, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_SQL: &str = r#"
    UPDATE blog_posts
    SET title = ?, slug = ?, content = ?, content_format = ?, thumbnail = ?,
        embed_url = ?, embed_type = ?, is_published = ?, updated_at = ?
    WHERE id = ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, post: &BlogPost) -> Result<BlogPost> {
    let result = sqlx::query(INSERT_SQL)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(post.content_format.as_str())
        .bind(&post.thumbnail)
        .bind(&post.embed_url)
        .bind(&post.embed_type)
        .bind(post.is_published)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(pool)
        .await
        .context("Failed to create blog post")?;

    Ok(BlogPost {
        id: result.last_insert_rowid(),
        ..post.clone()
    })
}

async fn update_post_sqlite(pool: &SqlitePool, post: &BlogPost) -> Result<BlogPost> {
    sqlx::query(UPDATE_SQL)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(post.content_format.as_str())
        .bind(&post.thumbnail)
        .bind(&post.embed_url)
        .bind(&post.embed_type)
        .bind(post.is_published)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(pool)
        .await
        .context("Failed to update blog post")?;

    Ok(post.clone())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> BlogPost {
    let format: String = row.get("content_format");
    BlogPost {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        content_format: ContentFormat::parse(&format),
        thumbnail: row.get("thumbnail"),
        embed_url: row.get("embed_url"),
        embed_type: row.get("embed_type"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, post: &BlogPost) -> Result<BlogPost> {
    let result = sqlx::query(INSERT_SQL)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(post.content_format.as_str())
        .bind(&post.thumbnail)
        .bind(&post.embed_url)
        .bind(&post.embed_type)
        .bind(post.is_published)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(pool)
        .await
        .context("Failed to create blog post")?;

    Ok(BlogPost {
        id: result.last_insert_id() as i64,
        ..post.clone()
    })
}

async fn update_post_mysql(pool: &MySqlPool, post: &BlogPost) -> Result<BlogPost> {
    sqlx::query(UPDATE_SQL)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(post.content_format.as_str())
        .bind(&post.thumbnail)
        .bind(&post.embed_url)
        .bind(&post.embed_type)
        .bind(post.is_published)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(pool)
        .await
        .context("Failed to update blog post")?;

    Ok(post.clone())
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> BlogPost {
    let format: String = row.get("content_format");
    BlogPost {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        content_format: ContentFormat::parse(&format),
        thumbnail: row.get("thumbnail"),
        embed_url: row.get("embed_url"),
        embed_type: row.get("embed_type"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
