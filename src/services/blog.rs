//! Blog post management
//!
//! Business rules for posts:
//! - title and content are required
//! - slugs come from the title unless the admin supplies one
//! - a generated slug that is taken gets a numeric suffix (`-2`, `-3`, ...)
//! - an explicit slug that is taken is rejected
//! - the slug is regenerated when the title changes, unless a different
//!   slug is supplied

use crate::db::repositories::BlogPostRepository;
use crate::models::{BlogPost, BlogPostInput, ContentFormat};
use crate::services::slug::{generate_slug, is_valid_slug, with_suffix};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Upper bound on suffix probing before giving up
const MAX_SLUG_ATTEMPTS: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("Blog post not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Slug already in use: {0}")]
    SlugConflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Normalized form input
struct PostFields {
    title: String,
    slug: Option<String>,
    content: String,
    content_format: ContentFormat,
    thumbnail: Option<String>,
    embed_url: Option<String>,
    embed_type: Option<String>,
    is_published: bool,
}

pub struct BlogService {
    repo: Arc<dyn BlogPostRepository>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn BlogPostRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: BlogPostInput) -> Result<BlogPost, BlogServiceError> {
        let fields = normalize(input)?;

        let slug = match fields.slug {
            Some(slug) => self.claim_explicit_slug(slug, None).await?,
            None => self.unique_slug_for(&fields.title, None).await?,
        };

        let now = Utc::now();
        let post = BlogPost {
            id: 0,
            title: fields.title,
            slug,
            content: fields.content,
            content_format: fields.content_format,
            thumbnail: fields.thumbnail,
            embed_url: fields.embed_url,
            embed_type: fields.embed_type,
            is_published: fields.is_published,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&post)
            .await
            .context("Failed to create blog post")?;
        tracing::info!("Created blog post {} ({})", created.id, created.slug);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: BlogPostInput) -> Result<BlogPost, BlogServiceError> {
        let existing = self.get_by_id(id).await?;
        let fields = normalize(input)?;

        // The edit form echoes the stored slug back, so an unchanged slug is
        // not an override.
        let title_changed = fields.title != existing.title;
        let slug = match fields.slug {
            Some(slug) if slug != existing.slug => {
                self.claim_explicit_slug(slug, Some(id)).await?
            }
            _ if title_changed => self.unique_slug_for(&fields.title, Some(id)).await?,
            _ => existing.slug.clone(),
        };

        let post = BlogPost {
            title: fields.title,
            slug,
            content: fields.content,
            content_format: fields.content_format,
            thumbnail: fields.thumbnail,
            embed_url: fields.embed_url,
            embed_type: fields.embed_type,
            is_published: fields.is_published,
            updated_at: Utc::now(),
            ..existing
        };

        let updated = self
            .repo
            .update(&post)
            .await
            .context("Failed to update blog post")?;
        tracing::info!("Updated blog post {} ({})", updated.id, updated.slug);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), BlogServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete blog post")?;
        if !deleted {
            return Err(BlogServiceError::NotFound);
        }
        tracing::info!("Deleted blog post {}", id);
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get blog post")?
            .ok_or(BlogServiceError::NotFound)
    }

    /// A post by slug, only if it is published
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPost, BlogServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get blog post")?
            .filter(|post| post.is_published)
            .ok_or(BlogServiceError::NotFound)
    }

    /// Published posts, newest first
    pub async fn list_published(&self) -> Result<Vec<BlogPost>, BlogServiceError> {
        Ok(self
            .repo
            .list(true)
            .await
            .context("Failed to list blog posts")?)
    }

    /// Every post including drafts, newest first
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, BlogServiceError> {
        Ok(self
            .repo
            .list(false)
            .await
            .context("Failed to list blog posts")?)
    }

    async fn claim_explicit_slug(
        &self,
        slug: String,
        exclude_id: Option<i64>,
    ) -> Result<String, BlogServiceError> {
        if !is_valid_slug(&slug) {
            return Err(BlogServiceError::ValidationError(
                "Slug may only contain lowercase letters, digits and single hyphens".to_string(),
            ));
        }
        if self
            .repo
            .slug_exists(&slug, exclude_id)
            .await
            .context("Failed to check slug")?
        {
            return Err(BlogServiceError::SlugConflict(slug));
        }
        Ok(slug)
    }

    async fn unique_slug_for(
        &self,
        title: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, BlogServiceError> {
        let base = generate_slug(title);
        if base.is_empty() {
            return Err(BlogServiceError::ValidationError(
                "Title must contain at least one letter or digit".to_string(),
            ));
        }

        let mut candidate = base.clone();
        for n in 2..=MAX_SLUG_ATTEMPTS {
            if !self
                .repo
                .slug_exists(&candidate, exclude_id)
                .await
                .context("Failed to check slug")?
            {
                return Ok(candidate);
            }
            candidate = with_suffix(&base, n);
        }

        Err(BlogServiceError::SlugConflict(base))
    }
}

fn normalize(input: BlogPostInput) -> Result<PostFields, BlogServiceError> {
    let title = input.title.trim().to_string();
    let content = input.content.trim().to_string();

    if title.is_empty() {
        return Err(BlogServiceError::ValidationError(
            "Title is required".to_string(),
        ));
    }
    if content.is_empty() {
        return Err(BlogServiceError::ValidationError(
            "Content is required".to_string(),
        ));
    }

    Ok(PostFields {
        title,
        slug: non_empty(input.slug),
        content,
        content_format: ContentFormat::parse(input.content_format.as_deref().unwrap_or("")),
        thumbnail: non_empty(input.thumbnail),
        embed_url: non_empty(input.embed_url),
        embed_type: non_empty(input.embed_type),
        is_published: input.is_published,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
