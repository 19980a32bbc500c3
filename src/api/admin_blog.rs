//! Admin blog management
//!
//! Validation problems re-render the form with the submitted values and a
//! 400; storage failures re-render it with a 500 and an apology. Missing
//! posts go to the 404 page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::api::flash::redirect_with_flash;
use crate::api::middleware::{AppError, AppState, PageContext};
use crate::models::{BlogPost, BlogPostInput};
use crate::services::BlogServiceError;
use crate::theme::FlashMessage;

/// The post form as submitted and as re-displayed
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlogPostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_format: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub embed_url: String,
    #[serde(default)]
    pub embed_type: String,
    /// Checkbox; absent when unchecked
    #[serde(default)]
    pub is_published: Option<String>,
}

impl BlogPostForm {
    fn new_post() -> Self {
        Self {
            content_format: "markdown".to_string(),
            ..Self::default()
        }
    }

    fn from_post(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            content: post.content.clone(),
            content_format: post.content_format.to_string(),
            thumbnail: post.thumbnail.clone().unwrap_or_default(),
            embed_url: post.embed_url.clone().unwrap_or_default(),
            embed_type: post.embed_type.clone().unwrap_or_default(),
            is_published: post.is_published.then(|| "on".to_string()),
        }
    }

    fn to_input(&self) -> BlogPostInput {
        BlogPostInput {
            title: self.title.clone(),
            slug: Some(self.slug.clone()),
            content: self.content.clone(),
            content_format: Some(self.content_format.clone()),
            thumbnail: Some(self.thumbnail.clone()),
            embed_url: Some(self.embed_url.clone()),
            embed_type: Some(self.embed_type.clone()),
            is_published: self.is_published.is_some(),
        }
    }
}

/// Form page for a new post (`post_id` None) or an existing one
fn render_form(
    state: &AppState,
    page: &PageContext,
    status: StatusCode,
    post_id: Option<i64>,
    form: &BlogPostForm,
    error: Option<&str>,
) -> Response {
    let action = match post_id {
        Some(id) => format!("/admin/blog/{}/edit", id),
        None => "/admin/blog/new".to_string(),
    };

    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("action", &action);
    if let Some(id) = post_id {
        context.insert("post_id", &id);
    }
    if let Some(error) = error {
        context.insert("form_error", error);
    }
    page.render_status(state, status, "admin/blog_form.html", context)
}

const SAVE_FAILED_MESSAGE: &str = "Sorry, the post could not be saved. Please try again.";

/// Status and message for errors shown inline on the form, or the error to
/// propagate
fn form_error(e: BlogServiceError) -> Result<(StatusCode, String), AppError> {
    match e {
        BlogServiceError::ValidationError(msg) => Ok((StatusCode::BAD_REQUEST, msg)),
        BlogServiceError::SlugConflict(slug) => Ok((
            StatusCode::BAD_REQUEST,
            format!("The slug '{}' is already used by another post", slug),
        )),
        BlogServiceError::InternalError(e) => {
            tracing::error!("Failed to save blog post: {:#}", e);
            Ok((StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED_MESSAGE.to_string()))
        }
        BlogServiceError::NotFound => Err(AppError::NotFound),
    }
}

/// GET /admin/blog
pub async fn list_posts(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    let posts = state.blog_service.list_all().await?;

    let mut context = TeraContext::new();
    context.insert("posts", &posts);
    Ok(page.render(&state, "admin/blog_list.html", context))
}

/// GET /admin/blog/new
pub async fn new_post(State(state): State<AppState>, page: PageContext) -> Response {
    render_form(&state, &page, StatusCode::OK, None, &BlogPostForm::new_post(), None)
}

/// POST /admin/blog/new
pub async fn create_post(
    State(state): State<AppState>,
    page: PageContext,
    Form(form): Form<BlogPostForm>,
) -> Result<Response, AppError> {
    match state.blog_service.create(form.to_input()).await {
        Ok(post) => Ok(redirect_with_flash(
            "/admin/blog",
            &FlashMessage::success(format!("Created post \"{}\"", post.title)),
        )),
        Err(e) => {
            let (status, message) = form_error(e)?;
            Ok(render_form(&state, &page, status, None, &form, Some(&message)))
        }
    }
}

/// GET /admin/blog/{id}/edit
pub async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    page: PageContext,
) -> Result<Response, AppError> {
    let post = state.blog_service.get_by_id(id).await?;
    Ok(render_form(
        &state,
        &page,
        StatusCode::OK,
        Some(id),
        &BlogPostForm::from_post(&post),
        None,
    ))
}

/// POST /admin/blog/{id}/edit
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    page: PageContext,
    Form(form): Form<BlogPostForm>,
) -> Result<Response, AppError> {
    match state.blog_service.update(id, form.to_input()).await {
        Ok(post) => Ok(redirect_with_flash(
            "/admin/blog",
            &FlashMessage::success(format!("Updated post \"{}\"", post.title)),
        )),
        Err(e) => {
            let (status, message) = form_error(e)?;
            Ok(render_form(&state, &page, status, Some(id), &form, Some(&message)))
        }
    }
}

/// POST /admin/blog/{id}/delete
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let flash = match state.blog_service.delete(id).await {
        Ok(()) => FlashMessage::success("Post deleted"),
        Err(BlogServiceError::NotFound) => return Err(AppError::NotFound),
        Err(e) => {
            tracing::error!("Failed to delete blog post {}: {}", id, e);
            FlashMessage::error("Sorry, the post could not be deleted. Please try again.")
        }
    };
    Ok(redirect_with_flash("/admin/blog", &flash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentFormat;
    use chrono::Utc;

    #[test]
    fn test_checkbox_maps_to_published() {
        let mut form = BlogPostForm {
            title: "Hi".to_string(),
            content: "Body".to_string(),
            ..BlogPostForm::default()
        };
        assert!(!form.to_input().is_published);

        form.is_published = Some("on".to_string());
        assert!(form.to_input().is_published);
    }

    #[test]
    fn test_form_round_trips_existing_post() {
        let now = Utc::now();
        let post = BlogPost {
            id: 3,
            title: "Launch".to_string(),
            slug: "launch".to_string(),
            content: "<p>x</p>".to_string(),
            content_format: ContentFormat::Html,
            thumbnail: None,
            embed_url: Some("https://example.com/v".to_string()),
            embed_type: None,
            is_published: true,
            created_at: now,
            updated_at: now,
        };

        let form = BlogPostForm::from_post(&post);
        assert_eq!(form.content_format, "html");
        assert_eq!(form.thumbnail, "");
        assert_eq!(form.is_published.as_deref(), Some("on"));

        let input = form.to_input();
        assert_eq!(input.slug.as_deref(), Some("launch"));
        assert!(input.is_published);
    }

    #[test]
    fn test_form_error_messages() {
        assert_eq!(
            form_error(BlogServiceError::ValidationError("Title is required".to_string())).unwrap(),
            (StatusCode::BAD_REQUEST, "Title is required".to_string())
        );
        let (status, message) =
            form_error(BlogServiceError::SlugConflict("x".to_string())).unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("'x'"));
        assert_eq!(
            form_error(BlogServiceError::InternalError(anyhow::anyhow!("disk full"))).unwrap(),
            (StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED_MESSAGE.to_string())
        );
        assert!(matches!(
            form_error(BlogServiceError::NotFound),
            Err(AppError::NotFound)
        ));
    }
}
