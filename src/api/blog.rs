//! Public blog pages

use axum::{
    extract::{Path, State},
    response::Response,
};
use tera::Context as TeraContext;

use crate::api::middleware::{AppError, AppState, PageContext};

/// GET /blog
pub async fn list_posts(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response, AppError> {
    let posts = state.blog_service.list_published().await?;

    let mut context = TeraContext::new();
    context.insert("posts", &posts);
    Ok(page.render(&state, "blog/index.html", context))
}

/// GET /blog/{slug}
///
/// Drafts are not visible here, even to a logged-in admin.
pub async fn show_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    page: PageContext,
) -> Result<Response, AppError> {
    let post = state.blog_service.get_published_by_slug(&slug).await?;
    let body = state
        .content_renderer
        .render(&post.content_format, &post.content);

    let mut context = TeraContext::new();
    context.insert("post", &post);
    context.insert("body", &body);
    context.insert("trusted_markup", &post.content_format.is_trusted_markup());
    Ok(page.render(&state, "blog/post.html", context))
}
