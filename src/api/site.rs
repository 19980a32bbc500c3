//! Marketing pages

use axum::{extract::State, response::Response};
use tera::Context as TeraContext;

use crate::api::middleware::{AppError, AppState, PageContext};

/// Posts teased on the home page
const RECENT_POSTS: usize = 3;

/// GET /
pub async fn home(State(state): State<AppState>, page: PageContext) -> Response {
    // The home page still renders when the blog can't be read.
    let recent_posts = match state.blog_service.list_published().await {
        Ok(mut posts) => {
            posts.truncate(RECENT_POSTS);
            posts
        }
        Err(e) => {
            tracing::warn!("Failed to load recent posts: {}", e);
            Vec::new()
        }
    };

    let mut context = TeraContext::new();
    context.insert("recent_posts", &recent_posts);
    page.render(&state, "home.html", context)
}

/// GET /services
pub async fn services(State(state): State<AppState>, page: PageContext) -> Response {
    page.render(&state, "services.html", TeraContext::new())
}

/// Fallback for unknown routes
pub async fn not_found() -> AppError {
    AppError::NotFound
}
